use burn::backend::ndarray::NdArrayDevice;
use ndarray::Array2;
use ndarray_npy::read_npy;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use spami::data::{DualOmicsData, OmicsDataset, OmicsTensors};
use spami::model::checkpoint::load_run;
use spami::training::finalizer::{FinalOutputs, RunFinalizer};
use spami::training::{train, Trainer, TrainingConfig};
use spami::{DefaultBackend, SpamiError, TrainingBackend};
use tempfile::TempDir;

fn modality(n: usize, d: usize, seed: u64) -> OmicsDataset {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let feat = Array2::from_shape_fn((n, d), |_| rng.gen_range(0.0f32..1.0));
    OmicsDataset::new(feat, Array2::eye(n), Array2::eye(n))
}

fn synthetic_pair() -> DualOmicsData {
    DualOmicsData::new(modality(10, 5, 1), modality(10, 5, 2)).unwrap()
}

#[test]
fn default_preset_run_reduces_loss_and_persists_embedding() {
    let temp_dir = TempDir::new().unwrap();
    let config = TrainingConfig::for_dataset("synthetic").with_result_dir(temp_dir.path());
    assert_eq!(config.epochs, 1000);
    std::fs::create_dir_all(config.artifact_paths().dir).unwrap();

    let data = synthetic_pair();
    let result = Trainer::<TrainingBackend>::new(config, NdArrayDevice::Cpu)
        .with_progress_bar(false)
        .train(&data)
        .unwrap();

    let losses = &result.state.loss_history;
    assert_eq!(losses.len(), 1000);
    assert!(losses.iter().all(|l| l.is_finite()));
    assert!(losses[999] < losses[0], "loss went from {} to {}", losses[0], losses[999]);

    let embedding: Array2<f32> = read_npy(&result.artifacts.embedding).unwrap();
    assert_eq!(embedding.dim(), (10, 64));
    assert_eq!(embedding, result.embedding);
    assert!(result.artifacts.loss_plot.exists());

    let device = NdArrayDevice::Cpu;
    let t1 = OmicsTensors::<DefaultBackend>::from_dataset(data.omics1(), &device);
    let t2 = OmicsTensors::<DefaultBackend>::from_dataset(data.omics2(), &device);
    let (_model, metadata) = load_run(&result.artifacts, &t1, &t2, &device).unwrap();
    assert_eq!(metadata.loss_history.len(), 1000);
    assert_eq!(metadata.model_config.out_dim, 64);
}

fn fit_and_finalize(config: &TrainingConfig, data: &DualOmicsData) -> FinalOutputs {
    let device = NdArrayDevice::Cpu;
    let t1 = OmicsTensors::<TrainingBackend>::from_dataset(data.omics1(), &device);
    let t2 = OmicsTensors::<TrainingBackend>::from_dataset(data.omics2(), &device);
    let model_config = config.model_config(5, 5);
    let model = model_config.init::<TrainingBackend>(&t1, &t2, config.seed, &device);

    let run = Trainer::<TrainingBackend>::new(config.clone(), device)
        .with_progress_bar(false)
        .fit(model, &t1, &t2)
        .unwrap();
    RunFinalizer::new(config.artifact_paths(), config.clone(), model_config)
        .finalize(&run)
        .unwrap()
}

#[test]
fn finalizing_twice_overwrites_artifacts() {
    let temp_dir = TempDir::new().unwrap();
    let data = synthetic_pair();
    let first_config = TrainingConfig::for_dataset("MISAR")
        .with_epochs(3)
        .with_out_dim(16)
        .with_result_dir(temp_dir.path());
    let second_config = first_config.clone().with_seed(1);
    let paths = first_config.artifact_paths();
    std::fs::create_dir_all(&paths.dir).unwrap();

    let first = fit_and_finalize(&first_config, &data);
    let second = fit_and_finalize(&second_config, &data);
    assert_ne!(first.embedding, second.embedding);

    let saved: Array2<f32> = read_npy(&paths.embedding).unwrap();
    assert_eq!(saved, second.embedding);
}

#[test]
fn missing_artifact_directory_is_a_persistence_failure() {
    let temp_dir = TempDir::new().unwrap();
    let config = TrainingConfig::for_dataset("MISAR")
        .with_epochs(2)
        .with_out_dim(8)
        .with_result_dir(temp_dir.path().join("absent"));

    let err = Trainer::<TrainingBackend>::new(config, NdArrayDevice::Cpu)
        .with_progress_bar(false)
        .train(&synthetic_pair())
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<SpamiError>(),
        Some(SpamiError::PersistenceFailure { .. })
    ));
}

#[test]
fn mismatched_location_counts_are_rejected() {
    let err = train::<TrainingBackend>(
        modality(10, 5, 1),
        modality(9, 5, 2),
        TrainingConfig::default(),
        NdArrayDevice::Cpu,
    )
    .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<SpamiError>(),
        Some(SpamiError::ShapeMismatch { .. })
    ));
}
