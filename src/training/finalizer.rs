use crate::data::tensor_to_array;
use crate::error::SpamiError;
use crate::model::architecture::DualOmicsModel;
use crate::model::checkpoint::{ModelSaver, RunMetadata};
use crate::model::ModelConfig;
use crate::training::{FittedRun, TrainingConfig};
use crate::utils::plot::plot_loss_curve;
use crate::utils::random::{stream_rng, RngStream};
use anyhow::Result;
use burn::module::AutodiffModule;
use burn::tensor::backend::AutodiffBackend;
use ndarray::Array2;
use ndarray_npy::write_npy;
use std::path::{Path, PathBuf};
use tracing::info;

/// Model record file name
pub const MODEL_FILE: &str = "model.mpk";
/// Fused embedding file name
pub const EMBEDDING_FILE: &str = "combine_emb.npy";
/// Loss curve file name
pub const LOSS_PLOT_FILE: &str = "loss_plot.svg";
/// Run metadata file name
pub const METADATA_FILE: &str = "metadata.json";

/// Artifact locations of one run, `<result_dir>/<dataset>/...`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub dir: PathBuf,
    pub model: PathBuf,
    pub embedding: PathBuf,
    pub loss_plot: PathBuf,
    pub metadata: PathBuf,
}

impl ArtifactPaths {
    pub fn new<P: AsRef<Path>>(result_dir: P, dataset: &str) -> Self {
        let dir = result_dir.as_ref().join(dataset);
        Self {
            model: dir.join(MODEL_FILE),
            embedding: dir.join(EMBEDDING_FILE),
            loss_plot: dir.join(LOSS_PLOT_FILE),
            metadata: dir.join(METADATA_FILE),
            dir,
        }
    }
}

/// Host-side results of the evaluation pass
#[derive(Debug, Clone)]
pub struct FinalOutputs {
    /// Fused embedding [n, out_dim]
    pub embedding: Array2<f32>,
    /// Fusion mixing weights [n, 2]
    pub attention: Array2<f32>,
}

/// Evaluates a fitted model once and writes every artifact of the run
pub struct RunFinalizer {
    paths: ArtifactPaths,
    training_config: TrainingConfig,
    model_config: ModelConfig,
}

impl RunFinalizer {
    pub fn new(paths: ArtifactPaths, training_config: TrainingConfig, model_config: ModelConfig) -> Self {
        Self {
            paths,
            training_config,
            model_config,
        }
    }

    /// Switch to evaluation mode, recompute the embeddings from the last epoch's inputs
    /// and persist them
    ///
    /// The artifact directory must already exist. Existing artifacts are overwritten.
    pub fn finalize<B, M>(&self, run: &FittedRun<B, M>) -> Result<FinalOutputs>
    where
        B: AutodiffBackend,
        M: AutodiffModule<B> + DualOmicsModel<B>,
        M::InnerModule: DualOmicsModel<B::InnerBackend>,
    {
        if !self.paths.dir.is_dir() {
            return Err(SpamiError::persistence(&self.paths.dir, "artifact directory does not exist").into());
        }

        let model = run.model.valid();
        let input = run.last_input.clone().inner();
        // dropout is inactive without autodiff, the stream is never drawn from
        let mut rng = stream_rng(self.training_config.seed, RngStream::Dropout);
        let output = model.forward(input, &mut rng);

        let embedding = tensor_to_array(output.combined)?;
        let attention = tensor_to_array(output.attention)?;

        ModelSaver::save_model::<B::InnerBackend, _, _>(model, &self.paths.model)?;

        write_npy(&self.paths.embedding, &embedding)
            .map_err(|e| SpamiError::persistence(&self.paths.embedding, e))?;
        info!("Saved embedding {:?}: {:?}", embedding.dim(), self.paths.embedding);

        plot_loss_curve(&run.state.loss_history, &self.paths.loss_plot)
            .map_err(|e| SpamiError::persistence(&self.paths.loss_plot, e))?;
        info!("Saved loss curve: {:?}", self.paths.loss_plot);

        let metadata = RunMetadata {
            version: crate::VERSION.to_string(),
            dataset: self.training_config.dataset.clone(),
            model_config: self.model_config.clone(),
            training_config: self.training_config.clone(),
            loss_history: run.state.loss_history.clone(),
            timestamp: crate::utils::unix_timestamp(),
        };
        ModelSaver::save_metadata(&metadata, &self.paths.metadata)?;

        Ok(FinalOutputs {
            embedding,
            attention,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::tests::synthetic_dataset;
    use crate::data::OmicsTensors;
    use crate::training::Trainer;
    use burn::backend::{Autodiff, NdArray};
    use burn::prelude::*;
    use ndarray_npy::read_npy;
    use tempfile::TempDir;

    type TestBackend = Autodiff<NdArray<f32>>;

    #[test]
    fn test_artifact_paths() {
        let paths = ArtifactPaths::new("result", "MISAR");
        assert_eq!(paths.dir, PathBuf::from("result/MISAR"));
        assert_eq!(paths.model, PathBuf::from("result/MISAR/model.mpk"));
        assert_eq!(paths.embedding, PathBuf::from("result/MISAR/combine_emb.npy"));
        assert_eq!(paths.loss_plot, PathBuf::from("result/MISAR/loss_plot.svg"));
        assert_eq!(paths.metadata, PathBuf::from("result/MISAR/metadata.json"));
    }

    #[test]
    fn test_finalize_writes_artifacts() {
        let temp_dir = TempDir::new().unwrap();
        let device = <TestBackend as Backend>::Device::default();
        let config = TrainingConfig::for_dataset("Mouse_Thymus")
            .with_epochs(3)
            .with_out_dim(6)
            .with_result_dir(temp_dir.path());
        let paths = config.artifact_paths();
        std::fs::create_dir_all(&paths.dir).unwrap();

        let d1 = synthetic_dataset(9, 4, 1);
        let d2 = synthetic_dataset(9, 3, 2);
        let t1 = OmicsTensors::<TestBackend>::from_dataset(&d1, &device);
        let t2 = OmicsTensors::<TestBackend>::from_dataset(&d2, &device);
        let model_config = config.model_config(4, 3);
        let model = model_config.init::<TestBackend>(&t1, &t2, config.seed, &device);

        let run = Trainer::<TestBackend>::new(config.clone(), device)
            .with_progress_bar(false)
            .fit(model, &t1, &t2)
            .unwrap();
        let outputs = RunFinalizer::new(paths.clone(), config, model_config)
            .finalize(&run)
            .unwrap();

        assert_eq!(outputs.embedding.dim(), (9, 6));
        assert_eq!(outputs.attention.dim(), (9, 2));

        let saved: Array2<f32> = read_npy(&paths.embedding).unwrap();
        assert_eq!(saved, outputs.embedding);
        assert!(paths.model.exists());
        assert!(std::fs::read_to_string(&paths.loss_plot).unwrap().contains("<svg"));

        let metadata = ModelSaver::load_metadata(&paths.metadata).unwrap();
        assert_eq!(metadata.dataset, "Mouse_Thymus");
        assert_eq!(metadata.loss_history, run.state.loss_history);
    }
}
