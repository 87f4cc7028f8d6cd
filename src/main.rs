use anyhow::{Context, Result};
use burn::backend::ndarray::NdArrayDevice;
use spami::cli::{parse_args, setup_logging, Commands, TrainArgs};
use spami::data::loader::load_dataset;
use spami::data::DualOmicsData;
use spami::training::presets::{DEFAULT_PRESET, PRESETS};
use spami::training::{Trainer, TrainingConfig};
use spami::TrainingBackend;
use tracing::{error, info};

fn main() {
    let cli = parse_args();

    setup_logging(cli.verbose);

    info!("{}", spami::info());

    let result = match cli.command {
        Commands::Train(args) => run_train(args),
        Commands::Presets => run_presets(),
    };

    if let Err(e) = result {
        error!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn select_device(name: &str) -> Result<NdArrayDevice> {
    match name {
        "cpu" => Ok(NdArrayDevice::Cpu),
        other => anyhow::bail!("Unsupported device: {} (available: cpu)", other),
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    let device = select_device(&args.device)?;

    let mut config = match &args.config {
        Some(path) => TrainingConfig::load(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => TrainingConfig::for_dataset(&args.dataset),
    };
    config.dataset = args.dataset.clone();
    config.result_dir = args.output.clone();
    if let Some(out_dim) = args.out_dim {
        config = config.with_out_dim(out_dim);
    }
    if let Some(dropout) = args.dropout {
        config = config.with_dropout(dropout);
    }
    if let Some(weight_decay) = args.weight_decay {
        config = config.with_weight_decay(weight_decay);
    }
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    if let Some(epochs) = args.epochs {
        config = config.with_epochs(epochs);
    }
    config.validate()?;

    info!("Loading omics1 from {:?}", args.omics1);
    let omics1 = load_dataset(&args.omics1)?;
    info!("Loading omics2 from {:?}", args.omics2);
    let omics2 = load_dataset(&args.omics2)?;
    let data = DualOmicsData::new(omics1, omics2).context("Input modalities do not pair")?;

    let artifacts = config.artifact_paths();
    spami::utils::ensure_dir(&artifacts.dir)?;

    let mut trainer = Trainer::<TrainingBackend>::new(config, device)
        .with_progress_bar(!args.no_progress);
    let result = trainer.train(&data).context("Training failed")?;

    info!("=== Training Results ===");
    info!("Epochs: {}", result.state.epoch);
    if let (Some(first), Some(last)) = (result.state.loss_history.first(), result.state.last_loss()) {
        info!("Loss: {:.4} -> {:.4}", first, last);
    }
    info!("Embedding: {:?}", result.embedding.dim());
    info!("Training time: {}", spami::utils::format_duration(result.duration_secs));
    info!("Artifacts written to {:?}", result.artifacts.dir);

    Ok(())
}

fn run_presets() -> Result<()> {
    println!(
        "{:<18} {:>10} {:>7} {:>10}  factors",
        "dataset", "lr", "epochs", "neighbors"
    );
    let rows = PRESETS
        .iter()
        .copied()
        .chain(std::iter::once(("(default)", DEFAULT_PRESET)));
    for (name, preset) in rows {
        println!(
            "{:<18} {:>10} {:>7} {:>10}  {:?}",
            name,
            preset.learning_rate,
            preset.epochs,
            format!("{}/{}", preset.n_neighbors_omics1, preset.n_neighbors_omics2),
            preset.factors.factors()
        );
    }
    Ok(())
}
