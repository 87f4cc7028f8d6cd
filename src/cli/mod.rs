use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// SpaMI: spatial multi-omics integration with graph contrastive learning
#[derive(Parser, Debug)]
#[command(name = "spami")]
#[command(about = "Spatial multi-omics integration with graph contrastive learning")]
#[command(version)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train on two paired modalities and write the fused embedding
    Train(TrainArgs),

    /// List the built-in dataset presets
    Presets,
}

/// Training arguments
#[derive(Parser, Debug)]
pub struct TrainArgs {
    /// Directory holding the first modality (feat.npy, adj.npy, graph_neigh.npy)
    #[arg(long, required = true)]
    pub omics1: PathBuf,

    /// Directory holding the second modality
    #[arg(long, required = true)]
    pub omics2: PathBuf,

    /// Dataset identifier, selects the hyperparameter preset
    #[arg(short, long, required = true)]
    pub dataset: String,

    /// Output root; artifacts go to <output>/<dataset>/
    #[arg(short, long, default_value = "result")]
    pub output: PathBuf,

    /// Training configuration file (JSON), replaces the preset
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Embedding dimension
    #[arg(long)]
    pub out_dim: Option<usize>,

    /// Dropout rate
    #[arg(long)]
    pub dropout: Option<f64>,

    /// Weight decay
    #[arg(long)]
    pub weight_decay: Option<f64>,

    /// Random seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Override the preset's epoch count
    #[arg(short, long)]
    pub epochs: Option<usize>,

    /// Device to use (cpu)
    #[arg(long, default_value = "cpu")]
    pub device: String,

    /// Hide the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

/// Parse CLI arguments
pub fn parse_args() -> Cli {
    Cli::parse()
}

/// Setup logging based on verbosity
///
/// `RUST_LOG` takes precedence when set.
pub fn setup_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_train_args() {
        let cli = Cli::parse_from([
            "spami", "train",
            "--omics1", "data/rna",
            "--omics2", "data/atac",
            "-d", "MISAR",
        ]);

        match cli.command {
            Commands::Train(args) => {
                assert_eq!(args.omics1, PathBuf::from("data/rna"));
                assert_eq!(args.dataset, "MISAR");
                assert_eq!(args.output, PathBuf::from("result"));
                assert_eq!(args.device, "cpu");
                assert!(args.epochs.is_none());
                assert!(args.seed.is_none());
            }
            _ => panic!("Expected Train command"),
        }
    }

    #[test]
    fn test_train_overrides() {
        let cli = Cli::parse_from([
            "spami", "-v", "train",
            "--omics1", "a",
            "--omics2", "b",
            "--dataset", "Mouse_Thymus",
            "--out-dim", "32",
            "--dropout", "0.2",
            "--weight-decay", "0.0001",
            "--seed", "7",
            "--no-progress",
        ]);

        assert!(cli.verbose);
        match cli.command {
            Commands::Train(args) => {
                assert_eq!(args.out_dim, Some(32));
                assert_eq!(args.dropout, Some(0.2));
                assert_eq!(args.weight_decay, Some(0.0001));
                assert_eq!(args.seed, Some(7));
                assert!(args.no_progress);
            }
            _ => panic!("Expected Train command"),
        }
    }

    #[test]
    fn test_missing_modality_rejected() {
        let result = Cli::try_parse_from(["spami", "train", "--omics1", "a", "-d", "MISAR"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_presets_command() {
        let cli = Cli::parse_from(["spami", "presets"]);
        assert!(matches!(cli.command, Commands::Presets));
    }
}
