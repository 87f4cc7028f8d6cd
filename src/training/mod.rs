pub mod callbacks;
pub mod finalizer;
pub mod presets;
pub mod trainer;

use crate::error::SpamiError;
use crate::model::loss::{LossComponents, LossWeights};
use crate::model::ModelConfig;
use crate::training::finalizer::ArtifactPaths;
use crate::utils::validation::{in_range, positive};
use anyhow::{Context, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use trainer::{train, FittedRun, Trainer};

/// Training configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Dataset identifier, selects the preset and names the artifact directory
    pub dataset: String,
    /// Embedding dimension
    pub out_dim: usize,
    /// Dropout rate on encoder inputs
    pub dropout: f64,
    /// Weight decay (L2 regularization)
    pub weight_decay: f64,
    /// Learning rate
    pub learning_rate: f64,
    /// Number of training epochs
    pub epochs: usize,
    /// Neighbors used to build the first modality's graph
    pub n_neighbors_omics1: usize,
    /// Neighbors used to build the second modality's graph
    pub n_neighbors_omics2: usize,
    /// Loss term weights
    pub factors: LossWeights,
    /// Random seed
    pub seed: u64,
    /// Root directory for run artifacts
    pub result_dir: PathBuf,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self::for_dataset("default")
    }
}

impl TrainingConfig {
    /// Configuration with the preset of `dataset` applied
    pub fn for_dataset(dataset: &str) -> Self {
        let preset = presets::lookup(dataset);
        Self {
            dataset: dataset.to_string(),
            out_dim: 64,
            dropout: 0.15,
            weight_decay: 0.0,
            learning_rate: preset.learning_rate,
            epochs: preset.epochs,
            n_neighbors_omics1: preset.n_neighbors_omics1,
            n_neighbors_omics2: preset.n_neighbors_omics2,
            factors: preset.factors,
            seed: 2024,
            result_dir: PathBuf::from("result"),
        }
    }

    pub fn with_out_dim(mut self, out_dim: usize) -> Self {
        self.out_dim = out_dim;
        self
    }

    pub fn with_dropout(mut self, dropout: f64) -> Self {
        self.dropout = dropout;
        self
    }

    pub fn with_weight_decay(mut self, weight_decay: f64) -> Self {
        self.weight_decay = weight_decay;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    pub fn with_factors(mut self, factors: LossWeights) -> Self {
        self.factors = factors;
        self
    }

    pub fn with_result_dir<P: AsRef<Path>>(mut self, result_dir: P) -> Self {
        self.result_dir = result_dir.as_ref().to_path_buf();
        self
    }

    /// Load configuration from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let config: Self = serde_json::from_str(&json).context("Failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)
            .with_context(|| format!("Failed to write config file {:?}", path.as_ref()))?;
        Ok(())
    }

    /// Reject values the training loop cannot run with
    pub fn validate(&self) -> Result<(), SpamiError> {
        if self.epochs == 0 {
            return Err(SpamiError::InvalidConfig {
                message: "epochs must be at least 1".to_string(),
            });
        }
        if self.out_dim == 0 {
            return Err(SpamiError::InvalidConfig {
                message: "out_dim must be at least 1".to_string(),
            });
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(SpamiError::InvalidConfig {
                message: format!("dropout must lie in [0, 1), got {}", self.dropout),
            });
        }
        in_range(self.weight_decay, 0.0, f64::INFINITY, "weight_decay")?;
        positive(self.learning_rate, "learning_rate")?;
        for (name, w) in ["w1", "w2", "w3", "w4", "w5"].iter().zip(self.factors.factors()) {
            in_range(w, 0.0, f64::INFINITY, name)?;
        }
        Ok(())
    }

    /// Model configuration for the given input dimensions
    pub fn model_config(&self, omics1_input_dim: usize, omics2_input_dim: usize) -> ModelConfig {
        ModelConfig::new(omics1_input_dim, omics2_input_dim)
            .with_out_dim(self.out_dim)
            .with_dropout(self.dropout)
    }

    /// Artifact locations for this run
    pub fn artifact_paths(&self) -> ArtifactPaths {
        ArtifactPaths::new(&self.result_dir, &self.dataset)
    }
}

/// Training state
#[derive(Debug, Clone, Default)]
pub struct TrainingState {
    /// Completed epochs
    pub epoch: usize,
    /// Total loss per completed epoch
    pub loss_history: Vec<f64>,
    /// Individual loss terms per completed epoch
    pub component_history: Vec<LossComponents>,
}

impl TrainingState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one epoch's losses
    pub fn record(&mut self, components: LossComponents) {
        self.epoch += 1;
        self.loss_history.push(components.total);
        self.component_history.push(components);
    }

    pub fn is_finished(&self, epochs: usize) -> bool {
        self.epoch >= epochs
    }

    pub fn last_loss(&self) -> Option<f64> {
        self.loss_history.last().copied()
    }
}

/// Training result
#[derive(Debug, Clone)]
pub struct TrainingResult {
    /// Final training state
    pub state: TrainingState,
    /// Where the artifacts were written
    pub artifacts: ArtifactPaths,
    /// Fused embedding [n, out_dim]
    pub embedding: Array2<f32>,
    /// Fusion mixing weights [n, 2]
    pub attention: Array2<f32>,
    /// Training duration in seconds
    pub duration_secs: f64,
}
