//! # SpaMI: spatial multi-omics integration
//!
//! SpaMI learns a joint embedding of two omics modalities measured over the same
//! spatial locations. Each modality is encoded by a graph contrastive encoder that
//! must tell its real spatial input apart from a row-shuffled copy, reconstruct its
//! features, and agree with the other modality's embedding. An attention layer fuses
//! the two embeddings into one per location.
//!
//! ## Features
//!
//! - Dataset presets for learning rate, epochs and loss weights
//! - Reproducible runs from a single seed
//! - Model record, fused embedding (`.npy`), loss curve and metadata per run
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use spami::data::loader::load_dataset;
//! use spami::training::{train, TrainingConfig};
//! use spami::TrainingBackend;
//!
//! let omics1 = load_dataset("data/rna").unwrap();
//! let omics2 = load_dataset("data/protein").unwrap();
//!
//! let config = TrainingConfig::for_dataset("Mouse_Thymus").with_result_dir("result");
//! std::fs::create_dir_all(config.artifact_paths().dir).unwrap();
//!
//! let device = burn::backend::ndarray::NdArrayDevice::default();
//! let result = train::<TrainingBackend>(omics1, omics2, config, device).unwrap();
//! println!("embedding {:?}", result.embedding.dim());
//! ```

pub mod cli;
pub mod data;
pub mod error;
pub mod model;
pub mod training;
pub mod utils;

use burn::backend::Autodiff;
use burn_ndarray::NdArray;

/// Default backend type
pub type DefaultBackend = NdArray<f32>;

/// Backend used for training
pub type TrainingBackend = Autodiff<DefaultBackend>;

/// Re-export commonly used types
pub use data::loader::DataLoader;
pub use data::{DualOmicsData, OmicsDataset};
pub use error::SpamiError;
pub use model::{architecture::SpamiModel, ModelConfig};
pub use training::finalizer::ArtifactPaths;
pub use training::{TrainingConfig, TrainingResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!(
        "{} v{} - spatial multi-omics integration",
        NAME, VERSION
    )
}
