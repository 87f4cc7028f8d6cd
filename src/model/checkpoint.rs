use burn::prelude::*;
use burn::record::{FullPrecisionSettings, NamedMpkFileRecorder};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use anyhow::{Context, Result};
use tracing::info;

use crate::data::OmicsTensors;
use crate::error::SpamiError;
use crate::model::architecture::SpamiModel;
use crate::model::ModelConfig;
use crate::training::finalizer::ArtifactPaths;
use crate::training::TrainingConfig;

/// Metadata written next to the persisted model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetadata {
    /// Crate version that produced the run
    pub version: String,
    /// Dataset identifier
    pub dataset: String,
    /// Model configuration
    pub model_config: ModelConfig,
    /// Training configuration
    pub training_config: TrainingConfig,
    /// Total loss per epoch
    pub loss_history: Vec<f64>,
    /// Seconds since the unix epoch
    pub timestamp: u64,
}

impl RunMetadata {
    /// Loss of the last epoch
    pub fn final_loss(&self) -> Option<f64> {
        self.loss_history.last().copied()
    }
}

/// Recorder for model parameters, stored as full-precision floats
pub type ModelRecorder = NamedMpkFileRecorder<FullPrecisionSettings>;

/// Model persistence
pub struct ModelSaver;

impl ModelSaver {
    /// Save model parameters, overwriting any previous file
    pub fn save_model<B: Backend, M: Module<B>, P: AsRef<Path>>(model: M, path: P) -> Result<()> {
        let path = path.as_ref();
        model
            .save_file(path.to_path_buf(), &ModelRecorder::new())
            .map_err(|e| SpamiError::persistence(path, format!("{:?}", e)))?;

        info!("Saved model: {:?}", path);
        Ok(())
    }

    /// Save run metadata as pretty JSON
    pub fn save_metadata<P: AsRef<Path>>(metadata: &RunMetadata, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(metadata)
            .context("Failed to serialize metadata")?;
        fs::write(path, json).map_err(|e| SpamiError::persistence(path, e))?;
        Ok(())
    }

    /// Load run metadata
    pub fn load_metadata<P: AsRef<Path>>(path: P) -> Result<RunMetadata> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read metadata file {:?}", path))?;
        serde_json::from_str(&json).context("Failed to parse metadata")
    }

    /// Rebuild a model over the given graphs and load persisted parameters into it
    pub fn load_model<B: Backend, P: AsRef<Path>>(
        path: P,
        model_config: &ModelConfig,
        omics1: &OmicsTensors<B>,
        omics2: &OmicsTensors<B>,
        device: &B::Device,
    ) -> Result<SpamiModel<B>> {
        let path = path.as_ref();
        info!("Loading model from {:?}", path);

        let model = model_config
            .init(omics1, omics2, 0, device)
            .load_file(path.to_path_buf(), &ModelRecorder::new(), device)
            .map_err(|e| anyhow::anyhow!("Failed to load model {:?}: {:?}", path, e))?;

        Ok(model)
    }
}

/// Reload a finished run: its metadata and its model rebuilt over the same graphs
pub fn load_run<B: Backend>(
    paths: &ArtifactPaths,
    omics1: &OmicsTensors<B>,
    omics2: &OmicsTensors<B>,
    device: &B::Device,
) -> Result<(SpamiModel<B>, RunMetadata)> {
    let metadata = ModelSaver::load_metadata(&paths.metadata)?;
    let model = ModelSaver::load_model(&paths.model, &metadata.model_config, omics1, omics2, device)?;
    Ok((model, metadata))
}
