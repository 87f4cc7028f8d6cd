use crate::model::loss::LossWeights;
use tracing::debug;

/// Numeric hyperparameters tied to a dataset identifier
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DatasetPreset {
    pub learning_rate: f64,
    pub epochs: usize,
    /// Neighbors used when the first modality's graph was built
    pub n_neighbors_omics1: usize,
    /// Neighbors used when the second modality's graph was built
    pub n_neighbors_omics2: usize,
    pub factors: LossWeights,
}

/// Preset used for any identifier not listed in [`PRESETS`]
pub const DEFAULT_PRESET: DatasetPreset = DatasetPreset {
    learning_rate: 0.001,
    epochs: 1000,
    n_neighbors_omics1: 3,
    n_neighbors_omics2: 3,
    factors: LossWeights::from_factors([1.0, 1.0, 10.0, 10.0, 5.0]),
};

/// Known datasets and their presets
pub const PRESETS: &[(&str, DatasetPreset)] = &[
    (
        "MISAR",
        DatasetPreset {
            learning_rate: 0.01,
            epochs: 800,
            n_neighbors_omics1: 3,
            n_neighbors_omics2: 3,
            factors: LossWeights::from_factors([1.0, 1.0, 10.0, 15.0, 3.0]),
        },
    ),
    (
        "Mouse_Brain_P22",
        DatasetPreset {
            learning_rate: 0.001,
            epochs: 400,
            n_neighbors_omics1: 6,
            n_neighbors_omics2: 6,
            factors: LossWeights::from_factors([1.0, 1.0, 10.0, 15.0, 5.0]),
        },
    ),
    (
        "Mouse_Thymus",
        DatasetPreset {
            learning_rate: 0.0001,
            epochs: 600,
            n_neighbors_omics1: 3,
            n_neighbors_omics2: 3,
            factors: LossWeights::from_factors([1.0, 5.0, 10.0, 25.0, 1.0]),
        },
    ),
];

/// Preset for `dataset`, falling back to [`DEFAULT_PRESET`]
pub fn lookup(dataset: &str) -> DatasetPreset {
    match PRESETS.iter().find(|(name, _)| *name == dataset) {
        Some((_, preset)) => *preset,
        None => {
            debug!("No preset for dataset '{}', using defaults", dataset);
            DEFAULT_PRESET
        }
    }
}
