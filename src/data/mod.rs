pub mod loader;
pub mod permutation;

use crate::error::SpamiError;
use anyhow::{Context, Result};
use burn::prelude::*;
use ndarray::Array2;
use tracing::{debug, warn};

/// Number of discriminator scores per location: real branch and shuffled branch
pub const DISCRIMINATOR_OUTPUTS: usize = 2;

/// One spatial omics modality, as produced by preprocessing
///
/// `adj` and `graph_neigh` are stored without self-loops; they are added when the
/// matrices are copied onto the compute device.
#[derive(Debug, Clone)]
pub struct OmicsDataset {
    /// Feature matrix [n_locations, n_features]
    pub feat: Array2<f32>,
    /// Spatial adjacency [n_locations, n_locations]
    pub adj: Array2<f32>,
    /// Neighborhood indicator [n_locations, n_locations]
    pub graph_neigh: Array2<f32>,
    /// Contrastive labels [n_locations, 2]
    pub label_csl: Array2<f32>,
}

impl OmicsDataset {
    /// Create dataset with default contrastive labels
    pub fn new(feat: Array2<f32>, adj: Array2<f32>, graph_neigh: Array2<f32>) -> Self {
        let label_csl = contrastive_labels(feat.nrows());
        Self {
            feat,
            adj,
            graph_neigh,
            label_csl,
        }
    }

    /// Replace contrastive labels
    pub fn with_labels(mut self, label_csl: Array2<f32>) -> Self {
        self.label_csl = label_csl;
        self
    }

    /// Number of spatial locations
    pub fn n_locations(&self) -> usize {
        self.feat.nrows()
    }

    /// Feature dimension
    pub fn n_features(&self) -> usize {
        self.feat.ncols()
    }

    /// Check shapes and labels of a single modality
    pub fn validate(&self, name: &str) -> Result<(), SpamiError> {
        let n = self.n_locations();
        if n == 0 {
            return Err(SpamiError::shape(format!("{} feat rows", name), "at least 1", 0));
        }
        if self.n_features() == 0 {
            return Err(SpamiError::shape(format!("{} feat columns", name), "at least 1", 0));
        }

        for (label, matrix) in [("adj", &self.adj), ("graph_neigh", &self.graph_neigh)] {
            if matrix.dim() != (n, n) {
                return Err(SpamiError::shape(
                    format!("{} {}", name, label),
                    format!("{}x{}", n, n),
                    format!("{}x{}", matrix.nrows(), matrix.ncols()),
                ));
            }
            if !is_symmetric(matrix) {
                warn!("{} {} is not symmetric", name, label);
            }
        }

        if self.label_csl.dim() != (n, DISCRIMINATOR_OUTPUTS) {
            return Err(SpamiError::shape(
                format!("{} label_CSL", name),
                format!("{}x{}", n, DISCRIMINATOR_OUTPUTS),
                format!("{}x{}", self.label_csl.nrows(), self.label_csl.ncols()),
            ));
        }
        if let Some(bad) = self.label_csl.iter().find(|&&v| v != 0.0 && v != 1.0) {
            return Err(SpamiError::InvalidLabels {
                what: name.to_string(),
                message: format!("labels must be 0 or 1, found {}", bad),
            });
        }

        Ok(())
    }
}

/// Default contrastive labels: column 0 (real branch) is 1, column 1 (shuffled branch) is 0
pub fn contrastive_labels(n_locations: usize) -> Array2<f32> {
    let mut labels = Array2::zeros((n_locations, DISCRIMINATOR_OUTPUTS));
    labels.column_mut(0).fill(1.0);
    labels
}

fn is_symmetric(matrix: &Array2<f32>) -> bool {
    matrix
        .indexed_iter()
        .all(|((i, j), &v)| (v - matrix[[j, i]]).abs() <= 1e-6)
}

/// Two modalities measured over the same spatial locations
///
/// Only constructed through [`DualOmicsData::new`], so a value always holds a validated pair.
#[derive(Debug, Clone)]
pub struct DualOmicsData {
    omics1: OmicsDataset,
    omics2: OmicsDataset,
}

impl DualOmicsData {
    /// Pair two modalities, rejecting inconsistent shapes
    pub fn new(omics1: OmicsDataset, omics2: OmicsDataset) -> Result<Self> {
        omics1.validate("omics1")?;
        omics2.validate("omics2")?;

        if omics1.n_locations() != omics2.n_locations() {
            return Err(SpamiError::shape(
                "omics2 spatial locations",
                omics1.n_locations(),
                omics2.n_locations(),
            )
            .into());
        }

        debug!(
            "Paired modalities: {} locations, {} + {} features",
            omics1.n_locations(),
            omics1.n_features(),
            omics2.n_features()
        );

        Ok(Self { omics1, omics2 })
    }

    /// Number of spatial locations shared by both modalities
    pub fn n_locations(&self) -> usize {
        self.omics1.n_locations()
    }

    pub fn omics1(&self) -> &OmicsDataset {
        &self.omics1
    }

    pub fn omics2(&self) -> &OmicsDataset {
        &self.omics2
    }
}

/// Device-resident copy of one modality
#[derive(Debug, Clone)]
pub struct OmicsTensors<B: Backend> {
    /// Features [n_locations, n_features]
    pub feat: Tensor<B, 2>,
    /// Adjacency with self-loops
    pub adj: Tensor<B, 2>,
    /// Neighborhood indicator with self-loops
    pub graph_neigh: Tensor<B, 2>,
    /// Contrastive labels [n_locations, 2]
    pub labels: Tensor<B, 2, Int>,
}

impl<B: Backend> OmicsTensors<B> {
    /// Copy a dataset onto the device, adding self-loops to both graphs
    pub fn from_dataset(dataset: &OmicsDataset, device: &B::Device) -> Self {
        let n = dataset.n_locations();
        let eye = Array2::<f32>::eye(n);

        Self {
            feat: array_to_tensor(&dataset.feat, device),
            adj: array_to_tensor(&(&dataset.adj + &eye), device),
            graph_neigh: array_to_tensor(&(&dataset.graph_neigh + &eye), device),
            labels: array_to_tensor::<B>(&dataset.label_csl, device).int(),
        }
    }
}

/// Create a float tensor from a host matrix
pub fn array_to_tensor<B: Backend>(array: &Array2<f32>, device: &B::Device) -> Tensor<B, 2> {
    let shape = [array.nrows(), array.ncols()];
    let values: Vec<f32> = array.iter().copied().collect();
    Tensor::from_data(TensorData::new(values, shape), device)
}

/// Copy a float tensor back to a host matrix
pub fn tensor_to_array<B: Backend>(tensor: Tensor<B, 2>) -> Result<Array2<f32>> {
    let [rows, cols] = tensor.dims();
    let values: Vec<f32> = tensor.into_data().iter::<f32>().collect();
    Array2::from_shape_vec((rows, cols), values)
        .context("Tensor data does not match its shape")
}
