use crate::data::{contrastive_labels, OmicsDataset};
use anyhow::{Context, Result};
use ndarray::Array2;
use ndarray_npy::read_npy;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File names expected inside a modality directory
pub const FEAT_FILE: &str = "feat.npy";
pub const ADJ_FILE: &str = "adj.npy";
pub const GRAPH_NEIGH_FILE: &str = "graph_neigh.npy";
pub const LABEL_FILE: &str = "label_CSL.npy";

/// Loader for preprocessed modality matrices stored as `.npy` files
#[derive(Debug, Clone)]
pub struct DataLoader {
    dir: PathBuf,
}

impl DataLoader {
    /// Create loader for one modality directory
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Load the modality
    ///
    /// `label_CSL.npy` is optional; without it the default contrastive labels are used.
    pub fn load(&self) -> Result<OmicsDataset> {
        info!("Loading modality from {:?}", self.dir);

        let feat = self.load_matrix(FEAT_FILE)?;
        let adj = self.load_matrix(ADJ_FILE)?;
        let graph_neigh = self.load_matrix(GRAPH_NEIGH_FILE)?;

        let label_path = self.dir.join(LABEL_FILE);
        let label_csl = if label_path.is_file() {
            self.load_matrix(LABEL_FILE)?
        } else {
            debug!("No {} in {:?}, using default labels", LABEL_FILE, self.dir);
            contrastive_labels(feat.nrows())
        };

        info!(
            "Loaded {} locations x {} features",
            feat.nrows(),
            feat.ncols()
        );

        Ok(OmicsDataset {
            feat,
            adj,
            graph_neigh,
            label_csl,
        })
    }

    /// Read a 2-D array stored as f32 or f64
    fn load_matrix(&self, name: &str) -> Result<Array2<f32>> {
        let path = self.dir.join(name);

        if let Ok(array) = read_npy::<_, Array2<f32>>(&path) {
            return Ok(array);
        }

        let array: Array2<f64> = read_npy(&path)
            .with_context(|| format!("Failed to read {:?} as a 2-D f32/f64 array", path))?;
        debug!("Narrowing {:?} from f64 to f32", path);
        Ok(array.mapv(|v| v as f32))
    }
}

/// Load one modality directory
pub fn load_dataset<P: AsRef<Path>>(dir: P) -> Result<OmicsDataset> {
    DataLoader::new(dir).load()
}
