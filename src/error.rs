use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the training core.
///
/// Library functions return `anyhow::Result`; these variants are the root causes
/// and can be recovered with `err.downcast_ref::<SpamiError>()`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpamiError {
    #[error("Shape mismatch in {what}: expected {expected}, got {actual}")]
    ShapeMismatch {
        what: String,
        expected: String,
        actual: String,
    },

    #[error("Invalid contrastive labels in {what}: {message}")]
    InvalidLabels { what: String, message: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Loss diverged at epoch {epoch}: {value}")]
    NumericDivergence { epoch: usize, value: f64 },

    #[error("Failed to persist {path:?}: {message}")]
    PersistenceFailure { path: PathBuf, message: String },
}

impl SpamiError {
    pub(crate) fn shape(what: impl Into<String>, expected: impl ToString, actual: impl ToString) -> Self {
        Self::ShapeMismatch {
            what: what.into(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    pub(crate) fn persistence(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::PersistenceFailure {
            path: path.into(),
            message: message.to_string(),
        }
    }
}
