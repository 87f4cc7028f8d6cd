pub mod plot;

use std::path::Path;
use anyhow::{Context, Result};

/// Ensure directory exists
pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    if !path.exists() {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {:?}", path))?;
    }
    Ok(())
}

/// Format duration as human-readable string
pub fn format_duration(secs: f64) -> String {
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else if secs < 3600.0 {
        format!("{:.1}m", secs / 60.0)
    } else {
        format!("{:.1}h", secs / 3600.0)
    }
}

/// Seconds since the unix epoch, used to stamp run metadata
pub fn unix_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Random number utilities
///
/// A run has one seed. Each consumer of randomness gets its own ChaCha stream
/// derived from that seed, so changing how often one consumer draws never shifts
/// the numbers another consumer sees.
pub mod random {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    /// Independent random streams of a training run
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum RngStream {
        /// Parameter initialization
        Init = 0,
        /// Row permutations for negative samples
        Permutation = 1,
        /// Dropout masks
        Dropout = 2,
    }

    /// Create RNG with fixed seed
    pub fn seeded_rng(seed: u64) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(seed)
    }

    /// Create the RNG for one stream of a seeded run
    pub fn stream_rng(seed: u64, stream: RngStream) -> ChaCha8Rng {
        let mut rng = seeded_rng(seed);
        rng.set_stream(stream as u64);
        rng
    }
}

/// Validation utilities
pub mod validation {
    use crate::error::SpamiError;

    /// Validate that value is in range
    pub fn in_range<T: PartialOrd + std::fmt::Display>(
        value: T,
        min: T,
        max: T,
        name: &str,
    ) -> Result<(), SpamiError> {
        if !(value >= min && value <= max) {
            return Err(SpamiError::InvalidConfig {
                message: format!("{} must be between {} and {}, got {}", name, min, max, value),
            });
        }
        Ok(())
    }

    /// Validate that value is positive
    pub fn positive<T: PartialOrd + Default + std::fmt::Display>(
        value: T,
        name: &str,
    ) -> Result<(), SpamiError> {
        if !(value > T::default()) {
            return Err(SpamiError::InvalidConfig {
                message: format!("{} must be positive, got {}", name, value),
            });
        }
        Ok(())
    }
}
