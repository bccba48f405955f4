//! JSON loaders for compensation and projection settings

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use log::{debug, warn};

use super::CompensationConfig;
use crate::error::ConfigError;
use crate::projection::ProjectionConfig;

pub(crate) fn open(path: &Path) -> Result<File, ConfigError> {
    File::open(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Load a compensation config from a JSON file
pub fn load_compensation<P: AsRef<Path>>(path: P) -> Result<CompensationConfig, ConfigError> {
    let path = path.as_ref();
    let config = load_compensation_from_reader(BufReader::new(open(path)?))?;
    debug!(
        "Loaded compensation config from {}: {} salary configs, {} bonus configs, {} grants",
        path.display(),
        config.salary_configs.len(),
        config.bonus_configs.len(),
        config.rsu_grants.len()
    );
    Ok(config)
}

/// Load a compensation config from any reader
pub fn load_compensation_from_reader<R: Read>(reader: R) -> Result<CompensationConfig, ConfigError> {
    let config: CompensationConfig = serde_json::from_reader(reader)?;

    // Malformed numbers are computed as-is; only flag them
    for grant in &config.rsu_grants {
        let total: f64 = grant.effective_schedule().iter().sum();
        if (total - 100.0).abs() > 1e-6 {
            warn!("Grant {} vesting schedule sums to {:.2}%, not 100%", grant.id, total);
        }
        if grant.total_shares <= 0.0 {
            warn!("Grant {} has non-positive share count {}", grant.id, grant.total_shares);
        }
    }

    Ok(config)
}

/// Load projection settings from a JSON file; missing fields take defaults
pub fn load_projection_config<P: AsRef<Path>>(path: P) -> Result<ProjectionConfig, ConfigError> {
    let path = path.as_ref();
    let config: ProjectionConfig = serde_json::from_reader(BufReader::new(open(path)?))?;
    Ok(config)
}
