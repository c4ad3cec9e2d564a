//! Configuration types for VFS Core

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FsError, FsResult};
use crate::names::{ItemNameComparer, NameComparer};
use crate::path;

/// Main file system configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FsConfig {
    /// Volumes provisioned under the root at startup
    pub volumes: Vec<String>,
    /// Buffered command notifications per subscriber
    pub notification_capacity: usize,
}

impl Default for FsConfig {
    fn default() -> Self {
        Self {
            volumes: vec!["C:".to_string(), "D:".to_string()],
            notification_capacity: 64,
        }
    }
}

impl FsConfig {
    /// Reads a JSON configuration file.
    pub fn from_json_file(path: &Path) -> FsResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            FsError::invalid_argument(format!("cannot read config {}: {}", path.display(), e))
        })?;
        let config: FsConfig = serde_json::from_str(&content).map_err(|e| {
            FsError::invalid_argument(format!("cannot parse config {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> FsResult<()> {
        if self.volumes.is_empty() {
            return Err(FsError::invalid_argument("at least one volume is required"));
        }
        for (i, volume) in self.volumes.iter().enumerate() {
            if !path::is_valid_volume_name(volume) {
                return Err(FsError::invalid_argument(format!(
                    "'{volume}' is not a valid volume name"
                )));
            }
            if self.volumes[..i]
                .iter()
                .any(|other| ItemNameComparer.equals(other, volume))
            {
                return Err(FsError::invalid_argument(format!("volume '{volume}' is listed twice")));
            }
        }
        let default_volume = path::default_volume();
        if !self
            .volumes
            .iter()
            .any(|volume| ItemNameComparer.equals(volume, default_volume))
        {
            return Err(FsError::invalid_argument(format!(
                "volume '{default_volume}' is required as the default current directory"
            )));
        }
        if self.notification_capacity == 0 {
            return Err(FsError::invalid_argument("notification_capacity must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        FsConfig::default().validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_bad_volumes() {
        let mut config = FsConfig::default();
        config.volumes = vec!["C:".into(), "c:".into()];
        assert!(config.validate().is_err());

        config.volumes = vec!["X:".into()];
        assert!(config.validate().is_err());

        config.volumes.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "volumes": ["E:", "c:"] }}"#).unwrap();

        let config = FsConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.volumes, vec!["E:", "c:"]);
        assert_eq!(config.notification_capacity, 64);
    }

    #[test]
    fn test_validate_requires_default_volume() {
        let mut config = FsConfig::default();
        config.volumes = vec!["D:".into()];
        assert!(matches!(
            config.validate(),
            Err(FsError::InvalidArgument { message }) if message.contains("'C:'")
        ));

        config.volumes = vec!["D:".into(), "c:".into()];
        config.validate().unwrap();
    }

    #[test]
    fn test_load_rejects_garbage() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            FsConfig::from_json_file(file.path()),
            Err(FsError::InvalidArgument { .. })
        ));
    }
}
