//! Runtime configuration, read from TOML.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{Result, RuntimeError};

/// Where sessions live and how they are persisted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Base directory; each session gets `<data_dir>/<session_id>/`.
    pub data_dir: PathBuf,
    pub session_id: String,
    /// Snapshot every N applied commands. 0 disables snapshots.
    pub snapshot_interval: u64,
    /// Default log directive when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("ballot_data"),
            session_id: "default".to_string(),
            snapshot_interval: 100,
            log_level: "info".to_string(),
        }
    }
}

impl RuntimeConfig {
    pub fn session_dir(&self) -> PathBuf {
        self.data_dir.join(&self.session_id)
    }
}

/// Read and deserialize a TOML file.
pub fn from_toml_path<P: AsRef<Path>, R: DeserializeOwned>(path: P) -> Result<R> {
    let contents = fs::read_to_string(path)?;
    toml::from_str(&contents).map_err(|e| RuntimeError::Config(e.to_string()))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn create_config_from(content: &str) -> NamedTempFile {
        let mut config_file = NamedTempFile::new().unwrap();
        config_file.write_all(content.as_bytes()).unwrap();
        config_file
    }

    #[test]
    fn test_correct_config() {
        let config = r#"
            data_dir = "/var/lib/ballot"
            session_id = "city-council"
            snapshot_interval = 10
            log_level = "debug"
        "#;
        let config_file = create_config_from(config);

        let config: RuntimeConfig = from_toml_path(config_file.path()).unwrap();
        assert_eq!(
            config,
            RuntimeConfig {
                data_dir: PathBuf::from("/var/lib/ballot"),
                session_id: "city-council".to_string(),
                snapshot_interval: 10,
                log_level: "debug".to_string(),
            }
        );
        assert_eq!(config.session_dir(), PathBuf::from("/var/lib/ballot/city-council"));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config_file = create_config_from("snapshot_interval = 0\n");
        let config: RuntimeConfig = from_toml_path(config_file.path()).unwrap();
        assert_eq!(config.snapshot_interval, 0);
        assert_eq!(config.session_id, "default");
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let config_file = create_config_from("snapshot_intervall = 5\n");
        let err = from_toml_path::<_, RuntimeConfig>(config_file.path()).unwrap_err();
        assert!(matches!(err, RuntimeError::Config(_)));
    }
}
