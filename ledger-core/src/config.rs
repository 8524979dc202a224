//! Configuration for the ledger

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Ledger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directory for RocksDB
    pub data_dir: PathBuf,

    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// Hard cap applied to `list_recent` limits
    pub recent_limit_max: usize,

    /// RocksDB configuration
    pub rocksdb: RocksDbConfig,

    /// Log-mirror configuration
    pub mirror: MirrorConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data/cashrail"),
            service_name: "cashrail-ledger".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            recent_limit_max: 500,
            rocksdb: RocksDbConfig::default(),
            mirror: MirrorConfig::default(),
        }
    }
}

/// RocksDB configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RocksDbConfig {
    /// Write buffer size (MB)
    pub write_buffer_size_mb: usize,

    /// Max write buffers
    pub max_write_buffer_number: i32,

    /// Target file size (MB)
    pub target_file_size_mb: u64,

    /// Max background jobs (compaction + flush)
    pub max_background_jobs: i32,

    /// Enable statistics
    pub enable_statistics: bool,
}

impl Default for RocksDbConfig {
    fn default() -> Self {
        Self {
            write_buffer_size_mb: 64,
            max_write_buffer_number: 4,
            target_file_size_mb: 64,
            max_background_jobs: 2,
            enable_statistics: false,
        }
    }
}

/// Log-mirror configuration.
///
/// The mirror receives a formatted copy of each committed transaction. It is
/// best-effort: a mirror failure never rolls back a ledger write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorConfig {
    /// Mirror committed entries at all
    pub enabled: bool,

    /// Append JSONL copies to this file; when unset, mirror via tracing
    pub path: Option<PathBuf>,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(data_dir) = std::env::var("CASHRAIL_DATA_DIR") {
            config.data_dir = PathBuf::from(data_dir);
        }

        if let Ok(path) = std::env::var("CASHRAIL_MIRROR_PATH") {
            config.mirror.path = Some(PathBuf::from(path));
        }

        if let Ok(limit) = std::env::var("CASHRAIL_RECENT_LIMIT") {
            config.recent_limit_max = limit
                .parse()
                .map_err(|e| crate::Error::Config(format!("CASHRAIL_RECENT_LIMIT: {}", e)))?;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.service_name, "cashrail-ledger");
        assert_eq!(config.recent_limit_max, 500);
        assert!(config.mirror.enabled);
        assert!(config.mirror.path.is_none());
    }

    #[test]
    fn test_config_toml_round_trip() {
        let mut config = Config::default();
        config.mirror.path = Some(PathBuf::from("./data/audit.log"));
        let text = toml::to_string(&config).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back.data_dir, config.data_dir);
        assert_eq!(back.recent_limit_max, config.recent_limit_max);
        assert_eq!(back.mirror.path, config.mirror.path);
    }
}
