use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub features: FeaturesConfig,

    #[serde(default)]
    pub backup: BackupConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// SQLite file holding people, roles and memberships
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("persona.sqlite")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeaturesConfig {
    /// SQLite file holding the feature registry
    #[serde(default = "default_registry_path")]
    pub registry_path: PathBuf,

    /// Root of the per-feature fixture directories
    #[serde(default = "default_setup_data_dir")]
    pub setup_data_dir: PathBuf,

    /// Seconds before an unreleased install lease may be taken over (default: 900)
    #[serde(default = "default_lease_secs")]
    pub lease_secs: u64,
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            registry_path: default_registry_path(),
            setup_data_dir: default_setup_data_dir(),
            lease_secs: default_lease_secs(),
        }
    }
}

fn default_registry_path() -> PathBuf {
    PathBuf::from("features.sqlite")
}

fn default_setup_data_dir() -> PathBuf {
    PathBuf::from("private/setup_data")
}

fn default_lease_secs() -> u64 {
    900
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackupConfig {
    /// Snapshot the database before every install attempt
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Directory receiving the snapshots
    #[serde(default = "default_backup_dir")]
    pub dir: PathBuf,

    /// Number of snapshots to retain (default: 10)
    #[serde(default = "default_keep")]
    pub keep: usize,

    /// Abort the install attempt if the snapshot fails
    #[serde(default)]
    pub required: bool,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: default_backup_dir(),
            keep: default_keep(),
            required: false,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_backup_dir() -> PathBuf {
    PathBuf::from("backups")
}

fn default_keep() -> usize {
    10
}
