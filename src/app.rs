//! Wiring of the stores, backup and installer runner from a [`Config`].

use anyhow::{Context, Result};
use chrono::Duration;
use persona_db::backup::{Backup, NoBackup, SqliteBackup};
use persona_db::pool::{init_pool, init_registry_pool, DbPool};

use crate::config::Config;
use crate::installer::{FeatureInstaller, InstallOutcome};
use crate::setup;

/// The opened domain database and an installer bound to its registry.
pub struct App {
    pub db: DbPool,
    pub installer: FeatureInstaller,
    backup: Option<SqliteBackup>,
}

impl App {
    /// Open (and migrate) both databases described by `config`.
    pub fn open(config: &Config) -> Result<Self> {
        for path in [&config.database.path, &config.features.registry_path] {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory {:?}", parent))?;
            }
        }

        tracing::info!("Opening database at {}", config.database.path.display());
        let db = init_pool(&config.database.path.to_string_lossy())?;

        tracing::info!(
            "Opening feature registry at {}",
            config.features.registry_path.display()
        );
        let registry = init_registry_pool(&config.features.registry_path.to_string_lossy())?;

        let backup = config.backup.enabled.then(|| {
            SqliteBackup::new(
                db.clone(),
                &config.backup.dir,
                backup_prefix(config),
                config.backup.keep,
            )
        });
        let runner_backup: Box<dyn Backup> = match backup.clone() {
            Some(b) => Box::new(b),
            None => Box::new(NoBackup),
        };

        let lease = i64::try_from(config.features.lease_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .context("features.lease_secs is out of range")?;
        let installer = FeatureInstaller::new(registry, runner_backup, &config.features.setup_data_dir)
            .with_lease(lease)
            .with_backup_required(config.backup.required);

        Ok(Self {
            db,
            installer,
            backup,
        })
    }

    /// Run the startup sequence of seed installers.
    pub fn install(&self) -> persona_common::Result<Vec<(String, InstallOutcome)>> {
        let features = setup::startup_features(&self.db)?;
        self.installer.run_all(&features)
    }

    /// Take a snapshot outside of an install. `None` when backups are disabled.
    pub fn backup_now(&self) -> persona_common::Result<Option<std::path::PathBuf>> {
        self.backup.as_ref().map(SqliteBackup::snapshot).transpose()
    }
}

fn backup_prefix(config: &Config) -> String {
    config
        .database
        .path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "persona".to_string())
}
