mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Load configuration from a TOML file.
///
/// Relative paths in the file are resolved against the file's directory.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    config.resolve_paths(base);

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./persona.toml",
        "./config.toml",
        "~/.config/persona/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    let mut config = Config::default();
    config.resolve_paths(Path::new("."));
    Ok(config)
}

impl Config {
    /// Expand `~` and anchor relative paths at `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            let expanded = PathBuf::from(shellexpand::tilde(&p.to_string_lossy()).as_ref());
            *p = if expanded.is_relative() {
                base.join(expanded)
            } else {
                expanded
            };
        };

        resolve(&mut self.database.path);
        resolve(&mut self.features.registry_path);
        resolve(&mut self.features.setup_data_dir);
        resolve(&mut self.backup.dir);
    }
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.features.lease_secs == 0 {
        anyhow::bail!("features.lease_secs cannot be 0");
    }

    let lease = i64::try_from(config.features.lease_secs)
        .ok()
        .and_then(chrono::Duration::try_seconds);
    if lease.is_none() {
        anyhow::bail!("features.lease_secs is too large");
    }

    if config.backup.enabled && config.backup.keep == 0 {
        anyhow::bail!("backup.keep cannot be 0 when backups are enabled");
    }

    if config.database.path == config.features.registry_path {
        anyhow::bail!("database.path and features.registry_path must be different files");
    }

    if !config.features.setup_data_dir.exists() {
        tracing::warn!(
            "Setup data directory does not exist: {:?}",
            config.features.setup_data_dir
        );
    }

    Ok(())
}
