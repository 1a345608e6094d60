//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which lays out a temporary directory with a
//! config file, a setup data directory and room for both databases.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use persona::config::{self, Config};
use tempfile::TempDir;

/// A scratch installation rooted in a temporary directory.
pub struct TestHarness {
    pub dir: TempDir,
}

impl TestHarness {
    /// Create a harness with backups enabled and no fixtures.
    pub fn new() -> Self {
        Self::with_config_toml(
            r#"
[database]
path = "data/persona.sqlite"

[features]
registry_path = "data/features.sqlite"
setup_data_dir = "setup_data"

[backup]
dir = "backups"
keep = 3
"#,
        )
    }

    /// Create a harness whose `persona.toml` has the given contents.
    pub fn with_config_toml(contents: &str) -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        fs::create_dir_all(dir.path().join("setup_data")).expect("failed to create setup dir");
        fs::write(dir.path().join("persona.toml"), contents).expect("failed to write config");
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.root().join("persona.toml")
    }

    pub fn config(&self) -> Config {
        config::load_config(&self.config_path()).expect("failed to load test config")
    }

    /// Write `contents` as `<setup_data>/<feature>/<file_name>`.
    pub fn write_fixture(&self, feature: &str, file_name: &str, contents: &str) -> PathBuf {
        let feature_dir = self.root().join("setup_data").join(feature);
        fs::create_dir_all(&feature_dir).expect("failed to create fixture dir");
        let path = feature_dir.join(file_name);
        fs::write(&path, contents).expect("failed to write fixture");
        path
    }

    /// Write the fixtures for the whole startup sequence.
    pub fn write_startup_fixtures(&self) {
        self.write_fixture(
            persona::setup::AUTH_GROUPS,
            "auth_groups.json",
            r#"["admin", "member"]"#,
        );
        self.write_fixture(persona::setup::ROLES, "roles.json", r#"["Admin", "Member"]"#);
        self.write_fixture(
            persona::setup::DEMO_PEOPLE,
            "people.json",
            r#"[
                {"first_name": "Ada", "last_name": "Lovelace", "email": "ada@example.com"},
                {"first_name": "Alan", "last_name": "Turing"},
                {"first_name": "Grace", "last_name": "Hopper", "email": "grace@example.com"}
            ]"#,
        );
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.root().join("backups")
    }
}
