//! One-time feature installers.
//!
//! A feature is a named, side-effecting setup routine (usually inserting seed
//! rows) that must run successfully exactly once over the life of a
//! deployment. [`FeatureInstaller`] consults the feature registry before each
//! run, snapshots the domain database, hands the installer its fixture file
//! and records the outcome, whether the installer returned, failed or
//! panicked.
//!
//! # Example
//!
//! ```
//! use persona::installer::{FeatureInstaller, InstallOutcome};
//! use persona_db::backup::NoBackup;
//! use persona_db::models::FeatureMetadata;
//! use persona_db::pool::init_memory_registry_pool;
//!
//! let registry = init_memory_registry_pool().unwrap();
//! let installer = FeatureInstaller::new(registry, Box::new(NoBackup), "setup_data");
//!
//! let meta = FeatureMetadata::new().who("ops");
//! let outcome = installer.run_once("hello", &meta, |_fixture| Ok(true)).unwrap();
//! assert_eq!(outcome, InstallOutcome::Installed);
//!
//! let outcome = installer.run_once("hello", &meta, |_fixture| Ok(true)).unwrap();
//! assert_eq!(outcome, InstallOutcome::AlreadyInstalled);
//! ```

mod fixture;

pub use fixture::{find_fixture, open_fixture, Fixture};

use std::collections::HashSet;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use chrono::Duration;
use parking_lot::Mutex;
use persona_common::{Error, InstallerId, Result};
use persona_db::backup::Backup;
use persona_db::models::{FeatureMetadata, FeatureRecord};
use persona_db::pool::{get_conn, DbPool};
use persona_db::queries::features::{self, Claim};

/// Default time after which an unreleased install lease is considered abandoned.
pub const DEFAULT_LEASE_SECS: i64 = 15 * 60;

/// What happened when a feature was run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    /// A previous run already succeeded; the installer was not invoked.
    AlreadyInstalled,
    /// The installer ran and reported success.
    Installed,
    /// The installer ran and returned `false`; it will be retried next time.
    Declined,
}

impl InstallOutcome {
    /// Whether the feature is present after this call.
    pub fn is_present(self) -> bool {
        matches!(self, Self::AlreadyInstalled | Self::Installed)
    }
}

impl fmt::Display for InstallOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyInstalled => write!(f, "already installed"),
            Self::Installed => write!(f, "installed"),
            Self::Declined => write!(f, "declined"),
        }
    }
}

/// Installer body: receives the feature's fixture, if any, and reports success.
pub type InstallFn = Box<dyn Fn(Option<Fixture>) -> Result<bool> + Send + Sync>;

/// A named installer together with its provenance.
pub struct Feature {
    name: String,
    metadata: FeatureMetadata,
    install: InstallFn,
}

impl Feature {
    pub fn new<F>(name: impl Into<String>, metadata: FeatureMetadata, install: F) -> Self
    where
        F: Fn(Option<Fixture>) -> Result<bool> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            metadata,
            install: Box::new(install),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metadata(&self) -> &FeatureMetadata {
        &self.metadata
    }
}

impl fmt::Debug for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Feature")
            .field("name", &self.name)
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

/// An ordered list of features, run in declaration order.
#[derive(Debug, Default)]
pub struct FeatureSet {
    features: Vec<Feature>,
}

impl FeatureSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a feature. Names must be unique within a set.
    pub fn push(&mut self, feature: Feature) -> Result<&mut Self> {
        if self.features.iter().any(|f| f.name == feature.name) {
            return Err(Error::validation(format!(
                "feature '{}' is declared twice",
                feature.name
            )));
        }
        self.features.push(feature);
        Ok(self)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.features.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Runs features against a registry, at most once per successful completion.
pub struct FeatureInstaller {
    registry: DbPool,
    backup: Box<dyn Backup>,
    setup_data_dir: PathBuf,
    lease: Duration,
    backup_required: bool,
    owner: InstallerId,
    installed: Mutex<HashSet<String>>,
}

impl FeatureInstaller {
    /// Create a runner.
    ///
    /// * `registry` - pool of the feature registry database
    /// * `backup` - invoked before every install attempt
    /// * `setup_data_dir` - root under which per-feature fixture directories live
    pub fn new(registry: DbPool, backup: Box<dyn Backup>, setup_data_dir: impl Into<PathBuf>) -> Self {
        Self {
            registry,
            backup,
            setup_data_dir: setup_data_dir.into(),
            lease: Duration::seconds(DEFAULT_LEASE_SECS),
            backup_required: false,
            owner: InstallerId::new(),
            installed: Mutex::new(HashSet::new()),
        }
    }

    /// Set how long an install lease stays valid without being released.
    pub fn with_lease(mut self, lease: Duration) -> Self {
        self.lease = lease;
        self
    }

    /// When set, a failed backup aborts the attempt instead of being logged.
    pub fn with_backup_required(mut self, required: bool) -> Self {
        self.backup_required = required;
        self
    }

    /// Token this runner writes into `locked_by` while it installs.
    pub fn owner(&self) -> InstallerId {
        self.owner
    }

    pub fn setup_data_dir(&self) -> &Path {
        &self.setup_data_dir
    }

    /// Current registry record for `name`.
    pub fn lookup(&self, name: &str) -> Result<Option<FeatureRecord>> {
        let conn = get_conn(&self.registry)?;
        features::get_feature(&conn, name)
    }

    /// Registry record for `name`, or [`Error::NotFound`] if it was never attempted.
    pub fn record(&self, name: &str) -> Result<FeatureRecord> {
        self.lookup(name)?
            .ok_or_else(|| Error::not_found("feature", name))
    }

    /// Every registry record, ordered by name.
    pub fn records(&self) -> Result<Vec<FeatureRecord>> {
        let conn = get_conn(&self.registry)?;
        features::list_features(&conn)
    }

    /// Run `install` for `name` unless a previous run already succeeded.
    ///
    /// Before the installer runs, the install lease is taken, the domain
    /// database is backed up and the fixture is resolved. The outcome is
    /// written to the registry on every path; an error returned by the
    /// installer is then propagated and a panic is resumed.
    ///
    /// Returns [`Error::Conflict`] if another runner holds a live lease, or
    /// if the lease expired and was taken over while the installer ran. A
    /// recorded success is never overwritten.
    pub fn run_once<F>(&self, name: &str, metadata: &FeatureMetadata, install: F) -> Result<InstallOutcome>
    where
        F: FnOnce(Option<Fixture>) -> Result<bool>,
    {
        if self.installed.lock().contains(name) {
            tracing::debug!("Feature '{}' already installed (cached)", name);
            return Ok(InstallOutcome::AlreadyInstalled);
        }

        let conn = get_conn(&self.registry)?;

        if features::get_feature(&conn, name)?.is_some_and(|record| record.success) {
            tracing::info!("Feature '{}' already installed", name);
            self.remember(name);
            return Ok(InstallOutcome::AlreadyInstalled);
        }

        let owner = self.owner.to_string();
        match features::claim_feature(&conn, name, &owner, self.lease)? {
            Claim::Acquired => {}
            Claim::AlreadyInstalled => {
                tracing::info!("Feature '{}' already installed", name);
                self.remember(name);
                return Ok(InstallOutcome::AlreadyInstalled);
            }
            Claim::Held { owner, since } => {
                return Err(Error::conflict(format!(
                    "feature '{name}' is being installed by {owner} (since {since}); \
                     an abandoned lease expires after {}s (features.lease_secs)",
                    self.lease.num_seconds()
                )));
            }
        }

        tracing::info!("Installing {}", name);
        let attempt = panic::catch_unwind(AssertUnwindSafe(|| self.attempt(name, install)));
        let success = matches!(attempt, Ok(Ok(true)));
        let recorded = features::upsert_feature(&conn, name, success, metadata, &owner);

        match attempt {
            Ok(Ok(ok)) => {
                if recorded?.is_none() {
                    tracing::warn!("Lost the install lease on '{}'; outcome not recorded", name);
                    return Err(Error::conflict(format!(
                        "install lease on feature '{name}' was taken over by another runner; \
                         outcome not recorded"
                    )));
                }
                if ok {
                    tracing::info!("Feature '{}' installed", name);
                    self.remember(name);
                    Ok(InstallOutcome::Installed)
                } else {
                    tracing::warn!("Installer for '{}' reported failure; will retry next run", name);
                    Ok(InstallOutcome::Declined)
                }
            }
            Ok(Err(e)) => {
                note_unrecorded(name, &recorded);
                tracing::error!("Installing '{}' failed: {}", name, e);
                Err(e)
            }
            Err(payload) => {
                note_unrecorded(name, &recorded);
                tracing::error!("Installer for '{}' panicked", name);
                panic::resume_unwind(payload)
            }
        }
    }

    /// Run one declared feature.
    pub fn run_feature(&self, feature: &Feature) -> Result<InstallOutcome> {
        self.run_once(&feature.name, &feature.metadata, |fixture| (feature.install)(fixture))
    }

    /// Run every feature of `set` in order, stopping at the first error.
    pub fn run_all(&self, set: &FeatureSet) -> Result<Vec<(String, InstallOutcome)>> {
        let mut report = Vec::with_capacity(set.len());
        for feature in set.iter() {
            let outcome = self.run_feature(feature)?;
            report.push((feature.name.clone(), outcome));
        }
        Ok(report)
    }

    fn attempt<F>(&self, name: &str, install: F) -> Result<bool>
    where
        F: FnOnce(Option<Fixture>) -> Result<bool>,
    {
        if let Err(e) = self.backup.backup() {
            if self.backup_required {
                return Err(e);
            }
            tracing::warn!("Backup before installing '{}' failed, continuing: {}", name, e);
        }

        let fixture = open_fixture(&self.setup_data_dir, name)?;
        if fixture.is_none() {
            tracing::debug!("No fixture for '{}'", name);
        }

        install(fixture)
    }

    fn remember(&self, name: &str) {
        self.installed.lock().insert(name.to_string());
    }
}

fn note_unrecorded(name: &str, recorded: &Result<Option<FeatureRecord>>) {
    match recorded {
        Ok(Some(_)) => {}
        Ok(None) => tracing::warn!(
            "Failure of '{}' not recorded; another runner owns the record",
            name
        ),
        Err(e) => tracing::error!("Failed to record failure of '{}': {}", name, e),
    }
}
