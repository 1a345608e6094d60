//! Online snapshots of the domain database.
//!
//! The installer runner takes a snapshot before every install attempt. The
//! snapshot is a plain SQLite file produced with the online backup API, so it
//! is consistent even while other connections hold the database open.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use persona_common::{Error, Result};
use rusqlite::Connection;

use crate::pool::{get_conn, DbPool};

/// Something that can protect the domain store before it is mutated.
pub trait Backup: Send + Sync {
    /// Take a full backup now.
    fn backup(&self) -> Result<()>;
}

/// A backup that does nothing, for in-memory databases and dry runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBackup;

impl Backup for NoBackup {
    fn backup(&self) -> Result<()> {
        tracing::debug!("Backups disabled; skipping snapshot");
        Ok(())
    }
}

/// Copies the domain database into timestamped files under a directory.
#[derive(Clone)]
pub struct SqliteBackup {
    pool: DbPool,
    dir: PathBuf,
    prefix: String,
    keep: usize,
}

impl SqliteBackup {
    /// Create a backup target.
    ///
    /// * `pool` - pool of the database to copy
    /// * `dir` - directory that receives the snapshots (created on demand)
    /// * `prefix` - file name prefix, usually the database file stem
    /// * `keep` - number of snapshots with this prefix to retain
    pub fn new(pool: DbPool, dir: impl Into<PathBuf>, prefix: impl Into<String>, keep: usize) -> Self {
        Self {
            pool,
            dir: dir.into(),
            prefix: prefix.into(),
            keep: keep.max(1),
        }
    }

    /// Directory the snapshots are written to.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write one snapshot and prune old ones. Returns the snapshot path.
    pub fn snapshot(&self) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let target = self.next_target();

        let src = get_conn(&self.pool)?;
        let mut dst = Connection::open(&target)
            .map_err(|e| Error::backup(format!("failed to create {}: {e}", target.display())))?;

        {
            let backup = rusqlite::backup::Backup::new(&src, &mut dst)
                .map_err(|e| Error::backup(format!("failed to start backup: {e}")))?;
            backup
                .run_to_completion(64, Duration::from_millis(20), None)
                .map_err(|e| Error::backup(format!("backup did not complete: {e}")))?;
        }

        let integrity: String = dst
            .query_row("PRAGMA quick_check", [], |row| row.get(0))
            .map_err(|e| Error::backup(format!("quick_check on {} failed: {e}", target.display())))?;
        if integrity != "ok" {
            return Err(Error::backup(format!(
                "snapshot {} failed quick_check: {integrity}",
                target.display()
            )));
        }

        self.prune();

        Ok(target)
    }

    /// List existing snapshots with this prefix, oldest first.
    pub fn snapshots(&self) -> Result<Vec<PathBuf>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let head = format!("{}-", self.prefix);
        let mut files: Vec<PathBuf> = std::fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| n.starts_with(&head) && n.ends_with(".sqlite"))
            })
            .collect();

        // Names embed a fixed-width timestamp and sequence, so lexical order
        // is chronological.
        files.sort();
        Ok(files)
    }

    fn next_target(&self) -> PathBuf {
        let stamp = Utc::now().format("%Y%m%dT%H%M%S%.3fZ");
        let mut seq = 0u32;
        loop {
            let candidate = self
                .dir
                .join(format!("{}-{}-{:03}.sqlite", self.prefix, stamp, seq));
            if !candidate.exists() {
                return candidate;
            }
            seq += 1;
        }
    }

    fn prune(&self) {
        let snapshots = match self.snapshots() {
            Ok(snapshots) => snapshots,
            Err(e) => {
                tracing::warn!("Failed to list snapshots in {}: {}", self.dir.display(), e);
                return;
            }
        };

        if snapshots.len() <= self.keep {
            return;
        }

        let remove_count = snapshots.len() - self.keep;
        for old in snapshots.into_iter().take(remove_count) {
            match std::fs::remove_file(&old) {
                Ok(()) => tracing::debug!("Pruned old snapshot {}", old.display()),
                Err(e) => tracing::warn!("Failed to prune snapshot {}: {}", old.display(), e),
            }
        }
    }
}

impl Backup for SqliteBackup {
    fn backup(&self) -> Result<()> {
        let path = self.snapshot()?;
        tracing::info!("Database backed up to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::init_memory_pool;
    use crate::queries::roles;

    #[test]
    fn test_snapshot_copies_data() {
        let dir = tempfile::tempdir().unwrap();
        let pool = init_memory_pool().unwrap();
        roles::insert_role(&pool.get().unwrap(), "Admin").unwrap();

        let backup = SqliteBackup::new(pool, dir.path(), "persona", 5);
        let path = backup.snapshot().unwrap();
        assert!(path.starts_with(dir.path()));

        let copy = Connection::open(&path).unwrap();
        let name: String = copy
            .query_row("SELECT name FROM role", [], |row| row.get(0))
            .unwrap();
        assert_eq!(name, "Admin");
    }

    #[test]
    fn test_snapshots_are_pruned() {
        let dir = tempfile::tempdir().unwrap();
        let pool = init_memory_pool().unwrap();
        let backup = SqliteBackup::new(pool, dir.path(), "persona", 2);

        let first = backup.snapshot().unwrap();
        backup.snapshot().unwrap();
        let last = backup.snapshot().unwrap();

        let remaining = backup.snapshots().unwrap();
        assert_eq!(remaining.len(), 2);
        assert!(!remaining.contains(&first));
        assert_eq!(remaining.last(), Some(&last));
    }

    #[test]
    fn test_prune_ignores_other_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "keep me").unwrap();
        let pool = init_memory_pool().unwrap();
        let backup = SqliteBackup::new(pool, dir.path(), "persona", 1);

        backup.snapshot().unwrap();
        backup.snapshot().unwrap();

        assert_eq!(backup.snapshots().unwrap().len(), 1);
        assert!(dir.path().join("notes.txt").exists());
    }

    #[test]
    fn test_no_backup_is_ok() {
        assert!(NoBackup.backup().is_ok());
    }
}
