//! Database migrations module
//!
//! This module handles SQLite schema migrations for persona. Two schemas are
//! kept apart: the domain store and the feature registry, each with its own
//! ordered list of embedded migrations and its own `schema_migrations` table.

use rusqlite::{Connection, Result};
use thiserror::Error;

/// Migration error types
#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Migration {0} ({1}) failed: {2}")]
    Failed(usize, &'static str, String),
}

impl From<MigrationError> for persona_common::Error {
    fn from(err: MigrationError) -> Self {
        persona_common::Error::database(err.to_string())
    }
}

/// A single migration with its SQL content
struct Migration {
    version: usize,
    name: &'static str,
    sql: &'static str,
}

const DOMAIN_MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "people_and_roles",
        sql: include_str!("domain/001_people_and_roles.sql"),
    },
    Migration {
        version: 2,
        name: "auth_groups",
        sql: include_str!("domain/002_auth_groups.sql"),
    },
];

const REGISTRY_MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "feature_registry",
    sql: include_str!("registry/001_feature_registry.sql"),
}];

/// Which database a connection belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schema {
    /// People, roles, role memberships and auth groups.
    Domain,
    /// The feature installer ledger.
    Registry,
}

impl Schema {
    fn migrations(self) -> &'static [Migration] {
        match self {
            Schema::Domain => DOMAIN_MIGRATIONS,
            Schema::Registry => REGISTRY_MIGRATIONS,
        }
    }
}

/// Initialize the migrations table if it doesn't exist
fn init_migrations_table(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY NOT NULL,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;
    Ok(())
}

/// Get the current schema version
fn get_current_version(conn: &Connection) -> Result<usize> {
    conn.query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
        row.get::<_, Option<usize>>(0)
    })
    .map(|version| version.unwrap_or(0))
}

/// Apply a single migration
fn apply_migration(conn: &Connection, migration: &Migration) -> Result<(), MigrationError> {
    let failed = |e: rusqlite::Error| MigrationError::Failed(migration.version, migration.name, e.to_string());

    conn.execute_batch(migration.sql).map_err(failed)?;

    conn.execute(
        "INSERT INTO schema_migrations (version, name) VALUES (?, ?)",
        rusqlite::params![migration.version, migration.name],
    )
    .map_err(failed)?;

    Ok(())
}

/// Run all pending migrations for `schema`
///
/// Creates the migrations table if needed, then applies each pending
/// migration in order, one transaction per migration.
///
/// # Returns
///
/// * `Ok(usize)` - Number of migrations applied
/// * `Err(MigrationError)` - If any migration fails
pub fn run_migrations(conn: &Connection, schema: Schema) -> Result<usize, MigrationError> {
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    init_migrations_table(conn)?;

    let current_version = get_current_version(conn)?;

    let pending_migrations: Vec<_> = schema
        .migrations()
        .iter()
        .filter(|m| m.version > current_version)
        .collect();

    let mut applied_count = 0;
    for migration in pending_migrations {
        let tx = conn.unchecked_transaction()?;

        apply_migration(&tx, migration)?;

        tx.commit()
            .map_err(|e| MigrationError::Failed(migration.version, migration.name, e.to_string()))?;

        applied_count += 1;

        tracing::info!(
            "Applied {:?} migration {}: {}",
            schema,
            migration.version,
            migration.name
        );
    }

    Ok(applied_count)
}

/// Get the current schema version without applying migrations
pub fn current_version(conn: &Connection) -> Result<usize, MigrationError> {
    init_migrations_table(conn)?;

    Ok(get_current_version(conn)?)
}

/// Get the latest available migration version for `schema`
pub fn latest_version(schema: Schema) -> usize {
    schema.migrations().last().map(|m| m.version).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn table_exists(conn: &Connection, table: &str) -> bool {
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                [table],
                |row| row.get(0),
            )
            .unwrap();
        count == 1
    }

    #[test]
    fn test_run_domain_migrations() {
        let conn = Connection::open_in_memory().unwrap();

        let applied = run_migrations(&conn, Schema::Domain).unwrap();
        assert_eq!(applied, DOMAIN_MIGRATIONS.len());
        assert_eq!(current_version(&conn).unwrap(), latest_version(Schema::Domain));

        // Second run is a no-op
        let applied = run_migrations(&conn, Schema::Domain).unwrap();
        assert_eq!(applied, 0);
    }

    #[test]
    fn test_domain_schema_created() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn, Schema::Domain).unwrap();

        for table in ["person", "role", "role_membership", "auth_group", "schema_migrations"] {
            assert!(table_exists(&conn, table), "Table {} should exist", table);
        }
        assert!(!table_exists(&conn, "feature"));
    }

    #[test]
    fn test_registry_schema_created() {
        let conn = Connection::open_in_memory().unwrap();
        let applied = run_migrations(&conn, Schema::Registry).unwrap();
        assert_eq!(applied, REGISTRY_MIGRATIONS.len());

        assert!(table_exists(&conn, "feature"));
        assert!(!table_exists(&conn, "person"));
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn, Schema::Domain).unwrap();

        let enabled: i32 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(enabled, 1);
    }
}
