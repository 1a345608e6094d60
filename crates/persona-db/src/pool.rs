//! Database connection pool management.
//!
//! This module provides connection pooling for SQLite using r2d2. It handles
//! pool initialization, per-connection pragmas, and running migrations for
//! either the domain store or the feature registry.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use persona_common::{Error, Result};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::migrations::{self, Schema};

/// Type alias for the database connection pool.
pub type DbPool = Pool<SqliteConnectionManager>;

/// Type alias for a pooled database connection.
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// How long a connection waits on a locked database before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const POOL_SIZE: u32 = 4;

/// Initialize the domain database pool with the given file path.
///
/// This function will:
/// - Create the SQLite database file if it doesn't exist
/// - Enable foreign keys, WAL journaling and a busy timeout on every connection
/// - Run pending domain migrations
///
/// # Example
///
/// ```no_run
/// use persona_db::pool::init_pool;
///
/// let pool = init_pool("/var/lib/persona/persona.sqlite").unwrap();
/// let conn = pool.get().unwrap();
/// ```
pub fn init_pool(db_path: &str) -> Result<DbPool> {
    build_file_pool(db_path, Schema::Domain)
}

/// Initialize the feature registry pool with the given file path.
pub fn init_registry_pool(db_path: &str) -> Result<DbPool> {
    build_file_pool(db_path, Schema::Registry)
}

/// Initialize an in-memory domain database pool for testing.
///
/// Each call creates a uniquely-named shared-cache in-memory database so
/// parallel tests do not interfere with each other, while all connections
/// within one pool still share state.
///
/// # Example
///
/// ```
/// use persona_db::pool::init_memory_pool;
///
/// let pool = init_memory_pool().unwrap();
/// let conn = pool.get().unwrap();
/// ```
pub fn init_memory_pool() -> Result<DbPool> {
    build_memory_pool(Schema::Domain)
}

/// Initialize an in-memory feature registry pool for testing.
pub fn init_memory_registry_pool() -> Result<DbPool> {
    build_memory_pool(Schema::Registry)
}

fn build_file_pool(db_path: &str, schema: Schema) -> Result<DbPool> {
    let manager = SqliteConnectionManager::file(db_path).with_init(|conn| {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA journal_mode = WAL;",
        )
    });

    let pool = Pool::builder()
        .max_size(POOL_SIZE)
        .build(manager)
        .map_err(|e| Error::database(format!("Failed to create connection pool: {e}")))?;

    migrate(&pool, schema)?;

    Ok(pool)
}

fn build_memory_pool(schema: Schema) -> Result<DbPool> {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    let uri = format!("file:persona_memdb_{n}?mode=memory&cache=shared");

    let manager = SqliteConnectionManager::file(uri).with_init(|conn| {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")
    });

    let pool = Pool::builder()
        .max_size(POOL_SIZE)
        .build(manager)
        .map_err(|e| Error::database(format!("Failed to create in-memory pool: {e}")))?;

    migrate(&pool, schema)?;

    Ok(pool)
}

fn migrate(pool: &DbPool, schema: Schema) -> Result<()> {
    let conn = pool
        .get()
        .map_err(|e| Error::database(format!("Failed to get connection for migrations: {e}")))?;

    migrations::run_migrations(&conn, schema)?;
    Ok(())
}

/// Get a connection from the pool.
///
/// Convenience wrapper around `pool.get()` that converts the r2d2 error into
/// the common Error type.
pub fn get_conn(pool: &DbPool) -> Result<PooledConnection> {
    pool.get()
        .map_err(|e| Error::database(format!("Failed to get connection from pool: {e}")))
}
