//! Feature registry queries.
//!
//! The `feature` table is the durable ledger behind the installer runner.
//! A row with `success = 1` is permanent; rows are never deleted here.

use chrono::{DateTime, Duration, Utc};
use persona_common::{Error, Result};
use rusqlite::{Connection, OptionalExtension, Transaction, TransactionBehavior};

use crate::models::{FeatureMetadata, FeatureRecord};

const COLS: &str = "name, success, installation_ts, who, contact, since, reference, \
    locked_by, locked_at";

/// Result of trying to take the install lease for a feature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Claim {
    /// The lease is ours; the installer may run.
    Acquired,
    /// The feature already succeeded; nothing to do.
    AlreadyInstalled,
    /// Another runner holds an unexpired lease.
    Held { owner: String, since: DateTime<Utc> },
}

/// Get a feature record by name.
///
/// # Returns
///
/// * `Ok(Some(FeatureRecord))` - The record if the feature was ever attempted
/// * `Ok(None)` - If the feature has no record
/// * `Err(Error)` - If a database error occurs
pub fn get_feature(conn: &Connection, name: &str) -> Result<Option<FeatureRecord>> {
    let q = format!("SELECT {COLS} FROM feature WHERE name = ?1");
    conn.query_row(&q, [name], FeatureRecord::from_row)
        .optional()
        .map_err(|e| Error::database(e.to_string()))
}

/// Record the outcome of an install attempt made by `owner`.
///
/// Inserts the row if absent, otherwise updates `success`, `installation_ts`
/// and the provenance in place and releases the install lease. The statement
/// is a single `INSERT .. ON CONFLICT(name) DO UPDATE`, so concurrent upserts
/// on the same name never produce two rows.
///
/// The update only applies while the row is still unsuccessful and its lease
/// is free or held by `owner`.
///
/// # Returns
///
/// * `Ok(Some(FeatureRecord))` - The record as written
/// * `Ok(None)` - If the row already succeeded or another owner holds its lease
/// * `Err(Error)` - If a database error occurs
pub fn upsert_feature(
    conn: &Connection,
    name: &str,
    success: bool,
    metadata: &FeatureMetadata,
    owner: &str,
) -> Result<Option<FeatureRecord>> {
    let q = format!(
        "INSERT INTO feature (name, success, installation_ts, who, contact, since, reference)
         VALUES (:name, :success, :ts, :who, :contact, :since, :reference)
         ON CONFLICT(name) DO UPDATE SET
             success = excluded.success,
             installation_ts = excluded.installation_ts,
             who = excluded.who,
             contact = excluded.contact,
             since = excluded.since,
             reference = excluded.reference,
             locked_by = NULL,
             locked_at = NULL
         WHERE feature.success = 0
           AND (feature.locked_by IS NULL OR feature.locked_by = :owner)
         RETURNING {COLS}"
    );

    conn.query_row(
        &q,
        rusqlite::named_params! {
            ":name": name,
            ":success": success,
            ":ts": Utc::now(),
            ":who": metadata.who,
            ":contact": metadata.contact,
            ":since": metadata.since,
            ":reference": metadata.reference,
            ":owner": owner,
        },
        FeatureRecord::from_row,
    )
    .optional()
    .map_err(|e| Error::database(e.to_string()))
}

/// List every feature record, ordered by name.
pub fn list_features(conn: &Connection) -> Result<Vec<FeatureRecord>> {
    let q = format!("SELECT {COLS} FROM feature ORDER BY name");
    let mut stmt = conn
        .prepare(&q)
        .map_err(|e| Error::database(e.to_string()))?;

    let rows = stmt
        .query_map([], FeatureRecord::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(rows)
}

/// Take the install lease for `name` on behalf of `owner`.
///
/// Runs inside an `IMMEDIATE` transaction so that two processes sharing the
/// registry cannot both acquire the lease. A lease older than `lease` is
/// treated as abandoned and taken over. When the feature has no record yet, a
/// `success = 0` placeholder row is created to carry the lease.
pub fn claim_feature(
    conn: &Connection,
    name: &str,
    owner: &str,
    lease: Duration,
) -> Result<Claim> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)
        .map_err(|e| Error::database(e.to_string()))?;

    let now = Utc::now();
    if let Some(record) = get_feature(&tx, name)? {
        if record.success {
            return Ok(Claim::AlreadyInstalled);
        }
        if let (Some(holder), Some(locked_at)) = (record.locked_by, record.locked_at) {
            if holder != owner && locked_at + lease > now {
                return Ok(Claim::Held {
                    owner: holder,
                    since: locked_at,
                });
            }
        }
    }

    tx.execute(
        "INSERT INTO feature (name, success, installation_ts, locked_by, locked_at)
         VALUES (?1, 0, ?2, ?3, ?2)
         ON CONFLICT(name) DO UPDATE SET
             locked_by = excluded.locked_by,
             locked_at = excluded.locked_at",
        rusqlite::params![name, now, owner],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    tx.commit().map_err(|e| Error::database(e.to_string()))?;

    Ok(Claim::Acquired)
}
