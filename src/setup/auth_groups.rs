//! Auth groups used for role based access control.

use persona_common::{Error, Result};
use persona_db::pool::{get_conn, DbPool};
use persona_db::queries::auth_groups;

use super::{require, AUTH_GROUPS};
use crate::installer::Fixture;

/// Insert one auth group per name in the fixture (`["admin", ...]`).
///
/// The group name doubles as its description. All rows are written in one
/// transaction.
pub fn install_auth_groups(db: &DbPool, fixture: Option<Fixture>) -> Result<bool> {
    let groups: Vec<String> = require(fixture, AUTH_GROUPS)?.json()?;

    let mut conn = get_conn(db)?;
    let tx = conn
        .transaction()
        .map_err(|e| Error::database(e.to_string()))?;

    for group in &groups {
        auth_groups::insert_auth_group(&tx, group, Some(group))?;
    }

    tx.commit().map_err(|e| Error::database(e.to_string()))?;
    tracing::info!("Inserted {} auth groups", groups.len());

    Ok(true)
}
