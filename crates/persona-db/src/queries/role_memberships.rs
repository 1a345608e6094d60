//! Role membership database queries.
//!
//! A membership links one person to a list of roles, stored as a JSON array
//! in `role_ids`, for an optional begin/end date range.

use chrono::NaiveDate;
use persona_common::{Error, MembershipId, PersonId, Result, RoleId};
use rusqlite::Connection;

use crate::models::RoleMembership;

const COLS: &str = "id, role_ids, begin_date, end_date, person_id";

/// Insert a role membership for `person_id`.
pub fn insert_membership(
    conn: &Connection,
    person_id: PersonId,
    role_ids: &[RoleId],
    begin_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> Result<RoleMembership> {
    let role_ids_json =
        serde_json::to_string(role_ids).map_err(|e| Error::internal(e.to_string()))?;

    conn.execute(
        "INSERT INTO role_membership (role_ids, begin_date, end_date, person_id)
         VALUES (:role_ids, :begin_date, :end_date, :person_id)",
        rusqlite::named_params! {
            ":role_ids": role_ids_json,
            ":begin_date": begin_date,
            ":end_date": end_date,
            ":person_id": person_id.get(),
        },
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(RoleMembership {
        id: MembershipId::from(conn.last_insert_rowid()),
        role_ids: role_ids.to_vec(),
        begin_date,
        end_date,
        person_id,
    })
}

/// List the memberships of one person.
pub fn list_memberships_for_person(
    conn: &Connection,
    person_id: PersonId,
) -> Result<Vec<RoleMembership>> {
    let q = format!("SELECT {COLS} FROM role_membership WHERE person_id = ?1 ORDER BY id");
    collect(conn, &q, [person_id.get()])
}

/// List all memberships.
pub fn list_memberships(conn: &Connection) -> Result<Vec<RoleMembership>> {
    let q = format!("SELECT {COLS} FROM role_membership ORDER BY id");
    collect(conn, &q, [])
}

/// Count all memberships.
pub fn count_memberships(conn: &Connection) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM role_membership", [], |row| row.get(0))
        .map_err(|e| Error::database(e.to_string()))
}

fn collect<P: rusqlite::Params>(conn: &Connection, q: &str, params: P) -> Result<Vec<RoleMembership>> {
    let mut stmt = conn
        .prepare(q)
        .map_err(|e| Error::database(e.to_string()))?;

    let rows = stmt
        .query_map(params, RoleMembership::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(rows)
}
