//! Role database queries.

use persona_common::{Error, Result, RoleId};
use rusqlite::{Connection, OptionalExtension};

use crate::models::Role;

/// Insert a role. Role names are unique.
pub fn insert_role(conn: &Connection, name: &str) -> Result<Role> {
    conn.execute("INSERT INTO role (name) VALUES (?1)", [name])
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(Role {
        id: RoleId::from(conn.last_insert_rowid()),
        name: name.to_string(),
    })
}

/// Get a role by name.
pub fn get_role_by_name(conn: &Connection, name: &str) -> Result<Option<Role>> {
    conn.query_row(
        "SELECT id, name FROM role WHERE name = ?1",
        [name],
        Role::from_row,
    )
    .optional()
    .map_err(|e| Error::database(e.to_string()))
}

/// List all roles ordered by id.
pub fn list_roles(conn: &Connection) -> Result<Vec<Role>> {
    let mut stmt = conn
        .prepare("SELECT id, name FROM role ORDER BY id")
        .map_err(|e| Error::database(e.to_string()))?;

    let roles = stmt
        .query_map([], Role::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(roles)
}

/// Count all roles.
pub fn count_roles(conn: &Connection) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM role", [], |row| row.get(0))
        .map_err(|e| Error::database(e.to_string()))
}
