//! Auth group database queries.
//!
//! Auth groups back role based access control; `role` is unique.

use persona_common::{AuthGroupId, Error, Result};
use rusqlite::Connection;

use crate::models::AuthGroup;

/// Insert an auth group.
pub fn insert_auth_group(
    conn: &Connection,
    role: &str,
    description: Option<&str>,
) -> Result<AuthGroup> {
    conn.execute(
        "INSERT INTO auth_group (role, description) VALUES (?1, ?2)",
        rusqlite::params![role, description],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(AuthGroup {
        id: AuthGroupId::from(conn.last_insert_rowid()),
        role: role.to_string(),
        description: description.map(str::to_string),
    })
}

/// List all auth groups ordered by role.
pub fn list_auth_groups(conn: &Connection) -> Result<Vec<AuthGroup>> {
    let mut stmt = conn
        .prepare("SELECT id, role, description FROM auth_group ORDER BY role")
        .map_err(|e| Error::database(e.to_string()))?;

    let groups = stmt
        .query_map([], AuthGroup::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(groups)
}

/// Count all auth groups.
pub fn count_auth_groups(conn: &Connection) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM auth_group", [], |row| row.get(0))
        .map_err(|e| Error::database(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::init_memory_pool;

    #[test]
    fn test_insert_auth_group() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        let group = insert_auth_group(&conn, "admin", Some("admin")).unwrap();
        assert_eq!(group.role, "admin");

        let groups = list_auth_groups(&conn).unwrap();
        assert_eq!(groups, vec![group]);
    }

    #[test]
    fn test_duplicate_auth_group_rejected() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        insert_auth_group(&conn, "admin", None).unwrap();
        assert!(insert_auth_group(&conn, "admin", None).is_err());
        assert_eq!(count_auth_groups(&conn).unwrap(), 1);
    }
}
