//! Application roles that people are assigned to.

use persona_common::{Error, Result};
use persona_db::pool::{get_conn, DbPool};
use persona_db::queries::roles;

use super::{require, ROLES};
use crate::installer::Fixture;

/// Insert one role per name in the fixture (`["Admin", "Member", ...]`).
pub fn install_roles(db: &DbPool, fixture: Option<Fixture>) -> Result<bool> {
    let names: Vec<String> = require(fixture, ROLES)?.json()?;

    let mut conn = get_conn(db)?;
    let tx = conn
        .transaction()
        .map_err(|e| Error::database(e.to_string()))?;

    for name in &names {
        roles::insert_role(&tx, name)?;
    }

    tx.commit().map_err(|e| Error::database(e.to_string()))?;
    tracing::info!("Inserted {} roles", names.len());

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use persona_db::pool::init_memory_pool;
    use std::fs;

    #[test]
    fn test_inserts_roles() {
        let pool = init_memory_pool().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roles.json");
        fs::write(&path, r#"["Admin", "Member"]"#).unwrap();

        assert!(install_roles(&pool, Some(Fixture::open(path).unwrap())).unwrap());

        let names: Vec<_> = roles::list_roles(&pool.get().unwrap())
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, ["Admin", "Member"]);
    }

    #[test]
    fn test_wrong_shape_is_fixture_error() {
        let pool = init_memory_pool().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roles.json");
        fs::write(&path, r#"{"roles": ["Admin"]}"#).unwrap();

        let err = install_roles(&pool, Some(Fixture::open(path).unwrap())).unwrap_err();
        assert!(matches!(err, Error::Fixture { .. }));
        assert_eq!(roles::count_roles(&pool.get().unwrap()).unwrap(), 0);
    }

    #[test]
    fn test_missing_fixture_is_rejected() {
        let pool = init_memory_pool().unwrap();
        assert!(matches!(install_roles(&pool, None), Err(Error::Validation(_))));
    }
}
