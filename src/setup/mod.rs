//! Seed-data installers run at startup.
//!
//! The features are declared here, in the order they must run: auth groups
//! first, then roles, then demo people (who are assigned existing roles).

mod auth_groups;
mod demo_people;
mod roles;

pub use auth_groups::install_auth_groups;
pub use demo_people::{install_demo_people, install_demo_people_with, PersonSeed};
pub use roles::install_roles;

use chrono::NaiveDate;
use persona_common::{Error, Result};
use persona_db::models::FeatureMetadata;
use persona_db::pool::DbPool;

use crate::installer::{Feature, FeatureSet, Fixture};

pub const AUTH_GROUPS: &str = "2021-02-23 Auth Groups";
pub const ROLES: &str = "2021-02-23 Roles";
pub const DEMO_PEOPLE: &str = "2021-02-23 Demo people and their roles";

fn metadata() -> FeatureMetadata {
    let meta = FeatureMetadata::new()
        .who("Kevin Koster")
        .contact("koster.k2001@gmail.com");
    match NaiveDate::from_ymd_opt(2021, 2, 23) {
        Some(since) => meta.since(since),
        None => meta,
    }
}

/// The startup sequence, bound to the domain database `db`.
pub fn startup_features(db: &DbPool) -> Result<FeatureSet> {
    let mut set = FeatureSet::new();

    let pool = db.clone();
    set.push(Feature::new(AUTH_GROUPS, metadata(), move |fixture| {
        install_auth_groups(&pool, fixture)
    }))?;

    let pool = db.clone();
    set.push(Feature::new(ROLES, metadata(), move |fixture| {
        install_roles(&pool, fixture)
    }))?;

    let pool = db.clone();
    set.push(Feature::new(DEMO_PEOPLE, metadata(), move |fixture| {
        install_demo_people(&pool, fixture)
    }))?;

    Ok(set)
}

/// These installers have nothing to seed without a fixture.
fn require(fixture: Option<Fixture>, feature: &str) -> Result<Fixture> {
    fixture.ok_or_else(|| Error::validation(format!("feature '{feature}' needs a fixture file")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use persona_db::pool::init_memory_pool;

    #[test]
    fn test_startup_order() {
        let pool = init_memory_pool().unwrap();
        let set = startup_features(&pool).unwrap();
        assert_eq!(set.names(), [AUTH_GROUPS, ROLES, DEMO_PEOPLE]);
    }

    #[test]
    fn test_metadata_provenance() {
        let meta = metadata();
        assert_eq!(meta.who.as_deref(), Some("Kevin Koster"));
        assert_eq!(meta.since, NaiveDate::from_ymd_opt(2021, 2, 23));
    }

    #[test]
    fn test_require_without_fixture() {
        let err = require(None, ROLES).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
