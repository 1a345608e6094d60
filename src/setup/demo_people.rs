//! Demo people, each given a membership of one random existing role.

use chrono::{Duration, Local, NaiveDate};
use persona_common::{Error, Result};
use persona_db::pool::{get_conn, DbPool};
use persona_db::queries::{people, role_memberships, roles};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;

use super::{require, DEMO_PEOPLE};
use crate::installer::Fixture;

/// One entry of the demo people fixture.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PersonSeed {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Insert the demo people with a random role each, dated around today.
pub fn install_demo_people(db: &DbPool, fixture: Option<Fixture>) -> Result<bool> {
    install_demo_people_with(db, fixture, &mut rand::thread_rng(), Local::now().date_naive())
}

/// Like [`install_demo_people`] with an explicit random source and date.
///
/// Memberships run from ten days before `today` to thirty days after it.
/// Without any roles in the store, people are inserted with an empty role
/// list.
pub fn install_demo_people_with<R: Rng + ?Sized>(
    db: &DbPool,
    fixture: Option<Fixture>,
    rng: &mut R,
    today: NaiveDate,
) -> Result<bool> {
    let seeds: Vec<PersonSeed> = require(fixture, DEMO_PEOPLE)?.json()?;

    let begin = today - Duration::days(10);
    let end = today + Duration::days(30);

    let mut conn = get_conn(db)?;
    let tx = conn
        .transaction()
        .map_err(|e| Error::database(e.to_string()))?;

    let available = roles::list_roles(&tx)?;
    if available.is_empty() {
        tracing::warn!("No roles installed; demo people get no role");
    }

    for seed in &seeds {
        let person = people::insert_person(&tx, &seed.first_name, &seed.last_name, seed.email.as_deref())?;
        let role_ids: Vec<_> = available.choose(rng).map(|role| role.id).into_iter().collect();
        role_memberships::insert_membership(&tx, person.id, &role_ids, Some(begin), Some(end))?;
        tracing::debug!("Added {} with roles {:?}", person.label(), role_ids);
    }

    tx.commit().map_err(|e| Error::database(e.to_string()))?;
    tracing::info!("Inserted {} demo people", seeds.len());

    Ok(true)
}
