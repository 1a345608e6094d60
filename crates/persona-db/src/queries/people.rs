//! Person database queries.

use persona_common::{Error, PersonId, Result};
use rusqlite::{Connection, OptionalExtension};

use crate::models::Person;

const COLS: &str = "id, first_name, last_name, email";

/// Insert a person.
///
/// # Returns
///
/// * `Ok(Person)` - The created person
/// * `Err(Error)` - If the e-mail address is already taken or a database error occurs
pub fn insert_person(
    conn: &Connection,
    first_name: &str,
    last_name: &str,
    email: Option<&str>,
) -> Result<Person> {
    conn.execute(
        "INSERT INTO person (first_name, last_name, email)
         VALUES (:first_name, :last_name, :email)",
        rusqlite::named_params! {
            ":first_name": first_name,
            ":last_name": last_name,
            ":email": email,
        },
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(Person {
        id: PersonId::from(conn.last_insert_rowid()),
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        email: email.map(str::to_string),
    })
}

/// Get a person by ID.
pub fn get_person(conn: &Connection, id: PersonId) -> Result<Option<Person>> {
    let q = format!("SELECT {COLS} FROM person WHERE id = ?1");
    conn.query_row(&q, [id.get()], Person::from_row)
        .optional()
        .map_err(|e| Error::database(e.to_string()))
}

/// Get a person by e-mail address.
pub fn get_person_by_email(conn: &Connection, email: &str) -> Result<Option<Person>> {
    let q = format!("SELECT {COLS} FROM person WHERE email = ?1");
    conn.query_row(&q, [email], Person::from_row)
        .optional()
        .map_err(|e| Error::database(e.to_string()))
}

/// List all people ordered by last name, then first name.
pub fn list_people(conn: &Connection) -> Result<Vec<Person>> {
    let q = format!("SELECT {COLS} FROM person ORDER BY last_name, first_name, id");
    let mut stmt = conn
        .prepare(&q)
        .map_err(|e| Error::database(e.to_string()))?;

    let people = stmt
        .query_map([], Person::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(people)
}

/// Count all people.
pub fn count_people(conn: &Connection) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM person", [], |row| row.get(0))
        .map_err(|e| Error::database(e.to_string()))
}
