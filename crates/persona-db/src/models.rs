//! Rust models matching the database schema.
//!
//! Each model implements `from_row` for constructing itself from a
//! `rusqlite::Row` selected with the column order of its query module.

use chrono::{DateTime, NaiveDate, Utc};
use persona_common::{AuthGroupId, MembershipId, PersonId, RoleId};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Feature registry
// ---------------------------------------------------------------------------

/// Provenance attached to a feature by whoever wrote its installer.
///
/// Stored verbatim; nothing in the installer interprets these fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureMetadata {
    /// Feature author(s).
    pub who: Option<String>,
    /// E-mail address of the author.
    pub contact: Option<String>,
    /// When the feature was implemented.
    pub since: Option<NaiveDate>,
    /// External see-more hyperlink.
    pub reference: Option<String>,
}

impl FeatureMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn who(mut self, who: impl Into<String>) -> Self {
        self.who = Some(who.into());
        self
    }

    pub fn contact(mut self, contact: impl Into<String>) -> Self {
        self.contact = Some(contact.into());
        self
    }

    pub fn since(mut self, since: NaiveDate) -> Self {
        self.since = Some(since);
        self
    }

    pub fn reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }
}

/// One row of the `feature` ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub name: String,
    pub success: bool,
    pub installation_ts: DateTime<Utc>,
    #[serde(flatten)]
    pub metadata: FeatureMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked_at: Option<DateTime<Utc>>,
}

impl FeatureRecord {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            name: row.get(0)?,
            success: row.get(1)?,
            installation_ts: row.get(2)?,
            metadata: FeatureMetadata {
                who: row.get(3)?,
                contact: row.get(4)?,
                since: row.get(5)?,
                reference: row.get(6)?,
            },
            locked_by: row.get(7)?,
            locked_at: row.get(8)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Domain
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
}

impl Person {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: PersonId::from(row.get::<_, i64>(0)?),
            first_name: row.get(1)?,
            last_name: row.get(2)?,
            email: row.get(3)?,
        })
    }

    /// Display form used in listings: `<id> <first last>`.
    pub fn label(&self) -> String {
        format!("{} <{} {}>", self.id, self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
}

impl Role {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: RoleId::from(row.get::<_, i64>(0)?),
            name: row.get(1)?,
        })
    }
}

/// A person's membership of one or more roles over an optional date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleMembership {
    pub id: MembershipId,
    pub role_ids: Vec<RoleId>,
    pub begin_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub person_id: PersonId,
}

impl RoleMembership {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        let role_ids: String = row.get(1)?;
        let role_ids = serde_json::from_str(&role_ids).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
        })?;

        Ok(Self {
            id: MembershipId::from(row.get::<_, i64>(0)?),
            role_ids,
            begin_date: row.get(2)?,
            end_date: row.get(3)?,
            person_id: PersonId::from(row.get::<_, i64>(4)?),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthGroup {
    pub id: AuthGroupId,
    pub role: String,
    pub description: Option<String>,
}

impl AuthGroup {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: AuthGroupId::from(row.get::<_, i64>(0)?),
            role: row.get(1)?,
            description: row.get(2)?,
        })
    }
}
