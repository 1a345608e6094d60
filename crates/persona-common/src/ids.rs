//! Typed ID wrappers for type safety across persona.
//!
//! Domain rows use SQLite integer primary keys; each table gets its own
//! newtype so a `RoleId` cannot be passed where a `PersonId` is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Generate a newtype ID wrapper over an `i64` row id.
macro_rules! row_id {
    ($($(#[doc = $doc:expr])* $name:ident),+ $(,)?) => {
        $(
            $(#[doc = $doc])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
            #[serde(transparent)]
            pub struct $name(i64);

            impl $name {
                /// Return the raw row id.
                #[must_use]
                pub fn get(self) -> i64 {
                    self.0
                }
            }

            impl From<i64> for $name {
                fn from(id: i64) -> Self {
                    Self(id)
                }
            }

            impl From<$name> for i64 {
                fn from(id: $name) -> Self {
                    id.0
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.0)
                }
            }
        )+
    };
}

row_id! {
    /// Row id of a person.
    PersonId,
    /// Row id of a role.
    RoleId,
    /// Row id of a role membership.
    MembershipId,
    /// Row id of an auth group.
    AuthGroupId,
}

/// Identifies one installer runner instance when it holds an install lease.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstallerId(Uuid);

impl InstallerId {
    /// Generate a new random installer ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for InstallerId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for InstallerId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl fmt::Display for InstallerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
