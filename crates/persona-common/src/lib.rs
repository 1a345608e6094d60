//! Persona-Common: shared error type and typed identifiers.
//!
//! This crate provides the pieces every other persona crate agrees on:
//!
//! - **Error Handling**: a unified [`Error`] and the [`Result`] alias
//! - **Typed IDs**: newtypes over SQLite row ids so a `RoleId` never stands in
//!   for a `PersonId`, plus the [`InstallerId`] lease token
//!
//! # Examples
//!
//! ```
//! use persona_common::{Error, PersonId, Result};
//!
//! let id = PersonId::from(7);
//! assert_eq!(id.get(), 7);
//!
//! fn example() -> Result<()> {
//!     Err(Error::not_found("feature", "2021-02-23 Roles"))
//! }
//! assert!(example().is_err());
//! ```

pub mod error;
pub mod ids;

pub use error::{Error, Result};
pub use ids::*;
