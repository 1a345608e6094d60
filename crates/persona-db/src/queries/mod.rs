//! Database query modules.
//!
//! This module organizes all database operations into logical groups:
//! - features: the installer ledger (lookup, upsert, lease claim)
//! - people: person rows
//! - roles: role rows
//! - role_memberships: person-to-roles links with date ranges
//! - auth_groups: RBAC groups

pub mod auth_groups;
pub mod features;
pub mod people;
pub mod role_memberships;
pub mod roles;
