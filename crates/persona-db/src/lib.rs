//! Persona-DB: database schema, migrations, query operations, and backups
//!
//! This crate provides database functionality for persona using SQLite
//! with rusqlite and r2d2 connection pooling. Two databases are managed:
//! the domain store (people, roles, memberships, auth groups) and the
//! feature registry that records which seed installers have run.
//!
//! # Modules
//!
//! - `migrations` - Embedded schema migrations for both databases
//! - `pool` - Connection pool management
//! - `models` - Rust models matching database schema
//! - `queries` - Database query operations
//! - `backup` - Online snapshots of the domain database
//!
//! # Example
//!
//! ```no_run
//! use persona_db::pool::{init_pool, get_conn};
//! use persona_db::queries::roles;
//!
//! let pool = init_pool("/var/lib/persona/persona.sqlite").unwrap();
//! let conn = get_conn(&pool).unwrap();
//!
//! let role = roles::insert_role(&conn, "Admin").unwrap();
//! println!("Created role: {}", role.name);
//! ```

pub mod backup;
pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;
