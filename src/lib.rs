//! Persona - people and role store with one-time seed-data installers
//!
//! This library crate exposes the installer runner, the seed installers and
//! configuration for the binary and for integration testing.

pub mod app;
pub mod config;
pub mod installer;
pub mod setup;
