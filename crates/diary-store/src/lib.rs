//! # diary-store
//!
//! Persistence gateway for the diary backend.
//!
//! - **[`connection`]**: `r2d2` pool of `SQLite` connections with WAL, foreign
//!   keys and busy timeout applied on every checkout, wrapped in [`Database`]
//! - **[`migrations`]**: versioned schema migrations, each in its own transaction
//! - **[`sql`]**: dynamic `WHERE` composition, LIKE escaping, tag and
//!   timestamp encoding, typed row accessors
//!
//! Entity repositories live in their own crates and receive a `&Connection`
//! from [`Database::call`]; this crate knows nothing about tasks or resources
//! beyond the schema.

#![deny(unsafe_code)]

pub mod connection;
pub mod errors;
pub mod migrations;
pub mod sql;

pub use connection::{ConnectionConfig, Database};
pub use errors::{Result, StoreError};
