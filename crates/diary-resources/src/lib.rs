//! # diary-resources
//!
//! Learning resource catalogue with `SQLite` persistence.
//!
//! Unlike tasks, resource status and priority are free-form strings; only
//! `rating` (1 to 5) is range checked. Updates replace every mutable field.

#![deny(unsafe_code)]

pub mod errors;
pub mod filter;
pub mod import;
pub mod repository;
pub mod types;

pub use errors::{ResourceError, Result};
pub use filter::{ResourceListPlan, ResourceListQuery, DEFAULT_LIMIT, DEFAULT_PAGE};
pub use import::{validate_import_url, ImportRequest};
pub use repository::ResourceRepository;
pub use types::{
    AppliedFilters, RatingUpdate, Resource, ResourceInput, ResourceListResult, ResourceStats,
    StatusUpdate, COMPLETED_STATUS,
};
