//! # diary-core
//!
//! Foundation types shared by every diary crate:
//!
//! - **Entity IDs**: [`TaskId`], [`ResourceId`], [`ProjectId`] as UUID newtypes
//! - **Sparse updates**: [`Patch`], a field container that keeps "absent"
//!   apart from "explicitly null"
//! - **Logging**: [`logging::init_subscriber`] for the global `tracing` subscriber

#![deny(unsafe_code)]

pub mod ids;
pub mod logging;
pub mod patch;

pub use ids::{IdError, ProjectId, ResourceId, TaskId};
pub use patch::Patch;
