//! # diary-tasks
//!
//! Task CRUD with `SQLite` persistence.
//!
//! - **[`types`]**: the [`Task`] entity, its closed enums, request payloads
//! - **[`filter`]**: turns list query parameters into a [`TaskListPlan`]
//!   (predicates, ordering, pagination)
//! - **[`update`]**: merges a sparse [`TaskUpdate`] onto a stored task
//! - **[`repository`]**: stateless SQL functions over a `&Connection`

#![deny(unsafe_code)]

pub mod errors;
pub mod filter;
pub mod repository;
pub mod types;
pub mod update;

pub use errors::{Result, TaskError};
pub use filter::{DateFilter, SortOrder, TaskListPlan, TaskListQuery, TaskSortKey};
pub use repository::TaskRepository;
pub use types::{
    Category, DueDate, Priority, Task, TaskCreateParams, TaskListResult, TaskStats, TaskStatus,
    TaskUpdate,
};
pub use update::{resolve_update, validate_title, ResolvedUpdate};
