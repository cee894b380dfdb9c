//! Request handlers, one module per entity.
//!
//! Each handler validates path and body, runs the repository call on the
//! blocking pool through `Database::call`, and shapes the JSON response.

pub mod resources;
pub mod tasks;

use chrono::{Local, NaiveDate};
use serde::Serialize;

/// `{"message": "..."}` body.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    /// Outcome description.
    pub message: &'static str,
}

/// Reference date for relative date filters: the server's local calendar day.
pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}
