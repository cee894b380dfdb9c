//! Learning resource types. Wire format is `snake_case`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use diary_core::ResourceId;
use serde::{Deserialize, Serialize};

use crate::errors::{ResourceError, Result};

/// Status value that stamps `completed_at`.
pub const COMPLETED_STATUS: &str = "completed";

/// A stored learning resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Immutable identifier.
    pub id: ResourceId,
    /// Title.
    pub title: String,
    /// Link to the material.
    pub url: Option<String>,
    /// Summary.
    pub description: Option<String>,
    /// Technology the resource covers.
    pub technology: String,
    /// Kind of material (book, video, article).
    #[serde(rename = "type")]
    pub resource_type: String,
    /// Free-form progress status.
    pub status: Option<String>,
    /// Free-form priority.
    pub priority: Option<String>,
    /// Rating, 1 to 5.
    pub rating: Option<i64>,
    /// Minutes.
    pub estimated_time: Option<i64>,
    /// Percent complete.
    pub progress: Option<i64>,
    /// Personal notes.
    pub notes: Option<String>,
    /// Ordered labels.
    pub tags: Vec<String>,
    /// Set when status became completed.
    pub completed_at: Option<DateTime<Utc>>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

/// Body of a create or full-replace request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourceInput {
    /// Title.
    pub title: String,
    /// Link to the material.
    #[serde(default)]
    pub url: Option<String>,
    /// Summary.
    #[serde(default)]
    pub description: Option<String>,
    /// Technology the resource covers.
    pub technology: String,
    /// Kind of material (book, video, article).
    #[serde(rename = "type")]
    pub resource_type: String,
    /// Free-form progress status.
    #[serde(default)]
    pub status: Option<String>,
    /// Free-form priority.
    #[serde(default)]
    pub priority: Option<String>,
    /// Rating, 1 to 5.
    #[serde(default)]
    pub rating: Option<i64>,
    /// Estimated minutes.
    #[serde(default)]
    pub estimated_time: Option<i64>,
    /// Percent complete.
    #[serde(default)]
    pub progress: Option<i64>,
    /// Personal notes.
    #[serde(default)]
    pub notes: Option<String>,
    /// Ordered labels.
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

fn required(value: &str, field: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ResourceError::validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

fn optional(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Check a rating is within 1..=5.
pub fn check_rating(rating: i64) -> Result<i64> {
    if (1..=5).contains(&rating) {
        Ok(rating)
    } else {
        Err(ResourceError::validation("rating must be between 1 and 5"))
    }
}

impl ResourceInput {
    /// Trim required fields, drop blank optional strings, range-check numbers.
    pub fn normalized(self) -> Result<Self> {
        if let Some(minutes) = self.estimated_time.filter(|m| *m < 0) {
            return Err(ResourceError::validation(format!(
                "estimated_time must not be negative: {minutes}"
            )));
        }
        if let Some(progress) = self.progress.filter(|p| !(0..=100).contains(p)) {
            return Err(ResourceError::validation(format!(
                "progress must be between 0 and 100: {progress}"
            )));
        }
        Ok(Self {
            title: required(&self.title, "title")?,
            technology: required(&self.technology, "technology")?,
            resource_type: required(&self.resource_type, "type")?,
            url: optional(self.url),
            description: optional(self.description),
            status: optional(self.status),
            priority: optional(self.priority),
            rating: self.rating.map(check_rating).transpose()?,
            estimated_time: self.estimated_time,
            progress: self.progress,
            notes: optional(self.notes),
            tags: self.tags,
        })
    }
}

/// Body of `PATCH /resources/{id}/status`.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusUpdate {
    /// Free-form progress status.
    pub status: String,
}

/// Body of `PATCH /resources/{id}/rating`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RatingUpdate {
    /// Rating, 1 to 5.
    pub rating: i64,
}

/// Filter values echoed back with a listing; absent filters are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AppliedFilters {
    /// Technology the resource covers.
    pub technology: String,
    /// Kind of material (book, video, article).
    #[serde(rename = "type")]
    pub resource_type: String,
    /// Free-form progress status.
    pub status: String,
    /// Free-form priority.
    pub priority: String,
    /// Search text.
    pub search: String,
}

/// One page of a resource listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceListResult {
    /// Resources on this page.
    pub resources: Vec<Resource>,
    /// 1-based page number.
    pub page: i64,
    /// Page size.
    pub limit: i64,
    /// Rows matching the filter.
    pub total: i64,
    /// Pages at this page size.
    pub total_pages: i64,
}

/// Catalogue statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResourceStats {
    /// All resources.
    pub total_resources: i64,
    /// Status `completed`.
    pub completed_count: i64,
    /// Status `in-progress`.
    pub in_progress_count: i64,
    /// Status `to-read`.
    pub to_read_count: i64,
    /// Status `bookmarked`.
    pub bookmarked_count: i64,
    /// Estimated hours of resources completed in the last 7 days.
    pub weekly_hours: f64,
    /// Mean over rated resources; 0 when none are rated.
    pub avg_rating: f64,
    /// Count per technology.
    pub technology_breakdown: BTreeMap<String, i64>,
    /// Count per type.
    pub type_breakdown: BTreeMap<String, i64>,
}
