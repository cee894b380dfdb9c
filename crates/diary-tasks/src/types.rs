//! Core types for task management.
//!
//! Wire format is `camelCase`. Enum values are lowercase, with
//! `in-progress` hyphenated; the same strings are stored in `SQLite` and
//! guarded there by CHECK constraints.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use diary_core::{Patch, ProjectId, TaskId};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ─────────────────────────────────────────────────────────────────────────────
// Enums
// ─────────────────────────────────────────────────────────────────────────────

/// Error for a string that names no enum variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {field}: {value}")]
pub struct UnknownVariant {
    /// Field name (`priority`, `category`, `status`).
    pub field: &'static str,
    /// The rejected input.
    pub value: String,
}

/// Task priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Whenever.
    Low,
    /// Default.
    #[default]
    Medium,
    /// Soon.
    High,
    /// Now.
    Urgent,
}

impl Priority {
    /// Every priority, highest rank first.
    pub const ALL: [Self; 4] = [Self::Urgent, Self::High, Self::Medium, Self::Low];

    /// SQL string representation.
    #[must_use]
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }

    /// Sort rank: low = 1 up to urgent = 4.
    #[must_use]
    pub fn rank(self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
            Self::Urgent => 4,
        }
    }
}

impl FromStr for Priority {
    type Err = UnknownVariant;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "urgent" => Ok(Self::Urgent),
            _ => Err(UnknownVariant {
                field: "priority",
                value: s.to_string(),
            }),
        }
    }
}

/// Task category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Private life.
    #[default]
    Personal,
    /// Work.
    Office,
    /// Study.
    Learning,
    /// Investigation.
    Research,
}

impl Category {
    /// SQL string representation.
    #[must_use]
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Personal => "personal",
            Self::Office => "office",
            Self::Learning => "learning",
            Self::Research => "research",
        }
    }
}

impl FromStr for Category {
    type Err = UnknownVariant;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "personal" => Ok(Self::Personal),
            "office" => Ok(Self::Office),
            "learning" => Ok(Self::Learning),
            "research" => Ok(Self::Research),
            _ => Err(UnknownVariant {
                field: "category",
                value: s.to_string(),
            }),
        }
    }
}

/// Task workflow status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    /// Not started.
    #[default]
    Pending,
    /// Being worked on.
    InProgress,
    /// Awaiting review.
    Review,
    /// Done.
    Completed,
    /// Abandoned.
    Cancelled,
}

impl TaskStatus {
    /// SQL string representation.
    #[must_use]
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in-progress",
            Self::Review => "review",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl FromStr for TaskStatus {
    type Err = UnknownVariant;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "in-progress" => Ok(Self::InProgress),
            "review" => Ok(Self::Review),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(UnknownVariant {
                field: "status",
                value: s.to_string(),
            }),
        }
    }
}

macro_rules! display_as_sql {
    ($($ty:ty),*) => {$(
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_sql())
            }
        }
    )*};
}

display_as_sql!(Priority, Category, TaskStatus);

// ─────────────────────────────────────────────────────────────────────────────
// Due date
// ─────────────────────────────────────────────────────────────────────────────

/// Calendar due date as accepted on input.
///
/// Deserializes from `YYYY-MM-DD` or from an RFC 3339 date-time, in which
/// case the date as written (in its own offset) is kept. Serializes as
/// `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DueDate(pub NaiveDate);

impl DueDate {
    /// Parse either accepted form.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
            .map(Self)
    }
}

impl From<NaiveDate> for DueDate {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl<'de> Deserialize<'de> for DueDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "invalid dueDate {raw:?}: expected YYYY-MM-DD or RFC 3339"
            ))
        })
    }
}

impl Serialize for DueDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Entity
// ─────────────────────────────────────────────────────────────────────────────

/// A stored task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Immutable identifier.
    pub id: TaskId,
    /// Short title, 1..=255 characters.
    pub title: String,
    /// Free-form details.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Done flag.
    pub completed: bool,
    /// Day the task is due.
    pub due_date: NaiveDate,
    /// Priority.
    pub priority: Priority,
    /// Category.
    pub category: Category,
    /// Workflow status.
    pub status: TaskStatus,
    /// Opaque project reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<ProjectId>,
    /// Ordered labels.
    pub tags: Vec<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Requests
// ─────────────────────────────────────────────────────────────────────────────

/// Body of a create request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCreateParams {
    /// Title (trimmed, 1..=255 characters).
    pub title: String,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
    /// Due date.
    pub due_date: DueDate,
    /// Priority (default: medium).
    #[serde(default)]
    pub priority: Option<Priority>,
    /// Category (default: personal).
    #[serde(default)]
    pub category: Option<Category>,
    /// Status (default: pending).
    #[serde(default)]
    pub status: Option<TaskStatus>,
    /// Project reference.
    #[serde(default)]
    pub project_id: Option<ProjectId>,
    /// Tags (default: empty).
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

/// Body of a partial update. Only present fields are applied.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskUpdate {
    /// New title.
    pub title: Patch<String>,
    /// New description; `null` clears it.
    pub description: Patch<String>,
    /// New done flag; `true` also forces status to completed.
    pub completed: Patch<bool>,
    /// New due date.
    pub due_date: Patch<DueDate>,
    /// New priority.
    pub priority: Patch<Priority>,
    /// New category.
    pub category: Patch<Category>,
    /// New status.
    pub status: Patch<TaskStatus>,
    /// New project reference; `null` clears it.
    pub project_id: Patch<ProjectId>,
    /// Replacement tag list.
    pub tags: Patch<Vec<String>>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Results
// ─────────────────────────────────────────────────────────────────────────────

/// One page of a task listing.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskListResult {
    /// Tasks on this page, in plan order.
    pub tasks: Vec<Task>,
    /// Rows matching the filter, ignoring pagination.
    pub total: i64,
    /// Applied page size.
    pub limit: u32,
    /// Applied offset.
    pub offset: u32,
}

/// Dashboard counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    /// All tasks.
    pub total: i64,
    /// Due today.
    pub today: i64,
    /// Due today and completed.
    pub today_completed: i64,
    /// Not completed and not cancelled.
    pub in_progress: i64,
    /// Completed.
    pub completed: i64,
    /// Due yesterday or earlier and not completed.
    pub overdue: i64,
}
