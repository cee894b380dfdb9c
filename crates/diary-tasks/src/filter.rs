//! Task list query builder.
//!
//! [`TaskListQuery`] is the raw query string. [`TaskListQuery::into_plan`]
//! validates it against a reference date and produces a [`TaskListPlan`]:
//! a conjunction of predicates, an ORDER BY drawn from a fixed allow-list,
//! and a page window. Nothing the client sends is interpolated into SQL.

use std::borrow::Cow;
use std::str::FromStr;

use chrono::{Datelike, Days, NaiveDate};
use diary_core::ProjectId;
use diary_store::sql::{format_date, SqlFilter};
use rusqlite::types::Value;
use serde::Deserialize;

use crate::errors::{Result, TaskError};
use crate::types::{Category, Priority, TaskStatus};

/// Page size when `limit` is missing or zero.
pub const DEFAULT_LIMIT: u32 = 50;

/// Raw list parameters, as sent in the query string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskListQuery {
    /// Exact category.
    pub category: Option<String>,
    /// Exact priority.
    pub priority: Option<String>,
    /// Exact status.
    pub status: Option<String>,
    /// Done flag; absent means either.
    pub completed: Option<bool>,
    /// Case-insensitive substring of title or description.
    pub search: Option<String>,
    /// `today`, `tomorrow`, `this-week` or `overdue`.
    pub date_filter: Option<String>,
    /// Project UUID; ignored when malformed.
    pub project_id: Option<String>,
    /// Comma-separated tags, all required.
    pub tags: Option<String>,
    /// Page size.
    pub limit: Option<u32>,
    /// Rows to skip.
    pub offset: Option<u32>,
    /// Sort key.
    pub sort_by: Option<String>,
    /// `asc` or `desc`.
    pub sort_order: Option<String>,
}

/// Relative due-date window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFilter {
    /// Due today.
    Today,
    /// Due tomorrow.
    Tomorrow,
    /// Due between today and the coming Sunday, inclusive.
    ThisWeek,
    /// Due yesterday or earlier and not completed.
    Overdue,
}

impl FromStr for DateFilter {
    type Err = TaskError;
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "today" => Ok(Self::Today),
            "tomorrow" => Ok(Self::Tomorrow),
            "this-week" => Ok(Self::ThisWeek),
            "overdue" => Ok(Self::Overdue),
            _ => Err(TaskError::validation(format!("invalid dateFilter: {s}"))),
        }
    }
}

impl DateFilter {
    fn apply(self, filter: &mut SqlFilter, today: NaiveDate) {
        match self {
            Self::Today => filter.push_eq("due_date", format_date(today)),
            Self::Tomorrow => filter.push_eq("due_date", format_date(next_day(today))),
            Self::ThisWeek => {
                let days_left = 7 - u64::from(today.weekday().num_days_from_sunday());
                let week_end = today.checked_add_days(Days::new(days_left)).unwrap_or(today);
                filter.push(
                    "due_date BETWEEN ? AND ?",
                    [Value::from(format_date(today)), Value::from(format_date(week_end))],
                );
            }
            Self::Overdue => {
                let yesterday = today.pred_opt().unwrap_or(today);
                filter.push(
                    "due_date <= ? AND completed = 0",
                    [Value::from(format_date(yesterday))],
                );
            }
        }
    }
}

fn next_day(date: NaiveDate) -> NaiveDate {
    date.succ_opt().unwrap_or(date)
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Ascending.
    #[default]
    Asc,
    /// Descending.
    Desc,
}

impl SortOrder {
    fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = TaskError;
    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("asc") {
            Ok(Self::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Ok(Self::Desc)
        } else {
            Err(TaskError::validation(format!("invalid sortOrder: {s}")))
        }
    }
}

/// Allow-listed sort keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TaskSortKey {
    /// `due_date`.
    #[default]
    DueDate,
    /// `created_at`.
    CreatedAt,
    /// `updated_at`.
    UpdatedAt,
    /// `project_id`.
    ProjectId,
    /// `title`.
    Title,
    /// Priority rank, urgent highest.
    Priority,
    /// `category`.
    Category,
    /// `status`.
    Status,
    /// `completed`.
    Completed,
}

impl FromStr for TaskSortKey {
    type Err = TaskError;
    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "dueDate" => Self::DueDate,
            "createdAt" => Self::CreatedAt,
            "updatedAt" => Self::UpdatedAt,
            "projectId" => Self::ProjectId,
            "title" => Self::Title,
            "priority" => Self::Priority,
            "category" => Self::Category,
            "status" => Self::Status,
            "completed" => Self::Completed,
            _ => return Err(TaskError::validation(format!("invalid sortBy: {s}"))),
        })
    }
}

/// `CASE` mapping the `priority` column to [`Priority::rank`].
fn priority_rank_case() -> String {
    let arms = Priority::ALL
        .iter()
        .map(|p| format!("WHEN '{}' THEN {}", p.as_sql(), p.rank()))
        .collect::<Vec<_>>()
        .join(" ");
    format!("CASE priority {arms} END")
}

impl TaskSortKey {
    fn expression(self) -> Cow<'static, str> {
        match self {
            Self::DueDate => "due_date".into(),
            Self::CreatedAt => "created_at".into(),
            Self::UpdatedAt => "updated_at".into(),
            Self::ProjectId => "project_id".into(),
            Self::Title => "title".into(),
            Self::Priority => priority_rank_case().into(),
            Self::Category => "category".into(),
            Self::Status => "status".into(),
            Self::Completed => "completed".into(),
        }
    }

    /// `ORDER BY` body, with `id` as the final tiebreaker.
    pub fn order_clause(self, order: SortOrder) -> String {
        format!("{} {}, id ASC", self.expression(), order.as_sql())
    }
}

/// A validated list query, ready to execute.
#[derive(Debug, Clone)]
pub struct TaskListPlan {
    /// Conjunctive predicates.
    pub filter: SqlFilter,
    /// Sort key.
    pub sort_by: TaskSortKey,
    /// Sort direction.
    pub sort_order: SortOrder,
    /// Page size.
    pub limit: u32,
    /// Rows to skip.
    pub offset: u32,
}

impl TaskListPlan {
    /// `ORDER BY` body for this plan.
    pub fn order_clause(&self) -> String {
        self.sort_by.order_clause(self.sort_order)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_enum<T: FromStr>(value: Option<String>) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    non_blank(value)
        .map(|v| v.trim().parse::<T>().map_err(|e| TaskError::validation(e.to_string())))
        .transpose()
}

impl TaskListQuery {
    /// Validate and resolve against `today`.
    pub fn into_plan(self, today: NaiveDate) -> Result<TaskListPlan> {
        let mut filter = SqlFilter::new();

        if let Some(category) = parse_enum::<Category>(self.category)? {
            filter.push_eq("category", category.as_sql().to_string());
        }
        if let Some(priority) = parse_enum::<Priority>(self.priority)? {
            filter.push_eq("priority", priority.as_sql().to_string());
        }
        if let Some(status) = parse_enum::<TaskStatus>(self.status)? {
            filter.push_eq("status", status.as_sql().to_string());
        }
        if let Some(completed) = self.completed {
            filter.push_eq("completed", completed);
        }
        if let Some(project_id) = self.project_id.as_deref().and_then(|p| ProjectId::parse(p).ok()) {
            filter.push_eq("project_id", project_id.to_string());
        }
        if let Some(search) = self.search.filter(|s| !s.is_empty()) {
            filter.push_search(&["title", "description"], &search);
        }
        if let Some(date_filter) = parse_enum::<DateFilter>(self.date_filter)? {
            date_filter.apply(&mut filter, today);
        }
        if let Some(tags) = self.tags {
            for tag in tags.split(',').map(str::trim).filter(|t| !t.is_empty()) {
                filter.push_tag("tags", tag);
            }
        }

        let sort_by = parse_enum::<TaskSortKey>(self.sort_by)?.unwrap_or_default();
        let sort_order = parse_enum::<SortOrder>(self.sort_order)?.unwrap_or_default();

        Ok(TaskListPlan {
            filter,
            sort_by,
            sort_order,
            limit: self.limit.filter(|l| *l > 0).unwrap_or(DEFAULT_LIMIT),
            offset: self.offset.unwrap_or(0),
        })
    }
}
