//! Resource list filter and page/limit pagination.

use diary_store::sql::SqlFilter;
use serde::Deserialize;

use crate::types::AppliedFilters;

/// Page when `page` is missing, unparsable or below 1.
pub const DEFAULT_PAGE: i64 = 1;
/// Page size when `limit` is missing, unparsable or below 1.
pub const DEFAULT_LIMIT: i64 = 20;

/// Raw list parameters.
///
/// `page` and `limit` stay strings so a bad value falls back to its default
/// instead of failing the request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ResourceListQuery {
    /// Exact technology.
    pub technology: Option<String>,
    /// Exact type.
    #[serde(rename = "type")]
    pub resource_type: Option<String>,
    /// Exact status.
    pub status: Option<String>,
    /// Exact priority.
    pub priority: Option<String>,
    /// Case-insensitive substring of title or description.
    pub search: Option<String>,
    /// 1-based page.
    pub page: Option<String>,
    /// Page size.
    pub limit: Option<String>,
}

/// A resolved list query.
#[derive(Debug, Clone)]
pub struct ResourceListPlan {
    /// Conjunctive predicates.
    pub filter: SqlFilter,
    /// 1-based page.
    pub page: i64,
    /// Page size.
    pub limit: i64,
    /// Filter values to echo back.
    pub applied: AppliedFilters,
}

impl ResourceListPlan {
    /// Rows to skip: `(page - 1) * limit`.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

fn positive_or(raw: Option<&str>, default: i64) -> i64 {
    raw.and_then(|r| r.trim().parse::<i64>().ok())
        .filter(|n| *n >= 1)
        .unwrap_or(default)
}

/// `ceil(total / limit)`.
pub fn total_pages(total: i64, limit: i64) -> i64 {
    if total <= 0 || limit <= 0 {
        0
    } else {
        (total - 1) / limit + 1
    }
}

impl ResourceListQuery {
    /// Build the plan. Never fails: every input has a fallback.
    pub fn into_plan(self) -> ResourceListPlan {
        let mut filter = SqlFilter::new();
        let text = |v: Option<String>| v.filter(|s| !s.is_empty()).unwrap_or_default();
        let applied = AppliedFilters {
            technology: text(self.technology),
            resource_type: text(self.resource_type),
            status: text(self.status),
            priority: text(self.priority),
            search: text(self.search),
        };

        for (column, value) in [
            ("technology", &applied.technology),
            ("type", &applied.resource_type),
            ("status", &applied.status),
            ("priority", &applied.priority),
        ] {
            if !value.is_empty() {
                filter.push_eq(column, value.clone());
            }
        }
        if !applied.search.is_empty() {
            filter.push_search(&["title", "description"], &applied.search);
        }

        ResourceListPlan {
            filter,
            page: positive_or(self.page.as_deref(), DEFAULT_PAGE),
            limit: positive_or(self.limit.as_deref(), DEFAULT_LIMIT),
            applied,
        }
    }
}
