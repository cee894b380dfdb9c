//! SQL building blocks shared by the entity repositories.
//!
//! [`SqlFilter`] accumulates `WHERE` predicates together with their bound
//! values. Values are owned [`rusqlite::types::Value`]s so a finished filter is
//! `Send` and can be built on the request thread, then moved into
//! [`crate::Database::call`].
//!
//! Search folds case with [`LOWER_FN`], a Unicode-aware replacement for the
//! built-in `LOWER()` (which only folds ASCII). [`register_functions`] must
//! run on a connection before any searching query; pooled connections get it
//! on acquire.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::functions::FunctionFlags;
use rusqlite::types::{FromSql, Value};
use rusqlite::{Connection, Row};

use crate::errors::{Result, StoreError};

/// Conjunction of parameterized predicates.
#[derive(Clone, Debug, Default)]
pub struct SqlFilter {
    conditions: Vec<String>,
    values: Vec<Value>,
}

impl SqlFilter {
    /// Empty filter (matches every row).
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a predicate with `?` placeholders and the values bound to them, in order.
    pub fn push(&mut self, condition: impl Into<String>, values: impl IntoIterator<Item = Value>) {
        self.conditions.push(condition.into());
        self.values.extend(values);
    }

    /// Add a predicate with a single bound value.
    pub fn push_eq(&mut self, column: &str, value: impl Into<Value>) {
        self.push(format!("{column} = ?"), [value.into()]);
    }

    /// Case-insensitive substring match on any of `columns`.
    pub fn push_search(&mut self, columns: &[&str], needle: &str) {
        if columns.is_empty() {
            return;
        }
        let pattern = contains_pattern(needle);
        let clause = columns
            .iter()
            .map(|c| format!("{LOWER_FN}({c}) LIKE ? ESCAPE '\\'"))
            .collect::<Vec<_>>()
            .join(" OR ");
        self.push(
            format!("({clause})"),
            columns.iter().map(|_| Value::Text(pattern.clone())),
        );
    }

    /// Require `tag` to be an element of the JSON array in `column`.
    pub fn push_tag(&mut self, column: &str, tag: &str) {
        self.push(
            format!("EXISTS (SELECT 1 FROM json_each({column}) WHERE json_each.value = ?)"),
            [Value::Text(tag.to_string())],
        );
    }

    /// `WHERE ...` clause, or an empty string when there are no predicates.
    pub fn where_clause(&self) -> String {
        if self.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.conditions.join(" AND "))
        }
    }

    /// Bound values in placeholder order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Number of predicates.
    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    /// True when no predicate has been added.
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

/// SQL name of the Unicode lowercase function.
pub const LOWER_FN: &str = "unicode_lower";

/// Register the scalar functions the query builders emit.
pub fn register_functions(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        LOWER_FN,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let value: Option<String> = ctx.get(0)?;
            Ok(value.map(|v| v.to_lowercase()))
        },
    )
}

/// Escape LIKE wildcards; pair with `ESCAPE '\'`.
pub fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// `%needle%` pattern, lowercased and escaped.
pub fn contains_pattern(needle: &str) -> String {
    format!("%{}%", escape_like(&needle.to_lowercase()))
}

/// Serialize tags to a JSON array string.
pub fn tags_to_json(tags: &[String]) -> Result<String> {
    Ok(serde_json::to_string(tags)?)
}

/// Parse a JSON array column into tags.
pub fn parse_tags(raw: &str, table: &'static str) -> Result<Vec<String>> {
    serde_json::from_str(raw).map_err(|e| StoreError::CorruptRow {
        table,
        column: "tags",
        detail: format!("invalid JSON: {e}"),
    })
}

/// Storage form of a timestamp: RFC 3339 UTC with microseconds.
///
/// Fixed width, so lexical order equals chronological order.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Decode a stored timestamp.
pub fn parse_timestamp(
    raw: &str,
    table: &'static str,
    column: &'static str,
) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::CorruptRow {
            table,
            column,
            detail: format!("invalid timestamp {raw:?}: {e}"),
        })
}

/// Storage form of a calendar date (`YYYY-MM-DD`).
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Decode a stored calendar date.
pub fn parse_date(raw: &str, table: &'static str, column: &'static str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| StoreError::CorruptRow {
        table,
        column,
        detail: format!("invalid date {raw:?}: {e}"),
    })
}

/// Required column value, or [`StoreError::CorruptRow`].
pub fn get<T: FromSql>(
    row: &Row<'_>,
    idx: usize,
    table: &'static str,
    column: &'static str,
) -> Result<T> {
    row.get(idx).map_err(|e| StoreError::CorruptRow {
        table,
        column,
        detail: e.to_string(),
    })
}

/// Nullable column value.
pub fn get_opt<T: FromSql>(
    row: &Row<'_>,
    idx: usize,
    table: &'static str,
    column: &'static str,
) -> Result<Option<T>> {
    get(row, idx, table, column)
}

/// Parse a text column into an enum.
pub fn parse_enum<T: std::str::FromStr>(
    raw: &str,
    table: &'static str,
    column: &'static str,
) -> Result<T> {
    raw.parse().map_err(|_| StoreError::CorruptRow {
        table,
        column,
        detail: format!("unknown variant: {raw}"),
    })
}
