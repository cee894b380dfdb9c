//! SQL data access for learning resources.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use diary_core::ResourceId;
use diary_store::sql::{
    format_timestamp, get, get_opt, parse_enum, parse_tags, parse_timestamp, tags_to_json,
};
use diary_store::StoreError;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use tracing::{debug, instrument};

use crate::errors::{ResourceError, Result};
use crate::filter::{total_pages, ResourceListPlan};
use crate::types::{
    check_rating, Resource, ResourceInput, ResourceListResult, ResourceStats, COMPLETED_STATUS,
};

const TABLE: &str = "learning_resources";

const COLUMNS: &str = "id, title, url, description, technology, type, status, priority, rating, \
                       estimated_time, progress, notes, tags, completed_at, created_at, updated_at";

fn resource_from_row(row: &Row<'_>) -> std::result::Result<Resource, StoreError> {
    let id: String = get(row, 0, TABLE, "id")?;
    let tags: String = get(row, 12, TABLE, "tags")?;
    let completed_at: Option<String> = get_opt(row, 13, TABLE, "completed_at")?;
    let created_at: String = get(row, 14, TABLE, "created_at")?;
    let updated_at: String = get(row, 15, TABLE, "updated_at")?;

    Ok(Resource {
        id: parse_enum(&id, TABLE, "id")?,
        title: get(row, 1, TABLE, "title")?,
        url: get_opt(row, 2, TABLE, "url")?,
        description: get_opt(row, 3, TABLE, "description")?,
        technology: get(row, 4, TABLE, "technology")?,
        resource_type: get(row, 5, TABLE, "type")?,
        status: get_opt(row, 6, TABLE, "status")?,
        priority: get_opt(row, 7, TABLE, "priority")?,
        rating: get_opt(row, 8, TABLE, "rating")?,
        estimated_time: get_opt(row, 9, TABLE, "estimated_time")?,
        progress: get_opt(row, 10, TABLE, "progress")?,
        notes: get_opt(row, 11, TABLE, "notes")?,
        tags: parse_tags(&tags, TABLE)?,
        completed_at: completed_at
            .map(|c| parse_timestamp(&c, TABLE, "completed_at"))
            .transpose()?,
        created_at: parse_timestamp(&created_at, TABLE, "created_at")?,
        updated_at: parse_timestamp(&updated_at, TABLE, "updated_at")?,
    })
}

/// `completed_at` after a status change: stamped on entering completed,
/// kept while completed, cleared on leaving.
fn completed_at_for(
    status: Option<&str>,
    previous: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    if status == Some(COMPLETED_STATUS) {
        previous.or(Some(now))
    } else {
        None
    }
}

fn bump(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    now.max(previous + Duration::microseconds(1))
}

fn write(conn: &Connection, resource: &Resource, insert: bool) -> Result<()> {
    let sql = if insert {
        format!(
            "INSERT INTO learning_resources ({COLUMNS}) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)"
        )
    } else {
        "UPDATE learning_resources SET title = ?2, url = ?3, description = ?4, \
         technology = ?5, type = ?6, status = ?7, priority = ?8, rating = ?9, \
         estimated_time = ?10, progress = ?11, notes = ?12, tags = ?13, \
         completed_at = ?14, created_at = ?15, updated_at = ?16 WHERE id = ?1"
            .to_string()
    };
    let _ = conn.execute(
        &sql,
        params![
            resource.id.to_string(),
            resource.title,
            resource.url,
            resource.description,
            resource.technology,
            resource.resource_type,
            resource.status,
            resource.priority,
            resource.rating,
            resource.estimated_time,
            resource.progress,
            resource.notes,
            tags_to_json(&resource.tags)?,
            resource.completed_at.map(format_timestamp),
            format_timestamp(resource.created_at),
            format_timestamp(resource.updated_at),
        ],
    )?;
    Ok(())
}

fn group_counts(conn: &Connection, column: &str) -> Result<BTreeMap<String, i64>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {column}, COUNT(*) FROM learning_resources GROUP BY {column}"
    ))?;
    let mut rows = stmt.query([])?;
    let mut counts = BTreeMap::new();
    while let Some(row) = rows.next()? {
        let _ = counts.insert(row.get(0)?, row.get(1)?);
    }
    Ok(counts)
}

/// Resource repository.
pub struct ResourceRepository;

impl ResourceRepository {
    /// Insert a new resource.
    #[instrument(skip_all)]
    pub fn create(conn: &Connection, input: ResourceInput) -> Result<Resource> {
        let input = input.normalized()?;
        let now = Utc::now();
        let resource = Resource {
            id: ResourceId::new(),
            completed_at: completed_at_for(input.status.as_deref(), None, now),
            title: input.title,
            url: input.url,
            description: input.description,
            technology: input.technology,
            resource_type: input.resource_type,
            status: input.status,
            priority: input.priority,
            rating: input.rating,
            estimated_time: input.estimated_time,
            progress: input.progress,
            notes: input.notes,
            tags: input.tags.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        };
        write(conn, &resource, true)?;
        debug!(resource_id = %resource.id, "resource created");
        Self::get(conn, resource.id)?.ok_or(ResourceError::NotFound(resource.id))
    }

    /// Fetch one resource.
    #[instrument(skip(conn))]
    pub fn get(conn: &Connection, id: ResourceId) -> Result<Option<Resource>> {
        let row = conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM learning_resources WHERE id = ?1"),
                params![id.to_string()],
                |row| Ok(resource_from_row(row)),
            )
            .optional()?;
        Ok(row.transpose()?)
    }

    fn require(conn: &Connection, id: ResourceId) -> Result<Resource> {
        Self::get(conn, id)?.ok_or(ResourceError::NotFound(id))
    }

    /// One page, newest first.
    #[instrument(skip_all, fields(page = plan.page, limit = plan.limit))]
    pub fn list(conn: &Connection, plan: &ResourceListPlan) -> Result<ResourceListResult> {
        let where_sql = plan.filter.where_clause();
        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM learning_resources {where_sql}"),
            params_from_iter(plan.filter.values().iter()),
            |row| row.get(0),
        )?;

        let mut values = plan.filter.values().to_vec();
        values.push(plan.limit.into());
        values.push(plan.offset().into());
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM learning_resources {where_sql} \
             ORDER BY created_at DESC, id ASC LIMIT ? OFFSET ?"
        ))?;
        let mut rows = stmt.query(params_from_iter(values.iter()))?;
        let mut resources = Vec::new();
        while let Some(row) = rows.next()? {
            resources.push(resource_from_row(row)?);
        }
        debug!(
            predicates = plan.filter.len(),
            total,
            returned = resources.len(),
            "resources listed"
        );

        Ok(ResourceListResult {
            resources,
            page: plan.page,
            limit: plan.limit,
            total,
            total_pages: total_pages(total, plan.limit),
        })
    }

    /// Replace every mutable field.
    #[instrument(skip(conn, input))]
    pub fn replace(conn: &Connection, id: ResourceId, input: ResourceInput) -> Result<Resource> {
        let input = input.normalized()?;
        let existing = Self::require(conn, id)?;
        let now = Utc::now();
        let resource = Resource {
            id,
            completed_at: completed_at_for(input.status.as_deref(), existing.completed_at, now),
            title: input.title,
            url: input.url,
            description: input.description,
            technology: input.technology,
            resource_type: input.resource_type,
            status: input.status,
            priority: input.priority,
            rating: input.rating,
            estimated_time: input.estimated_time,
            progress: input.progress,
            notes: input.notes,
            tags: input.tags.unwrap_or_default(),
            created_at: existing.created_at,
            updated_at: bump(existing.updated_at, now),
        };
        write(conn, &resource, false)?;
        Self::require(conn, id)
    }

    /// Set the status, stamping or clearing `completed_at`.
    #[instrument(skip(conn))]
    pub fn update_status(conn: &Connection, id: ResourceId, status: &str) -> Result<Resource> {
        let status = status.trim();
        if status.is_empty() {
            return Err(ResourceError::validation("status is required"));
        }
        let existing = Self::require(conn, id)?;
        let now = Utc::now();
        let completed_at = completed_at_for(Some(status), existing.completed_at, now);
        let _ = conn.execute(
            "UPDATE learning_resources SET status = ?2, completed_at = ?3, updated_at = ?4 \
             WHERE id = ?1",
            params![
                id.to_string(),
                status,
                completed_at.map(format_timestamp),
                format_timestamp(bump(existing.updated_at, now)),
            ],
        )?;
        Self::require(conn, id)
    }

    /// Set the rating (1 to 5).
    #[instrument(skip(conn))]
    pub fn update_rating(conn: &Connection, id: ResourceId, rating: i64) -> Result<Resource> {
        let rating = check_rating(rating)?;
        let existing = Self::require(conn, id)?;
        let _ = conn.execute(
            "UPDATE learning_resources SET rating = ?2, updated_at = ?3 WHERE id = ?1",
            params![
                id.to_string(),
                rating,
                format_timestamp(bump(existing.updated_at, Utc::now())),
            ],
        )?;
        Self::require(conn, id)
    }

    /// Delete a resource. Returns whether a row was removed.
    #[instrument(skip(conn))]
    pub fn delete(conn: &Connection, id: ResourceId) -> Result<bool> {
        let changed = conn.execute(
            "DELETE FROM learning_resources WHERE id = ?1",
            params![id.to_string()],
        )?;
        Ok(changed > 0)
    }

    /// Distinct technologies, sorted.
    #[instrument(skip(conn))]
    pub fn technologies(conn: &Connection) -> Result<Vec<String>> {
        let mut stmt = conn.prepare(
            "SELECT DISTINCT technology FROM learning_resources \
             WHERE technology != '' ORDER BY technology",
        )?;
        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(row.get(0)?);
        }
        Ok(out)
    }

    /// Catalogue statistics; the weekly window ends at `now`.
    #[instrument(skip(conn))]
    pub fn stats(conn: &Connection, now: DateTime<Utc>) -> Result<ResourceStats> {
        let week_ago = format_timestamp(now - Duration::days(7));
        let mut stats = conn.query_row(
            "SELECT
               COUNT(*),
               COALESCE(SUM(status = 'completed'), 0),
               COALESCE(SUM(status = 'in-progress'), 0),
               COALESCE(SUM(status = 'to-read'), 0),
               COALESCE(SUM(status = 'bookmarked'), 0),
               COALESCE(SUM(CASE WHEN status = 'completed' AND completed_at >= ?1
                                 THEN estimated_time END), 0),
               COALESCE(AVG(rating), 0.0)
             FROM learning_resources",
            params![week_ago],
            |row| {
                let weekly_minutes: i64 = row.get(5)?;
                #[allow(clippy::cast_precision_loss)]
                let weekly_hours = weekly_minutes as f64 / 60.0;
                Ok(ResourceStats {
                    total_resources: row.get(0)?,
                    completed_count: row.get(1)?,
                    in_progress_count: row.get(2)?,
                    to_read_count: row.get(3)?,
                    bookmarked_count: row.get(4)?,
                    weekly_hours,
                    avg_rating: row.get(6)?,
                    ..ResourceStats::default()
                })
            },
        )?;
        stats.technology_breakdown = group_counts(conn, "technology")?;
        stats.type_breakdown = group_counts(conn, "type")?;
        Ok(stats)
    }
}
