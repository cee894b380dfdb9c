//! SQL data access for tasks.
//!
//! All methods take a `&Connection` and are stateless: they translate
//! between [`Task`] and rows. Callers run them through
//! `diary_store::Database::call`.

use chrono::{NaiveDate, Utc};
use diary_core::{ProjectId, TaskId};
use diary_store::sql::{
    format_date, format_timestamp, get, get_opt, parse_date, parse_enum, parse_tags,
    parse_timestamp, tags_to_json,
};
use diary_store::StoreError;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use tracing::{debug, instrument};

use crate::errors::{Result, TaskError};
use crate::filter::TaskListPlan;
use crate::types::{Task, TaskCreateParams, TaskListResult, TaskStats, TaskUpdate};
use crate::update::{resolve_update, validate_title};

const TABLE: &str = "tasks";

const COLUMNS: &str = "id, title, description, completed, due_date, priority, category, \
                       status, project_id, tags, created_at, updated_at";

fn task_from_row(row: &Row<'_>) -> std::result::Result<Task, StoreError> {
    let id: String = get(row, 0, TABLE, "id")?;
    let due_date: String = get(row, 4, TABLE, "due_date")?;
    let priority: String = get(row, 5, TABLE, "priority")?;
    let category: String = get(row, 6, TABLE, "category")?;
    let status: String = get(row, 7, TABLE, "status")?;
    let project_id: Option<String> = get_opt(row, 8, TABLE, "project_id")?;
    let tags: String = get(row, 9, TABLE, "tags")?;
    let created_at: String = get(row, 10, TABLE, "created_at")?;
    let updated_at: String = get(row, 11, TABLE, "updated_at")?;

    Ok(Task {
        id: parse_enum::<TaskId>(&id, TABLE, "id")?,
        title: get(row, 1, TABLE, "title")?,
        description: get_opt(row, 2, TABLE, "description")?,
        completed: get(row, 3, TABLE, "completed")?,
        due_date: parse_date(&due_date, TABLE, "due_date")?,
        priority: parse_enum(&priority, TABLE, "priority")?,
        category: parse_enum(&category, TABLE, "category")?,
        status: parse_enum(&status, TABLE, "status")?,
        project_id: project_id
            .map(|p| parse_enum::<ProjectId>(&p, TABLE, "project_id"))
            .transpose()?,
        tags: parse_tags(&tags, TABLE)?,
        created_at: parse_timestamp(&created_at, TABLE, "created_at")?,
        updated_at: parse_timestamp(&updated_at, TABLE, "updated_at")?,
    })
}

fn collect(rows: &mut rusqlite::Rows<'_>) -> Result<Vec<Task>> {
    let mut tasks = Vec::new();
    while let Some(row) = rows.next()? {
        tasks.push(task_from_row(row)?);
    }
    Ok(tasks)
}

fn count(conn: &Connection, where_sql: &str, values: &[rusqlite::types::Value]) -> Result<i64> {
    let sql = format!("SELECT COUNT(*) FROM tasks {where_sql}");
    Ok(conn.query_row(&sql, params_from_iter(values.iter()), |row| row.get(0))?)
}

/// Task repository.
pub struct TaskRepository;

impl TaskRepository {
    /// Insert a new task with server-assigned id and timestamps.
    #[instrument(skip_all)]
    pub fn create(conn: &Connection, params: &TaskCreateParams) -> Result<Task> {
        let now = Utc::now();
        let task = Task {
            id: TaskId::new(),
            title: validate_title(&params.title)?,
            description: params.description.clone(),
            completed: false,
            due_date: params.due_date.0,
            priority: params.priority.unwrap_or_default(),
            category: params.category.unwrap_or_default(),
            status: params.status.unwrap_or_default(),
            project_id: params.project_id,
            tags: params.tags.clone().unwrap_or_default(),
            created_at: now,
            updated_at: now,
        };

        let ts = format_timestamp(now);
        let _ = conn.execute(
            &format!(
                "INSERT INTO tasks ({COLUMNS}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)"
            ),
            params![
                task.id.to_string(),
                task.title,
                task.description,
                task.completed,
                format_date(task.due_date),
                task.priority.as_sql(),
                task.category.as_sql(),
                task.status.as_sql(),
                task.project_id.map(|p| p.to_string()),
                tags_to_json(&task.tags)?,
                ts,
            ],
        )?;

        debug!(task_id = %task.id, "task created");
        // Re-read so the response carries exactly what was stored.
        Self::get(conn, task.id)?.ok_or(TaskError::NotFound(task.id))
    }

    /// Fetch one task.
    #[instrument(skip(conn))]
    pub fn get(conn: &Connection, id: TaskId) -> Result<Option<Task>> {
        let row = conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM tasks WHERE id = ?1"),
                params![id.to_string()],
                |row| Ok(task_from_row(row)),
            )
            .optional()?;
        Ok(row.transpose()?)
    }

    /// Run a list plan: one page plus the total over the same predicates.
    #[instrument(skip_all, fields(limit = plan.limit, offset = plan.offset))]
    pub fn list(conn: &Connection, plan: &TaskListPlan) -> Result<TaskListResult> {
        let where_sql = plan.filter.where_clause();
        let total = count(conn, &where_sql, plan.filter.values())?;

        let sql = format!(
            "SELECT {COLUMNS} FROM tasks {where_sql} ORDER BY {} LIMIT ? OFFSET ?",
            plan.order_clause()
        );
        let mut values = plan.filter.values().to_vec();
        values.push(plan.limit.into());
        values.push(plan.offset.into());

        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(values.iter()))?;
        let tasks = collect(&mut rows)?;
        debug!(predicates = plan.filter.len(), total, returned = tasks.len(), "tasks listed");

        Ok(TaskListResult {
            tasks,
            total,
            limit: plan.limit,
            offset: plan.offset,
        })
    }

    /// Apply a sparse update. Fails with [`TaskError::NotFound`] if missing.
    #[instrument(skip(conn, update))]
    pub fn update(conn: &Connection, id: TaskId, update: TaskUpdate) -> Result<Task> {
        let existing = Self::get(conn, id)?.ok_or(TaskError::NotFound(id))?;
        let resolved = resolve_update(&existing, update, Utc::now())?;

        let set = resolved
            .assignments()
            .iter()
            .map(|(column, _)| format!("{column} = ?"))
            .collect::<Vec<_>>()
            .join(", ");
        let mut values: Vec<rusqlite::types::Value> = resolved
            .assignments()
            .iter()
            .map(|(_, value)| value.clone())
            .collect();
        values.push(id.to_string().into());

        let changed = conn.execute(
            &format!("UPDATE tasks SET {set} WHERE id = ?"),
            params_from_iter(values.iter()),
        )?;
        if changed == 0 {
            return Err(TaskError::NotFound(id));
        }

        debug!(task_id = %id, columns = resolved.assignments().len(), "task updated");
        Self::get(conn, id)?.ok_or(TaskError::NotFound(id))
    }

    /// Delete a task. Returns whether a row was removed.
    #[instrument(skip(conn))]
    pub fn delete(conn: &Connection, id: TaskId) -> Result<bool> {
        let changed = conn.execute("DELETE FROM tasks WHERE id = ?1", params![id.to_string()])?;
        Ok(changed > 0)
    }

    /// Dashboard counters relative to `today`.
    #[instrument(skip(conn))]
    pub fn stats(conn: &Connection, today: NaiveDate) -> Result<TaskStats> {
        let yesterday = today.pred_opt().unwrap_or(today);
        let stats = conn.query_row(
            "SELECT
               COUNT(*),
               COALESCE(SUM(due_date = ?1), 0),
               COALESCE(SUM(due_date = ?1 AND completed = 1), 0),
               COALESCE(SUM(completed = 0 AND status != 'cancelled'), 0),
               COALESCE(SUM(completed = 1), 0),
               COALESCE(SUM(due_date <= ?2 AND completed = 0), 0)
             FROM tasks",
            params![format_date(today), format_date(yesterday)],
            |row| {
                Ok(TaskStats {
                    total: row.get(0)?,
                    today: row.get(1)?,
                    today_completed: row.get(2)?,
                    in_progress: row.get(3)?,
                    completed: row.get(4)?,
                    overdue: row.get(5)?,
                })
            },
        )?;
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::TaskListQuery;
    use crate::types::{Category, DueDate, Priority, TaskStatus};
    use assert_matches::assert_matches;
    use diary_core::Patch;
    use std::collections::HashSet;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        diary_store::sql::register_functions(&conn).unwrap();
        let _ = diary_store::migrations::run_migrations(&conn).unwrap();
        conn
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn params(title: &str, due: NaiveDate) -> TaskCreateParams {
        TaskCreateParams {
            title: title.into(),
            description: None,
            due_date: DueDate(due),
            priority: None,
            category: None,
            status: None,
            project_id: None,
            tags: None,
        }
    }

    fn create(conn: &Connection, p: TaskCreateParams) -> Task {
        TaskRepository::create(conn, &p).unwrap()
    }

    fn list(conn: &Connection, query: TaskListQuery, today: NaiveDate) -> TaskListResult {
        let plan = query.into_plan(today).unwrap();
        TaskRepository::list(conn, &plan).unwrap()
    }

    #[test]
    fn create_applies_defaults() {
        let conn = setup();
        let task = create(&conn, params("  Buy milk ", date(2024, 6, 1)));
        assert_eq!(task.title, "Buy milk");
        assert!(!task.completed);
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.category, Category::Personal);
        assert_eq!(task.status, TaskStatus::Pending);
        assert!(task.tags.is_empty());
        assert_eq!(task.created_at, task.updated_at);
    }

    #[test]
    fn create_rejects_blank_title() {
        let conn = setup();
        let result = TaskRepository::create(&conn, &params("   ", date(2024, 6, 1)));
        assert_matches!(result, Err(TaskError::Validation(_)));
    }

    #[test]
    fn get_round_trips_all_fields() {
        let conn = setup();
        let project = ProjectId::new();
        let created = create(
            &conn,
            TaskCreateParams {
                description: Some("details".into()),
                priority: Some(Priority::Urgent),
                category: Some(Category::Research),
                status: Some(TaskStatus::Review),
                project_id: Some(project),
                tags: Some(vec!["b".into(), "a".into()]),
                ..params("Full", date(2024, 2, 29))
            },
        );
        let fetched = TaskRepository::get(&conn, created.id).unwrap().unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.tags, ["b", "a"]);
        assert_eq!(fetched.project_id, Some(project));
    }

    #[test]
    fn get_missing_is_none() {
        let conn = setup();
        assert!(TaskRepository::get(&conn, TaskId::new()).unwrap().is_none());
    }

    #[test]
    fn corrupt_enum_surfaces_as_store_error() {
        let conn = setup();
        let task = create(&conn, params("t", date(2024, 1, 1)));
        // Bypass the CHECK constraint to simulate a hand-edited row.
        conn.execute_batch("PRAGMA ignore_check_constraints = ON").unwrap();
        let _ = conn
            .execute("UPDATE tasks SET priority = 'extreme'", [])
            .unwrap();
        assert_matches!(
            TaskRepository::get(&conn, task.id),
            Err(TaskError::Store(StoreError::CorruptRow { column: "priority", .. }))
        );
    }

    #[test]
    fn update_completed_forces_status_and_keeps_rest() {
        let conn = setup();
        let task = create(&conn, params("Report", date(2024, 6, 1)));
        let update = TaskUpdate {
            completed: Patch::Value(true),
            ..TaskUpdate::default()
        };
        let updated = TaskRepository::update(&conn, task.id, update).unwrap();
        assert!(updated.completed);
        assert_eq!(updated.status, TaskStatus::Completed);
        assert_eq!(updated.title, task.title);
        assert_eq!(updated.due_date, task.due_date);
        assert_eq!(updated.created_at, task.created_at);
        assert!(updated.updated_at > task.updated_at);
    }

    #[test]
    fn update_with_empty_body_bumps_timestamp() {
        let conn = setup();
        let task = create(&conn, params("Report", date(2024, 6, 1)));
        let first = TaskRepository::update(&conn, task.id, TaskUpdate::default()).unwrap();
        let second = TaskRepository::update(&conn, task.id, TaskUpdate::default()).unwrap();
        assert!(first.updated_at > task.updated_at);
        assert!(second.updated_at > first.updated_at);
        assert_eq!(second.title, task.title);
    }

    #[test]
    fn update_null_clears_description() {
        let conn = setup();
        let task = create(
            &conn,
            TaskCreateParams {
                description: Some("x".into()),
                ..params("t", date(2024, 6, 1))
            },
        );
        let update = TaskUpdate {
            description: Patch::Null,
            ..TaskUpdate::default()
        };
        let updated = TaskRepository::update(&conn, task.id, update).unwrap();
        assert!(updated.description.is_none());
    }

    #[test]
    fn update_missing_is_not_found() {
        let conn = setup();
        let id = TaskId::new();
        assert_matches!(
            TaskRepository::update(&conn, id, TaskUpdate::default()),
            Err(TaskError::NotFound(missing)) if missing == id
        );
    }

    #[test]
    fn delete_then_get() {
        let conn = setup();
        let task = create(&conn, params("t", date(2024, 6, 1)));
        assert!(TaskRepository::delete(&conn, task.id).unwrap());
        assert!(TaskRepository::get(&conn, task.id).unwrap().is_none());
        assert!(!TaskRepository::delete(&conn, task.id).unwrap());
    }

    #[test]
    fn list_filters_conjunctively() {
        let conn = setup();
        let today = date(2024, 6, 5);
        let _ = create(
            &conn,
            TaskCreateParams {
                category: Some(Category::Office),
                priority: Some(Priority::High),
                tags: Some(vec!["rust".into(), "work".into()]),
                ..params("Ship release", today)
            },
        );
        let _ = create(
            &conn,
            TaskCreateParams {
                category: Some(Category::Office),
                priority: Some(Priority::Low),
                tags: Some(vec!["rust".into()]),
                ..params("Review PR", today)
            },
        );
        let _ = create(
            &conn,
            TaskCreateParams {
                category: Some(Category::Personal),
                priority: Some(Priority::High),
                tags: Some(vec!["work".into()]),
                ..params("Gym", today)
            },
        );

        let result = list(
            &conn,
            TaskListQuery {
                category: Some("office".into()),
                tags: Some("rust,work".into()),
                ..TaskListQuery::default()
            },
            today,
        );
        assert_eq!(result.total, 1);
        assert_eq!(result.tasks[0].title, "Ship release");
        for task in &result.tasks {
            assert_eq!(task.category, Category::Office);
            assert!(task.tags.iter().any(|t| t == "rust"));
            assert!(task.tags.iter().any(|t| t == "work"));
        }
    }

    #[test]
    fn list_search_matches_title_or_description() {
        let conn = setup();
        let today = date(2024, 6, 5);
        let _ = create(&conn, params("Read the Book", today));
        let _ = create(
            &conn,
            TaskCreateParams {
                description: Some("chapter about BOOKS".into()),
                ..params("Study", today)
            },
        );
        let _ = create(&conn, params("Other", today));

        let result = list(
            &conn,
            TaskListQuery {
                search: Some("book".into()),
                ..TaskListQuery::default()
            },
            today,
        );
        assert_eq!(result.total, 2);
    }

    #[test]
    fn list_search_folds_non_ascii_case() {
        let conn = setup();
        let today = date(2024, 6, 5);
        let apples = create(&conn, params("ÄPFEL kaufen", today));
        let _ = create(&conn, params("Birnen", today));

        for needle in ["äpfel", "ÄPFEL", "ÄPFEL kaufen"] {
            let result = list(
                &conn,
                TaskListQuery {
                    search: Some(needle.into()),
                    ..TaskListQuery::default()
                },
                today,
            );
            assert_eq!(result.total, 1, "{needle}");
            assert_eq!(result.tasks[0].id, apples.id);
        }
    }

    #[test]
    fn overdue_excludes_completed_and_future() {
        let conn = setup();
        let today = date(2024, 6, 5);
        let late = create(&conn, params("late", date(2024, 6, 1)));
        let yesterday = create(&conn, params("yesterday", date(2024, 6, 4)));
        let _ = create(&conn, params("today", today));
        let done = create(&conn, params("done", date(2024, 6, 1)));
        let _ = TaskRepository::update(
            &conn,
            done.id,
            TaskUpdate {
                completed: Patch::Value(true),
                ..TaskUpdate::default()
            },
        )
        .unwrap();

        let result = list(
            &conn,
            TaskListQuery {
                date_filter: Some("overdue".into()),
                ..TaskListQuery::default()
            },
            today,
        );
        let ids: HashSet<TaskId> = result.tasks.iter().map(|t| t.id).collect();
        assert_eq!(ids, HashSet::from([late.id, yesterday.id]));
        for task in &result.tasks {
            assert!(!task.completed);
            assert!(task.due_date < today);
        }
    }

    #[test]
    fn this_week_window() {
        let conn = setup();
        let wednesday = date(2024, 6, 5);
        let _ = create(&conn, params("tue", date(2024, 6, 4)));
        let _ = create(&conn, params("wed", wednesday));
        let _ = create(&conn, params("sun", date(2024, 6, 9)));
        let _ = create(&conn, params("mon", date(2024, 6, 10)));

        let result = list(
            &conn,
            TaskListQuery {
                date_filter: Some("this-week".into()),
                ..TaskListQuery::default()
            },
            wednesday,
        );
        let titles: Vec<_> = result.tasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["wed", "sun"]);
    }

    #[test]
    fn priority_sort_uses_rank() {
        let conn = setup();
        let today = date(2024, 6, 5);
        for (title, priority) in [
            ("a", Priority::Low),
            ("b", Priority::Urgent),
            ("c", Priority::Medium),
            ("d", Priority::High),
        ] {
            let _ = create(
                &conn,
                TaskCreateParams {
                    priority: Some(priority),
                    ..params(title, today)
                },
            );
        }

        let asc = list(
            &conn,
            TaskListQuery {
                sort_by: Some("priority".into()),
                sort_order: Some("asc".into()),
                ..TaskListQuery::default()
            },
            today,
        );
        let order: Vec<_> = asc.tasks.iter().map(|t| t.priority).collect();
        assert_eq!(
            order,
            [Priority::Low, Priority::Medium, Priority::High, Priority::Urgent]
        );

        let desc = list(
            &conn,
            TaskListQuery {
                sort_by: Some("priority".into()),
                sort_order: Some("desc".into()),
                ..TaskListQuery::default()
            },
            today,
        );
        assert_eq!(desc.tasks[0].priority, Priority::Urgent);
    }

    #[test]
    fn paging_covers_each_row_once() {
        let conn = setup();
        let today = date(2024, 6, 5);
        let mut created = HashSet::new();
        for i in 0..7 {
            // Shared due dates force the id tiebreaker to decide order.
            let task = create(&conn, params(&format!("t{i}"), date(2024, 6, 1 + i % 2)));
            let _ = created.insert(task.id);
        }

        let mut seen = Vec::new();
        let mut offset = 0;
        loop {
            let page = list(
                &conn,
                TaskListQuery {
                    limit: Some(3),
                    offset: Some(offset),
                    ..TaskListQuery::default()
                },
                today,
            );
            assert_eq!(page.total, 7);
            if page.tasks.is_empty() {
                break;
            }
            seen.extend(page.tasks.iter().map(|t| t.id));
            offset += 3;
        }
        assert_eq!(seen.len(), 7);
        assert_eq!(seen.into_iter().collect::<HashSet<_>>(), created);
    }

    #[test]
    fn stats_counts() {
        let conn = setup();
        let today = date(2024, 6, 5);
        let _ = create(&conn, params("due today", today));
        let done_today = create(&conn, params("done today", today));
        let _ = TaskRepository::update(
            &conn,
            done_today.id,
            TaskUpdate {
                completed: Patch::Value(true),
                ..TaskUpdate::default()
            },
        )
        .unwrap();
        let _ = create(&conn, params("late", date(2024, 6, 1)));
        let _ = create(
            &conn,
            TaskCreateParams {
                status: Some(TaskStatus::Cancelled),
                ..params("dropped", date(2024, 7, 1))
            },
        );

        let stats = TaskRepository::stats(&conn, today).unwrap();
        assert_eq!(
            stats,
            TaskStats {
                total: 4,
                today: 2,
                today_completed: 1,
                in_progress: 2,
                completed: 1,
                overdue: 1,
            }
        );
    }

    #[test]
    fn stats_on_empty_table() {
        let conn = setup();
        let stats = TaskRepository::stats(&conn, date(2024, 6, 5)).unwrap();
        assert_eq!(stats, TaskStats::default());
    }
}
