//! Partial update resolver.
//!
//! Merges a sparse [`TaskUpdate`] onto the stored [`Task`] and records the
//! column assignments the repository has to write. Absent fields produce no
//! assignment, so a concurrent write to another column is never clobbered.

use chrono::{DateTime, Duration, Utc};
use diary_core::Patch;
use diary_store::sql::{format_date, format_timestamp, tags_to_json};
use rusqlite::types::Value;

use crate::errors::{Result, TaskError};
use crate::types::{Task, TaskStatus, TaskUpdate};

/// Maximum title length, in characters.
pub const MAX_TITLE_CHARS: usize = 255;

/// Trim a title and check it is 1..=255 characters.
pub fn validate_title(raw: &str) -> Result<String> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(TaskError::validation("title is required"));
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(TaskError::validation(format!(
            "title must be at most {MAX_TITLE_CHARS} characters"
        )));
    }
    Ok(title.to_string())
}

/// Outcome of [`resolve_update`].
#[derive(Debug, Clone)]
pub struct ResolvedUpdate {
    /// The task as it will read after the write.
    pub task: Task,
    assignments: Vec<(&'static str, Value)>,
}

impl ResolvedUpdate {
    /// `(column, value)` pairs to write; always ends with `updated_at`.
    pub fn assignments(&self) -> &[(&'static str, Value)] {
        &self.assignments
    }
}

fn required<T>(patch: Patch<T>, field: &str) -> Result<Option<T>> {
    match patch {
        Patch::Absent => Ok(None),
        Patch::Null => Err(TaskError::validation(format!("{field} cannot be null"))),
        Patch::Value(v) => Ok(Some(v)),
    }
}

/// Apply `update` to `existing`.
///
/// `completed: true` on a task whose stored status is not completed forces
/// the status to completed, overriding any status in the same request.
/// `updatedAt` becomes `now`, or one microsecond past the stored value if
/// the clock has not moved forward.
pub fn resolve_update(
    existing: &Task,
    update: TaskUpdate,
    now: DateTime<Utc>,
) -> Result<ResolvedUpdate> {
    let mut task = existing.clone();
    let mut set: Vec<(&'static str, Value)> = Vec::new();

    if let Some(title) = required(update.title, "title")? {
        task.title = validate_title(&title)?;
        set.push(("title", Value::Text(task.title.clone())));
    }
    if let Some(description) = update.description.into_option() {
        set.push(("description", description.clone().map_or(Value::Null, Value::Text)));
        task.description = description;
    }
    let completed = required(update.completed, "completed")?;
    if let Some(completed) = completed {
        task.completed = completed;
        set.push(("completed", completed.into()));
    }
    if let Some(due) = required(update.due_date, "dueDate")? {
        task.due_date = due.0;
        set.push(("due_date", Value::Text(format_date(due.0))));
    }
    if let Some(priority) = required(update.priority, "priority")? {
        task.priority = priority;
        set.push(("priority", Value::Text(priority.as_sql().to_string())));
    }
    if let Some(category) = required(update.category, "category")? {
        task.category = category;
        set.push(("category", Value::Text(category.as_sql().to_string())));
    }

    let mut status = required(update.status, "status")?;
    if completed == Some(true) && existing.status != TaskStatus::Completed {
        status = Some(TaskStatus::Completed);
    }
    if let Some(status) = status {
        task.status = status;
        set.push(("status", Value::Text(status.as_sql().to_string())));
    }

    if let Some(project_id) = update.project_id.into_option() {
        task.project_id = project_id;
        set.push((
            "project_id",
            project_id.map_or(Value::Null, |p| Value::Text(p.to_string())),
        ));
    }
    if let Some(tags) = required(update.tags, "tags")? {
        set.push(("tags", Value::Text(tags_to_json(&tags)?)));
        task.tags = tags;
    }

    task.updated_at = now.max(existing.updated_at + Duration::microseconds(1));
    set.push(("updated_at", Value::Text(format_timestamp(task.updated_at))));

    Ok(ResolvedUpdate {
        task,
        assignments: set,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Category, DueDate, Priority};
    use assert_matches::assert_matches;
    use chrono::NaiveDate;
    use diary_core::{ProjectId, TaskId};

    fn ts(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn pending() -> Task {
        Task {
            id: TaskId::new(),
            title: "Write report".into(),
            description: Some("quarterly".into()),
            completed: false,
            due_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            priority: Priority::Medium,
            category: Category::Office,
            status: TaskStatus::Pending,
            project_id: Some(ProjectId::new()),
            tags: vec!["work".into()],
            created_at: ts("2024-05-01T09:00:00Z"),
            updated_at: ts("2024-05-01T09:00:00Z"),
        }
    }

    fn columns(resolved: &ResolvedUpdate) -> Vec<&'static str> {
        resolved.assignments().iter().map(|(c, _)| *c).collect()
    }

    #[test]
    fn completing_forces_status() {
        let task = pending();
        let update = TaskUpdate {
            completed: Patch::Value(true),
            ..TaskUpdate::default()
        };
        let now = ts("2024-05-02T09:00:00Z");
        let resolved = resolve_update(&task, update, now).unwrap();

        assert!(resolved.task.completed);
        assert_eq!(resolved.task.status, TaskStatus::Completed);
        assert_eq!(resolved.task.title, task.title);
        assert_eq!(resolved.task.description, task.description);
        assert_eq!(resolved.task.tags, task.tags);
        assert_eq!(resolved.task.updated_at, now);
        assert_eq!(columns(&resolved), ["completed", "status", "updated_at"]);
    }

    #[test]
    fn forced_status_overrides_explicit_status() {
        let update = TaskUpdate {
            completed: Patch::Value(true),
            status: Patch::Value(TaskStatus::Review),
            ..TaskUpdate::default()
        };
        let resolved = resolve_update(&pending(), update, Utc::now()).unwrap();
        assert_eq!(resolved.task.status, TaskStatus::Completed);
    }

    #[test]
    fn no_force_when_already_completed() {
        let mut task = pending();
        task.status = TaskStatus::Completed;
        let update = TaskUpdate {
            completed: Patch::Value(true),
            status: Patch::Value(TaskStatus::Review),
            ..TaskUpdate::default()
        };
        let resolved = resolve_update(&task, update, Utc::now()).unwrap();
        assert_eq!(resolved.task.status, TaskStatus::Review);
    }

    #[test]
    fn uncompleting_leaves_status() {
        let mut task = pending();
        task.completed = true;
        task.status = TaskStatus::Completed;
        let update = TaskUpdate {
            completed: Patch::Value(false),
            ..TaskUpdate::default()
        };
        let resolved = resolve_update(&task, update, Utc::now()).unwrap();
        assert!(!resolved.task.completed);
        assert_eq!(resolved.task.status, TaskStatus::Completed);
    }

    #[test]
    fn status_completed_does_not_set_flag() {
        let update = TaskUpdate {
            status: Patch::Value(TaskStatus::Completed),
            ..TaskUpdate::default()
        };
        let resolved = resolve_update(&pending(), update, Utc::now()).unwrap();
        assert!(!resolved.task.completed);
        assert_eq!(resolved.task.status, TaskStatus::Completed);
    }

    #[test]
    fn empty_update_only_touches_timestamp() {
        let task = pending();
        let resolved = resolve_update(&task, TaskUpdate::default(), ts("2024-05-03T00:00:00Z")).unwrap();
        assert_eq!(columns(&resolved), ["updated_at"]);
        let mut expected = task;
        expected.updated_at = resolved.task.updated_at;
        assert_eq!(resolved.task, expected);
    }

    #[test]
    fn updated_at_strictly_increases_with_stale_clock() {
        let task = pending();
        let stale = task.updated_at - Duration::hours(1);
        let resolved = resolve_update(&task, TaskUpdate::default(), stale).unwrap();
        assert!(resolved.task.updated_at > task.updated_at);
    }

    #[test]
    fn null_clears_nullable_fields() {
        let update = TaskUpdate {
            description: Patch::Null,
            project_id: Patch::Null,
            ..TaskUpdate::default()
        };
        let resolved = resolve_update(&pending(), update, Utc::now()).unwrap();
        assert!(resolved.task.description.is_none());
        assert!(resolved.task.project_id.is_none());
        assert_eq!(resolved.assignments()[0], ("description", Value::Null));
        assert_eq!(resolved.assignments()[1], ("project_id", Value::Null));
    }

    #[test]
    fn null_on_required_field_is_rejected() {
        for update in [
            TaskUpdate { title: Patch::Null, ..TaskUpdate::default() },
            TaskUpdate { completed: Patch::Null, ..TaskUpdate::default() },
            TaskUpdate { due_date: Patch::Null, ..TaskUpdate::default() },
            TaskUpdate { status: Patch::Null, ..TaskUpdate::default() },
            TaskUpdate { tags: Patch::Null, ..TaskUpdate::default() },
        ] {
            assert_matches!(
                resolve_update(&pending(), update, Utc::now()),
                Err(TaskError::Validation(msg)) if msg.ends_with("cannot be null")
            );
        }
    }

    #[test]
    fn title_is_trimmed_and_validated() {
        let update = TaskUpdate {
            title: Patch::Value("  New title  ".into()),
            ..TaskUpdate::default()
        };
        let resolved = resolve_update(&pending(), update, Utc::now()).unwrap();
        assert_eq!(resolved.task.title, "New title");

        let blank = TaskUpdate {
            title: Patch::Value("   ".into()),
            ..TaskUpdate::default()
        };
        assert_matches!(
            resolve_update(&pending(), blank, Utc::now()),
            Err(TaskError::Validation(_))
        );
    }

    #[test]
    fn title_length_counts_chars() {
        assert!(validate_title(&"é".repeat(255)).is_ok());
        assert!(validate_title(&"a".repeat(256)).is_err());
    }

    #[test]
    fn values_are_applied() {
        let update = TaskUpdate {
            due_date: Patch::Value(DueDate(NaiveDate::from_ymd_opt(2024, 7, 4).unwrap())),
            priority: Patch::Value(Priority::Urgent),
            tags: Patch::Value(vec![]),
            ..TaskUpdate::default()
        };
        let resolved = resolve_update(&pending(), update, Utc::now()).unwrap();
        assert_eq!(resolved.task.priority, Priority::Urgent);
        assert!(resolved.task.tags.is_empty());
        assert_eq!(
            resolved.assignments()[0],
            ("due_date", Value::Text("2024-07-04".into()))
        );
        assert_eq!(resolved.assignments()[2], ("tags", Value::Text("[]".into())));
    }
}
