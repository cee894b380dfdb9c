//! `/api/v1/tasks` handlers.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use diary_core::TaskId;
use diary_tasks::{Task, TaskCreateParams, TaskListQuery, TaskRepository, TaskStats, TaskUpdate};
use serde::Serialize;

use super::{today, MessageResponse};
use crate::error::ApiError;
use crate::server::AppState;

/// `pagination` block of a task listing.
#[derive(Debug, Serialize)]
pub struct TaskPagination {
    /// Rows matching the filter.
    pub total: i64,
    /// Applied page size.
    pub limit: u32,
    /// Applied offset.
    pub offset: u32,
}

/// `GET /tasks` body.
#[derive(Debug, Serialize)]
pub struct TaskListResponse {
    /// Page of tasks.
    pub tasks: Vec<Task>,
    /// Paging metadata.
    pub pagination: TaskPagination,
}

/// `{"task": ...}` body.
#[derive(Debug, Serialize)]
pub struct TaskResponse {
    /// The task.
    pub task: Task,
}

/// `GET /tasks/stats` body.
#[derive(Debug, Serialize)]
pub struct TaskStatsResponse {
    /// Counters.
    pub stats: TaskStats,
}

fn parse_id(raw: &str) -> Result<TaskId, ApiError> {
    TaskId::parse(raw).map_err(|_| ApiError::BadRequest("Invalid task ID format".into()))
}

/// GET /tasks
pub async fn list_tasks(
    State(state): State<AppState>,
    query: Result<Query<TaskListQuery>, QueryRejection>,
) -> Result<Json<TaskListResponse>, ApiError> {
    const FAILED: &str = "Failed to fetch tasks";
    let Query(query) = query?;
    let plan = query
        .into_plan(today())
        .map_err(|e| ApiError::from_task(e, FAILED))?;
    let result = state
        .db
        .call(move |conn| TaskRepository::list(conn, &plan))
        .await
        .map_err(|e| ApiError::from_task(e, FAILED))?;

    Ok(Json(TaskListResponse {
        tasks: result.tasks,
        pagination: TaskPagination {
            total: result.total,
            limit: result.limit,
            offset: result.offset,
        },
    }))
}

/// GET /tasks/{id}
pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TaskResponse>, ApiError> {
    let id = parse_id(&id)?;
    let task = state
        .db
        .call(move |conn| TaskRepository::get(conn, id))
        .await
        .map_err(|e| ApiError::from_task(e, "Failed to fetch task"))?
        .ok_or_else(|| ApiError::NotFound("Task not found".into()))?;
    Ok(Json(TaskResponse { task }))
}

/// POST /tasks
pub async fn create_task(
    State(state): State<AppState>,
    body: Result<Json<TaskCreateParams>, JsonRejection>,
) -> Result<(StatusCode, Json<TaskResponse>), ApiError> {
    let Json(params) = body?;
    let task = state
        .db
        .call(move |conn| TaskRepository::create(conn, &params))
        .await
        .map_err(|e| ApiError::from_task(e, "Failed to create task"))?;
    Ok((StatusCode::CREATED, Json(TaskResponse { task })))
}

/// PUT /tasks/{id}
pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<TaskUpdate>, JsonRejection>,
) -> Result<Json<TaskResponse>, ApiError> {
    let id = parse_id(&id)?;
    let Json(update) = body?;
    let task = state
        .db
        .call(move |conn| TaskRepository::update(conn, id, update))
        .await
        .map_err(|e| ApiError::from_task(e, "Failed to update task"))?;
    Ok(Json(TaskResponse { task }))
}

/// DELETE /tasks/{id}
pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&id)?;
    let deleted = state
        .db
        .call(move |conn| TaskRepository::delete(conn, id))
        .await
        .map_err(|e| ApiError::from_task(e, "Failed to delete task"))?;
    if !deleted {
        return Err(ApiError::NotFound("Task not found".into()));
    }
    Ok(Json(MessageResponse {
        message: "Task deleted successfully",
    }))
}

/// GET /tasks/stats
pub async fn task_stats(
    State(state): State<AppState>,
) -> Result<Json<TaskStatsResponse>, ApiError> {
    let today = today();
    let stats = state
        .db
        .call(move |conn| TaskRepository::stats(conn, today))
        .await
        .map_err(|e| ApiError::from_task(e, "Failed to fetch task stats"))?;
    Ok(Json(TaskStatsResponse { stats }))
}
