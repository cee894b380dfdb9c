//! `/api/v1/resources` handlers.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use diary_core::ResourceId;
use diary_resources::{
    validate_import_url, AppliedFilters, ImportRequest, RatingUpdate, Resource, ResourceInput,
    ResourceListQuery, ResourceRepository, ResourceStats, StatusUpdate,
};
use serde::Serialize;
use tracing::debug;

use super::MessageResponse;
use crate::error::ApiError;
use crate::server::AppState;

/// `pagination` block of a resource listing.
#[derive(Debug, Serialize)]
pub struct ResourcePagination {
    /// 1-based page.
    pub page: i64,
    /// Page size.
    pub limit: i64,
    /// Rows matching the filter.
    pub total: i64,
    /// `ceil(total / limit)`.
    pub total_pages: i64,
}

/// `GET /resources` body.
#[derive(Debug, Serialize)]
pub struct ResourceListResponse {
    /// Page of resources.
    pub resources: Vec<Resource>,
    /// Paging metadata.
    pub pagination: ResourcePagination,
    /// Filters as applied.
    pub filters: AppliedFilters,
}

/// `{"resource": ...}` body.
#[derive(Debug, Serialize)]
pub struct ResourceResponse {
    /// The resource.
    pub resource: Resource,
}

/// `{"message": ..., "resource": ...}` body.
#[derive(Debug, Serialize)]
pub struct ResourceMessageResponse {
    /// Outcome description.
    pub message: &'static str,
    /// The resource after the change.
    pub resource: Resource,
}

/// `GET /resources/technologies` body.
#[derive(Debug, Serialize)]
pub struct TechnologiesResponse {
    /// Distinct technologies, sorted.
    pub technologies: Vec<String>,
}

fn parse_id(raw: &str) -> Result<ResourceId, ApiError> {
    ResourceId::parse(raw).map_err(|_| ApiError::BadRequest("Invalid resource ID".into()))
}

/// GET /resources
pub async fn list_resources(
    State(state): State<AppState>,
    query: Result<Query<ResourceListQuery>, QueryRejection>,
) -> Result<Json<ResourceListResponse>, ApiError> {
    let Query(query) = query?;
    let plan = query.into_plan();
    let filters = plan.applied.clone();
    let result = state
        .db
        .call(move |conn| ResourceRepository::list(conn, &plan))
        .await
        .map_err(|e| ApiError::from_resource(e, "Failed to fetch resources"))?;

    Ok(Json(ResourceListResponse {
        resources: result.resources,
        pagination: ResourcePagination {
            page: result.page,
            limit: result.limit,
            total: result.total,
            total_pages: result.total_pages,
        },
        filters,
    }))
}

/// GET /resources/{id}
pub async fn get_resource(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ResourceResponse>, ApiError> {
    let id = parse_id(&id)?;
    let resource = state
        .db
        .call(move |conn| ResourceRepository::get(conn, id))
        .await
        .map_err(|e| ApiError::from_resource(e, "Failed to fetch resource"))?
        .ok_or_else(|| ApiError::NotFound("Resource not found".into()))?;
    Ok(Json(ResourceResponse { resource }))
}

/// POST /resources
pub async fn create_resource(
    State(state): State<AppState>,
    body: Result<Json<ResourceInput>, JsonRejection>,
) -> Result<(StatusCode, Json<ResourceMessageResponse>), ApiError> {
    let Json(input) = body?;
    let resource = state
        .db
        .call(move |conn| ResourceRepository::create(conn, input))
        .await
        .map_err(|e| ApiError::from_resource(e, "Failed to create resource"))?;
    Ok((
        StatusCode::CREATED,
        Json(ResourceMessageResponse {
            message: "Resource created successfully",
            resource,
        }),
    ))
}

/// PUT /resources/{id}
pub async fn update_resource(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<ResourceInput>, JsonRejection>,
) -> Result<Json<ResourceMessageResponse>, ApiError> {
    let id = parse_id(&id)?;
    let Json(input) = body?;
    let resource = state
        .db
        .call(move |conn| ResourceRepository::replace(conn, id, input))
        .await
        .map_err(|e| ApiError::from_resource(e, "Failed to update resource"))?;
    Ok(Json(ResourceMessageResponse {
        message: "Resource updated successfully",
        resource,
    }))
}

/// DELETE /resources/{id}
pub async fn delete_resource(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&id)?;
    let deleted = state
        .db
        .call(move |conn| ResourceRepository::delete(conn, id))
        .await
        .map_err(|e| ApiError::from_resource(e, "Failed to delete resource"))?;
    if !deleted {
        return Err(ApiError::NotFound("Resource not found".into()));
    }
    Ok(Json(MessageResponse {
        message: "Resource deleted successfully",
    }))
}

/// PATCH /resources/{id}/status
pub async fn update_resource_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<StatusUpdate>, JsonRejection>,
) -> Result<Json<ResourceMessageResponse>, ApiError> {
    let id = parse_id(&id)?;
    let Json(StatusUpdate { status }) = body?;
    let resource = state
        .db
        .call(move |conn| ResourceRepository::update_status(conn, id, &status))
        .await
        .map_err(|e| ApiError::from_resource(e, "Failed to update resource status"))?;
    Ok(Json(ResourceMessageResponse {
        message: "Resource status updated successfully",
        resource,
    }))
}

/// PATCH /resources/{id}/rating
pub async fn update_resource_rating(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<RatingUpdate>, JsonRejection>,
) -> Result<Json<ResourceMessageResponse>, ApiError> {
    let id = parse_id(&id)?;
    let Json(RatingUpdate { rating }) = body?;
    let resource = state
        .db
        .call(move |conn| ResourceRepository::update_rating(conn, id, rating))
        .await
        .map_err(|e| ApiError::from_resource(e, "Failed to update resource rating"))?;
    Ok(Json(ResourceMessageResponse {
        message: "Resource rating updated successfully",
        resource,
    }))
}

/// GET /resources/stats
pub async fn resource_stats(
    State(state): State<AppState>,
) -> Result<Json<ResourceStats>, ApiError> {
    let now = Utc::now();
    let stats = state
        .db
        .call(move |conn| ResourceRepository::stats(conn, now))
        .await
        .map_err(|e| ApiError::from_resource(e, "Failed to fetch resource stats"))?;
    Ok(Json(stats))
}

/// GET /resources/technologies
pub async fn technologies(
    State(state): State<AppState>,
) -> Result<Json<TechnologiesResponse>, ApiError> {
    let technologies = state
        .db
        .call(ResourceRepository::technologies)
        .await
        .map_err(|e| ApiError::from_resource(e, "Failed to fetch technologies"))?;
    Ok(Json(TechnologiesResponse { technologies }))
}

/// POST /resources/import-url
///
/// Validates the body, then reports that metadata extraction is unavailable.
pub async fn import_from_url(
    body: Result<Json<ImportRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(ImportRequest { url }) = body?;
    let url = validate_import_url(&url)
        .map_err(|e| ApiError::from_resource(e, "Failed to import resource"))?;
    debug!(%url, "url import requested");
    Err(ApiError::NotImplemented(
        "Importing resources from a URL is not implemented".into(),
    ))
}
