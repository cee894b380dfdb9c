//! Router assembly and shared handler state.

use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, patch, post};
use axum::Router;
use diary_settings::Settings;
use diary_store::Database;
use tower_http::trace::TraceLayer;

use crate::cors::{cors_layer, CorsPolicy};
use crate::error::ApiError;
use crate::handlers::{resources, tasks};
use crate::health::health_handler;

/// Shared state accessible from axum handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Connection pool; the only state shared between requests.
    pub db: Database,
    /// Cross-origin allow-list.
    pub cors: Arc<CorsPolicy>,
}

impl AppState {
    /// State from an open database and a CORS policy.
    pub fn new(db: Database, cors: CorsPolicy) -> Self {
        Self {
            db,
            cors: Arc::new(cors),
        }
    }

    /// State from loaded settings.
    pub fn from_settings(db: Database, settings: &Settings) -> Self {
        Self::new(db, CorsPolicy::new(&settings.cors.allowed_origins))
    }
}

fn task_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(tasks::list_tasks).post(tasks::create_task))
        .route("/stats", get(tasks::task_stats))
        .route(
            "/{id}",
            get(tasks::get_task)
                .put(tasks::update_task)
                .delete(tasks::delete_task),
        )
}

fn resource_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(resources::list_resources).post(resources::create_resource),
        )
        .route("/stats", get(resources::resource_stats))
        .route("/technologies", get(resources::technologies))
        .route("/import-url", post(resources::import_from_url))
        .route(
            "/{id}",
            get(resources::get_resource)
                .put(resources::update_resource)
                .delete(resources::delete_resource),
        )
        .route("/{id}/status", patch(resources::update_resource_status))
        .route("/{id}/rating", patch(resources::update_resource_rating))
}

async fn not_found() -> ApiError {
    ApiError::NotFound("Not found".into())
}

/// Build the full application router.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .nest("/tasks", task_routes())
        .nest("/resources", resource_routes());

    Router::new()
        .nest("/api/v1", api)
        .route("/health", get(health_handler))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state.cors.clone(), cors_layer))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
