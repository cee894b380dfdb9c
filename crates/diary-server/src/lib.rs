//! # diary-server
//!
//! HTTP boundary for the diary backend.
//!
//! - **[`server`]**: [`AppState`] and the axum [`Router`](axum::Router) with
//!   every route mounted under `/api/v1`
//! - **[`handlers`]**: one handler set per entity; parse, call the
//!   repository on the blocking pool, shape the response
//! - **[`cors`]**: allow-list CORS that answers every `OPTIONS` with 204
//! - **[`error`]**: [`ApiError`] and the `{"error": "..."}` body
//! - **[`health`]**: `GET /health`
//! - **[`shutdown`]**: signal-driven graceful shutdown

#![deny(unsafe_code)]

pub mod cors;
pub mod error;
pub mod handlers;
pub mod health;
pub mod server;
pub mod shutdown;

pub use error::ApiError;
pub use server::{build_router, AppState};
pub use shutdown::ShutdownCoordinator;
