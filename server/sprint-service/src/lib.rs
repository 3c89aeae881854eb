//! Sprint Pulse Service
//!
//! HTTP shell around sprint-engine plus the git log reader that feeds it.
//! Bind to 127.0.0.1 by default (internal only).

pub mod config;
pub mod git;
mod handlers;
mod state;
pub mod types;

use axum::{
  http::Request,
  routing::{get, post},
  Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

pub use config::ServiceConfig;
pub use git::GitLogReader;
pub use handlers::{analyze, health, report};
pub use state::AppState;

/// All routes with CORS and per-request tracing spans.
pub fn router(state: Arc<AppState>) -> Router {
  Router::new()
    .route("/health", get(health))
    .route("/analyze", post(analyze))
    .route("/report", get(report))
    .layer(
      TraceLayer::new_for_http().make_span_with(|req: &Request<_>| {
        tracing::info_span!(
          "request",
          id = %Uuid::new_v4(),
          method = %req.method(),
          uri = %req.uri(),
        )
      }),
    )
    .layer(CorsLayer::permissive())
    .with_state(state)
}
