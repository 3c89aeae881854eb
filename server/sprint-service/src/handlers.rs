//! HTTP handlers for the sprint service.

use axum::{
  body::Bytes,
  extract::{Query, State},
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use std::sync::Arc;
use tracing::{info, warn};

use sprint_engine::types::ErrorOutput;
use sprint_engine::{AnalysisInput, EngineError};

use crate::state::AppState;
use crate::types::{ReportQuery, RepositoryReport};

fn error_response(e: &EngineError) -> Response {
  let status = if e.is_collaborator() {
    StatusCode::BAD_GATEWAY
  } else {
    StatusCode::BAD_REQUEST
  };
  (status, Json(ErrorOutput::from(e))).into_response()
}

pub async fn health() -> &'static str {
  "ok"
}

/// Analyze a posted batch. Body has the same shape as the CLI input.
pub async fn analyze(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
  let input: AnalysisInput = match serde_json::from_slice(&body) {
    Ok(v) => v,
    Err(e) => {
      warn!(error = %e, "analyze: invalid body");
      return error_response(&EngineError::from(e));
    }
  };

  match state.engine.analyze(&input) {
    Ok(report) => (StatusCode::OK, Json(report)).into_response(),
    Err(e) => {
      warn!(error = %e, "analyze: rejected");
      error_response(&e)
    }
  }
}

/// Read the configured repository and analyze its recent history.
pub async fn report(State(state): State<Arc<AppState>>, Query(query): Query<ReportQuery>) -> Response {
  let Some(reader) = state.reader.as_ref() else {
    let body = ErrorOutput::new("REPO_PATH is not configured");
    return (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response();
  };

  let commits = match reader.read().await {
    Ok(commits) => commits,
    Err(e) => {
      warn!(repo = %reader.repo().display(), error = %e, "report: git read failed");
      return error_response(&e);
    }
  };

  let input = AnalysisInput {
    commits,
    sprint_days: query.sprint_days.or(state.config.sprint_days),
    days_elapsed: query.days_elapsed.or(state.config.days_elapsed),
    narrative: query.narrative,
    oracle_sync: query.oracle_sync,
    ..AnalysisInput::default()
  };

  match state.engine.analyze(&input) {
    Ok(report) => {
      info!(report_id = %report.report_id, commits = input.commits.len(), "report: ok");
      let body = RepositoryReport {
        repository: reader.repo().display().to_string(),
        generated_at: chrono::Utc::now(),
        commits_read: input.commits.len(),
        report,
      };
      (StatusCode::OK, Json(body)).into_response()
    }
    Err(e) => error_response(&e),
  }
}
