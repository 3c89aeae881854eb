//! Request/response types for the sprint service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sprint_engine::SprintReport;

/// Query string for `GET /report`; values override the service settings.
#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
  pub sprint_days: Option<u32>,
  pub days_elapsed: Option<u32>,
  #[serde(default)]
  pub narrative: bool,
  #[serde(default)]
  pub oracle_sync: bool,
}

/// `GET /report` body: the report plus where and when it was read.
#[derive(Debug, Serialize)]
pub struct RepositoryReport {
  pub repository: String,
  pub generated_at: DateTime<Utc>,
  pub commits_read: usize,
  pub report: SprintReport,
}
