//! Core types for the sprint engine (JSON contracts + report models).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::config::Config;

// ---------------------------------------------------------------------------
// Inbound types (JSON contract: what the caller sends)
// ---------------------------------------------------------------------------

/// One commit record. Unknown fields are silently ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
  pub hash: String,
  pub author: String,
  /// Expected ISO-8601; malformed values are skipped by time-based rules.
  #[serde(default)]
  pub date: String,
  pub message: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub diff: Option<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub files_changed: Vec<String>,
}

impl Commit {
  /// First seven characters of the hash.
  pub fn short_hash(&self) -> &str {
    match self.hash.char_indices().nth(7) {
      Some((idx, _)) => &self.hash[..idx],
      None => &self.hash,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TicketStatus {
  #[serde(rename = "Todo", alias = "To Do", alias = "todo", alias = "TODO")]
  Todo,
  #[serde(
    rename = "In Progress",
    alias = "in_progress",
    alias = "In-Progress",
    alias = "in progress"
  )]
  InProgress,
  #[serde(rename = "Done", alias = "done", alias = "DONE")]
  Done,
}

impl TicketStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Todo => "Todo",
      Self::InProgress => "In Progress",
      Self::Done => "Done",
    }
  }
}

impl fmt::Display for TicketStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

fn unassigned() -> String {
  "unassigned".to_string()
}

/// A board ticket. Supplied boards carry the first five fields; discovered
/// boards also fill contributors, commit_count and the seen-window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
  pub id: String,
  pub title: String,
  pub status: TicketStatus,
  #[serde(default = "unassigned")]
  pub assignee: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub contributors: Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub commit_count: Option<usize>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub first_seen: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub last_seen: Option<String>,
}

impl Ticket {
  pub fn new(id: impl Into<String>, title: impl Into<String>, status: TicketStatus) -> Self {
    Self {
      id: id.into(),
      title: title.into(),
      status,
      assignee: unassigned(),
      description: None,
      contributors: Vec::new(),
      commit_count: None,
      first_seen: None,
      last_seen: None,
    }
  }

  pub fn with_assignee(mut self, assignee: impl Into<String>) -> Self {
    self.assignee = assignee.into();
    self
  }
}

/// One analysis request: commits, an optional board, optional overrides.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalysisInput {
  pub commits: Vec<Commit>,
  /// When absent the board is discovered from commit messages.
  #[serde(default)]
  pub board: Option<Vec<Ticket>>,
  #[serde(default)]
  pub sprint_days: Option<u32>,
  #[serde(default)]
  pub days_elapsed: Option<u32>,
  /// Ask the composer to attach an oracle narrative.
  #[serde(default)]
  pub narrative: bool,
  #[serde(default)]
  pub config: Option<Config>,
  /// Also ask the oracle to map every commit to a ticket.
  #[serde(default)]
  pub oracle_sync: bool,
  /// Pull request the batch belongs to. Seeds the board when `board` is
  /// absent.
  #[serde(default)]
  pub pull_request: Option<PullRequest>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequest {
  pub number: u64,
  pub title: String,
  #[serde(default)]
  pub body: Option<String>,
  #[serde(default)]
  pub author: String,
}

// ---------------------------------------------------------------------------
// Debt
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DebtOrigin {
  Message,
  Diff,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DebtItem {
  pub signal: String,
  pub weight: u32,
  pub source: String,
  pub author: String,
  pub hash: String,
  pub origin: DebtOrigin,
}

/// File path with the number of commits that touched it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hotspot {
  pub path: String,
  pub count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Priority {
  Medium,
  High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefactorKind {
  Refactor,
  TechDebt,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefactorTicket {
  pub title: String,
  pub priority: Priority,
  pub description: String,
  #[serde(rename = "type")]
  pub kind: RefactorKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DebtReport {
  pub score: u32,
  pub refactor_tickets: Vec<RefactorTicket>,
  pub items: Vec<DebtItem>,
  pub hotspots: Vec<Hotspot>,
}

// ---------------------------------------------------------------------------
// Forecast
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
  Low,
  Medium,
  High,
}

impl RiskLevel {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Low => "LOW",
      Self::Medium => "MEDIUM",
      Self::High => "HIGH",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Velocity {
  pub total_commits: usize,
  pub avg_daily: f64,
  /// Commits per `YYYY-MM-DD`, parseable timestamps only.
  pub daily_breakdown: BTreeMap<String, usize>,
  /// Commits per author, parseable timestamps only.
  pub author_breakdown: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Progress {
  pub total: usize,
  pub done: usize,
  pub in_progress: usize,
  pub todo: usize,
  pub completion_rate: f64,
  pub expected_rate: f64,
  pub on_track: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Forecast {
  pub risk_level: RiskLevel,
  pub velocity: Velocity,
  pub progress: Progress,
  pub risks: Vec<String>,
  pub recommendations: Vec<String>,
  pub days_remaining: i64,
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
  pub score: u8,
  pub alerts: Vec<String>,
}

// ---------------------------------------------------------------------------
// Board sync + report
// ---------------------------------------------------------------------------

/// Suggested status change for one ticket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TicketUpdate {
  pub ticket_id: String,
  pub new_status: String,
  pub reason: String,
  pub confidence: f64,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub side_effects: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BoardSource {
  Supplied,
  PullRequest,
  Discovered,
}

#[derive(Debug, Clone, Serialize)]
pub struct SprintReport {
  pub report_id: String,
  pub board_source: BoardSource,
  pub board: Vec<Ticket>,
  pub debt: DebtReport,
  pub forecast: Forecast,
  pub health: HealthReport,
  pub updates: Vec<TicketUpdate>,
  /// Oracle commit mappings, present when `oracle_sync` was requested.
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub oracle_updates: Vec<TicketUpdate>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub narrative: Option<String>,
}

// ---------------------------------------------------------------------------
// CLI stream wrappers
// ---------------------------------------------------------------------------

/// Structured error output for invalid input.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorOutput {
  pub error: bool,
  pub message: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub field: Option<String>,
}

impl ErrorOutput {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      error: true,
      message: message.into(),
      field: None,
    }
  }

  pub fn with_field(mut self, field: impl Into<String>) -> Self {
    self.field = Some(field.into());
    self
  }
}

impl From<&crate::error::EngineError> for ErrorOutput {
  fn from(e: &crate::error::EngineError) -> Self {
    match e {
      crate::error::EngineError::Validation { field, reason } => {
        ErrorOutput::new(reason.clone()).with_field(field.clone())
      }
      _ => ErrorOutput::new(e.to_string()),
    }
  }
}
