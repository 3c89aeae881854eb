//! Report composer: runs every analyzer over one batch and assembles the
//! sprint report.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::debt;
use crate::discovery;
use crate::error::EngineError;
use crate::forecast;
use crate::health;
use crate::oracle::{self, HeuristicOracle, TextOracle};
use crate::sync;
use crate::types::*;

/// The sprint analysis engine. Stateless across calls; every run reads only
/// its input.
pub struct Engine {
  config: Config,
  oracle: Box<dyn TextOracle>,
}

impl Engine {
  pub fn new(config: Config) -> Self {
    Self {
      config,
      oracle: Box::new(HeuristicOracle),
    }
  }

  pub fn with_defaults() -> Self {
    Self::new(Config::default())
  }

  /// Swap the text oracle used for narratives and commit mapping.
  pub fn with_oracle(mut self, oracle: impl TextOracle + 'static) -> Self {
    self.oracle = Box::new(oracle);
    self
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  /// Effective config for one input: the input's own config (or the engine's)
  /// with the top-level sprint overrides applied.
  fn resolve_config(&self, input: &AnalysisInput) -> Config {
    let mut config = input.config.clone().unwrap_or_else(|| self.config.clone());
    if let Some(days) = input.sprint_days {
      config.sprint_days = days;
    }
    if let Some(days) = input.days_elapsed {
      config.days_elapsed = days;
    }
    config
  }

  /// Analyze one batch of commits against a supplied board, a pull
  /// request's board, or one discovered from commit messages.
  pub fn analyze(&self, input: &AnalysisInput) -> Result<SprintReport, EngineError> {
    let config = self.resolve_config(input);
    config.validate()?;

    let (board, board_source) = match (&input.board, &input.pull_request) {
      (Some(board), _) => {
        validate_board(board)?;
        (board.clone(), BoardSource::Supplied)
      }
      (None, Some(pr)) => {
        if pr.title.trim().is_empty() {
          return Err(EngineError::validation("pull_request.title", "must not be empty"));
        }
        let board = discovery::board_from_pull_request(pr.number, &pr.title, pr.body.as_deref(), &pr.author);
        (board, BoardSource::PullRequest)
      }
      (None, None) => (discovery::discover(&input.commits), BoardSource::Discovered),
    };
    debug!(
      commits = input.commits.len(),
      tickets = board.len(),
      source = ?board_source,
      "analyzing sprint"
    );

    let debt = debt::report(&input.commits, &config.debt);
    let forecast = forecast::forecast(
      &input.commits,
      &board,
      config.sprint_days,
      config.days_elapsed,
      &config.forecast,
    );
    let health = health::score(&input.commits, &board, &config.health);
    let updates = sync::suggest_updates(&input.commits, &board);

    let mut report = SprintReport {
      report_id: report_id(&input.commits, &board),
      board_source,
      board,
      debt,
      forecast,
      health,
      updates,
      oracle_updates: Vec::new(),
      narrative: None,
    };

    if input.oracle_sync {
      report.oracle_updates = self.sync_with_oracle(&input.commits, &report.board)?;
    }
    if input.narrative {
      report.narrative = Some(self.narrate(&report, &input.commits)?);
    }

    info!(
      report_id = %report.report_id,
      health = report.health.score,
      debt = report.debt.score,
      risk = report.forecast.risk_level.as_str(),
      "sprint report ready"
    );
    Ok(report)
  }

  /// Narrative for a finished report from the configured oracle.
  pub fn narrate(&self, report: &SprintReport, commits: &[Commit]) -> Result<String, EngineError> {
    let prompt = oracle::sprint_narrative_prompt(report, commits);
    self.oracle.generate(&prompt).map_err(|e| {
      warn!(oracle = self.oracle.name(), error = %e, "narrative generation failed");
      e
    })
  }

  /// Commit-to-ticket suggestions from the configured oracle.
  pub fn sync_with_oracle(&self, commits: &[Commit], board: &[Ticket]) -> Result<Vec<TicketUpdate>, EngineError> {
    oracle::board_sync(self.oracle.as_ref(), commits, board).map_err(|e| {
      warn!(oracle = self.oracle.name(), error = %e, "oracle board sync failed");
      e
    })
  }
}

/// Ids on a supplied board must be present and unique.
fn validate_board(board: &[Ticket]) -> Result<(), EngineError> {
  let mut seen = HashSet::new();
  for ticket in board {
    if ticket.id.trim().is_empty() {
      return Err(EngineError::validation("board[].id", "must not be empty"));
    }
    if !seen.insert(ticket.id.as_str()) {
      return Err(EngineError::validation(
        "board[].id",
        &format!("duplicate ticket id {}", ticket.id),
      ));
    }
  }
  Ok(())
}

/// Stable report id: hash of commit hashes and board ids, in order.
fn report_id(commits: &[Commit], board: &[Ticket]) -> String {
  let mut hasher = blake3::Hasher::new();
  for commit in commits {
    hasher.update(commit.hash.as_bytes());
    hasher.update(b"\n");
  }
  hasher.update(b"|");
  for ticket in board {
    hasher.update(ticket.id.as_bytes());
    hasher.update(b"\n");
  }
  let hex = hasher.finalize().to_hex();
  format!("rpt-{}", &hex[..16])
}

#[cfg(test)]
mod tests {
  use super::*;

  fn commit(hash: &str, date: &str, message: &str) -> Commit {
    Commit {
      hash: hash.into(),
      author: "alice".into(),
      date: date.into(),
      message: message.into(),
      diff: None,
      files_changed: vec![],
    }
  }

  struct EchoOracle;

  impl TextOracle for EchoOracle {
    fn name(&self) -> &str {
      "echo"
    }

    fn generate(&self, prompt: &str) -> Result<String, EngineError> {
      Ok(format!("{} chars", prompt.len()))
    }
  }

  struct FailingOracle;

  impl TextOracle for FailingOracle {
    fn name(&self) -> &str {
      "failing"
    }

    fn generate(&self, _prompt: &str) -> Result<String, EngineError> {
      Err(EngineError::collaborator("oracle", "unreachable host"))
    }
  }

  #[test]
  fn discovers_board_when_absent() {
    let input = AnalysisInput {
      commits: vec![
        commit("a1", "2025-01-10T10:00:00Z", "PROJ-1: start auth"),
        commit("a2", "2025-01-11T10:00:00Z", "fix: PROJ-1 token expiry"),
      ],
      ..AnalysisInput::default()
    };
    let report = Engine::with_defaults().analyze(&input).unwrap();
    assert_eq!(report.board_source, BoardSource::Discovered);
    assert_eq!(report.board.len(), 1);
    assert_eq!(report.board[0].status, TicketStatus::Done);
    assert!(report.narrative.is_none());
  }

  #[test]
  fn duplicate_board_ids_rejected() {
    let input = AnalysisInput {
      board: Some(vec![
        Ticket::new("PROJ-1", "a", TicketStatus::Todo),
        Ticket::new("PROJ-1", "b", TicketStatus::Done),
      ]),
      ..AnalysisInput::default()
    };
    match Engine::with_defaults().analyze(&input) {
      Err(EngineError::Validation { field, reason }) => {
        assert_eq!(field, "board[].id");
        assert!(reason.contains("PROJ-1"));
      }
      other => panic!("expected validation error, got {:?}", other.map(|r| r.report_id)),
    }
  }

  #[test]
  fn zero_sprint_override_rejected() {
    let input = AnalysisInput {
      sprint_days: Some(0),
      ..AnalysisInput::default()
    };
    assert!(Engine::with_defaults().analyze(&input).is_err());
  }

  #[test]
  fn overrides_reach_forecast() {
    let input = AnalysisInput {
      board: Some(vec![Ticket::new("PROJ-1", "a", TicketStatus::Todo)]),
      sprint_days: Some(10),
      days_elapsed: Some(4),
      ..AnalysisInput::default()
    };
    let report = Engine::with_defaults().analyze(&input).unwrap();
    assert_eq!(report.board_source, BoardSource::Supplied);
    assert_eq!(report.forecast.days_remaining, 6);
  }

  #[test]
  fn empty_input_yields_defaults() {
    let report = Engine::with_defaults().analyze(&AnalysisInput::default()).unwrap();
    assert!(report.board.is_empty());
    assert_eq!(report.debt.score, 0);
    assert_eq!(report.health.score, 100);
    assert_eq!(report.forecast.progress.total, 0);
    assert_eq!(report.forecast.progress.completion_rate, 0.0);
    assert!(report.report_id.starts_with("rpt-"));
    assert_eq!(report.report_id.len(), 20);
  }

  #[test]
  fn report_id_depends_on_batch() {
    let a = report_id(&[commit("a1", "", "x")], &[]);
    let b = report_id(&[commit("a2", "", "x")], &[]);
    assert_ne!(a, b);
    assert_eq!(a, report_id(&[commit("a1", "", "y")], &[]));
  }

  #[test]
  fn narrative_uses_configured_oracle() {
    let input = AnalysisInput {
      commits: vec![commit("a1", "2025-01-10T10:00:00Z", "PROJ-1 wip")],
      narrative: true,
      ..AnalysisInput::default()
    };
    let report = Engine::with_defaults().with_oracle(EchoOracle).analyze(&input).unwrap();
    assert!(report.narrative.unwrap().ends_with("chars"));

    let err = Engine::with_defaults()
      .with_oracle(FailingOracle)
      .analyze(&input)
      .unwrap_err();
    assert!(err.is_collaborator());
  }

  #[test]
  fn pull_request_seeds_board_when_none_supplied() {
    let input = AnalysisInput {
      commits: vec![commit("a1", "2025-01-10T10:00:00Z", "feat: csv export")],
      pull_request: Some(PullRequest {
        number: 17,
        title: "Add CSV export".into(),
        body: Some("Closes PROJ-8".into()),
        author: "bob".into(),
      }),
      ..AnalysisInput::default()
    };
    let report = Engine::with_defaults().analyze(&input).unwrap();
    assert_eq!(report.board_source, BoardSource::PullRequest);
    assert_eq!(report.board.len(), 1);
    assert_eq!(report.board[0].id, "PROJ-8");
    assert_eq!(report.board[0].assignee, "bob");
  }

  #[test]
  fn supplied_board_wins_over_pull_request() {
    let input = AnalysisInput {
      board: Some(vec![Ticket::new("PROJ-1", "a", TicketStatus::Todo)]),
      pull_request: Some(PullRequest {
        number: 3,
        title: "Unrelated".into(),
        body: None,
        author: "bob".into(),
      }),
      ..AnalysisInput::default()
    };
    let report = Engine::with_defaults().analyze(&input).unwrap();
    assert_eq!(report.board_source, BoardSource::Supplied);
    assert_eq!(report.board[0].id, "PROJ-1");
  }

  #[test]
  fn blank_pull_request_title_rejected() {
    let input = AnalysisInput {
      pull_request: Some(PullRequest {
        number: 3,
        title: "  ".into(),
        body: None,
        author: String::new(),
      }),
      ..AnalysisInput::default()
    };
    match Engine::with_defaults().analyze(&input) {
      Err(EngineError::Validation { field, .. }) => assert_eq!(field, "pull_request.title"),
      other => panic!("expected validation error, got {:?}", other.map(|r| r.report_id)),
    }
  }

  #[test]
  fn oracle_sync_is_opt_in() {
    let commits = vec![commit("a1", "2025-01-10T10:00:00Z", "feat: PROJ-4 csv export")];
    let plain = AnalysisInput {
      commits: commits.clone(),
      ..AnalysisInput::default()
    };
    let synced = AnalysisInput {
      commits,
      oracle_sync: true,
      ..AnalysisInput::default()
    };
    let engine = Engine::with_defaults();
    assert!(engine.analyze(&plain).unwrap().oracle_updates.is_empty());

    let report = engine.analyze(&synced).unwrap();
    assert_eq!(report.oracle_updates.len(), 1);
    assert_eq!(report.oracle_updates[0].ticket_id, "PROJ-4");
    assert_eq!(report.oracle_updates[0].new_status, "Done");
  }

  #[test]
  fn oracle_sync_failure_is_collaborator_error() {
    let input = AnalysisInput {
      commits: vec![commit("a1", "2025-01-10T10:00:00Z", "PROJ-1 wip")],
      oracle_sync: true,
      ..AnalysisInput::default()
    };
    let err = Engine::with_defaults()
      .with_oracle(FailingOracle)
      .analyze(&input)
      .unwrap_err();
    assert!(err.is_collaborator());
    assert_eq!(err.to_string(), "oracle: unreachable host");
  }

  #[test]
  fn narrative_does_not_change_scores() {
    let commits = vec![commit("a1", "2025-01-10T23:00:00Z", "hotfix PROJ-2")];
    let plain = AnalysisInput {
      commits: commits.clone(),
      ..AnalysisInput::default()
    };
    let narrated = AnalysisInput {
      commits,
      narrative: true,
      ..AnalysisInput::default()
    };
    let engine = Engine::with_defaults();
    let a = engine.analyze(&plain).unwrap();
    let b = engine.analyze(&narrated).unwrap();
    assert_eq!(a.health, b.health);
    assert_eq!(a.debt, b.debt);
    assert_eq!(a.report_id, b.report_id);
    assert!(b.narrative.unwrap().contains("Health score is **"));
  }
}
