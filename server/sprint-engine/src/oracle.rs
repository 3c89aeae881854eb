//! Text-generation seam. Narratives and commit-to-ticket reasoning are
//! delegated to a [`TextOracle`]; scores never read its output.
//!
//! [`HeuristicOracle`] is the deterministic stand-in used by the binaries and
//! tests. Hosted model clients live outside this crate and implement the same
//! trait.

use serde::Deserialize;
use serde_json::json;

use crate::error::EngineError;
use crate::extract;
use crate::types::{Commit, SprintReport, Ticket, TicketUpdate};

/// Minimum confidence for an oracle mapping to become a suggestion.
pub const MIN_SYNC_CONFIDENCE: f64 = 0.7;

pub trait TextOracle: Send + Sync {
  /// Short provider label for logs.
  fn name(&self) -> &str;

  fn generate(&self, prompt: &str) -> Result<String, EngineError>;
}

/// Value of the first `Label: value` line in a prompt.
fn prompt_field<'a>(prompt: &'a str, label: &str) -> Option<&'a str> {
  prompt.lines().find_map(|line| {
    line
      .trim()
      .strip_prefix(label)
      .and_then(|rest| rest.strip_prefix(':'))
      .map(str::trim)
  })
}

/// Deterministic oracle: reads the structured fields our own prompts carry
/// and answers from them.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicOracle;

impl HeuristicOracle {
  fn narrative(prompt: &str) -> String {
    let health = prompt_field(prompt, "Health Score").unwrap_or("unknown");
    let velocity = prompt_field(prompt, "Velocity").unwrap_or("unknown");
    let debt = prompt_field(prompt, "Debt Score").unwrap_or("unknown");
    let progress = prompt_field(prompt, "Sprint Progress").unwrap_or("unknown");
    let risk = prompt_field(prompt, "Risk Level").unwrap_or("unknown");
    format!(
      "## Sprint Health Narrative\n\n\
       Health score is **{}** with sprint risk rated **{}**. \
       The team is averaging {} and has {}.\n\n\
       Technical debt score stands at {}. \
       Review the forecast risks before committing to new scope.",
      health, risk, velocity, progress, debt
    )
  }

  fn commit_mapping(prompt: &str) -> String {
    let message = prompt_field(prompt, "Message").unwrap_or_default();
    let author = prompt_field(prompt, "Author").unwrap_or("unknown");
    let lowered = message.to_lowercase();

    let answer = match extract::extract_ids(message).into_iter().next() {
      Some(ticket_id) => {
        let done = lowered.contains("fix") || lowered.contains("feat");
        json!({
          "reasoning": format!("Commit by {} references {}.", author, ticket_id),
          "ticket_mapping": {
            "ticket_id": ticket_id,
            "confidence": 0.95,
            "suggested_status": if done { "Done" } else { "In Progress" },
            "rationale": format!("Commit message names {} directly.", ticket_id),
          },
          "side_effects": [],
        })
      }
      None => json!({
        "reasoning": format!("Commit by {} does not clearly map to any open ticket.", author),
        "ticket_mapping": {
          "ticket_id": "NONE",
          "confidence": 0.0,
          "suggested_status": "N/A",
          "rationale": "No ticket correlation found.",
        },
        "side_effects": ["Consider requiring ticket IDs in all commit messages."],
      }),
    };
    answer.to_string()
  }
}

impl TextOracle for HeuristicOracle {
  fn name(&self) -> &str {
    "heuristic"
  }

  fn generate(&self, prompt: &str) -> Result<String, EngineError> {
    let lowered = prompt.to_lowercase();
    // Narrative prompts also mention commits, so check them first.
    if lowered.contains("sprint") && (lowered.contains("narrative") || lowered.contains("summary")) {
      Ok(Self::narrative(prompt))
    } else if lowered.contains("commit") && lowered.contains("ticket") {
      Ok(Self::commit_mapping(prompt))
    } else {
      Ok(
        "The project data shows steady activity. Focus on completing in-progress work \
         before starting new tickets."
          .to_string(),
      )
    }
  }
}

/// Prompt asking for a sprint narrative over a finished report.
pub fn sprint_narrative_prompt(report: &SprintReport, commits: &[Commit]) -> String {
  let commit_lines: Vec<String> = commits
    .iter()
    .map(|c| format!("  - [{}] {}: {}", c.date, c.author, c.message))
    .collect();
  let board_lines: Vec<String> = report
    .board
    .iter()
    .map(|t| format!("  - {}: {} -> {} (Assigned: {})", t.id, t.title, t.status, t.assignee))
    .collect();

  format!(
    "Generate a sprint health narrative for the engineering team.\n\n\
     PROJECT STATISTICS:\n\
     \x20 Health Score: {}/100\n\
     \x20 Velocity: {} commits/day\n\
     \x20 Debt Score: {}\n\
     \x20 Sprint Progress: {}/{} tickets done\n\
     \x20 Risk Level: {}\n\n\
     RECENT COMMITS:\n{}\n\n\
     BOARD STATE:\n{}\n\n\
     Write a concise, actionable sprint summary. Highlight risks, recommend scope \
     adjustments, and flag any team health concerns. Use markdown formatting.",
    report.health.score,
    report.forecast.velocity.avg_daily,
    report.debt.score,
    report.forecast.progress.done,
    report.forecast.progress.total,
    report.forecast.risk_level.as_str(),
    commit_lines.join("\n"),
    board_lines.join("\n"),
  )
}

/// Prompt asking which ticket a single commit belongs to.
pub fn commit_mapping_prompt(commit: &Commit, board: &[Ticket]) -> String {
  let tickets: Vec<String> = board
    .iter()
    .map(|t| format!("- {}: {} (Status: {}, Assignee: {})", t.id, t.title, t.status, t.assignee))
    .collect();
  format!(
    "Analyze this commit and determine which project ticket it relates to.\n\n\
     COMMIT:\n\
     \x20 Hash: {}\n\
     \x20 Author: {}\n\
     \x20 Message: {}\n\
     \x20 Diff:\n{}\n\n\
     OPEN TICKETS:\n{}\n\n\
     Return a JSON object with: reasoning, ticket_mapping (ticket_id, confidence, \
     suggested_status, rationale), and side_effects.",
    commit.hash,
    commit.author,
    commit.message,
    commit.diff.as_deref().unwrap_or("N/A"),
    tickets.join("\n"),
  )
}

#[derive(Debug, Deserialize)]
struct OracleAnswer {
  #[serde(default)]
  ticket_mapping: Option<OracleMapping>,
  #[serde(default)]
  side_effects: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct OracleMapping {
  ticket_id: String,
  #[serde(default)]
  confidence: f64,
  #[serde(default)]
  suggested_status: Option<String>,
  #[serde(default)]
  rationale: Option<String>,
}

/// Turn one oracle answer into a suggestion.
///
/// Confident JSON mappings become updates; low-confidence mappings are
/// dropped; free text becomes a `Needs Review` entry for ticket `UNKNOWN`.
pub fn parse_board_sync(answer: &str) -> Option<TicketUpdate> {
  match serde_json::from_str::<OracleAnswer>(answer) {
    Ok(parsed) => {
      let mapping = parsed.ticket_mapping?;
      if mapping.confidence <= MIN_SYNC_CONFIDENCE {
        return None;
      }
      Some(TicketUpdate {
        ticket_id: mapping.ticket_id,
        new_status: mapping
          .suggested_status
          .unwrap_or_else(|| "In Progress".to_string()),
        reason: mapping
          .rationale
          .unwrap_or_else(|| "AI-inferred mapping".to_string()),
        confidence: mapping.confidence,
        side_effects: parsed.side_effects,
      })
    }
    Err(_) => {
      let excerpt: String = answer.chars().take(100).collect();
      Some(TicketUpdate {
        ticket_id: "UNKNOWN".to_string(),
        new_status: "Needs Review".to_string(),
        reason: format!("AI analysis: {}...", excerpt),
        confidence: 0.0,
        side_effects: Vec::new(),
      })
    }
  }
}

/// Ask the oracle about every commit and collect the confident mappings.
pub fn board_sync(
  oracle: &dyn TextOracle,
  commits: &[Commit],
  board: &[Ticket],
) -> Result<Vec<TicketUpdate>, EngineError> {
  let mut updates = Vec::new();
  for commit in commits {
    let answer = oracle.generate(&commit_mapping_prompt(commit, board))?;
    if let Some(update) = parse_board_sync(&answer) {
      updates.push(update);
    }
  }
  Ok(updates)
}
