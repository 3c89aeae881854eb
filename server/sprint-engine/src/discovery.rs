//! Virtual board discovery: group commits by referenced ticket id, then infer
//! status, title and ownership for each ticket.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::extract;
use crate::types::{Commit, Ticket, TicketStatus};

static CONVENTIONAL_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
  match Regex::new(r"(?i)^(fix|feat|chore|refactor|docs|test|ci|style|perf|build):\s*") {
    Ok(re) => re,
    Err(_) => unreachable!("static regex pattern"),
  }
});

/// Ordered status rule: any signal present in the lowercased text selects `status`.
pub struct StatusRule {
  pub name: &'static str,
  pub signals: &'static [&'static str],
  pub status: TicketStatus,
}

pub const STATUS_RULES: &[StatusRule] = &[
  StatusRule {
    name: "done",
    signals: &[
      "fix:", "fixes", "fixed", "resolve", "resolved", "close", "closed", "complete", "done",
    ],
    status: TicketStatus::Done,
  },
  StatusRule {
    name: "feature",
    signals: &["feat:", "feature", "implement", "add:"],
    status: TicketStatus::Done,
  },
  StatusRule {
    name: "wip",
    signals: &["wip", "draft", "partial", "progress", "refactor"],
    status: TicketStatus::InProgress,
  },
];

/// Status when no rule fires.
pub const DEFAULT_STATUS: TicketStatus = TicketStatus::InProgress;

/// Everything one ticket accumulated across the batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TicketActivity {
  pub hashes: Vec<String>,
  /// Distinct authors in first-seen order.
  pub authors: Vec<String>,
  pub messages: Vec<String>,
  pub first_seen: Option<String>,
  pub last_seen: Option<String>,
}

impl TicketActivity {
  fn absorb(mut self, commit: &Commit) -> Self {
    self.hashes.push(commit.short_hash().to_string());
    if !self.authors.iter().any(|a| a == &commit.author) {
      self.authors.push(commit.author.clone());
    }
    self.messages.push(commit.message.clone());

    // Lexicographic comparison; assumes one timestamp format per batch.
    let date = commit.date.as_str();
    if !date.is_empty() {
      if self.first_seen.as_deref().map_or(true, |seen| date < seen) {
        self.first_seen = Some(date.to_string());
      }
      if self.last_seen.as_deref().map_or(true, |seen| date > seen) {
        self.last_seen = Some(date.to_string());
      }
    }
    self
  }
}

/// Ticket id -> activity, in order of first reference.
#[derive(Debug, Default)]
pub struct ActivityIndex {
  order: Vec<(String, TicketActivity)>,
  slots: HashMap<String, usize>,
}

impl ActivityIndex {
  fn absorb(mut self, commit: &Commit) -> Self {
    for id in extract::extract_ids(&commit.message) {
      let slot = match self.slots.get(&id).copied() {
        Some(slot) => slot,
        None => {
          self.order.push((id.clone(), TicketActivity::default()));
          self.slots.insert(id, self.order.len() - 1);
          self.order.len() - 1
        }
      };
      let entry = &mut self.order[slot].1;
      *entry = std::mem::take(entry).absorb(commit);
    }
    self
  }

  pub fn get(&self, id: &str) -> Option<&TicketActivity> {
    self.slots.get(id).map(|&slot| &self.order[slot].1)
  }

  pub fn len(&self) -> usize {
    self.order.len()
  }

  pub fn is_empty(&self) -> bool {
    self.order.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &TicketActivity)> {
    self.order.iter().map(|(id, a)| (id.as_str(), a))
  }
}

/// Reduce a commit sequence into per-ticket activity.
pub fn index_activity(commits: &[Commit]) -> ActivityIndex {
  commits
    .iter()
    .fold(ActivityIndex::default(), |index, commit| index.absorb(commit))
}

/// The first rule whose signals appear in `text` (already lowercased).
pub fn matching_status_rule(text: &str) -> Option<&'static StatusRule> {
  STATUS_RULES
    .iter()
    .find(|rule| rule.signals.iter().any(|signal| text.contains(signal)))
}

/// Infer a status from every message that referenced the ticket.
pub fn infer_status(messages: &[String]) -> TicketStatus {
  let all_text = messages.join(" ").to_lowercase();
  matching_status_rule(&all_text)
    .map(|rule| rule.status)
    .unwrap_or(DEFAULT_STATUS)
}

/// Drop every `id` or `[id]` from `text`, with the whitespace that follows it.
fn strip_id(text: &str, id: &str) -> String {
  if id.is_empty() {
    return text.to_string();
  }
  let mut out = String::with_capacity(text.len());
  let mut rest = text;
  while let Some(pos) = rest.find(id) {
    let before = &rest[..pos];
    out.push_str(before.strip_suffix('[').unwrap_or(before));
    let after = &rest[pos + id.len()..];
    rest = after.strip_prefix(']').unwrap_or(after).trim_start();
  }
  out.push_str(rest);
  out
}

/// Human title from the first referencing message.
pub fn infer_title(ticket_id: &str, messages: &[String]) -> String {
  let Some(first) = messages.first() else {
    return format!("Ticket {}", ticket_id);
  };
  let cleaned = strip_id(&CONVENTIONAL_PREFIX.replace(first, ""), ticket_id);
  let cleaned = cleaned.trim();
  if cleaned.is_empty() {
    format!("Work on {}", ticket_id)
  } else {
    cleaned.to_string()
  }
}

fn build_ticket(id: &str, activity: &TicketActivity) -> Ticket {
  Ticket {
    id: id.to_string(),
    title: infer_title(id, &activity.messages),
    status: infer_status(&activity.messages),
    assignee: activity
      .authors
      .first()
      .cloned()
      .unwrap_or_else(|| "unassigned".to_string()),
    description: None,
    contributors: activity.authors.clone(),
    commit_count: Some(activity.hashes.len()),
    first_seen: activity.first_seen.clone(),
    last_seen: activity.last_seen.clone(),
  }
}

/// Build a virtual board from commit messages, most recently active first.
pub fn discover(commits: &[Commit]) -> Vec<Ticket> {
  let index = index_activity(commits);
  let mut board: Vec<Ticket> = index
    .iter()
    .map(|(id, activity)| build_ticket(id, activity))
    .collect();
  // Stable: ties keep first-reference order; missing last_seen sorts lowest.
  board.sort_by(|a, b| b.last_seen.cmp(&a.last_seen));
  board
}

/// Board for a single pull request: one In Progress ticket per referenced id,
/// or a synthetic `PR-<number>` ticket when the PR references none.
pub fn board_from_pull_request(number: u64, title: &str, body: Option<&str>, author: &str) -> Vec<Ticket> {
  let text = format!("{} {}", title, body.unwrap_or_default());
  let short_title: String = title.chars().take(60).collect();
  let ids = extract::extract_with(&text, extract::rules().iter().take(2));

  if ids.is_empty() {
    return vec![
      Ticket::new(format!("PR-{}", number), short_title, TicketStatus::InProgress).with_assignee(author),
    ];
  }
  ids
    .into_iter()
    .map(|id| Ticket::new(id, short_title.clone(), TicketStatus::InProgress).with_assignee(author))
    .collect()
}
