//! Technical-debt sentinel: weighted debt markers in messages and added diff
//! lines, churn hotspots, a scalar debt score, and refactor suggestions.

use std::collections::HashMap;

use crate::config::DebtConfig;
use crate::types::{Commit, DebtItem, DebtOrigin, DebtReport, Hotspot, Priority, RefactorKind, RefactorTicket};

/// Raw result of one scan over a commit batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DebtScan {
  pub score: u32,
  pub items: Vec<DebtItem>,
  /// First-seen order.
  pub hotspots: Vec<Hotspot>,
}

/// Paths named in unified-diff headers (`--- a/<path>`, `+++ b/<path>`),
/// deduplicated in order of appearance.
pub fn changed_paths(diff: &str) -> Vec<String> {
  let mut paths: Vec<String> = Vec::new();
  for line in diff.lines() {
    let path = line
      .strip_prefix("+++ b/")
      .or_else(|| line.strip_prefix("--- a/"))
      .map(str::trim_end);
    if let Some(path) = path {
      if !path.is_empty() && !paths.iter().any(|p| p == path) {
        paths.push(path.to_string());
      }
    }
  }
  paths
}

/// Every path a commit touched: diff headers plus `files_changed`.
fn commit_paths(commit: &Commit) -> Vec<String> {
  let mut paths = commit.diff.as_deref().map(changed_paths).unwrap_or_default();
  for file in &commit.files_changed {
    let file = file.trim();
    if !file.is_empty() && !paths.iter().any(|p| p == file) {
      paths.push(file.to_string());
    }
  }
  paths
}

/// Added lines only: `+` but not the `+++` file header.
fn added_lines(diff: &str) -> impl Iterator<Item = &str> {
  diff
    .lines()
    .filter(|line| line.starts_with('+') && !line.starts_with("+++"))
}

/// Debt items for one commit: one per signal found in the message, then one
/// per signal per added diff line.
pub fn scan_commit(commit: &Commit, config: &DebtConfig) -> Vec<DebtItem> {
  let mut items = Vec::new();
  let short = commit.short_hash();

  let message = commit.message.to_lowercase();
  for signal in &config.signals {
    if message.contains(&signal.name.to_lowercase()) {
      items.push(DebtItem {
        signal: signal.name.clone(),
        weight: signal.weight,
        source: commit.message.clone(),
        author: commit.author.clone(),
        hash: short.to_string(),
        origin: DebtOrigin::Message,
      });
    }
  }

  if let Some(diff) = commit.diff.as_deref() {
    for line in added_lines(diff) {
      let lowered = line.to_lowercase();
      for signal in &config.signals {
        if lowered.contains(&signal.name.to_lowercase()) {
          items.push(DebtItem {
            signal: signal.name.clone(),
            weight: signal.weight,
            source: line[1..].trim().to_string(),
            author: commit.author.clone(),
            hash: short.to_string(),
            origin: DebtOrigin::Diff,
          });
        }
      }
    }
  }

  items
}

/// Per-file change counts; a file counts once per commit that touched it.
pub fn hotspots(commits: &[Commit]) -> Vec<Hotspot> {
  let mut out: Vec<Hotspot> = Vec::new();
  let mut slots: HashMap<String, usize> = HashMap::new();
  for commit in commits {
    for path in commit_paths(commit) {
      match slots.get(&path).copied() {
        Some(slot) => out[slot].count += 1,
        None => {
          slots.insert(path.clone(), out.len());
          out.push(Hotspot { path, count: 1 });
        }
      }
    }
  }
  out
}

/// Sum of item weights plus a flat penalty per heavily churned file.
/// Saturates at `u32::MAX`.
pub fn debt_score(items: &[DebtItem], hotspots: &[Hotspot], config: &DebtConfig) -> u32 {
  let weights = items
    .iter()
    .fold(0u64, |acc, i| acc.saturating_add(u64::from(i.weight)));
  let churned = hotspots
    .iter()
    .filter(|h| h.count >= config.hotspot_penalty_threshold)
    .count() as u64;
  let total = weights.saturating_add(churned.saturating_mul(u64::from(config.hotspot_penalty)));
  u32::try_from(total).unwrap_or(u32::MAX)
}

/// Scan a commit batch.
pub fn analyze(commits: &[Commit], config: &DebtConfig) -> DebtScan {
  let items: Vec<DebtItem> = commits
    .iter()
    .flat_map(|c| scan_commit(c, config))
    .collect();
  let hotspots = hotspots(commits);
  let score = debt_score(&items, &hotspots, config);
  DebtScan {
    score,
    items,
    hotspots,
  }
}

/// Signal name with its occurrence count, first-seen order.
fn signal_counts(items: &[DebtItem]) -> Vec<(&str, usize)> {
  let mut counts: Vec<(&str, usize)> = Vec::new();
  for item in items {
    match counts.iter_mut().find(|(name, _)| *name == item.signal) {
      Some((_, n)) => *n += 1,
      None => counts.push((item.signal.as_str(), 1)),
    }
  }
  counts
}

/// Refactor suggestions: one per churned file, then one per repeated signal.
pub fn refactor_tickets(scan: &DebtScan, config: &DebtConfig) -> Vec<RefactorTicket> {
  let mut tickets = Vec::new();

  for hotspot in scan
    .hotspots
    .iter()
    .filter(|h| h.count >= config.hotspot_ticket_threshold)
  {
    tickets.push(RefactorTicket {
      title: format!("Refactor: {} (changed {}x recently)", hotspot.path, hotspot.count),
      priority: if hotspot.count >= config.hotspot_penalty_threshold {
        Priority::High
      } else {
        Priority::Medium
      },
      description: format!(
        "This file has been modified {} times in recent commits. \
         Consider refactoring to reduce churn and improve maintainability.",
        hotspot.count
      ),
      kind: RefactorKind::Refactor,
    });
  }

  for (signal, count) in signal_counts(&scan.items) {
    if count < config.signal_ticket_threshold {
      continue;
    }
    let weight = config.weight_of(signal).unwrap_or(0);
    tickets.push(RefactorTicket {
      title: format!("Tech Debt: Address \"{}\" markers ({} occurrences)", signal, count),
      priority: if weight >= config.high_priority_weight {
        Priority::High
      } else {
        Priority::Medium
      },
      description: format!(
        "Found {} instances of \"{}\" patterns in recent commits. \
         These should be resolved to prevent debt accumulation.",
        count, signal
      ),
      kind: RefactorKind::TechDebt,
    });
  }

  tickets
}

/// Scan plus suggestions, shaped for the report.
pub fn report(commits: &[Commit], config: &DebtConfig) -> DebtReport {
  let scan = analyze(commits, config);
  let refactor_tickets = refactor_tickets(&scan, config);
  DebtReport {
    score: scan.score,
    refactor_tickets,
    items: scan.items,
    hotspots: scan.hotspots,
  }
}
