//! Composite project health: start at 100, subtract independent deductions.

use crate::config::HealthConfig;
use crate::date;
use crate::types::{Commit, HealthReport, Ticket, TicketStatus};

pub struct HealthContext<'a> {
  pub commits: &'a [Commit],
  pub board: &'a [Ticket],
  pub config: &'a HealthConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Deduction {
  pub points: f64,
  pub alert: String,
}

pub struct HealthRule {
  pub name: &'static str,
  pub check: fn(&HealthContext<'_>) -> Option<Deduction>,
}

/// In Progress tickets that no commit message mentions.
pub fn stalled_tickets<'a>(commits: &[Commit], board: &'a [Ticket]) -> Vec<&'a Ticket> {
  board
    .iter()
    .filter(|t| t.status == TicketStatus::InProgress)
    .filter(|t| !commits.iter().any(|c| c.message.contains(t.id.as_str())))
    .collect()
}

fn stalled(ctx: &HealthContext<'_>) -> Option<Deduction> {
  let total = ctx.board.len();
  if total == 0 {
    return None;
  }
  let stalled = stalled_tickets(ctx.commits, ctx.board).len();
  if stalled == 0 {
    return None;
  }
  Some(Deduction {
    points: stalled as f64 / total as f64 * ctx.config.stalled_weight,
    alert: format!(
      "CRITICAL: {} tickets appear stalled (no recent activity).",
      stalled
    ),
  })
}

fn fix_density(ctx: &HealthContext<'_>) -> Option<Deduction> {
  let fixes = ctx
    .commits
    .iter()
    .filter(|c| c.message.to_lowercase().contains("fix"))
    .count();
  if fixes <= ctx.config.fix_density_threshold {
    return None;
  }
  Some(Deduction {
    points: ctx.config.fix_density_penalty,
    alert: "WARNING: High frequency of bug fixes detected. Tech debt may be increasing.".to_string(),
  })
}

fn off_hours(ctx: &HealthContext<'_>) -> Option<Deduction> {
  let late = ctx
    .commits
    .iter()
    .filter_map(|c| date::parse_timestamp(&c.date))
    .filter(|ts| date::local_hour(ts) > ctx.config.off_hours_after)
    .count();
  if late <= ctx.config.off_hours_threshold {
    return None;
  }
  Some(Deduction {
    points: ctx.config.off_hours_penalty,
    alert: "CAUTION: Late-night activity detected. Monitor team for burnout.".to_string(),
  })
}

pub const HEALTH_RULES: &[HealthRule] = &[
  HealthRule {
    name: "stalled_tickets",
    check: stalled,
  },
  HealthRule {
    name: "fix_density",
    check: fix_density,
  },
  HealthRule {
    name: "off_hours",
    check: off_hours,
  },
];

/// Health score in [0, 100] with one alert per fired rule.
pub fn score(commits: &[Commit], board: &[Ticket], config: &HealthConfig) -> HealthReport {
  let ctx = HealthContext {
    commits,
    board,
    config,
  };
  let deductions: Vec<Deduction> = HEALTH_RULES
    .iter()
    .filter_map(|rule| (rule.check)(&ctx))
    .collect();
  let lost: f64 = deductions.iter().map(|d| d.points).sum();
  let score = (100.0 - lost).clamp(0.0, 100.0).round() as u8;

  HealthReport {
    score,
    alerts: deductions.into_iter().map(|d| d.alert).collect(),
  }
}
