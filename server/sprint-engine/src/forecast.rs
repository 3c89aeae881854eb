//! Sprint velocity forecast: commit cadence, ticket progress, and an ordered
//! risk cascade that can only escalate.

use std::collections::BTreeMap;

use crate::config::ForecastConfig;
use crate::date;
use crate::types::{Commit, Forecast, Progress, RiskLevel, Ticket, TicketStatus, Velocity};

fn round_to(value: f64, places: i32) -> f64 {
  let factor = 10f64.powi(places);
  (value * factor).round() / factor
}

/// Commit cadence. Daily and per-author counts include only commits with a
/// parseable timestamp; `total_commits` and `avg_daily` include all.
pub fn velocity(commits: &[Commit], days_elapsed: u32) -> Velocity {
  let mut daily_breakdown: BTreeMap<String, usize> = BTreeMap::new();
  let mut author_breakdown: BTreeMap<String, usize> = BTreeMap::new();

  for commit in commits {
    let Some(ts) = date::parse_timestamp(&commit.date) else {
      continue;
    };
    *daily_breakdown.entry(date::day_key(&ts)).or_insert(0) += 1;
    *author_breakdown.entry(commit.author.clone()).or_insert(0) += 1;
  }

  let avg_daily = commits.len() as f64 / days_elapsed.max(1) as f64;
  Velocity {
    total_commits: commits.len(),
    avg_daily: round_to(avg_daily, 2),
    daily_breakdown,
    author_breakdown,
  }
}

/// Ticket completion against the elapsed share of the sprint.
pub fn progress(board: &[Ticket], sprint_days: u32, days_elapsed: u32, config: &ForecastConfig) -> Progress {
  let count = |status: TicketStatus| board.iter().filter(|t| t.status == status).count();
  let total = board.len();
  let done = count(TicketStatus::Done);

  let completion_rate = if total > 0 {
    done as f64 / total as f64 * 100.0
  } else {
    0.0
  };
  let expected_rate = (days_elapsed as f64 / sprint_days.max(1) as f64 * 100.0).clamp(0.0, 100.0);

  Progress {
    total,
    done,
    in_progress: count(TicketStatus::InProgress),
    todo: count(TicketStatus::Todo),
    completion_rate: round_to(completion_rate, 1),
    expected_rate: round_to(expected_rate, 1),
    on_track: completion_rate >= expected_rate * config.on_track_ratio,
  }
}

/// Inputs every risk rule may look at.
pub struct RiskContext<'a> {
  pub velocity: &'a Velocity,
  pub progress: &'a Progress,
  pub sprint_days: u32,
  pub days_elapsed: u32,
  pub config: &'a ForecastConfig,
}

/// A fired rule: the level it demands plus its messages.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskFinding {
  pub level: RiskLevel,
  pub risk: String,
  pub recommendation: String,
}

pub struct RiskRule {
  pub name: &'static str,
  pub check: fn(&RiskContext<'_>) -> Option<RiskFinding>,
}

fn behind_schedule(ctx: &RiskContext<'_>) -> Option<RiskFinding> {
  let p = ctx.progress;
  if p.on_track {
    return None;
  }
  let deficit = p.expected_rate - p.completion_rate;
  Some(RiskFinding {
    level: RiskLevel::High,
    risk: format!(
      "Sprint is behind schedule: {:.1}% done vs {:.1}% expected ({:.0}% deficit).",
      p.completion_rate, p.expected_rate, deficit
    ),
    recommendation: "Consider scope reduction: identify lowest-priority tickets to defer to next sprint."
      .to_string(),
  })
}

fn workload_imbalance(ctx: &RiskContext<'_>) -> Option<RiskFinding> {
  let counts = &ctx.velocity.author_breakdown;
  let max = counts.values().copied().max()?;
  let min = counts.values().copied().min()?;
  if max == 0 || (min as f64 / max as f64) >= ctx.config.imbalance_ratio {
    return None;
  }
  Some(RiskFinding {
    level: RiskLevel::Medium,
    risk: "Uneven workload detected: some team members have significantly fewer commits.".to_string(),
    recommendation: "Rebalance work assignments to prevent bottlenecks and reduce bus factor.".to_string(),
  })
}

fn low_cadence(ctx: &RiskContext<'_>) -> Option<RiskFinding> {
  let avg = ctx.velocity.avg_daily;
  if avg >= ctx.config.low_cadence_per_day || ctx.days_elapsed <= ctx.config.low_cadence_min_days {
    return None;
  }
  Some(RiskFinding {
    level: RiskLevel::Medium,
    risk: format!("Low commit velocity: averaging {} commits/day.", avg),
    recommendation: "Check for blockers: team might be stuck on complex tasks or waiting on reviews."
      .to_string(),
  })
}

fn wip_overhang(ctx: &RiskContext<'_>) -> Option<RiskFinding> {
  let p = ctx.progress;
  let past_cutoff = ctx.days_elapsed as f64 > ctx.sprint_days as f64 * ctx.config.wip_overhang_fraction;
  if p.in_progress <= p.done || !past_cutoff {
    return None;
  }
  Some(RiskFinding {
    level: RiskLevel::Medium,
    risk: format!(
      "Too many open items: {} in progress vs {} done.",
      p.in_progress, p.done
    ),
    recommendation: "Focus on finishing active work before starting new tickets. Apply WIP limits."
      .to_string(),
  })
}

/// The cascade, in evaluation order.
pub const RISK_RULES: &[RiskRule] = &[
  RiskRule {
    name: "behind_schedule",
    check: behind_schedule,
  },
  RiskRule {
    name: "workload_imbalance",
    check: workload_imbalance,
  },
  RiskRule {
    name: "low_cadence",
    check: low_cadence,
  },
  RiskRule {
    name: "wip_overhang",
    check: wip_overhang,
  },
];

/// Run `rules` in order. The level starts at LOW and only ever rises.
pub fn evaluate(ctx: &RiskContext<'_>, rules: &[RiskRule]) -> (RiskLevel, Vec<RiskFinding>) {
  let findings: Vec<RiskFinding> = rules.iter().filter_map(|rule| (rule.check)(ctx)).collect();
  let level = findings
    .iter()
    .fold(RiskLevel::Low, |level, finding| level.max(finding.level));
  (level, findings)
}

/// Full sprint forecast.
pub fn forecast(
  commits: &[Commit],
  board: &[Ticket],
  sprint_days: u32,
  days_elapsed: u32,
  config: &ForecastConfig,
) -> Forecast {
  let velocity = velocity(commits, days_elapsed);
  let progress = progress(board, sprint_days, days_elapsed, config);

  let ctx = RiskContext {
    velocity: &velocity,
    progress: &progress,
    sprint_days,
    days_elapsed,
    config,
  };
  let (risk_level, findings) = evaluate(&ctx, RISK_RULES);
  let (risks, recommendations): (Vec<String>, Vec<String>) = findings
    .into_iter()
    .map(|f| (f.risk, f.recommendation))
    .unzip();

  Forecast {
    risk_level,
    velocity,
    progress,
    risks,
    recommendations,
    days_remaining: sprint_days as i64 - days_elapsed as i64,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn commit(author: &str, date: &str) -> Commit {
    Commit {
      hash: "abc1234".into(),
      author: author.into(),
      date: date.into(),
      message: "work".into(),
      diff: None,
      files_changed: vec![],
    }
  }

  fn board(done: usize, in_progress: usize, todo: usize) -> Vec<Ticket> {
    let mut tickets = Vec::new();
    for i in 0..done {
      tickets.push(Ticket::new(format!("D-{}", i), "d", TicketStatus::Done));
    }
    for i in 0..in_progress {
      tickets.push(Ticket::new(format!("P-{}", i), "p", TicketStatus::InProgress));
    }
    for i in 0..todo {
      tickets.push(Ticket::new(format!("T-{}", i), "t", TicketStatus::Todo));
    }
    tickets
  }

  fn velocity_with(authors: &[(&str, usize)], avg_daily: f64) -> Velocity {
    Velocity {
      total_commits: authors.iter().map(|(_, n)| n).sum(),
      avg_daily,
      daily_breakdown: BTreeMap::new(),
      author_breakdown: authors.iter().map(|(a, n)| (a.to_string(), *n)).collect(),
    }
  }

  #[test]
  fn behind_schedule_scenario_is_high() {
    let config = ForecastConfig::default();
    let p = progress(&board(1, 0, 9), 14, 7, &config);
    assert!((p.completion_rate - 10.0).abs() < 1e-9);
    assert!((p.expected_rate - 50.0).abs() < 1e-9);
    assert!(!p.on_track);

    let f = forecast(&[], &board(1, 0, 9), 14, 7, &config);
    assert_eq!(f.risk_level, RiskLevel::High);
    assert!(f.risks[0].contains("10.0% done vs 50.0% expected (40% deficit)"));
    assert!(f.recommendations[0].starts_with("Consider scope reduction"));
    assert_eq!(f.days_remaining, 7);
  }

  #[test]
  fn velocity_skips_unparseable_dates() {
    let commits = vec![
      commit("jane", "2025-01-14T10:00:00Z"),
      commit("jane", "2025-01-14T11:00:00Z"),
      commit("joe", "not a date"),
    ];
    let v = velocity(&commits, 2);
    assert_eq!(v.total_commits, 3);
    assert!((v.avg_daily - 1.5).abs() < 1e-9);
    assert_eq!(v.daily_breakdown.get("2025-01-14"), Some(&2));
    assert_eq!(v.author_breakdown.get("jane"), Some(&2));
    assert!(v.author_breakdown.get("joe").is_none());
  }

  #[test]
  fn zero_elapsed_days_does_not_divide_by_zero() {
    let v = velocity(&[commit("a", "2025-01-14T10:00:00Z")], 0);
    assert!((v.avg_daily - 1.0).abs() < 1e-9);
  }

  #[test]
  fn empty_board_has_zero_completion() {
    let p = progress(&[], 14, 0, &ForecastConfig::default());
    assert_eq!(p.total, 0);
    assert_eq!(p.completion_rate, 0.0);
    assert!(p.on_track);
  }

  #[test]
  fn expected_rate_capped_after_sprint_end() {
    let p = progress(&board(1, 0, 0), 10, 15, &ForecastConfig::default());
    assert_eq!(p.expected_rate, 100.0);
    let f = forecast(&[], &board(1, 0, 0), 10, 15, &ForecastConfig::default());
    assert_eq!(f.days_remaining, -5);
  }

  #[test]
  fn imbalance_rule_fires_below_ratio() {
    let config = ForecastConfig::default();
    let v = velocity_with(&[("jane", 10), ("joe", 2)], 5.0);
    let p = progress(&board(5, 0, 0), 14, 1, &config);
    let ctx = RiskContext {
      velocity: &v,
      progress: &p,
      sprint_days: 14,
      days_elapsed: 1,
      config: &config,
    };
    let finding = workload_imbalance(&ctx).unwrap();
    assert_eq!(finding.level, RiskLevel::Medium);

    let balanced = velocity_with(&[("jane", 10), ("joe", 3)], 5.0);
    let ctx = RiskContext { velocity: &balanced, ..ctx };
    assert!(workload_imbalance(&ctx).is_none());
  }

  #[test]
  fn low_cadence_needs_elapsed_days() {
    let config = ForecastConfig::default();
    let v = velocity_with(&[("jane", 1)], 0.5);
    let p = progress(&board(5, 0, 0), 14, 2, &config);
    let early = RiskContext {
      velocity: &v,
      progress: &p,
      sprint_days: 14,
      days_elapsed: 2,
      config: &config,
    };
    assert!(low_cadence(&early).is_none());
    let later = RiskContext { days_elapsed: 3, ..early };
    let finding = low_cadence(&later).unwrap();
    assert_eq!(finding.risk, "Low commit velocity: averaging 0.5 commits/day.");
  }

  #[test]
  fn wip_overhang_after_midpoint() {
    let config = ForecastConfig::default();
    let v = velocity_with(&[("jane", 20)], 2.0);
    let p = progress(&board(4, 5, 0), 14, 8, &config);
    let ctx = RiskContext {
      velocity: &v,
      progress: &p,
      sprint_days: 14,
      days_elapsed: 8,
      config: &config,
    };
    assert!(wip_overhang(&ctx).is_some());
    let at_midpoint = RiskContext { days_elapsed: 7, ..ctx };
    assert!(wip_overhang(&at_midpoint).is_none());
  }

  #[test]
  fn medium_rules_never_lower_high() {
    let config = ForecastConfig::default();
    let v = velocity_with(&[("jane", 10), ("joe", 1)], 0.5);
    let p = progress(&board(1, 8, 1), 14, 10, &config);
    let ctx = RiskContext {
      velocity: &v,
      progress: &p,
      sprint_days: 14,
      days_elapsed: 10,
      config: &config,
    };
    let (level, findings) = evaluate(&ctx, RISK_RULES);
    assert_eq!(level, RiskLevel::High);
    assert_eq!(findings.len(), 4);

    let reversed: Vec<RiskRule> = RISK_RULES
      .iter()
      .rev()
      .map(|r| RiskRule { name: r.name, check: r.check })
      .collect();
    let (reversed_level, _) = evaluate(&ctx, &reversed);
    assert_eq!(reversed_level, level);
  }

  #[test]
  fn quiet_healthy_sprint_is_low() {
    let commits: Vec<_> = (0..14)
      .map(|i| commit(if i % 2 == 0 { "jane" } else { "joe" }, "2025-01-14T10:00:00Z"))
      .collect();
    let f = forecast(&commits, &board(5, 1, 4), 14, 7, &ForecastConfig::default());
    assert_eq!(f.risk_level, RiskLevel::Low);
    assert!(f.risks.is_empty());
    assert!(f.recommendations.is_empty());
  }
}
