//! Engine configuration with sane defaults.
//!
//! Every threshold the analyzers use lives here with its literal default, so
//! callers can tune a run without touching the rules themselves.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Tunables for one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Sprint length in days.
  pub sprint_days: u32,
  /// Days of the sprint already elapsed.
  pub days_elapsed: u32,
  pub debt: DebtConfig,
  pub forecast: ForecastConfig,
  pub health: HealthConfig,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      sprint_days: 14,
      days_elapsed: 7,
      debt: DebtConfig::default(),
      forecast: ForecastConfig::default(),
      health: HealthConfig::default(),
    }
  }
}

/// One weighted debt marker. Matched as a case-insensitive substring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtSignal {
  pub name: String,
  pub weight: u32,
}

impl DebtSignal {
  pub fn new(name: &str, weight: u32) -> Self {
    Self {
      name: name.to_string(),
      weight,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebtConfig {
  /// Evaluated in order; order also fixes DebtItem order within a commit.
  pub signals: Vec<DebtSignal>,
  /// Change count at which a file earns a REFACTOR suggestion.
  pub hotspot_ticket_threshold: u32,
  /// Change count at which a file adds `hotspot_penalty` to the score.
  pub hotspot_penalty_threshold: u32,
  pub hotspot_penalty: u32,
  /// Occurrences of one signal needed for a TECH_DEBT suggestion.
  pub signal_ticket_threshold: usize,
  /// Signals at or above this weight produce High priority tickets.
  pub high_priority_weight: u32,
}

impl Default for DebtConfig {
  fn default() -> Self {
    Self {
      signals: vec![
        DebtSignal::new("todo", 2),
        DebtSignal::new("hotfix", 3),
        DebtSignal::new("workaround", 3),
        DebtSignal::new("temp", 1),
        DebtSignal::new("deprecated", 2),
        DebtSignal::new("hardcode", 2),
      ],
      hotspot_ticket_threshold: 2,
      hotspot_penalty_threshold: 3,
      hotspot_penalty: 5,
      signal_ticket_threshold: 2,
      high_priority_weight: 3,
    }
  }
}

impl DebtConfig {
  pub fn weight_of(&self, signal: &str) -> Option<u32> {
    self
      .signals
      .iter()
      .find(|s| s.name == signal)
      .map(|s| s.weight)
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
  /// On track when completion >= expected * ratio.
  pub on_track_ratio: f64,
  /// Imbalanced when min/max author commits falls below this.
  pub imbalance_ratio: f64,
  /// Commits per day under which cadence counts as low.
  pub low_cadence_per_day: f64,
  /// Low cadence only fires once more than this many days have elapsed.
  pub low_cadence_min_days: u32,
  /// WIP overhang only fires past this fraction of the sprint.
  pub wip_overhang_fraction: f64,
}

impl Default for ForecastConfig {
  fn default() -> Self {
    Self {
      on_track_ratio: 0.7,
      imbalance_ratio: 0.3,
      low_cadence_per_day: 1.0,
      low_cadence_min_days: 2,
      wip_overhang_fraction: 0.5,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
  /// Maximum deduction when every ticket is stalled.
  pub stalled_weight: f64,
  /// Fix commits tolerated before the density deduction applies.
  pub fix_density_threshold: usize,
  pub fix_density_penalty: f64,
  /// Commits with a local hour strictly after this count as off-hours.
  pub off_hours_after: u32,
  /// Off-hours commits tolerated before the deduction applies.
  pub off_hours_threshold: usize,
  pub off_hours_penalty: f64,
}

impl Default for HealthConfig {
  fn default() -> Self {
    Self {
      stalled_weight: 30.0,
      fix_density_threshold: 3,
      fix_density_penalty: 15.0,
      off_hours_after: 20,
      off_hours_threshold: 2,
      off_hours_penalty: 10.0,
    }
  }
}

/// Upper bound for any single debt weight or penalty.
pub const MAX_DEBT_WEIGHT: u32 = 1000;

impl Config {
  /// Reject values that would make a rule meaningless (zero-length sprint,
  /// negative ratios, unnamed signals).
  pub fn validate(&self) -> Result<(), EngineError> {
    if self.sprint_days == 0 {
      return Err(EngineError::validation("sprint_days", "must be at least 1"));
    }
    let ratios = [
      ("forecast.on_track_ratio", self.forecast.on_track_ratio),
      ("forecast.imbalance_ratio", self.forecast.imbalance_ratio),
      ("forecast.low_cadence_per_day", self.forecast.low_cadence_per_day),
      ("forecast.wip_overhang_fraction", self.forecast.wip_overhang_fraction),
      ("health.stalled_weight", self.health.stalled_weight),
      ("health.fix_density_penalty", self.health.fix_density_penalty),
      ("health.off_hours_penalty", self.health.off_hours_penalty),
    ];
    for (field, value) in ratios {
      if !value.is_finite() || value < 0.0 {
        return Err(EngineError::validation(field, "must be a non-negative number"));
      }
    }
    if self.health.off_hours_after > 23 {
      return Err(EngineError::validation("health.off_hours_after", "must be an hour 0..=23"));
    }
    if self.debt.signals.iter().any(|s| s.name.trim().is_empty()) {
      return Err(EngineError::validation("debt.signals[].name", "must not be empty"));
    }
    if self.debt.signals.iter().any(|s| s.weight > MAX_DEBT_WEIGHT) {
      return Err(EngineError::validation("debt.signals[].weight", "must be at most 1000"));
    }
    if self.debt.hotspot_penalty > MAX_DEBT_WEIGHT {
      return Err(EngineError::validation("debt.hotspot_penalty", "must be at most 1000"));
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_are_valid() {
    assert!(Config::default().validate().is_ok());
  }

  #[test]
  fn zero_length_sprint_rejected() {
    let config = Config {
      sprint_days: 0,
      ..Config::default()
    };
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("sprint_days"));
  }

  #[test]
  fn partial_json_keeps_defaults() {
    let config: Config =
      serde_json::from_str(r#"{"sprint_days": 10, "forecast": {"imbalance_ratio": 0.5}}"#).unwrap();
    assert_eq!(config.sprint_days, 10);
    assert_eq!(config.days_elapsed, 7);
    assert!((config.forecast.imbalance_ratio - 0.5).abs() < f64::EPSILON);
    assert!((config.forecast.on_track_ratio - 0.7).abs() < f64::EPSILON);
    assert_eq!(config.debt.signals.len(), 6);
  }

  #[test]
  fn oversized_debt_weights_rejected() {
    let mut config = Config::default();
    config.debt.signals.push(DebtSignal::new("hack", 3_000_000_000));
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("debt.signals[].weight"));

    let config = Config {
      debt: DebtConfig {
        hotspot_penalty: MAX_DEBT_WEIGHT + 1,
        ..DebtConfig::default()
      },
      ..Config::default()
    };
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.debt.signals[0].weight = MAX_DEBT_WEIGHT;
    assert!(config.validate().is_ok());
  }

  #[test]
  fn weight_lookup() {
    let debt = DebtConfig::default();
    assert_eq!(debt.weight_of("hotfix"), Some(3));
    assert_eq!(debt.weight_of("temp"), Some(1));
    assert_eq!(debt.weight_of("nope"), None);
  }
}
