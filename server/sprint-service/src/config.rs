//! Service settings, read once from the environment at startup.

use std::path::PathBuf;
use std::time::Duration;

use sprint_engine::EngineError;

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
  pub port: u16,
  /// Repository analyzed by `GET /report`; unset disables that endpoint.
  pub repo_path: Option<PathBuf>,
  pub git_timeout: Duration,
  pub max_commits: usize,
  /// History window for `git log`; 0 reads the whole history.
  pub since_days: u32,
  pub sprint_days: Option<u32>,
  pub days_elapsed: Option<u32>,
}

impl Default for ServiceConfig {
  fn default() -> Self {
    Self {
      port: 5005,
      repo_path: None,
      git_timeout: Duration::from_secs(30),
      max_commits: 200,
      since_days: 14,
      sprint_days: None,
      days_elapsed: None,
    }
  }
}

fn parse_var<T: std::str::FromStr>(name: &str, raw: Option<String>) -> Result<Option<T>, EngineError> {
  match raw.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
    None => Ok(None),
    Some(v) => v
      .parse()
      .map(Some)
      .map_err(|_| EngineError::validation(name, &format!("invalid value {:?}", v))),
  }
}

impl ServiceConfig {
  pub fn from_env() -> Result<Self, EngineError> {
    Self::from_lookup(|name| std::env::var(name).ok())
  }

  /// Build from any variable source; unset or blank variables keep defaults.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, EngineError> {
    let defaults = Self::default();
    let timeout_secs: Option<u64> = parse_var("GIT_TIMEOUT_SECS", lookup("GIT_TIMEOUT_SECS"))?;
    if timeout_secs == Some(0) {
      return Err(EngineError::validation("GIT_TIMEOUT_SECS", "must be at least 1"));
    }

    Ok(Self {
      port: parse_var("PORT", lookup("PORT"))?.unwrap_or(defaults.port),
      repo_path: lookup("REPO_PATH")
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from),
      git_timeout: timeout_secs
        .map(Duration::from_secs)
        .unwrap_or(defaults.git_timeout),
      max_commits: parse_var("MAX_COMMITS", lookup("MAX_COMMITS"))?.unwrap_or(defaults.max_commits),
      since_days: parse_var("SINCE_DAYS", lookup("SINCE_DAYS"))?.unwrap_or(defaults.since_days),
      sprint_days: parse_var("SPRINT_DAYS", lookup("SPRINT_DAYS"))?,
      days_elapsed: parse_var("DAYS_ELAPSED", lookup("DAYS_ELAPSED"))?,
    })
  }
}
