//! Structured error types for the sprint engine.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
  #[error("validation: {field}: {reason}")]
  Validation { field: String, reason: String },

  #[error("parse: {0}")]
  Parse(String),

  #[error("json: {0}")]
  Json(#[from] serde_json::Error),

  /// A collaborator outside the core (git, an oracle) failed or timed out.
  #[error("{name}: {message}")]
  Collaborator { name: String, message: String },
}

impl EngineError {
  pub fn validation(field: &str, reason: &str) -> Self {
    Self::Validation {
      field: field.to_string(),
      reason: reason.to_string(),
    }
  }

  pub fn parse(msg: impl Into<String>) -> Self {
    Self::Parse(msg.into())
  }

  pub fn collaborator(name: &str, message: impl Into<String>) -> Self {
    Self::Collaborator {
      name: name.to_string(),
      message: message.into(),
    }
  }

  /// True when the failure came from outside the core.
  pub fn is_collaborator(&self) -> bool {
    matches!(self, Self::Collaborator { .. })
  }
}
