//! Shared application state.

use sprint_engine::Engine;

use crate::config::ServiceConfig;
use crate::git::GitLogReader;

pub struct AppState {
  pub engine: Engine,
  pub config: ServiceConfig,
  /// Present only when `REPO_PATH` names a git working tree.
  pub reader: Option<GitLogReader>,
}

impl AppState {
  pub fn new(engine: Engine, config: ServiceConfig, reader: Option<GitLogReader>) -> Self {
    Self {
      engine,
      config,
      reader,
    }
  }
}
