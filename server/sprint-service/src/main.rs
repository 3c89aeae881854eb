//! Binary entrypoint for the sprint service.

use std::net::SocketAddr;
use std::sync::Arc;

use sprint_engine::{Config, Engine};
use sprint_service::{AppState, GitLogReader, ServiceConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  let filter = EnvFilter::try_from_default_env()
    .unwrap_or_else(|_| EnvFilter::new("sprint_service=info,tower_http=info"));
  tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

  let config = ServiceConfig::from_env()?;

  // A bad REPO_PATH only disables /report.
  let reader = match &config.repo_path {
    Some(path) => match GitLogReader::new(path, config.git_timeout, config.max_commits, config.since_days) {
      Ok(reader) => Some(reader),
      Err(e) => {
        warn!(error = %e, "REPO_PATH ignored");
        None
      }
    },
    None => None,
  };

  let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
  let state = Arc::new(AppState::new(Engine::new(Config::default()), config, reader));
  let app = sprint_service::router(state);

  info!("sprint-service listening on http://{}", addr);
  let listener = tokio::net::TcpListener::bind(addr).await?;
  axum::serve(listener, app).await?;

  Ok(())
}
