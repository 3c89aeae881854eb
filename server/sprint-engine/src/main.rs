//! Binary entrypoint: read one AnalysisInput JSON object from stdin, write one
//! SprintReport JSON object to stdout.
//!
//! Failures print an ErrorOutput instead and exit with status 1. Logs go to
//! stderr (`RUST_LOG`, default `sprint_engine=warn`).

use std::io::{self, Read, Write};

use sprint_engine::types::ErrorOutput;
use sprint_engine::{AnalysisInput, Engine, EngineError};
use tracing_subscriber::EnvFilter;

fn run(raw: &str) -> Result<String, EngineError> {
  let input: AnalysisInput = serde_json::from_str(raw)?;
  let report = Engine::with_defaults().analyze(&input)?;
  Ok(serde_json::to_string(&report)?)
}

fn main() {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sprint_engine=warn"));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_target(false)
    .with_writer(io::stderr)
    .init();

  let mut raw = String::new();
  if let Err(e) = io::stdin().read_to_string(&mut raw) {
    let _ = writeln!(io::stderr(), "sprint-engine: read error: {}", e);
    std::process::exit(1);
  }

  let stdout = io::stdout();
  let mut out = io::BufWriter::new(stdout.lock());
  match run(&raw) {
    Ok(json) => {
      let _ = writeln!(out, "{}", json);
      let _ = out.flush();
    }
    Err(e) => {
      tracing::error!(error = %e, "analysis failed");
      let _ = serde_json::to_writer(&mut out, &ErrorOutput::from(&e));
      let _ = writeln!(out);
      let _ = out.flush();
      std::process::exit(1);
    }
  }
}
