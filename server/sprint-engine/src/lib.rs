//! Sprint health engine: deterministic, rule-based sprint analytics.
//!
//! Takes a batch of commits and an optional ticket board, discovers a board
//! from commit messages when none is given, and emits a structured
//! SprintReport: debt score and refactor suggestions, velocity forecast with
//! risk level, composite health score, and board-sync suggestions.
//!
//! No DB, no network; pure computation. Free-text generation goes through
//! the [`oracle::TextOracle`] seam.

pub mod config;
pub mod date;
pub mod debt;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod extract;
pub mod forecast;
pub mod health;
pub mod oracle;
pub mod sync;
pub mod types;

pub use config::Config;
pub use engine::Engine;
pub use error::EngineError;
pub use oracle::{HeuristicOracle, TextOracle};
pub use types::{AnalysisInput, Commit, PullRequest, SprintReport, Ticket, TicketStatus};
