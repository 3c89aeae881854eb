//! Version-control log reader: runs `git log` under a timeout and turns its
//! output into engine commits.

use std::path::{Path, PathBuf};
use std::time::Duration;

use sprint_engine::debt::changed_paths;
use sprint_engine::{Commit, EngineError};
use tokio::process::Command;
use tracing::debug;

const RECORD_SEP: char = '\u{1e}';
const FIELD_SEP: char = '\u{1f}';

#[derive(Debug, Clone)]
pub struct GitLogReader {
  repo: PathBuf,
  timeout: Duration,
  max_commits: usize,
  since_days: u32,
}

impl GitLogReader {
  /// Fails unless `repo` is a working tree with a `.git` entry.
  pub fn new(repo: impl Into<PathBuf>, timeout: Duration, max_commits: usize, since_days: u32) -> Result<Self, EngineError> {
    let repo = repo.into();
    if !repo.join(".git").exists() {
      return Err(EngineError::collaborator(
        "git",
        format!("not a git repository: {}", repo.display()),
      ));
    }
    Ok(Self {
      repo,
      timeout,
      max_commits,
      since_days,
    })
  }

  pub fn repo(&self) -> &Path {
    &self.repo
  }

  /// `git log` arguments. `since_days == 0` reads the whole history.
  fn log_args(&self) -> Vec<String> {
    let mut args = vec![
      "log".to_string(),
      "--no-merges".to_string(),
      "-p".to_string(),
      format!("-n{}", self.max_commits),
    ];
    if self.since_days > 0 {
      args.push(format!("--since={} days ago", self.since_days));
    }
    args.push("--pretty=format:%x1e%H%x1f%an%x1f%aI%x1f%s".to_string());
    args
  }

  /// Recent non-merge commits with their patches, newest first.
  pub async fn read(&self) -> Result<Vec<Commit>, EngineError> {
    let mut cmd = Command::new("git");
    cmd
      .arg("-C")
      .arg(&self.repo)
      .args(self.log_args())
      .kill_on_drop(true);

    let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
      Ok(Ok(output)) => output,
      Ok(Err(e)) => return Err(EngineError::collaborator("git", format!("failed to run git: {}", e))),
      Err(_) => {
        return Err(EngineError::collaborator(
          "git",
          format!("git log timed out after {}s", self.timeout.as_secs()),
        ))
      }
    };

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(EngineError::collaborator("git", stderr.trim().to_string()));
    }

    let commits = parse_log(&String::from_utf8_lossy(&output.stdout));
    debug!(repo = %self.repo.display(), commits = commits.len(), "read git log");
    Ok(commits)
  }
}

/// Parse `git log -p` output produced with the record/field separators above.
pub fn parse_log(raw: &str) -> Vec<Commit> {
  raw
    .split(RECORD_SEP)
    .filter_map(|record| {
      let (header, patch) = record.split_once('\n').unwrap_or((record, ""));
      let mut fields = header.split(FIELD_SEP);
      let hash = fields.next()?.trim();
      if hash.is_empty() {
        return None;
      }
      let author = fields.next().unwrap_or_default();
      let date = fields.next().unwrap_or_default();
      let message = fields.next().unwrap_or_default();

      let patch = patch.trim();
      let diff = (!patch.is_empty()).then(|| patch.to_string());
      Some(Commit {
        hash: hash.to_string(),
        author: author.to_string(),
        date: date.to_string(),
        message: message.to_string(),
        files_changed: diff.as_deref().map(changed_paths).unwrap_or_default(),
        diff,
      })
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn git_available() -> bool {
    std::process::Command::new("git")
      .arg("--version")
      .output()
      .map(|o| o.status.success())
      .unwrap_or(false)
  }

  fn git(dir: &Path, args: &[&str]) {
    let status = std::process::Command::new("git")
      .arg("-C")
      .arg(dir)
      .args(["-c", "user.name=Test Dev", "-c", "user.email=dev@example.com"])
      .args(args)
      .status()
      .unwrap();
    assert!(status.success(), "git {:?} failed", args);
  }

  #[test]
  fn parses_records_with_and_without_patches() {
    let raw = "\u{1e}aaaa111\u{1f}alice\u{1f}2025-01-15T10:00:00+00:00\u{1f}fix: PROJ-1 login\n\n\
               diff --git a/src/auth.rs b/src/auth.rs\n--- a/src/auth.rs\n+++ b/src/auth.rs\n\
               @@ -1 +1,2 @@\n fn a() {}\n+// TODO tidy\n\
               \u{1e}bbbb222\u{1f}bob\u{1f}2025-01-14T09:00:00+00:00\u{1f}docs: readme";
    let commits = parse_log(raw);
    assert_eq!(commits.len(), 2);

    assert_eq!(commits[0].hash, "aaaa111");
    assert_eq!(commits[0].author, "alice");
    assert_eq!(commits[0].message, "fix: PROJ-1 login");
    assert_eq!(commits[0].files_changed, vec!["src/auth.rs"]);
    assert!(commits[0].diff.as_deref().unwrap().contains("+// TODO tidy"));

    assert_eq!(commits[1].message, "docs: readme");
    assert!(commits[1].diff.is_none());
    assert!(commits[1].files_changed.is_empty());
  }

  #[test]
  fn empty_output_is_empty_batch() {
    assert!(parse_log("").is_empty());
    assert!(parse_log("\n").is_empty());
  }

  #[test]
  fn zero_since_days_reads_full_history() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join(".git")).unwrap();

    let bounded = GitLogReader::new(dir.path(), Duration::from_secs(5), 10, 14).unwrap();
    assert!(bounded.log_args().contains(&"--since=14 days ago".to_string()));

    let unbounded = GitLogReader::new(dir.path(), Duration::from_secs(5), 10, 0).unwrap();
    assert!(unbounded.log_args().iter().all(|a| !a.starts_with("--since")));
    assert!(unbounded.log_args().contains(&"-n10".to_string()));
  }

  #[test]
  fn rejects_plain_directory() {
    let dir = tempfile::tempdir().unwrap();
    let err = GitLogReader::new(dir.path(), Duration::from_secs(5), 10, 14).unwrap_err();
    assert!(err.is_collaborator());
    assert!(err.to_string().contains("not a git repository"));
  }

  #[tokio::test]
  async fn reads_commits_from_real_repository() {
    if !git_available() {
      return;
    }
    let dir = tempfile::tempdir().unwrap();
    git(dir.path(), &["init", "-q"]);
    std::fs::write(dir.path().join("app.rs"), "fn main() {}\n// TODO: hardcode port\n").unwrap();
    git(dir.path(), &["add", "."]);
    git(dir.path(), &["commit", "-q", "-m", "feat: PROJ-3 bootstrap app"]);

    let reader = GitLogReader::new(dir.path(), Duration::from_secs(10), 10, 14).unwrap();
    let commits = reader.read().await.unwrap();
    assert_eq!(commits.len(), 1);
    assert_eq!(commits[0].author, "Test Dev");
    assert_eq!(commits[0].message, "feat: PROJ-3 bootstrap app");
    assert_eq!(commits[0].files_changed, vec!["app.rs"]);
  }
}
