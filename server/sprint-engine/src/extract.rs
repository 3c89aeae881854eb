//! Ticket identifier extraction from free text.
//!
//! Rules run in priority order and every match is kept (union, not
//! first-match-wins). Results are normalized and deduplicated.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// One recognizer. Capture group 1 holds the identifier.
pub struct IdRule {
  pub name: &'static str,
  re: Regex,
}

fn compile(pattern: &str) -> Regex {
  match Regex::new(pattern) {
    Ok(re) => re,
    Err(_) => unreachable!("static regex pattern"),
  }
}

static ID_RULES: LazyLock<Vec<IdRule>> = LazyLock::new(|| {
  vec![
    // Jira/Linear style: PROJ-123
    IdRule {
      name: "project_key",
      re: compile(r"\b([A-Z]{2,10}-\d+)\b"),
    },
    // Issue number: #42
    IdRule {
      name: "issue_number",
      re: compile(r"#(\d+)\b"),
    },
    IdRule {
      name: "github",
      re: compile(r"\b(GH-\d+)\b"),
    },
    IdRule {
      name: "fix",
      re: compile(r"\b(FIX-\d+)\b"),
    },
  ]
});

/// The recognizers in priority order.
pub fn rules() -> &'static [IdRule] {
  &ID_RULES
}

/// Canonical form: bare digit runs gain a leading `#`, everything else is
/// kept verbatim (case included).
pub fn normalize_id(raw: &str) -> String {
  if !raw.is_empty() && raw.chars().all(|c| c.is_ascii_digit()) {
    format!("#{}", raw)
  } else {
    raw.to_string()
  }
}

/// All ticket ids in `text`, deduplicated, in rule-then-position order.
pub fn extract_ids(text: &str) -> Vec<String> {
  extract_with(text, rules())
}

/// Like [`extract_ids`] but restricted to the given rules.
pub fn extract_with<'a>(text: &str, rules: impl IntoIterator<Item = &'a IdRule>) -> Vec<String> {
  let mut seen = HashSet::new();
  let mut ids = Vec::new();
  for rule in rules {
    for caps in rule.re.captures_iter(text) {
      let Some(m) = caps.get(1) else { continue };
      let id = normalize_id(m.as_str());
      if seen.insert(id.clone()) {
        ids.push(id);
      }
    }
  }
  ids
}
