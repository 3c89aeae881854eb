//! Tolerant timestamp parsing. Every time-based rule goes through here and
//! treats `None` as "skip this commit".

use chrono::{DateTime, FixedOffset, NaiveDateTime, Timelike};

/// Parse an ISO-8601 commit date, keeping the author's UTC offset.
///
/// Accepts RFC 3339 (`2025-01-15T10:30:00Z`, `2025-01-15T10:30:00+02:00`),
/// git's default `2025-01-15 10:30:00 +0200`, and offset-less
/// `2025-01-15T10:30:00` (read as UTC).
pub fn parse_timestamp(s: &str) -> Option<DateTime<FixedOffset>> {
  let s = s.trim();
  if s.is_empty() {
    return None;
  }
  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Some(dt);
  }
  if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S %z") {
    return Some(dt);
  }
  NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
    .ok()
    .map(|naive| naive.and_utc().fixed_offset())
}

/// Calendar day in the author's local time: "YYYY-MM-DD".
pub fn day_key(ts: &DateTime<FixedOffset>) -> String {
  ts.format("%Y-%m-%d").to_string()
}

/// Hour of day in the author's local time.
pub fn local_hour(ts: &DateTime<FixedOffset>) -> u32 {
  ts.hour()
}
