//! Board sync: map commits onto an existing board and suggest status changes.

use crate::types::{Commit, Ticket, TicketStatus, TicketUpdate};

const ID_CONFIDENCE: f64 = 0.95;
const TITLE_CONFIDENCE: f64 = 0.6;

/// One suggestion per (commit, ticket) pair where the commit message names the
/// ticket id or contains its title (both case-insensitive).
pub fn suggest_updates(commits: &[Commit], board: &[Ticket]) -> Vec<TicketUpdate> {
  let mut updates = Vec::new();
  for commit in commits {
    let message = commit.message.to_lowercase();
    let new_status = if message.contains("fix") || message.contains("feat") {
      TicketStatus::Done
    } else {
      TicketStatus::InProgress
    };

    for ticket in board {
      let id_hit = !ticket.id.is_empty() && message.contains(&ticket.id.to_lowercase());
      let title = ticket.title.trim().to_lowercase();
      let title_hit = !title.is_empty() && message.contains(&title);
      if !id_hit && !title_hit {
        continue;
      }
      updates.push(TicketUpdate {
        ticket_id: ticket.id.clone(),
        new_status: new_status.to_string(),
        reason: format!("Mapped from commit {}: {}", commit.short_hash(), commit.message),
        confidence: if id_hit { ID_CONFIDENCE } else { TITLE_CONFIDENCE },
        side_effects: Vec::new(),
      });
    }
  }
  updates
}
