//! Ticket domain model.
//!
//! # Responsibility
//! - Define the unit of work that flows through a project's stages.
//! - Separate identified tickets from creation requests.
//!
//! # Invariants
//! - A stored `Ticket` always carries a non-nil `id`.
//! - `id` and `created_at` are assigned once, when the ticket first lands in
//!   a stage, and never change afterwards.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Stable identifier of a ticket within its project.
pub type TicketId = Uuid;

/// Identified ticket held by a stage or by a project's finalized list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// Minted on first assignment.
    pub id: TicketId,
    /// Short title shown on the card.
    pub title: String,
    /// Concise overview.
    pub summary: String,
    /// Full free-text details.
    pub details: String,
    /// Unix epoch milliseconds, set on first assignment.
    pub created_at: i64,
}

/// Content of a ticket that has not been assigned to a stage yet.
///
/// Never stored directly; `Project::assign_ticket` turns it into a `Ticket`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTicket {
    pub title: String,
    pub summary: String,
    pub details: String,
}

impl NewTicket {
    /// Creates a request with only a title.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Mints identity and creation time.
    pub(crate) fn into_ticket(self) -> Ticket {
        Ticket {
            id: Uuid::new_v4(),
            title: self.title,
            summary: self.summary,
            details: self.details,
            created_at: now_epoch_ms(),
        }
    }
}

/// Input accepted by `Project::assign_ticket`.
///
/// The tag decides between create (`New`) and re-assignment of an already
/// identified ticket (`Existing`), so no zero-value inference is needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketInput {
    New(NewTicket),
    Existing(Ticket),
}

impl From<NewTicket> for TicketInput {
    fn from(value: NewTicket) -> Self {
        Self::New(value)
    }
}

impl From<Ticket> for TicketInput {
    fn from(value: Ticket) -> Self {
        Self::Existing(value)
    }
}

fn now_epoch_ms() -> i64 {
    // Clock before the epoch collapses to 0 rather than failing assignment.
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::{NewTicket, TicketInput};

    #[test]
    fn into_ticket_mints_id_and_timestamp() {
        let ticket = NewTicket::titled("write docs").into_ticket();
        assert!(!ticket.id.is_nil());
        assert!(ticket.created_at > 0);
        assert_eq!(ticket.title, "write docs");
        assert!(ticket.summary.is_empty());
    }

    #[test]
    fn two_requests_never_share_an_id() {
        let first = NewTicket::titled("a").into_ticket();
        let second = NewTicket::titled("a").into_ticket();
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn conversions_pick_the_matching_variant() {
        let request: TicketInput = NewTicket::titled("x").into();
        assert!(matches!(request, TicketInput::New(_)));

        let ticket = NewTicket::titled("y").into_ticket();
        let existing: TicketInput = ticket.clone().into();
        assert_eq!(existing, TicketInput::Existing(ticket));
    }
}
