//! Stage domain model.
//!
//! # Responsibility
//! - Hold the ordered ticket list of one pipeline step.
//! - Provide identifier-based ticket lookup, removal and in-place update.
//!
//! # Invariants
//! - Ticket order is meaningful: index 0 is the top of the stage.
//! - A stage never holds two tickets with the same identifier.

use crate::model::ticket::{Ticket, TicketId};
use serde::{Deserialize, Serialize};

/// Mutually exclusive movement directions.
///
/// For stages `Forward` is to the right of the pipeline; for tickets inside
/// a stage it is towards the tail of the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    /// Signed index step, positive for `Forward`.
    pub fn offset(self) -> isize {
        match self {
            Self::Forward => 1,
            Self::Backward => -1,
        }
    }

    /// Returns the opposite direction.
    pub fn invert(self) -> Self {
        match self {
            Self::Forward => Self::Backward,
            Self::Backward => Self::Forward,
        }
    }

    /// Index of the neighbor of `index` in a list of `len` items, if any.
    pub(crate) fn neighbor(self, index: usize, len: usize) -> Option<usize> {
        let target = index.checked_add_signed(self.offset())?;
        (target < len).then_some(target)
    }
}

/// Named step in a project's pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    pub name: String,
    pub tickets: Vec<Ticket>,
}

impl Stage {
    /// Creates an empty stage.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tickets: Vec::new(),
        }
    }

    /// Nameless stage without tickets, used as a "no owner" answer.
    pub const fn empty() -> Self {
        Self {
            name: String::new(),
            tickets: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }

    /// Position of the ticket within this stage.
    pub fn position(&self, id: TicketId) -> Option<usize> {
        self.tickets.iter().position(|ticket| ticket.id == id)
    }

    pub fn contains(&self, id: TicketId) -> bool {
        self.position(id).is_some()
    }

    pub fn find(&self, id: TicketId) -> Option<&Ticket> {
        self.tickets.iter().find(|ticket| ticket.id == id)
    }

    /// Removes and returns the ticket, if held here.
    pub fn take(&mut self, id: TicketId) -> Option<Ticket> {
        let index = self.position(id)?;
        Some(self.tickets.remove(index))
    }

    /// Replaces the editable content of a held ticket in place.
    ///
    /// Identity and creation time of the stored ticket are kept. Returns
    /// `false` when the ticket is not in this stage.
    pub fn update(&mut self, ticket: &Ticket) -> bool {
        match self.tickets.iter_mut().find(|held| held.id == ticket.id) {
            Some(held) => {
                held.title.clone_from(&ticket.title);
                held.summary.clone_from(&ticket.summary);
                held.details.clone_from(&ticket.details);
                true
            }
            None => false,
        }
    }

    /// Swaps a ticket with its neighbor in `direction`.
    ///
    /// Returns `false` at either end of the list or when the ticket is absent.
    pub fn shift(&mut self, id: TicketId, direction: Direction) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        match direction.neighbor(index, self.tickets.len()) {
            Some(target) => {
                self.tickets.swap(index, target);
                true
            }
            None => false,
        }
    }
}
