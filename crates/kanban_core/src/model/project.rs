//! Project aggregate: an ordered pipeline of stages plus finalized tickets.
//!
//! # Responsibility
//! - Own stage ordering and ticket movement between stages.
//! - Surface logic failures (unknown stage, unknown ticket) as typed errors.
//!
//! # Invariants
//! - A ticket identifier appears in at most one stage, and never in a stage
//!   and `finalized` at the same time.
//! - Ticket lookups match by identifier only.
//! - Moving between stages appends at the tail of the destination.
//! - Finalization is permanent; there is no way back into a stage.
//!
//! # See also
//! - `crate::repo::project_repo` for persistence of this aggregate.

use crate::model::stage::{Direction, Stage};
use crate::model::ticket::{NewTicket, Ticket, TicketId, TicketInput};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable global identifier of a project.
pub type ProjectId = Uuid;

static NO_STAGE: Stage = Stage::empty();

/// Shape errors that make a project unfit for storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectValidationError {
    NilId,
    EmptyName,
}

impl Display for ProjectValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "project id must not be nil"),
            Self::EmptyName => write!(f, "project name must not be blank"),
        }
    }
}

impl Error for ProjectValidationError {}

/// Logic errors raised by project operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectError {
    /// No stage carries the requested name.
    StageNotFound(String),
    /// No stage holds a ticket with this identifier.
    TicketNotFound(TicketId),
    /// The identifier is already held by a stage or the finalized list.
    DuplicateTicket(TicketId),
    /// Stage still holds tickets and cannot be removed.
    StageNotEmpty(String),
    /// Blank project or stage name.
    InvalidName,
}

impl Display for ProjectError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StageNotFound(name) => write!(f, "stage not found: `{name}`"),
            Self::TicketNotFound(id) => write!(f, "ticket not found: {id}"),
            Self::DuplicateTicket(id) => write!(f, "ticket already assigned: {id}"),
            Self::StageNotEmpty(name) => write!(f, "stage `{name}` still holds tickets"),
            Self::InvalidName => write!(f, "name must not be blank"),
        }
    }
}

impl Error for ProjectError {}

/// Context for a set of stages and tickets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    /// Pipeline, left to right.
    #[serde(default)]
    pub stages: Vec<Stage>,
    /// Append-only archive of tickets that left the pipeline.
    #[serde(default)]
    pub finalized: Vec<Ticket>,
}

impl Project {
    /// Creates an empty project with a freshly generated id.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            stages: Vec::new(),
            finalized: Vec::new(),
        }
    }

    /// Creates an empty project with a caller-provided id.
    pub fn with_id(
        id: ProjectId,
        name: impl Into<String>,
    ) -> Result<Self, ProjectValidationError> {
        if id.is_nil() {
            return Err(ProjectValidationError::NilId);
        }
        Ok(Self {
            id,
            name: name.into(),
            stages: Vec::new(),
            finalized: Vec::new(),
        })
    }

    /// Appends one empty stage per name, in order.
    pub fn with_stages<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            self.make_stage(name);
        }
        self
    }

    /// Checks the shape required before persistence.
    pub fn validate(&self) -> Result<(), ProjectValidationError> {
        if self.id.is_nil() {
            return Err(ProjectValidationError::NilId);
        }
        if self.name.trim().is_empty() {
            return Err(ProjectValidationError::EmptyName);
        }
        Ok(())
    }

    pub fn rename(&mut self, name: impl Into<String>) -> Result<(), ProjectError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ProjectError::InvalidName);
        }
        self.name = name;
        Ok(())
    }

    /// Appends an empty stage. Duplicate names are accepted; name lookups
    /// resolve to the leftmost match.
    pub fn make_stage(&mut self, name: impl Into<String>) {
        self.stages.push(Stage::new(name));
    }

    pub fn list_stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn stage(&self, name: &str) -> Option<&Stage> {
        self.stages.iter().find(|stage| stage.name == name)
    }

    pub fn stage_index(&self, name: &str) -> Option<usize> {
        self.stages.iter().position(|stage| stage.name == name)
    }

    /// Swaps the named stage with its neighbor in `direction`.
    ///
    /// Returns `false` when the stage is unknown or already at the boundary.
    pub fn move_stage(&mut self, name: &str, direction: Direction) -> bool {
        let Some(index) = self.stage_index(name) else {
            return false;
        };
        match direction.neighbor(index, self.stages.len()) {
            Some(target) => {
                self.stages.swap(index, target);
                true
            }
            None => false,
        }
    }

    pub fn rename_stage(
        &mut self,
        name: &str,
        new_name: impl Into<String>,
    ) -> Result<(), ProjectError> {
        let new_name = new_name.into();
        if new_name.trim().is_empty() {
            return Err(ProjectError::InvalidName);
        }
        let index = self.require_stage(name)?;
        self.stages[index].name = new_name;
        Ok(())
    }

    /// Removes an empty stage and returns it.
    pub fn remove_stage(&mut self, name: &str) -> Result<Stage, ProjectError> {
        let index = self.require_stage(name)?;
        if !self.stages[index].is_empty() {
            return Err(ProjectError::StageNotEmpty(name.to_string()));
        }
        Ok(self.stages.remove(index))
    }

    /// Appends a ticket to the named stage and returns its identifier.
    ///
    /// `TicketInput::New` mints the identifier and creation time.
    /// `TicketInput::Existing` keeps both, and is rejected when the
    /// identifier is already held anywhere in this project.
    ///
    /// # Errors
    /// - `StageNotFound` when no stage has that name; nothing is created.
    /// - `DuplicateTicket` for an existing ticket already in the project.
    pub fn assign_ticket(
        &mut self,
        stage: &str,
        ticket: impl Into<TicketInput>,
    ) -> Result<TicketId, ProjectError> {
        let index = self.require_stage(stage)?;
        let ticket = match ticket.into() {
            TicketInput::New(request) => request.into_ticket(),
            // A nil id never identifies anything; mint one like a new request.
            TicketInput::Existing(ticket) if ticket.id.is_nil() => NewTicket {
                title: ticket.title,
                summary: ticket.summary,
                details: ticket.details,
            }
            .into_ticket(),
            TicketInput::Existing(ticket) => {
                if self.contains_ticket(ticket.id) || self.is_finalized(ticket.id) {
                    return Err(ProjectError::DuplicateTicket(ticket.id));
                }
                ticket
            }
        };
        let id = ticket.id;
        self.stages[index].tickets.push(ticket);
        Ok(id)
    }

    /// Replaces title, summary and details of the ticket with the same id,
    /// keeping its stage and position.
    pub fn update_ticket(&mut self, ticket: &Ticket) -> Result<(), ProjectError> {
        if self.stages.iter_mut().any(|stage| stage.update(ticket)) {
            Ok(())
        } else {
            Err(ProjectError::TicketNotFound(ticket.id))
        }
    }

    /// Moves the ticket to the next stage. No-op in the last stage.
    pub fn progress_ticket(&mut self, id: TicketId) -> bool {
        self.move_between_stages(id, Direction::Forward)
    }

    /// Moves the ticket to the previous stage. No-op in the first stage.
    pub fn regress_ticket(&mut self, id: TicketId) -> bool {
        self.move_between_stages(id, Direction::Backward)
    }

    /// Reorders the ticket within its stage.
    pub fn move_ticket(&mut self, id: TicketId, direction: Direction) -> bool {
        match self.stage_index_for_ticket(id) {
            Some(index) => self.stages[index].shift(id, direction),
            None => false,
        }
    }

    /// Takes the ticket out of its stage and appends it to `finalized`.
    ///
    /// Idempotent: returns `false` when no stage holds the ticket.
    pub fn finalize_ticket(&mut self, id: TicketId) -> bool {
        let Some(index) = self.stage_index_for_ticket(id) else {
            return false;
        };
        match self.stages[index].take(id) {
            Some(ticket) => {
                self.finalized.push(ticket);
                true
            }
            None => false,
        }
    }

    /// Stage holding the ticket, or a nameless empty stage.
    pub fn stage_for_ticket(&self, id: TicketId) -> &Stage {
        self.stage_index_for_ticket(id)
            .map_or(&NO_STAGE, |index| &self.stages[index])
    }

    pub fn stage_index_for_ticket(&self, id: TicketId) -> Option<usize> {
        self.stages.iter().position(|stage| stage.contains(id))
    }

    /// Tickets of the named stage; empty for an unknown name.
    pub fn list_tickets(&self, stage: &str) -> &[Ticket] {
        match self.stage(stage) {
            Some(stage) => &stage.tickets,
            None => &[],
        }
    }

    /// Whether any stage holds the ticket. Finalized tickets do not count.
    pub fn contains_ticket(&self, id: TicketId) -> bool {
        self.stage_index_for_ticket(id).is_some()
    }

    pub fn find_ticket(&self, id: TicketId) -> Option<&Ticket> {
        self.stages.iter().find_map(|stage| stage.find(id))
    }

    pub fn is_finalized(&self, id: TicketId) -> bool {
        self.finalized.iter().any(|ticket| ticket.id == id)
    }

    fn require_stage(&self, name: &str) -> Result<usize, ProjectError> {
        self.stage_index(name)
            .ok_or_else(|| ProjectError::StageNotFound(name.to_string()))
    }

    fn move_between_stages(&mut self, id: TicketId, direction: Direction) -> bool {
        let Some(from) = self.stage_index_for_ticket(id) else {
            return false;
        };
        let Some(to) = direction.neighbor(from, self.stages.len()) else {
            return false;
        };
        match self.stages[from].take(id) {
            Some(ticket) => {
                self.stages[to].tickets.push(ticket);
                true
            }
            None => false,
        }
    }
}
