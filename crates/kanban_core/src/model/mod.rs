//! Kanban domain model.
//!
//! # Responsibility
//! - Define `Project`, `Stage` and `Ticket` and the operations that move
//!   tickets through a project's pipeline.
//! - Stay free of I/O; persistence lives in `crate::repo`.
//!
//! # Invariants
//! - Every persisted project is identified by a stable, non-nil `ProjectId`.
//! - Stages have no identity outside their project.

pub mod project;
pub mod stage;
pub mod ticket;
