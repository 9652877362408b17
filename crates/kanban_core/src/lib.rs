//! Data and state engine of a kanban board.
//! Owns the project/stage/ticket model and the write-through storage that
//! keeps projects durable behind an in-memory cache.

pub mod cache;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use cache::keyed_state::KeyedStateMap;
pub use cache::project_cache::ProjectCache;
pub use config::StorageConfig;
pub use logging::{init_logging, logging_status, LogLevel};
pub use model::project::{Project, ProjectError, ProjectId, ProjectValidationError};
pub use model::stage::{Direction, Stage};
pub use model::ticket::{NewTicket, Ticket, TicketId, TicketInput};
pub use repo::project_repo::{
    Partition, ProjectStore, RepoError, RepoResult, SaveOutcome, SqliteProjectStore,
};
pub use service::project_storage::{ProjectStorage, StorageStatus};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
