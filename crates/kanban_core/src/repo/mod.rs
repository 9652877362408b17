//! Persistent store contracts and implementations.
//!
//! # Responsibility
//! - Define the durable project store contract.
//! - Isolate SQLite query details from the write-through façade.
//!
//! # Invariants
//! - Write paths enforce `Project::validate()` before persistence.
//! - Store APIs return semantic errors (`NotFound`, `AlreadyExists`) in
//!   addition to engine errors, and `Option` for plain lookups.

pub mod project_repo;
