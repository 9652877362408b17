//! In-memory materialization of stored projects.
//!
//! # Responsibility
//! - Answer reads without touching persistent storage.
//! - Preserve a stable, explicit enumeration order per partition.
//!
//! # Invariants
//! - Nothing in this module performs I/O.
//! - Active and archived buckets keep independent order lists.

pub mod keyed_state;
pub mod project_cache;
