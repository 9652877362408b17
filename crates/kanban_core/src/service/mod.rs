//! Consumer-facing services.
//!
//! # Responsibility
//! - Compose store and cache into the API the presentation layer calls.
//! - Keep callers decoupled from storage details.

pub mod project_storage;
