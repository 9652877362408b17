//! Write-through project storage façade.
//!
//! # Responsibility
//! - Serve every read from the in-memory cache.
//! - Send writes to the persistent store first, then rebuild the cache from
//!   the store so both can never silently diverge.
//! - Skip store writes for projects whose content did not change.
//!
//! # Invariants
//! - `create` populates the cache only after the durable write succeeded.
//! - `save` is legal only for active projects; nothing is written when any
//!   project in the batch is archived or unknown.
//! - After any store mutation the cache equals the store, partition by
//!   partition and in the same order.
//! - Callers receive value copies; the cache is never lent out mutably.
//!
//! # Concurrency
//! Mutating calls take `&mut self`, so one owner drives the façade at a
//! time. Share it across threads behind a `Mutex` to keep the
//! diff/write/repopulate sequence of `save` atomic.

use crate::cache::project_cache::ProjectCache;
use crate::config::StorageConfig;
use crate::model::project::{Project, ProjectId};
use crate::repo::project_repo::{
    Partition, ProjectStore, RepoError, RepoResult, SqliteProjectStore,
};
use log::{debug, error, info, warn};
use std::path::Path;
use std::time::Instant;

/// Storage status of one project id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageStatus {
    Active,
    Archived,
    NonExistent,
}

/// Cache-fronted project storage.
pub struct ProjectStorage<S: ProjectStore> {
    store: S,
    cache: ProjectCache,
}

impl ProjectStorage<SqliteProjectStore> {
    /// Opens the database file at `path` and populates the cache.
    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        Self::new(SqliteProjectStore::open(path)?)
    }

    pub fn open_in_memory() -> RepoResult<Self> {
        Self::new(SqliteProjectStore::open_in_memory()?)
    }

    pub fn from_config(config: &StorageConfig) -> RepoResult<Self> {
        Self::open(&config.db_path)
    }
}

impl<S: ProjectStore> ProjectStorage<S> {
    /// Wraps a store and materializes both partitions into the cache.
    pub fn new(store: S) -> RepoResult<Self> {
        let mut storage = Self {
            store,
            cache: ProjectCache::new(),
        };
        storage.populate()?;
        Ok(storage)
    }

    /// Underlying persistent store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Durably creates a project, then caches it.
    pub fn create(&mut self, project: &Project) -> RepoResult<()> {
        let started_at = Instant::now();
        if let Err(err) = self.store.create(project) {
            error!(
                "event=project_create module=storage status=error project_id={} duration_ms={} error={}",
                project.id,
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err);
        }

        self.cache.add(Partition::Active, project.clone());
        info!(
            "event=project_create module=storage status=ok project_id={} duration_ms={}",
            project.id,
            started_at.elapsed().as_millis()
        );
        Ok(())
    }

    /// Persists the projects that differ from their cached copy.
    ///
    /// Returns the number of records written; `0` means no store I/O.
    ///
    /// # Errors
    /// - `NotFound` when a project is not active. Checked for the whole
    ///   batch before anything is written.
    /// - Store errors are forwarded unchanged.
    pub fn save(&mut self, projects: &[Project]) -> RepoResult<usize> {
        let started_at = Instant::now();

        let mut changed = Vec::new();
        for project in projects {
            let Some(cached) = self.cache.find(Partition::Active, project.id) else {
                warn!(
                    "event=project_save module=storage status=error project_id={} error_code=not_active",
                    project.id
                );
                return Err(RepoError::NotFound(project.id));
            };
            if cached != project {
                changed.push(project.clone());
            }
        }

        if changed.is_empty() {
            debug!(
                "event=project_save module=storage status=skipped requested={}",
                projects.len()
            );
            return Ok(0);
        }

        let outcome = match self.store.save(&changed) {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(
                    "event=project_save module=storage status=error changed={} duration_ms={} error={}",
                    changed.len(),
                    started_at.elapsed().as_millis(),
                    err
                );
                return Err(err);
            }
        };
        self.populate()?;

        if let Some(missing) = outcome.missing.first() {
            warn!(
                "event=project_save module=storage status=error project_id={} error_code=store_missing",
                missing
            );
            return Err(RepoError::NotFound(*missing));
        }

        info!(
            "event=project_save module=storage status=ok requested={} written={} duration_ms={}",
            projects.len(),
            outcome.written,
            started_at.elapsed().as_millis()
        );
        Ok(outcome.written)
    }

    /// Overwrites caller-owned projects with their cached active copies.
    ///
    /// A nil id in the first slot replaces the vector with `list()`.
    /// All-or-nothing: a missing id leaves the vector untouched.
    pub fn load(&self, projects: &mut Vec<Project>) -> RepoResult<()> {
        if projects.first().is_some_and(|first| first.id.is_nil()) {
            *projects = self.list();
            return Ok(());
        }

        let mut loaded = Vec::with_capacity(projects.len());
        for project in projects.iter() {
            let cached = self
                .cache
                .find(Partition::Active, project.id)
                .ok_or(RepoError::NotFound(project.id))?;
            loaded.push(cached.clone());
        }
        *projects = loaded;
        Ok(())
    }

    /// Value copy of an active project.
    pub fn find(&self, id: ProjectId) -> Option<Project> {
        self.cache.find(Partition::Active, id).cloned()
    }

    pub fn find_archived(&self, id: ProjectId) -> Option<Project> {
        self.cache.find(Partition::Archived, id).cloned()
    }

    pub fn list(&self) -> Vec<Project> {
        self.cache.list(Partition::Active)
    }

    pub fn list_archived(&self) -> Vec<Project> {
        self.cache.list(Partition::Archived)
    }

    /// Number of active projects.
    pub fn count(&self) -> usize {
        self.cache.count(Partition::Active)
    }

    pub fn status(&self, id: ProjectId) -> StorageStatus {
        match self.cache.locate(id) {
            Some(Partition::Active) => StorageStatus::Active,
            Some(Partition::Archived) => StorageStatus::Archived,
            None => StorageStatus::NonExistent,
        }
    }

    /// Moves an active project to the archive.
    pub fn archive(&mut self, id: ProjectId) -> RepoResult<()> {
        self.move_partition(id, Partition::Archived)
    }

    /// Brings an archived project back to the active partition.
    pub fn restore(&mut self, id: ProjectId) -> RepoResult<()> {
        self.move_partition(id, Partition::Active)
    }

    /// Rebuilds the cache from both store partitions.
    ///
    /// The current cache is replaced only when both listings succeed.
    pub fn populate(&mut self) -> RepoResult<()> {
        let started_at = Instant::now();
        let active = self.store.list()?;
        let archived = self.store.list_archived()?;

        let mut cache = ProjectCache::new();
        let (active_count, archived_count) = (active.len(), archived.len());
        for project in active {
            cache.add(Partition::Active, project);
        }
        for project in archived {
            cache.add(Partition::Archived, project);
        }
        self.cache = cache;

        debug!(
            "event=cache_populate module=storage status=ok active={} archived={} duration_ms={}",
            active_count,
            archived_count,
            started_at.elapsed().as_millis()
        );
        Ok(())
    }

    /// Releases the store handle.
    pub fn close(self) -> RepoResult<()> {
        let result = self.store.close();
        match &result {
            Ok(()) => info!("event=storage_close module=storage status=ok"),
            Err(err) => error!("event=storage_close module=storage status=error error={err}"),
        }
        result
    }

    fn move_partition(&mut self, id: ProjectId, to: Partition) -> RepoResult<()> {
        let started_at = Instant::now();
        let (event, moved) = match to {
            Partition::Archived => ("project_archive", self.store.archive(id)),
            Partition::Active => ("project_restore", self.store.restore(id)),
        };

        if let Err(err) = moved {
            error!(
                "event={} module=storage status=error project_id={} duration_ms={} error={}",
                event,
                id,
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err);
        }

        self.populate()?;
        info!(
            "event={} module=storage status=ok project_id={} duration_ms={}",
            event,
            id,
            started_at.elapsed().as_millis()
        );
        Ok(())
    }
}
