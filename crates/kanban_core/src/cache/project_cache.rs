//! Two-bucket project cache.
//!
//! # Responsibility
//! - Hold every active and archived project keyed by id.
//! - Enumerate each bucket in first-insertion order.
//!
//! # Invariants
//! - `add` appends to the order list only for an id not yet in the bucket.
//! - `clear` empties both buckets; callers repopulate from the store.

use crate::cache::keyed_state::KeyedStateMap;
use crate::model::project::{Project, ProjectId};
use crate::repo::project_repo::Partition;

/// Active + archived project buckets.
#[derive(Debug, Clone, Default)]
pub struct ProjectCache {
    active: KeyedStateMap<ProjectId, Project>,
    archived: KeyedStateMap<ProjectId, Project>,
}

impl ProjectCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites a project in `partition`.
    pub fn add(&mut self, partition: Partition, project: Project) {
        self.bucket_mut(partition).insert(project.id, project);
    }

    pub fn delete(&mut self, partition: Partition, id: ProjectId) -> Option<Project> {
        self.bucket_mut(partition).remove(&id)
    }

    pub fn find(&self, partition: Partition, id: ProjectId) -> Option<&Project> {
        self.bucket(partition).get(&id)
    }

    /// Clones every project of `partition` in order-list order.
    pub fn list(&self, partition: Partition) -> Vec<Project> {
        self.bucket(partition).values().cloned().collect()
    }

    pub fn count(&self, partition: Partition) -> usize {
        self.bucket(partition).len()
    }

    /// Partition currently holding `id`, if any.
    pub fn locate(&self, id: ProjectId) -> Option<Partition> {
        if self.active.contains_key(&id) {
            Some(Partition::Active)
        } else if self.archived.contains_key(&id) {
            Some(Partition::Archived)
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.active.clear();
        self.archived.clear();
    }

    fn bucket(&self, partition: Partition) -> &KeyedStateMap<ProjectId, Project> {
        match partition {
            Partition::Active => &self.active,
            Partition::Archived => &self.archived,
        }
    }

    fn bucket_mut(&mut self, partition: Partition) -> &mut KeyedStateMap<ProjectId, Project> {
        match partition {
            Partition::Active => &mut self.active,
            Partition::Archived => &mut self.archived,
        }
    }
}
