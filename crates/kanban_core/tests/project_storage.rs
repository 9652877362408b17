use kanban_core::{
    NewTicket, Project, ProjectId, ProjectStorage, ProjectStore, RepoError, RepoResult,
    SaveOutcome, SqliteProjectStore, StorageStatus,
};
use std::cell::Cell;
use uuid::Uuid;

/// Delegates to SQLite while counting store writes.
struct CountingStore {
    inner: SqliteProjectStore,
    saves: Cell<usize>,
    creates: Cell<usize>,
}

impl CountingStore {
    fn new() -> Self {
        Self {
            inner: SqliteProjectStore::open_in_memory().unwrap(),
            saves: Cell::new(0),
            creates: Cell::new(0),
        }
    }
}

impl ProjectStore for CountingStore {
    fn create(&self, project: &Project) -> RepoResult<()> {
        self.creates.set(self.creates.get() + 1);
        self.inner.create(project)
    }

    fn save(&self, projects: &[Project]) -> RepoResult<SaveOutcome> {
        self.saves.set(self.saves.get() + 1);
        self.inner.save(projects)
    }

    fn find(&self, id: ProjectId) -> RepoResult<Option<Project>> {
        self.inner.find(id)
    }

    fn find_archived(&self, id: ProjectId) -> RepoResult<Option<Project>> {
        self.inner.find_archived(id)
    }

    fn lookup_by_name(&self, name: &str) -> RepoResult<Option<Project>> {
        self.inner.lookup_by_name(name)
    }

    fn list(&self) -> RepoResult<Vec<Project>> {
        self.inner.list()
    }

    fn list_archived(&self) -> RepoResult<Vec<Project>> {
        self.inner.list_archived()
    }

    fn count(&self) -> RepoResult<usize> {
        self.inner.count()
    }

    fn archive(&self, id: ProjectId) -> RepoResult<()> {
        self.inner.archive(id)
    }

    fn restore(&self, id: ProjectId) -> RepoResult<()> {
        self.inner.restore(id)
    }

    fn close(self) -> RepoResult<()> {
        self.inner.close()
    }
}

fn board(name: &str) -> Project {
    Project::new(name).with_stages(["Todo", "Doing", "Done"])
}

fn ids(projects: &[Project]) -> Vec<Uuid> {
    projects.iter().map(|project| project.id).collect()
}

fn assert_converged<S: ProjectStore>(storage: &ProjectStorage<S>) {
    assert_eq!(storage.list(), storage.store().list().unwrap());
    assert_eq!(storage.list_archived(), storage.store().list_archived().unwrap());
    assert_eq!(storage.count(), storage.store().count().unwrap());
}

#[test]
fn create_save_and_find_through_the_cache() {
    let mut storage = ProjectStorage::open_in_memory().unwrap();
    let mut project = board("P1");
    storage.create(&project).unwrap();

    let ticket = project
        .assign_ticket("Todo", NewTicket::titled("T1"))
        .unwrap();
    assert_eq!(storage.save(&[project.clone()]).unwrap(), 1);

    let found = storage.find(project.id).unwrap();
    assert_eq!(found, project);
    assert_eq!(found.list_tickets("Todo")[0].id, ticket);
    assert_eq!(storage.store().find(project.id).unwrap(), Some(project));
}

#[test]
fn returned_projects_are_detached_copies() {
    let mut storage = ProjectStorage::open_in_memory().unwrap();
    let project = board("P1");
    storage.create(&project).unwrap();

    let mut copy = storage.find(project.id).unwrap();
    copy.rename("local edit").unwrap();

    assert_eq!(storage.find(project.id).unwrap().name, "P1");
}

#[test]
fn unchanged_save_skips_the_store() {
    let mut storage = ProjectStorage::new(CountingStore::new()).unwrap();
    let project = board("P1");
    storage.create(&project).unwrap();

    assert_eq!(storage.save(&[project.clone()]).unwrap(), 0);
    assert_eq!(storage.store().saves.get(), 0);

    let mut edited = project.clone();
    edited.assign_ticket("Todo", NewTicket::titled("T1")).unwrap();
    assert_eq!(storage.save(&[project, edited]).unwrap(), 1);
    assert_eq!(storage.store().saves.get(), 1);
}

#[test]
fn batch_save_writes_changed_projects_in_one_call() {
    let mut storage = ProjectStorage::new(CountingStore::new()).unwrap();
    let mut first = board("a");
    let mut second = board("b");
    let third = board("c");
    for project in [&first, &second, &third] {
        storage.create(project).unwrap();
    }

    first.rename("a2").unwrap();
    second.rename("b2").unwrap();
    let written = storage.save(&[first.clone(), second.clone(), third]).unwrap();

    assert_eq!(written, 2);
    assert_eq!(storage.store().saves.get(), 1);
    assert_eq!(storage.find(first.id).unwrap().name, "a2");
    assert_eq!(storage.find(second.id).unwrap().name, "b2");
}

#[test]
fn save_of_archived_or_unknown_project_writes_nothing() {
    let mut storage = ProjectStorage::new(CountingStore::new()).unwrap();
    let mut active = board("active");
    let mut archived = board("archived");
    storage.create(&active).unwrap();
    storage.create(&archived).unwrap();
    storage.archive(archived.id).unwrap();

    active.rename("changed").unwrap();
    archived.rename("changed").unwrap();
    let err = storage.save(&[active.clone(), archived.clone()]).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(id) if id == archived.id));

    let unknown = board("unknown");
    assert!(matches!(
        storage.save(&[unknown]).unwrap_err(),
        RepoError::NotFound(_)
    ));

    assert_eq!(storage.store().saves.get(), 0);
    assert_eq!(storage.find(active.id).unwrap().name, "active");
    assert_eq!(storage.find_archived(archived.id).unwrap().name, "archived");
}

#[test]
fn failed_create_leaves_cache_untouched() {
    let mut storage = ProjectStorage::open_in_memory().unwrap();
    let project = board("P1");
    storage.create(&project).unwrap();

    let mut twin = project.clone();
    twin.rename("twin").unwrap();
    assert!(matches!(
        storage.create(&twin).unwrap_err(),
        RepoError::AlreadyExists(_)
    ));

    let mut unnamed = board("x");
    unnamed.name.clear();
    assert!(matches!(
        storage.create(&unnamed).unwrap_err(),
        RepoError::Validation(_)
    ));

    assert_eq!(storage.list(), vec![project]);
    assert_converged(&storage);
}

#[test]
fn archive_and_restore_track_status() {
    let mut storage = ProjectStorage::open_in_memory().unwrap();
    let project = board("P1");
    assert_eq!(storage.status(project.id), StorageStatus::NonExistent);

    storage.create(&project).unwrap();
    assert_eq!(storage.status(project.id), StorageStatus::Active);

    storage.archive(project.id).unwrap();
    assert_eq!(storage.status(project.id), StorageStatus::Archived);
    assert!(storage.find(project.id).is_none());
    assert_eq!(storage.find_archived(project.id), Some(project.clone()));
    assert_eq!(storage.count(), 0);

    storage.restore(project.id).unwrap();
    assert_eq!(storage.status(project.id), StorageStatus::Active);
    assert_eq!(storage.find(project.id), Some(project));
}

#[test]
fn failed_archive_keeps_project_where_it_was() {
    let mut storage = ProjectStorage::open_in_memory().unwrap();
    let project = board("P1");
    storage.create(&project).unwrap();

    assert!(matches!(
        storage.restore(project.id).unwrap_err(),
        RepoError::NotFound(_)
    ));
    assert!(matches!(
        storage.archive(Uuid::new_v4()).unwrap_err(),
        RepoError::NotFound(_)
    ));

    assert_eq!(storage.status(project.id), StorageStatus::Active);
    assert_converged(&storage);
}

#[test]
fn cache_and_store_agree_after_mixed_mutations() {
    let mut storage = ProjectStorage::open_in_memory().unwrap();
    let mut projects: Vec<Project> = ["a", "b", "c", "d"].into_iter().map(board).collect();
    for project in &projects {
        storage.create(project).unwrap();
        assert_converged(&storage);
    }

    storage.archive(projects[1].id).unwrap();
    assert_converged(&storage);
    storage.archive(projects[3].id).unwrap();
    assert_converged(&storage);

    projects[2]
        .assign_ticket("Doing", NewTicket::titled("T"))
        .unwrap();
    storage.save(&[projects[2].clone()]).unwrap();
    assert_converged(&storage);

    storage.restore(projects[1].id).unwrap();
    assert_converged(&storage);

    assert_eq!(
        ids(&storage.list()),
        [projects[0].id, projects[1].id, projects[2].id]
    );
    assert_eq!(ids(&storage.list_archived()), [projects[3].id]);
}

#[test]
fn load_reads_from_cache() {
    let mut storage = ProjectStorage::open_in_memory().unwrap();
    let first = board("a");
    let second = board("b");
    storage.create(&first).unwrap();
    storage.create(&second).unwrap();

    let mut everything = vec![Project {
        id: Uuid::nil(),
        ..board("sentinel")
    }];
    storage.load(&mut everything).unwrap();
    assert_eq!(everything, vec![first.clone(), second.clone()]);

    let mut stale = second.clone();
    stale.rename("stale").unwrap();
    let mut selected = vec![stale];
    storage.load(&mut selected).unwrap();
    assert_eq!(selected, vec![second]);

    let mut with_unknown = vec![first, board("unknown")];
    let before = with_unknown.clone();
    assert!(storage.load(&mut with_unknown).is_err());
    assert_eq!(with_unknown, before);
}

#[test]
fn populate_picks_up_out_of_band_store_changes() {
    let mut storage = ProjectStorage::open_in_memory().unwrap();
    let project = board("P1");
    storage.create(&project).unwrap();

    storage.store().archive(project.id).unwrap();
    assert_eq!(storage.status(project.id), StorageStatus::Active);

    storage.populate().unwrap();
    assert_eq!(storage.status(project.id), StorageStatus::Archived);
    assert_converged(&storage);
}

#[test]
fn file_backed_storage_reloads_both_partitions() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("board.db");
    let active = board("active");
    let archived = board("archived");

    let mut storage = ProjectStorage::open(&path).unwrap();
    storage.create(&active).unwrap();
    storage.create(&archived).unwrap();
    storage.archive(archived.id).unwrap();
    storage.close().unwrap();

    let reopened = ProjectStorage::open(&path).unwrap();
    assert_eq!(reopened.list(), vec![active]);
    assert_eq!(reopened.list_archived(), vec![archived]);
}
