//! Project store contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist serialized `Project` aggregates keyed by project id.
//! - Keep two partitions, active and archived, and move records between
//!   them atomically.
//!
//! # Invariants
//! - A record lives in exactly one partition at a time.
//! - `save` only updates existing active records; it never creates one.
//! - Write paths call `Project::validate()` before any SQL mutation.
//! - Engine errors carry the name of the failing operation; nothing retries.
//! - Enumeration follows `position`, which is fixed at create time and
//!   travels with the record across partitions.

use crate::db::migrations::latest_version;
use crate::db::{open_db, open_db_in_memory, DbError};
use crate::model::project::{Project, ProjectId, ProjectValidationError};
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use uuid::Uuid;

pub type RepoResult<T> = Result<T, RepoError>;

/// Logical storage location of a project record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partition {
    Active,
    Archived,
}

impl Partition {
    pub fn label(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Archived => "archived",
        }
    }

    fn table(self) -> &'static str {
        match self {
            Self::Active => "active_projects",
            Self::Archived => "archived_projects",
        }
    }
}

impl Display for Partition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Error for project persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    /// A record with this id exists in either partition.
    AlreadyExists(ProjectId),
    /// No record with this id in the partition the operation reads from.
    NotFound(ProjectId),
    Validation(ProjectValidationError),
    /// Record could not be encoded or decoded. Indicates a schema mismatch
    /// and is not recoverable by retrying.
    Serialization {
        id: ProjectId,
        source: serde_json::Error,
    },
    /// Underlying engine failure with the operation that hit it.
    Engine {
        operation: &'static str,
        source: DbError,
    },
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyExists(id) => write!(f, "project already exists: {id}"),
            Self::NotFound(id) => write!(f, "project not found: {id}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Serialization { id, source } => {
                write!(f, "project record {id} failed to (de)serialize: {source}")
            }
            Self::Engine { operation, source } => write!(f, "{operation}: {source}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "project store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted project data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Serialization { source, .. } => Some(source),
            Self::Engine { source, .. } => Some(source),
            Self::AlreadyExists(_)
            | Self::NotFound(_)
            | Self::UninitializedConnection { .. }
            | Self::InvalidData(_) => None,
        }
    }
}

impl From<ProjectValidationError> for RepoError {
    fn from(value: ProjectValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Attaches the failing operation name to engine errors.
trait EngineContext<T> {
    fn context(self, operation: &'static str) -> RepoResult<T>;
}

impl<T> EngineContext<T> for rusqlite::Result<T> {
    fn context(self, operation: &'static str) -> RepoResult<T> {
        self.map_err(|err| RepoError::Engine {
            operation,
            source: DbError::Sqlite(err),
        })
    }
}

/// Result of a batched `save`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveOutcome {
    /// Records updated in the active partition.
    pub written: usize,
    /// Ids with no active record; nothing was written for them.
    pub missing: Vec<ProjectId>,
}

/// Durable project storage partitioned into active and archived records.
pub trait ProjectStore {
    /// Writes a new record to the active partition.
    ///
    /// Fails with `AlreadyExists` if either partition holds the id.
    fn create(&self, project: &Project) -> RepoResult<()>;

    /// Updates existing active records in one transaction.
    ///
    /// Ids without an active record are reported in `SaveOutcome::missing`.
    fn save(&self, projects: &[Project]) -> RepoResult<SaveOutcome>;

    /// Point lookup in the active partition.
    fn find(&self, id: ProjectId) -> RepoResult<Option<Project>>;

    /// Point lookup in the archived partition.
    fn find_archived(&self, id: ProjectId) -> RepoResult<Option<Project>>;

    /// First active project whose name matches exactly.
    fn lookup_by_name(&self, name: &str) -> RepoResult<Option<Project>>;

    fn list(&self) -> RepoResult<Vec<Project>>;

    fn list_archived(&self) -> RepoResult<Vec<Project>>;

    /// Number of active records.
    fn count(&self) -> RepoResult<usize>;

    /// Moves a record from active to archived atomically.
    fn archive(&self, id: ProjectId) -> RepoResult<()>;

    /// Moves a record from archived to active atomically.
    fn restore(&self, id: ProjectId) -> RepoResult<()>;

    /// Overwrites each caller-owned project with its active record.
    ///
    /// A nil id in the first slot asks for everything: the vector is
    /// replaced with `list()`. Slots are only written once every record was
    /// found, so a `NotFound` leaves the vector untouched.
    fn load(&self, projects: &mut Vec<Project>) -> RepoResult<()> {
        if projects.first().is_some_and(|first| first.id.is_nil()) {
            *projects = self.list()?;
            return Ok(());
        }

        let mut loaded = Vec::with_capacity(projects.len());
        for project in projects.iter() {
            let found = self
                .find(project.id)?
                .ok_or(RepoError::NotFound(project.id))?;
            loaded.push(found);
        }
        *projects = loaded;
        Ok(())
    }

    /// Releases the underlying engine handle.
    fn close(self) -> RepoResult<()>
    where
        Self: Sized;
}

/// SQLite-backed project store owning its connection.
pub struct SqliteProjectStore {
    conn: Connection,
}

impl SqliteProjectStore {
    /// Wraps a connection that already went through `open_db*`.
    pub fn try_new(conn: Connection) -> RepoResult<Self> {
        ensure_store_connection_ready(&conn)?;
        Ok(Self { conn })
    }

    /// Opens (or creates) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        let conn = open_db(path).map_err(|source| RepoError::Engine {
            operation: "open",
            source,
        })?;
        Self::try_new(conn)
    }

    pub fn open_in_memory() -> RepoResult<Self> {
        let conn = open_db_in_memory().map_err(|source| RepoError::Engine {
            operation: "open",
            source,
        })?;
        Self::try_new(conn)
    }

    /// Raw connection, for diagnostics and tests.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn begin(&self, operation: &'static str) -> RepoResult<Transaction<'_>> {
        Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate).context(operation)
    }

    fn find_in(&self, partition: Partition, id: ProjectId) -> RepoResult<Option<Project>> {
        let record: Option<String> = self
            .conn
            .query_row(
                &format!("SELECT record FROM {} WHERE id = ?1;", partition.table()),
                [id.to_string()],
                |row| row.get(0),
            )
            .optional()
            .context("find")?;

        record.map(|record| decode_record(id, &record)).transpose()
    }

    fn list_in(&self, partition: Partition) -> RepoResult<Vec<Project>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT id, record FROM {} ORDER BY position ASC, id ASC;",
                partition.table()
            ))
            .context("list")?;
        let mut rows = stmt.query([]).context("list")?;

        let mut projects = Vec::new();
        while let Some(row) = rows.next().context("list")? {
            let id_text: String = row.get(0).context("list")?;
            let record: String = row.get(1).context("list")?;
            projects.push(decode_record(parse_project_id(&id_text)?, &record)?);
        }
        Ok(projects)
    }

    fn move_record(
        &self,
        from: Partition,
        to: Partition,
        id: ProjectId,
        operation: &'static str,
    ) -> RepoResult<()> {
        let tx = self.begin(operation)?;

        let row: Option<(String, i64, String)> = tx
            .query_row(
                &format!(
                    "SELECT name, position, record FROM {} WHERE id = ?1;",
                    from.table()
                ),
                [id.to_string()],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()
            .context(operation)?;

        // Dropping `tx` on the early returns rolls back; the record stays put.
        let Some((name, position, record)) = row else {
            return Err(RepoError::NotFound(id));
        };

        tx.execute(
            &format!("DELETE FROM {} WHERE id = ?1;", from.table()),
            [id.to_string()],
        )
        .context(operation)?;
        tx.execute(
            &format!(
                "INSERT INTO {} (id, name, position, record) VALUES (?1, ?2, ?3, ?4);",
                to.table()
            ),
            params![id.to_string(), name, position, record],
        )
        .context(operation)?;

        tx.commit().context(operation)
    }
}

impl ProjectStore for SqliteProjectStore {
    fn create(&self, project: &Project) -> RepoResult<()> {
        project.validate()?;
        let record = encode_record(project)?;

        let tx = self.begin("create")?;
        for partition in [Partition::Active, Partition::Archived] {
            if record_exists(&tx, partition, project.id).context("create")? {
                return Err(RepoError::AlreadyExists(project.id));
            }
        }

        let position = next_position(&tx).context("create")?;
        tx.execute(
            "INSERT INTO active_projects (id, name, position, record) VALUES (?1, ?2, ?3, ?4);",
            params![project.id.to_string(), project.name.as_str(), position, record],
        )
        .context("create")?;

        tx.commit().context("create")
    }

    fn save(&self, projects: &[Project]) -> RepoResult<SaveOutcome> {
        let mut encoded = Vec::with_capacity(projects.len());
        for project in projects {
            if project.id.is_nil() {
                continue;
            }
            project.validate()?;
            encoded.push((project, encode_record(project)?));
        }

        let mut outcome = SaveOutcome {
            written: 0,
            missing: projects
                .iter()
                .filter(|project| project.id.is_nil())
                .map(|project| project.id)
                .collect(),
        };
        if encoded.is_empty() {
            return Ok(outcome);
        }

        let tx = self.begin("save")?;
        for (project, record) in encoded {
            let changed = tx
                .execute(
                    "UPDATE active_projects
                     SET
                        name = ?1,
                        record = ?2,
                        updated_at = (strftime('%s', 'now') * 1000)
                     WHERE id = ?3;",
                    params![project.name.as_str(), record, project.id.to_string()],
                )
                .context("save")?;

            if changed == 0 {
                outcome.missing.push(project.id);
            } else {
                outcome.written += 1;
            }
        }
        tx.commit().context("save")?;

        Ok(outcome)
    }

    fn find(&self, id: ProjectId) -> RepoResult<Option<Project>> {
        self.find_in(Partition::Active, id)
    }

    fn find_archived(&self, id: ProjectId) -> RepoResult<Option<Project>> {
        self.find_in(Partition::Archived, id)
    }

    fn lookup_by_name(&self, name: &str) -> RepoResult<Option<Project>> {
        let row: Option<(String, String)> = self
            .conn
            .query_row(
                "SELECT id, record FROM active_projects
                 WHERE name = ?1
                 ORDER BY position ASC
                 LIMIT 1;",
                [name],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .context("lookup_by_name")?;

        match row {
            Some((id_text, record)) => Ok(Some(decode_record(
                parse_project_id(&id_text)?,
                &record,
            )?)),
            None => Ok(None),
        }
    }

    fn list(&self) -> RepoResult<Vec<Project>> {
        self.list_in(Partition::Active)
    }

    fn list_archived(&self) -> RepoResult<Vec<Project>> {
        self.list_in(Partition::Archived)
    }

    fn count(&self) -> RepoResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM active_projects;", [], |row| row.get(0))
            .context("count")?;
        usize::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative project count `{count}`")))
    }

    fn archive(&self, id: ProjectId) -> RepoResult<()> {
        self.move_record(Partition::Active, Partition::Archived, id, "archive")
    }

    fn restore(&self, id: ProjectId) -> RepoResult<()> {
        self.move_record(Partition::Archived, Partition::Active, id, "restore")
    }

    fn close(self) -> RepoResult<()> {
        self.conn.close().map_err(|(_, err)| RepoError::Engine {
            operation: "close",
            source: DbError::Sqlite(err),
        })
    }
}

fn encode_record(project: &Project) -> RepoResult<String> {
    serde_json::to_string(project).map_err(|source| RepoError::Serialization {
        id: project.id,
        source,
    })
}

fn decode_record(id: ProjectId, record: &str) -> RepoResult<Project> {
    let project: Project = serde_json::from_str(record)
        .map_err(|source| RepoError::Serialization { id, source })?;
    if project.id != id {
        return Err(RepoError::InvalidData(format!(
            "record keyed `{id}` holds project `{}`",
            project.id
        )));
    }
    Ok(project)
}

fn parse_project_id(value: &str) -> RepoResult<ProjectId> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid project id `{value}`")))
}

fn record_exists(conn: &Connection, partition: Partition, id: ProjectId) -> rusqlite::Result<bool> {
    conn.query_row(
        &format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1);",
            partition.table()
        ),
        [id.to_string()],
        |row| row.get(0),
    )
}

/// Next creation position across both partitions.
fn next_position(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COALESCE(MAX(position), 0) + 1 FROM (
            SELECT position FROM active_projects
            UNION ALL
            SELECT position FROM archived_projects
        );",
        [],
        |row| row.get(0),
    )
}

fn ensure_store_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn
        .query_row("PRAGMA user_version;", [], |row| row.get(0))
        .context("open")?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }
    Ok(())
}
