//! Command-line driver for the kanban engine.
//!
//! # Responsibility
//! - Exercise `kanban_core` storage end to end from a shell.
//! - Keep output plain and deterministic for scripting.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use kanban_core::{
    Direction, NewTicket, Project, ProjectStorage, SqliteProjectStore, StorageConfig,
};
use log::warn;
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(author, version, about = "kanban: projects, stages and tickets", long_about = None)]
struct Cli {
    /// Database file; overrides KANBAN_DB_PATH.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List projects.
    List {
        /// List archived projects instead of active ones.
        #[arg(long)]
        archived: bool,
    },
    /// Create a project with the given stages.
    Create {
        name: String,
        /// Stage names, left to right.
        #[arg(long = "stage", default_values_t = default_stages())]
        stages: Vec<String>,
    },
    /// Print a project's pipeline.
    Show { id: Uuid },
    /// Add a ticket to a stage.
    AddTicket {
        project: Uuid,
        stage: String,
        title: String,
        #[arg(long, default_value = "")]
        summary: String,
    },
    /// Move a ticket to the next stage.
    Progress { project: Uuid, ticket: Uuid },
    /// Move a ticket to the previous stage.
    Regress { project: Uuid, ticket: Uuid },
    /// Move a stage one step left or right.
    MoveStage {
        project: Uuid,
        stage: String,
        #[arg(long)]
        backward: bool,
    },
    /// Finalize a ticket.
    Finalize { project: Uuid, ticket: Uuid },
    /// Archive a project.
    Archive { id: Uuid },
    /// Restore an archived project.
    Restore { id: Uuid },
}

fn default_stages() -> Vec<String> {
    ["Todo", "Doing", "Done"].map(String::from).to_vec()
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = StorageConfig::from_env();
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    if let Err(err) = config.init_logging() {
        eprintln!("warning: logging disabled: {err}");
    }

    let mut storage = ProjectStorage::from_config(&config)
        .with_context(|| format!("opening {}", config.db_path.display()))?;
    let result = run(&mut storage, cli.command);

    if let Err(err) = storage.close() {
        warn!("event=cli_close module=kanban_cli status=error error={err}");
    }
    result
}

fn run(storage: &mut ProjectStorage<SqliteProjectStore>, command: Commands) -> Result<()> {
    match command {
        Commands::List { archived } => {
            let projects = if archived {
                storage.list_archived()
            } else {
                storage.list()
            };
            for project in projects {
                println!("{}\t{}", project.id, project.name);
            }
        }
        Commands::Create { name, stages } => {
            let project = Project::new(name).with_stages(stages);
            storage.create(&project)?;
            println!("{}", project.id);
        }
        Commands::Show { id } => {
            let project = checkout(storage, id)?;
            println!("{} ({})", project.name, project.id);
            for stage in project.list_stages() {
                println!("[{}]", stage.name);
                for ticket in &stage.tickets {
                    println!("  {}\t{}", ticket.id, ticket.title);
                }
            }
            println!("finalized: {}", project.finalized.len());
        }
        Commands::AddTicket {
            project,
            stage,
            title,
            summary,
        } => {
            let mut project = checkout(storage, project)?;
            let request = NewTicket {
                title,
                summary,
                ..NewTicket::default()
            };
            let ticket_id = project.assign_ticket(&stage, request)?;
            storage.save(&[project])?;
            println!("{ticket_id}");
        }
        Commands::Progress { project, ticket } => {
            commit_if(storage, project, |project| project.progress_ticket(ticket))?;
        }
        Commands::Regress { project, ticket } => {
            commit_if(storage, project, |project| project.regress_ticket(ticket))?;
        }
        Commands::MoveStage {
            project,
            stage,
            backward,
        } => {
            let direction = if backward {
                Direction::Backward
            } else {
                Direction::Forward
            };
            commit_if(storage, project, |project| project.move_stage(&stage, direction))?;
        }
        Commands::Finalize { project, ticket } => {
            commit_if(storage, project, |project| project.finalize_ticket(ticket))?;
        }
        Commands::Archive { id } => storage.archive(id)?,
        Commands::Restore { id } => storage.restore(id)?,
    }
    Ok(())
}

fn checkout(storage: &ProjectStorage<SqliteProjectStore>, id: Uuid) -> Result<Project> {
    match storage.find(id) {
        Some(project) => Ok(project),
        None => bail!("no active project {id}"),
    }
}

/// Applies `mutate` to a copy of the project and saves it when it reports a change.
fn commit_if(
    storage: &mut ProjectStorage<SqliteProjectStore>,
    id: Uuid,
    mutate: impl FnOnce(&mut Project) -> bool,
) -> Result<()> {
    let mut project = checkout(storage, id)?;
    if mutate(&mut project) {
        storage.save(&[project])?;
    } else {
        println!("no change");
    }
    Ok(())
}
