//! Main CLI application structure

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use super::output::{Output, OutputFormat};
use super::{dep, resource, schedule, status, task};
use crate::domain::Project;
use crate::storage::{Config, DocumentStore};

/// Document used when neither `--file` nor the config names one
pub const DEFAULT_FILE: &str = "project.wbs.json";

#[derive(Parser)]
#[command(name = "wbs")]
#[command(author, version, about = "Project scheduling core: WBS, dependencies and Gantt placement")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Project document to operate on
    #[arg(long, short = 'p', global = true, env = "WBS_FILE")]
    pub file: Option<PathBuf>,

    /// Output format (defaults to the configured format)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new project document
    New {
        /// Project name
        name: String,

        /// Optional description
        #[arg(long, short)]
        description: Option<String>,

        /// Overwrite an existing document
        #[arg(long)]
        force: bool,
    },

    /// Manage tasks
    #[command(subcommand)]
    Task(task::TaskCommands),

    /// Manage resources
    #[command(subcommand)]
    Resource(resource::ResourceCommands),

    /// Manage statuses (Kanban columns)
    #[command(subcommand)]
    Status(status::StatusCommands),

    /// Manage task dependencies
    #[command(subcommand)]
    Dep(dep::DepCommands),

    /// Compute task placements from dates and dependencies
    Schedule {
        /// Day offsets instead of calendar dates
        #[arg(long)]
        relative: bool,

        /// Window start (YYYY-MM-DD); becomes day 0
        #[arg(long, requires = "to")]
        from: Option<NaiveDate>,

        /// Window end (YYYY-MM-DD)
        #[arg(long, requires = "from")]
        to: Option<NaiveDate>,
    },

    /// Check the document for broken references and cycles
    Validate,

    /// Recompute the schedule whenever the document changes
    Watch {
        /// Day offsets instead of calendar dates
        #[arg(long)]
        relative: bool,
    },
}

/// The document a command works on, plus loaded configuration
pub struct Workspace {
    pub config: Config,
    pub store: DocumentStore,
}

impl Workspace {
    pub fn new(config: Config, file: Option<PathBuf>) -> Self {
        let path = file
            .or_else(|| config.default_file.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_FILE));
        Self {
            config,
            store: DocumentStore::new(path),
        }
    }

    pub fn path(&self) -> &Path {
        self.store.path()
    }

    /// Loads the document, with a hint if it does not exist yet
    pub fn load(&self) -> Result<Project> {
        if !self.store.exists() {
            bail!(
                "No project document at {}. Run 'wbs new <name>' first.",
                self.path().display()
            );
        }
        self.store.load()
    }

    pub fn save(&self, project: &Project) -> Result<()> {
        self.store.save(project)
    }

    /// Loads, applies `f`, and saves if `f` succeeds
    pub fn modify<T>(&self, f: impl FnOnce(&mut Project) -> Result<T>) -> Result<T> {
        let mut project = self.load()?;
        let result = f(&mut project)?;
        self.save(&project)?;
        Ok(result)
    }
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;
    let format = cli
        .format
        .unwrap_or_else(|| config.default_format.into());
    let output = Output::new(format, cli.verbose);
    let ws = Workspace::new(config, cli.file);

    output.verbose("wbs starting");
    output.verbose_ctx("file", &format!("Using document: {}", ws.path().display()));

    match cli.command {
        Commands::New {
            name,
            description,
            force,
        } => {
            if ws.store.exists() && !force {
                bail!(
                    "{} already exists (use --force to overwrite)",
                    ws.path().display()
                );
            }
            let mut project = Project::new(&name);
            project.description = description;
            ws.save(&project)?;

            if output.is_json() {
                output.data(&serde_json::json!({
                    "id": project.id,
                    "name": project.name,
                    "path": ws.path().display().to_string(),
                }));
            } else {
                output.success(&format!(
                    "Created project '{}' at {}",
                    project.name,
                    ws.path().display()
                ));
            }
        }

        Commands::Task(cmd) => task::run(cmd, &ws, &output)?,
        Commands::Resource(cmd) => resource::run(cmd, &ws, &output)?,
        Commands::Status(cmd) => status::run(cmd, &ws, &output)?,
        Commands::Dep(cmd) => dep::run(cmd, &ws, &output)?,

        Commands::Schedule { relative, from, to } => {
            output.verbose_ctx(
                "schedule",
                &format!("relative={}, window={:?}..{:?}", relative, from, to),
            );
            schedule::show(&ws, &output, relative, from.zip(to))?
        }
        Commands::Validate => schedule::validate(&ws, &output)?,
        Commands::Watch { relative } => schedule::watch(&ws, &output, relative)?,
    }

    Ok(())
}
