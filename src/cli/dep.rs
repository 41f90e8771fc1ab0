//! Dependency CLI commands

use anyhow::Result;
use clap::Subcommand;

use super::app::Workspace;
use super::output::Output;
use crate::domain::{DependencyId, DependencyType, TaskId};

#[derive(Subcommand)]
pub enum DepCommands {
    /// Link two tasks
    ///
    /// Examples:
    ///   wbs dep add t-aaaaaaa t-bbbbbbb              # B starts after A finishes
    ///   wbs dep add t-aaaaaaa t-bbbbbbb --type SS --lag 2
    Add {
        /// Task that constrains
        predecessor: TaskId,

        /// Task that is constrained
        successor: TaskId,

        /// Link type: FS, SS, FF or SF
        #[arg(long = "type", short = 't', default_value = "FS")]
        dep_type: DependencyType,

        /// Offset in days (may be negative)
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        lag: i32,
    },

    /// List dependencies
    List,

    /// Remove a dependency
    Remove {
        /// Dependency ID
        id: DependencyId,
    },
}

pub fn run(cmd: DepCommands, ws: &Workspace, output: &Output) -> Result<()> {
    match cmd {
        DepCommands::Add {
            predecessor,
            successor,
            dep_type,
            lag,
        } => {
            let id = ws.modify(|project| {
                Ok(project.add_dependency(&predecessor, &successor, dep_type, lag)?)
            })?;

            if output.is_json() {
                output.data(&serde_json::json!({
                    "id": id,
                    "predecessorId": predecessor,
                    "successorId": successor,
                    "type": dep_type,
                    "lag": lag,
                }));
            } else {
                output.success(&format!(
                    "Linked {} -> {} ({} {:+}d) as {}",
                    predecessor, successor, dep_type, lag, id
                ));
            }
        }

        DepCommands::List => {
            let project = ws.load()?;

            if output.is_json() {
                output.data(&project.dependencies);
            } else if project.dependencies.is_empty() {
                println!("No dependencies");
            } else {
                for dep in &project.dependencies {
                    println!(
                        "{} {} -> {} {} {:+}d",
                        dep.id, dep.predecessor_id, dep.successor_id, dep.dep_type, dep.lag
                    );
                }
            }
        }

        DepCommands::Remove { id } => {
            let removed = ws.modify(|project| Ok(project.remove_dependency(&id)?))?;

            if output.is_json() {
                output.data(&removed);
            } else {
                output.success(&format!(
                    "Removed {} ({} -> {})",
                    id, removed.predecessor_id, removed.successor_id
                ));
            }
        }
    }
    Ok(())
}
