//! Status (Kanban column) CLI commands

use anyhow::{bail, Result};
use clap::Subcommand;

use super::app::Workspace;
use super::output::Output;
use crate::domain::{is_hex_color, StatusId};

#[derive(Subcommand)]
pub enum StatusCommands {
    /// Add a status after the existing ones
    Add {
        /// Display name
        name: String,

        /// Display color as #rrggbb
        #[arg(long, default_value = "#94a3b8")]
        color: String,
    },

    /// List statuses in display order
    List,

    /// Delete a status; its tasks move to the first remaining status
    Delete {
        /// Status ID
        id: StatusId,
    },

    /// Set display order (unlisted statuses follow in their current order)
    Reorder {
        /// Status IDs in the new order
        #[arg(required = true)]
        ids: Vec<StatusId>,
    },
}

pub fn run(cmd: StatusCommands, ws: &Workspace, output: &Output) -> Result<()> {
    match cmd {
        StatusCommands::Add { name, color } => {
            if !is_hex_color(&color) {
                bail!("Invalid color '{}': expected #rrggbb", color);
            }
            let id = ws.modify(|project| Ok(project.add_status(&name, &color)))?;

            if output.is_json() {
                output.data(&serde_json::json!({ "id": id, "name": name }));
            } else {
                output.success(&format!("Created status {}: {}", id, name));
            }
        }

        StatusCommands::List => {
            let project = ws.load()?;
            let statuses = project.ordered_statuses();

            if output.is_json() {
                output.data(&statuses);
            } else {
                for status in statuses {
                    let count = project
                        .tasks
                        .iter()
                        .filter(|t| t.status == status.id)
                        .count();
                    println!("{} {} {} ({} task(s))", status.id, status.name, status.color, count);
                }
            }
        }

        StatusCommands::Delete { id } => {
            ws.modify(|project| Ok(project.delete_status(&id)?))?;

            if output.is_json() {
                output.data(&serde_json::json!({ "deleted": id }));
            } else {
                output.success(&format!("Deleted status {}", id));
            }
        }

        StatusCommands::Reorder { ids } => {
            ws.modify(|project| Ok(project.reorder_statuses(&ids)?))?;
            output.success("Statuses reordered");
        }
    }
    Ok(())
}
