//! Resource CLI commands

use anyhow::{bail, Result};
use clap::Subcommand;

use super::app::Workspace;
use super::output::Output;
use crate::domain::{is_hex_color, ResourceId};

const DEFAULT_COLOR: &str = "#4f46e5";

#[derive(Subcommand)]
pub enum ResourceCommands {
    /// Add a resource (person or team)
    Add {
        /// Display name
        name: String,

        /// Display color as #rrggbb
        #[arg(long, default_value = DEFAULT_COLOR)]
        color: String,

        /// Availability percentage (0-100)
        #[arg(long)]
        availability: Option<u8>,
    },

    /// Change a resource's name, color or availability
    Update {
        /// Resource ID
        id: ResourceId,

        #[arg(long)]
        name: Option<String>,

        /// Display color as #rrggbb
        #[arg(long)]
        color: Option<String>,

        /// Availability percentage (0-100)
        #[arg(long)]
        availability: Option<u8>,
    },

    /// List resources with their task counts
    List,

    /// Delete a resource and unassign it from every task
    Delete {
        /// Resource ID
        id: ResourceId,
    },
}

pub fn run(cmd: ResourceCommands, ws: &Workspace, output: &Output) -> Result<()> {
    match cmd {
        ResourceCommands::Add {
            name,
            color,
            availability,
        } => {
            if !is_hex_color(&color) {
                bail!("Invalid color '{}': expected #rrggbb", color);
            }
            if let Some(a) = availability.filter(|a| *a > 100) {
                bail!("Availability must be 0-100, got {}", a);
            }

            let id = ws.modify(|project| {
                let id = project.add_resource(&name, &color);
                if availability.is_some() {
                    project.update_resource(&id, None, None, availability)?;
                }
                Ok(id)
            })?;

            if output.is_json() {
                output.data(&serde_json::json!({ "id": id, "name": name }));
            } else {
                output.success(&format!("Created resource {}: {}", id, name));
            }
        }

        ResourceCommands::Update {
            id,
            name,
            color,
            availability,
        } => {
            if name.is_none() && color.is_none() && availability.is_none() {
                bail!("Nothing to update");
            }
            if let Some(color) = color.as_deref().filter(|c| !is_hex_color(c)) {
                bail!("Invalid color '{}': expected #rrggbb", color);
            }
            if let Some(a) = availability.filter(|a| *a > 100) {
                bail!("Availability must be 0-100, got {}", a);
            }

            let resource = ws.modify(|project| {
                project.update_resource(&id, name, color, availability)?;
                Ok(project.resource(&id).cloned())
            })?;

            if output.is_json() {
                output.data(&resource);
            } else {
                output.success(&format!("Updated resource {}", id));
            }
        }

        ResourceCommands::List => {
            let project = ws.load()?;

            if output.is_json() {
                output.data(&project.resources);
            } else if project.resources.is_empty() {
                println!("No resources");
            } else {
                for resource in &project.resources {
                    let assigned = project
                        .tasks
                        .iter()
                        .filter(|t| t.references_resource(&resource.id))
                        .count();
                    println!(
                        "{} {} {} {}% ({} task(s))",
                        resource.id, resource.name, resource.color, resource.availability, assigned
                    );
                }
            }
        }

        ResourceCommands::Delete { id } => {
            let cleared = ws.modify(|project| Ok(project.delete_resource(&id)?))?;
            output.verbose_ctx("resource", &format!("Cleared {} task reference(s)", cleared));

            if output.is_json() {
                output.data(&serde_json::json!({
                    "deleted": id,
                    "tasksUpdated": cleared,
                }));
            } else {
                output.success(&format!(
                    "Deleted resource {} (unassigned from {} task(s))",
                    id, cleared
                ));
            }
        }
    }
    Ok(())
}
