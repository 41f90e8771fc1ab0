//! Task CLI commands

use anyhow::{anyhow, bail, Result};
use chrono::NaiveDate;
use clap::Subcommand;

use super::app::Workspace;
use super::output::Output;
use crate::domain::{Project, ResourceId, StatusId, Task, TaskId, TaskPatch};

#[derive(Subcommand)]
pub enum TaskCommands {
    /// Add a task at the end of its parent's children
    ///
    /// Examples:
    ///   wbs task add "Design"                 # Root task
    ///   wbs task add "Wireframes" --parent t-1a2b3c4
    Add {
        /// Task name
        name: String,

        /// Parent task ID
        #[arg(long)]
        parent: Option<TaskId>,
    },

    /// List tasks in WBS order
    List,

    /// Show task details
    Show {
        /// Task ID
        id: TaskId,
    },

    /// Change task fields
    Update {
        /// Task ID
        id: TaskId,

        #[arg(long)]
        name: Option<String>,

        /// First day (YYYY-MM-DD)
        #[arg(long)]
        start: Option<NaiveDate>,

        /// Last day, inclusive (YYYY-MM-DD)
        #[arg(long)]
        end: Option<NaiveDate>,

        /// Length in days
        #[arg(long)]
        duration: Option<u32>,

        /// Completion percentage (0-100)
        #[arg(long)]
        progress: Option<u8>,

        /// Status ID
        #[arg(long)]
        status: Option<StatusId>,

        /// Responsible resource ID
        #[arg(long)]
        responsible: Option<ResourceId>,

        /// Resource currently holding the ball
        #[arg(long)]
        ball_holder: Option<ResourceId>,

        /// Remove start date, end date and duration
        #[arg(long, conflicts_with_all = ["start", "end", "duration"])]
        clear_dates: bool,

        /// Remove responsible and ball holder
        #[arg(long, conflicts_with_all = ["responsible", "ball_holder"])]
        unassign: bool,
    },

    /// Move a task under a new parent (or to the root level)
    Move {
        /// Task ID
        id: TaskId,

        /// New parent task ID
        #[arg(long, conflicts_with = "root")]
        parent: Option<TaskId>,

        /// Move to the root level
        #[arg(long)]
        root: bool,

        /// Position among the new siblings (default: last)
        #[arg(long)]
        index: Option<usize>,
    },

    /// Delete a task, its subtasks and their dependencies
    Delete {
        /// Task ID
        id: TaskId,
    },
}

pub fn run(cmd: TaskCommands, ws: &Workspace, output: &Output) -> Result<()> {
    match cmd {
        TaskCommands::Add { name, parent } => add_task(ws, output, &name, parent.as_ref()),
        TaskCommands::List => list_tasks(ws, output),
        TaskCommands::Show { id } => show_task(ws, output, &id),
        TaskCommands::Update {
            id,
            name,
            start,
            end,
            duration,
            progress,
            status,
            responsible,
            ball_holder,
            clear_dates,
            unassign,
        } => {
            let mut patch = TaskPatch {
                name,
                start_date: start.map(Some),
                end_date: end.map(Some),
                duration: duration.map(Some),
                progress,
                status,
                responsible_id: responsible.map(Some),
                ball_holder_id: ball_holder.map(Some),
            };
            if clear_dates {
                patch.start_date = Some(None);
                patch.end_date = Some(None);
                patch.duration = Some(None);
            }
            if unassign {
                patch.responsible_id = Some(None);
                patch.ball_holder_id = Some(None);
            }
            update_task(ws, output, &id, patch)
        }
        TaskCommands::Move {
            id,
            parent,
            root,
            index,
        } => {
            if parent.is_none() && !root && index.is_none() {
                bail!("Nothing to do: pass --parent, --root or --index");
            }
            move_task(ws, output, &id, parent, root, index)
        }
        TaskCommands::Delete { id } => delete_task(ws, output, &id),
    }
}

fn add_task(ws: &Workspace, output: &Output, name: &str, parent: Option<&TaskId>) -> Result<()> {
    let id = ws.modify(|project| Ok(project.add_task(name, parent)?))?;
    output.verbose_ctx("task", &format!("Added {} under {:?}", id, parent));

    if output.is_json() {
        output.data(&serde_json::json!({
            "id": id,
            "name": name,
            "parentId": parent,
        }));
    } else {
        output.success(&format!("Created task {}: {}", id, name));
    }
    Ok(())
}

fn list_tasks(ws: &Workspace, output: &Output) -> Result<()> {
    let project = ws.load()?;
    let ordered = project.wbs_order();

    if output.is_json() {
        let tasks: Vec<_> = ordered
            .iter()
            .map(|(depth, task)| {
                serde_json::json!({
                    "depth": depth,
                    "task": task,
                })
            })
            .collect();
        output.data(&tasks);
    } else if ordered.is_empty() {
        println!("No tasks");
    } else {
        for (depth, task) in ordered {
            println!(
                "{}{} {} [{}] {}%{}",
                "  ".repeat(depth),
                task.id,
                task.name,
                status_name(&project, task),
                task.progress,
                format_span(task)
            );
        }
    }
    Ok(())
}

fn show_task(ws: &Workspace, output: &Output, id: &TaskId) -> Result<()> {
    let project = ws.load()?;
    let task = project
        .task(id)
        .ok_or_else(|| anyhow!("Task not found: {}", id))?;

    let children: Vec<&TaskId> = project
        .children(Some(id))
        .into_iter()
        .map(|t| &t.id)
        .collect();
    let predecessors: Vec<_> = project
        .dependencies
        .iter()
        .filter(|d| &d.successor_id == id)
        .collect();
    let successors: Vec<_> = project
        .dependencies
        .iter()
        .filter(|d| &d.predecessor_id == id)
        .collect();

    if output.is_json() {
        output.data(&serde_json::json!({
            "task": task,
            "children": children,
            "predecessors": predecessors,
            "successors": successors,
        }));
        return Ok(());
    }

    println!("Task: {}", task.id);
    println!("Name: {}", task.name);
    println!("Status: {}", status_name(&project, task));
    println!("Progress: {}%", task.progress);
    if let Some(parent) = &task.parent_id {
        println!("Parent: {}", parent);
    }
    match (task.effective_start(), task.effective_end()) {
        (Some(start), Some(end)) => println!("Dates: {} .. {}", start, end),
        (Some(start), None) => println!("Start: {}", start),
        _ => println!("Dates: unscheduled"),
    }
    if let Some(duration) = task.duration {
        println!("Duration: {}d", duration);
    }
    if let Some(resource) = &task.responsible_id {
        println!("Responsible: {}", resource_name(&project, resource));
    }
    if let Some(resource) = &task.ball_holder_id {
        println!("Ball holder: {}", resource_name(&project, resource));
    }

    if !children.is_empty() {
        println!("\nSubtasks:");
        for child in children {
            println!("  {}", child);
        }
    }
    if !predecessors.is_empty() {
        println!("\nAfter:");
        for dep in predecessors {
            println!("  {} ({} {:+}d)", dep.predecessor_id, dep.dep_type, dep.lag);
        }
    }
    if !successors.is_empty() {
        println!("\nBefore:");
        for dep in successors {
            println!("  {} ({} {:+}d)", dep.successor_id, dep.dep_type, dep.lag);
        }
    }
    Ok(())
}

fn update_task(ws: &Workspace, output: &Output, id: &TaskId, patch: TaskPatch) -> Result<()> {
    if patch.is_empty() {
        bail!("Nothing to update");
    }
    output.verbose_ctx("task", &format!("Patch for {}: {:?}", id, patch));

    let task = ws.modify(|project| {
        project.update_task(id, patch)?;
        Ok(project.task(id).cloned())
    })?;

    if output.is_json() {
        output.data(&task);
    } else {
        output.success(&format!("Updated task {}", id));
    }
    Ok(())
}

fn move_task(
    ws: &Workspace,
    output: &Output,
    id: &TaskId,
    parent: Option<TaskId>,
    root: bool,
    index: Option<usize>,
) -> Result<()> {
    let parent = ws.modify(|project| {
        // --index alone keeps the current parent
        let parent = if root {
            None
        } else {
            match parent {
                Some(parent) => Some(parent),
                None => project
                    .task(id)
                    .ok_or_else(|| anyhow!("Task not found: {}", id))?
                    .parent_id
                    .clone(),
            }
        };
        project.move_task(id, parent.as_ref(), index)?;
        Ok(parent)
    })?;

    let location = parent
        .map(|p| format!("under {}", p))
        .unwrap_or_else(|| "to root".to_string());
    if output.is_json() {
        output.data(&serde_json::json!({
            "id": id,
            "moved": location,
        }));
    } else {
        output.success(&format!("Moved {} {}", id, location));
    }
    Ok(())
}

fn delete_task(ws: &Workspace, output: &Output, id: &TaskId) -> Result<()> {
    let removed = ws.modify(|project| Ok(project.delete_task(id)?))?;

    if output.is_json() {
        output.data(&serde_json::json!({ "removed": removed }));
    } else if removed.len() > 1 {
        output.success(&format!(
            "Deleted {} and {} subtask(s)",
            id,
            removed.len() - 1
        ));
    } else {
        output.success(&format!("Deleted {}", id));
    }
    Ok(())
}

fn status_name<'a>(project: &'a Project, task: &'a Task) -> &'a str {
    project
        .status(&task.status)
        .map(|s| s.name.as_str())
        .unwrap_or(task.status.as_str())
}

fn resource_name(project: &Project, id: &ResourceId) -> String {
    project
        .resource(id)
        .map(|r| format!("{} ({})", r.name, id))
        .unwrap_or_else(|| format!("{} (missing)", id))
}

fn format_span(task: &Task) -> String {
    match (task.effective_start(), task.effective_end()) {
        (Some(start), Some(end)) => format!("  {} .. {}", start, end),
        _ => String::new(),
    }
}
