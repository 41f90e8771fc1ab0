//! Document model for the editor
//!
//! Contains the project data definitions and store-layer edits without
//! any I/O concerns.

mod id;
mod task;
mod resource;
mod dependency;
mod project;
mod graph;
mod edit;
mod validate;

pub use id::{DependencyId, IdError, ProjectId, ResourceId, StatusId, TaskId};
pub use task::{inclusive_days, Task, TaskPatch};
pub use resource::{is_hex_color, Resource, StatusConfig};
pub use dependency::{DependencyType, TaskDependency};
pub use project::Project;
pub use graph::{find_cycles, DependencyGraph, GraphError};
pub use edit::EditError;
pub use validate::Problem;
