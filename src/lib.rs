//! wbs-core - the editing and scheduling core of a project planner
//!
//! A project is a work breakdown structure of tasks with statuses,
//! resources and FS/SS/FF/SF dependencies. The crate places tasks on a
//! timeline from their dates and links, and tracks edits with a bounded,
//! debounced undo/redo history.

pub mod domain;
pub mod schedule;
pub mod history;
pub mod storage;
pub mod cli;

pub use domain::{DependencyType, Project, Task, TaskDependency, TaskId};
pub use history::{EditSession, HistoryStore};
pub use schedule::{compute_schedule, Schedule, ScheduleContext, ScheduleMode};
