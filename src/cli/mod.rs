//! # Command-Line Interface
//!
//! User-facing CLI commands and output formatting.
//!
//! ## Command Groups
//!
//! | Group | Purpose | Examples |
//! |-------|---------|----------|
//! | Core | Document lifecycle | `new`, `validate` |
//! | Task | WBS editing | `task add`, `task move`, `task update` |
//! | Resource | People and teams | `resource add`, `resource delete` |
//! | Status | Kanban columns | `status add`, `status reorder` |
//! | Dependency | Scheduling links | `dep add --type SS --lag 2` |
//! | Schedule | Timeline placement | `schedule`, `schedule --relative`, `watch` |
//!
//! ## Output Formats
//!
//! All commands support `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! ## Verbose Mode
//!
//! Use `--verbose` (or `-v`) for debug output:
//! ```bash
//! wbs --verbose schedule
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod output;
mod task;
mod resource;
mod status;
mod dep;
mod schedule;

pub use app::{run, Cli, Commands, Workspace, DEFAULT_FILE};
pub use output::{Output, OutputFormat};
