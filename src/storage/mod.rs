//! # Storage Layer
//!
//! Persistence and configuration for the editor core.
//!
//! ## Storage Formats
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Project documents | JSON envelope `{version, project}` | any path, default `project.wbs.json` |
//! | Config | TOML | `~/.config/wbs/config.toml` |
//!
//! ## Concurrency Safety
//!
//! - [`DocumentStore`] uses file locking (`fs2`) for concurrent access
//! - All writes are atomic (temp file + rename)
//!
//! ## Key Types
//!
//! - [`DocumentStore`] - Read/write project documents
//! - [`Config`] - User configuration (history and scheduler settings)

mod document;
mod config;

pub use document::{parse_document, render_document, DocumentError, DocumentStore, FORMAT_VERSION};
pub use config::{Config, ConfigError, HistoryConfig, OutputFormat, ScheduleConfig};
