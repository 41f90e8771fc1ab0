//! JSON document files
//!
//! A document is an envelope `{ "version": "1.0", "project": { ... } }`.
//! Writes are atomic (temp file + rename) and use file locking for
//! concurrent access safety.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::domain::Project;

/// Version written into new documents
pub const FORMAT_VERSION: &str = "1.0";

#[derive(Debug, Error, PartialEq)]
pub enum DocumentError {
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Unsupported document version '{0}' (expected 1.x)")]
    UnsupportedVersion(String),
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    version: &'a str,
    project: &'a Project,
}

/// Parses a document envelope
pub fn parse_document(json: &str) -> Result<Project, DocumentError> {
    let mut value: Value = serde_json::from_str(json)
        .map_err(|e| DocumentError::InvalidDocument(format!("not valid JSON: {}", e)))?;

    let envelope = value
        .as_object_mut()
        .ok_or_else(|| DocumentError::InvalidDocument("expected a JSON object".into()))?;

    let version = match envelope.get("version") {
        Some(Value::String(v)) => v.clone(),
        Some(_) => {
            return Err(DocumentError::InvalidDocument(
                "'version' must be a string".into(),
            ))
        }
        None => return Err(DocumentError::InvalidDocument("missing 'version'".into())),
    };
    if version.split('.').next() != Some("1") {
        return Err(DocumentError::UnsupportedVersion(version));
    }

    let project = envelope
        .remove("project")
        .ok_or_else(|| DocumentError::InvalidDocument("missing 'project'".into()))?;

    serde_json::from_value(project)
        .map_err(|e| DocumentError::InvalidDocument(format!("malformed 'project': {}", e)))
}

/// Renders a document envelope as pretty JSON
pub fn render_document(project: &Project) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&EnvelopeRef {
        version: FORMAT_VERSION,
        project,
    })
}

/// A document file on disk
pub struct DocumentStore {
    path: PathBuf,
}

impl DocumentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the path to the document file
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Reads and parses the document
    pub fn load(&self) -> Result<Project> {
        let mut file = File::open(&self.path)
            .with_context(|| format!("Failed to open document: {}", self.path.display()))?;

        // Acquire shared lock for reading
        file.lock_shared()
            .context("Failed to acquire read lock on document")?;

        let mut content = String::new();
        file.read_to_string(&mut content)
            .with_context(|| format!("Failed to read document: {}", self.path.display()))?;

        // Lock is released when file is dropped
        let project = parse_document(&content)
            .with_context(|| format!("Failed to load {}", self.path.display()))?;
        Ok(project)
    }

    /// Writes the document (full rewrite)
    pub fn save(&self, project: &Project) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let json = render_document(project).context("Failed to serialize project")?;

        // Write to temp file first
        let temp_path = self.path.with_extension("json.tmp");

        {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)
                .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;

            // Acquire exclusive lock
            file.lock_exclusive()
                .context("Failed to acquire write lock on document")?;

            let mut writer = BufWriter::new(&file);
            writer
                .write_all(json.as_bytes())
                .context("Failed to write document")?;
            writeln!(writer).context("Failed to write document")?;
            writer.flush().context("Failed to flush document")?;
        }

        // Atomic rename
        fs::rename(&temp_path, &self.path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                temp_path.display(),
                self.path.display()
            )
        })?;

        Ok(())
    }
}
