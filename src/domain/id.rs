//! Identifiers for document entities
//!
//! ID Format for newly created entities:
//! - Projects: `p-{7-char-hash}` (e.g., `p-7f2b4c1`)
//! - Tasks: `t-{7-char-hash}`
//! - Resources: `r-{7-char-hash}`
//! - Statuses: `s-{7-char-hash}`
//! - Dependencies: `d-{7-char-hash}`
//!
//! Hash is derived from a seed (usually the name) + creation timestamp.
//! Documents written by other tools may carry arbitrary non-empty ids
//! (uuids, slugs); those are accepted as-is when parsing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum IdError {
    #[error("Invalid {kind} ID: must not be empty")]
    Empty { kind: &'static str },

    #[error("Invalid {kind} ID '{id}': must not contain whitespace")]
    Whitespace { kind: &'static str, id: String },
}

/// Disambiguates ids generated for the same seed within one timestamp tick
static GENERATION: AtomicU64 = AtomicU64::new(0);

/// Generates a 7-character hash from seed and timestamp
fn generate_hash(seed: &str, timestamp: DateTime<Utc>) -> String {
    let counter = GENERATION.fetch_add(1, Ordering::Relaxed);
    let input = format!(
        "{}{}{}",
        seed,
        timestamp.timestamp_nanos_opt().unwrap_or(0),
        counter
    );
    let hash = blake3::hash(input.as_bytes());
    let hex = hash.to_hex();
    hex[..7].to_string()
}

fn check(kind: &'static str, s: &str) -> Result<(), IdError> {
    if s.is_empty() {
        return Err(IdError::Empty { kind });
    }
    if s.chars().any(char::is_whitespace) {
        return Err(IdError::Whitespace {
            kind,
            id: s.to_string(),
        });
    }
    Ok(())
}

macro_rules! entity_id {
    ($(#[$doc:meta])* $name:ident, $prefix:literal, $kind:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Generates a fresh id from a seed and timestamp
            pub fn generate(seed: &str, timestamp: DateTime<Utc>) -> Self {
                Self(format!("{}-{}", $prefix, generate_hash(seed, timestamp)))
            }

            /// Returns the id as a string slice
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                check($kind, s)?;
                Ok(Self(s.to_string()))
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                check($kind, &value)?;
                Ok(Self(value))
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

entity_id!(
    /// Project ID
    ProjectId,
    "p",
    "project"
);
entity_id!(
    /// Task ID, unique within a project
    TaskId,
    "t",
    "task"
);
entity_id!(
    /// Resource ID, referenced by task responsible/ball holder fields
    ResourceId,
    "r",
    "resource"
);
entity_id!(
    /// Status ID, referenced by `Task::status`
    StatusId,
    "s",
    "status"
);

impl StatusId {
    /// Wraps a built-in status id such as `todo`
    pub(crate) fn from_static(id: &'static str) -> Self {
        Self(id.to_string())
    }
}
entity_id!(
    /// Dependency ID
    DependencyId,
    "d",
    "dependency"
);
