//! Scheduling dependencies between tasks

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::id::{DependencyId, TaskId};

/// Constraint type linking a predecessor bar to a successor bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DependencyType {
    /// Successor starts after predecessor finishes
    #[default]
    #[serde(rename = "FS")]
    FinishToStart,
    /// Successor starts with predecessor
    #[serde(rename = "SS")]
    StartToStart,
    /// Successor finishes with predecessor
    #[serde(rename = "FF")]
    FinishToFinish,
    /// Successor finishes when predecessor starts
    #[serde(rename = "SF")]
    StartToFinish,
}

impl DependencyType {
    /// Returns the two-letter code used in documents
    pub fn code(&self) -> &'static str {
        match self {
            DependencyType::FinishToStart => "FS",
            DependencyType::StartToStart => "SS",
            DependencyType::FinishToFinish => "FF",
            DependencyType::StartToFinish => "SF",
        }
    }

    /// True if the constraint anchors on the predecessor's end
    pub fn reads_predecessor_end(&self) -> bool {
        matches!(self, DependencyType::FinishToStart | DependencyType::FinishToFinish)
    }

    /// True if the constraint pins the successor's end (rather than its start)
    pub fn pins_successor_end(&self) -> bool {
        matches!(self, DependencyType::FinishToFinish | DependencyType::StartToFinish)
    }
}

impl fmt::Display for DependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for DependencyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "FS" => Ok(DependencyType::FinishToStart),
            "SS" => Ok(DependencyType::StartToStart),
            "FF" => Ok(DependencyType::FinishToFinish),
            "SF" => Ok(DependencyType::StartToFinish),
            other => Err(format!(
                "Unknown dependency type '{}' (expected FS, SS, FF or SF)",
                other
            )),
        }
    }
}

/// A typed, lagged link between two tasks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDependency {
    pub id: DependencyId,
    pub predecessor_id: TaskId,
    pub successor_id: TaskId,
    #[serde(rename = "type", default)]
    pub dep_type: DependencyType,
    /// Days; positive delays the successor, negative overlaps
    #[serde(default)]
    pub lag: i32,
}

impl TaskDependency {
    pub fn new(
        id: DependencyId,
        predecessor_id: TaskId,
        successor_id: TaskId,
        dep_type: DependencyType,
        lag: i32,
    ) -> Self {
        Self {
            id,
            predecessor_id,
            successor_id,
            dep_type,
            lag,
        }
    }

    /// Returns true if either endpoint is `task`
    pub fn touches(&self, task: &TaskId) -> bool {
        &self.predecessor_id == task || &self.successor_id == task
    }
}
