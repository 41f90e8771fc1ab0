//! Task domain model
//!
//! Tasks form a tree through `parent_id` (the WBS) and carry optional
//! calendar placement. Dates are inclusive and date-only: a task from
//! 2024-01-01 to 2024-01-03 spans three days.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use super::id::{ResourceId, StatusId, TaskId};

/// A single work item in the breakdown structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier
    pub id: TaskId,

    /// Human-readable name
    pub name: String,

    /// Parent task in the breakdown tree
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<TaskId>,

    /// First day of work (inclusive)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,

    /// Last day of work (inclusive)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,

    /// Length in days
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,

    /// Completion percentage, 0-100
    #[serde(default)]
    pub progress: u8,

    /// References a `StatusConfig` id
    pub status: StatusId,

    /// Resource accountable for the task
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responsible_id: Option<ResourceId>,

    /// Resource currently expected to act on the task
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ball_holder_id: Option<ResourceId>,

    /// Sort key among siblings
    #[serde(default)]
    pub order: u32,
}

impl Task {
    /// Creates a task with no dates and zero progress
    pub fn new(id: TaskId, name: impl Into<String>, status: StatusId) -> Self {
        Self {
            id,
            name: name.into(),
            parent_id: None,
            start_date: None,
            end_date: None,
            duration: None,
            progress: 0,
            status,
            responsible_id: None,
            ball_holder_id: None,
            order: 0,
        }
    }

    /// Builder-style date setter, keeping `duration` in sync
    pub fn with_dates(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.start_date = Some(start);
        self.end_date = Some(end);
        self.duration = inclusive_days(start, end);
        self
    }

    /// Returns the task length in days.
    ///
    /// A start and end date pin the length; `duration` is used otherwise.
    pub fn span_days(&self) -> Option<i64> {
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if let Some(days) = inclusive_days(start, end) {
                return Some(i64::from(days));
            }
        }
        self.duration.map(i64::from)
    }

    /// Returns the last working day, derived from start + duration if needed
    pub fn effective_end(&self) -> Option<NaiveDate> {
        if let Some(end) = self.end_date {
            return Some(end);
        }
        let start = self.start_date?;
        let days = self.duration?;
        start.checked_add_days(Days::new(u64::from(days.saturating_sub(1))))
    }

    /// Returns the first working day, derived from end - duration if needed
    pub fn effective_start(&self) -> Option<NaiveDate> {
        if let Some(start) = self.start_date {
            return Some(start);
        }
        let end = self.end_date?;
        let days = self.duration?;
        end.checked_sub_days(Days::new(u64::from(days.saturating_sub(1))))
    }

    /// Returns true if either resource slot points at `resource`
    pub fn references_resource(&self, resource: &ResourceId) -> bool {
        self.responsible_id.as_ref() == Some(resource)
            || self.ball_holder_id.as_ref() == Some(resource)
    }
}

/// Number of days in an inclusive date range, `None` if `end` precedes `start`
pub fn inclusive_days(start: NaiveDate, end: NaiveDate) -> Option<u32> {
    let days = (end - start).num_days() + 1;
    u32::try_from(days).ok().filter(|d| *d > 0)
}

/// Partial update for a task; `None` leaves a field untouched.
///
/// Nested options clear the field when set to `Some(None)`.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub name: Option<String>,
    pub start_date: Option<Option<NaiveDate>>,
    pub end_date: Option<Option<NaiveDate>>,
    pub duration: Option<Option<u32>>,
    pub progress: Option<u8>,
    pub status: Option<StatusId>,
    pub responsible_id: Option<Option<ResourceId>>,
    pub ball_holder_id: Option<Option<ResourceId>>,
}

impl TaskPatch {
    /// Returns true if the patch changes nothing
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
            && self.duration.is_none()
            && self.progress.is_none()
            && self.status.is_none()
            && self.responsible_id.is_none()
            && self.ball_holder_id.is_none()
    }
}
