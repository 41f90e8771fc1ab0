//! # Dependency Scheduler
//!
//! Computes where every task sits on the timeline given its own dates and
//! the FS/SS/FF/SF links pointing at it.
//!
//! ## Day-index space
//!
//! All arithmetic happens on integer day offsets from a schedule origin.
//! A bar occupies `[start, start + duration)`, so a task dated 2024-01-01
//! to 2024-01-03 is `start = 0, duration = 3` and its "end" anchor is `3`.
//! Pixel scaling (`day_width`) is only applied by rendering helpers.
//!
//! | Type | Constraint |
//! |------|------------|
//! | FS | `successor.start = predecessor.end + lag` |
//! | SS | `successor.start = predecessor.start + lag` |
//! | FF | `successor.end = predecessor.end + lag` |
//! | SF | `successor.end = predecessor.start + lag` |
//!
//! ## Modes
//!
//! - [`ScheduleMode::Absolute`]: only tasks with calendar dates (or placed
//!   by a dependency from one) get a bar; placements carry dates.
//! - [`ScheduleMode::Relative`]: every task gets a bar; undated tasks start
//!   at offset 0 with their duration (or the default duration).
//!
//! ## Conflicts and failures
//!
//! When several links constrain the same task, the one listed last in the
//! dependency sequence wins. Problems are reported as [`ScheduleIssue`]s
//! alongside the result; they never abort the computation.

mod compute;

use chrono::{Days, NaiveDate};
use serde::Serialize;
use thiserror::Error;

use crate::domain::{DependencyId, TaskId};

pub use compute::compute_schedule;

/// How placements are anchored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleMode {
    /// Calendar dates
    #[default]
    Absolute,
    /// Day offsets only
    Relative,
}

/// An inclusive calendar window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl DateRange {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            start_date,
            end_date,
        }
    }

    /// Number of days in the window
    pub fn days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }
}

/// Inputs that do not come from the document itself
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleContext {
    /// Explicit window; its start becomes the schedule origin
    pub range: Option<DateRange>,
    /// Pixels per day, used only by rendering helpers
    pub day_width: f32,
    /// Length given to tasks with neither dates nor a duration
    pub default_duration: u32,
}

impl Default for ScheduleContext {
    fn default() -> Self {
        Self {
            range: None,
            day_width: 24.0,
            default_duration: 1,
        }
    }
}

impl ScheduleContext {
    /// Pixel x-position of a day offset
    pub fn x_of(&self, day: i64) -> f32 {
        day as f32 * self.day_width
    }
}

/// A bar in day-index space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    /// Offset in days from the schedule origin
    pub relative_start: i64,
    /// Length in days
    pub duration: i64,
}

impl Placement {
    /// Exclusive end offset
    pub fn end(&self) -> i64 {
        self.relative_start + self.duration
    }

    /// `(x, width)` in pixels
    pub fn pixel_span(&self, ctx: &ScheduleContext) -> (f32, f32) {
        (ctx.x_of(self.relative_start), ctx.x_of(self.duration))
    }
}

/// Where a task's placement came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "dependency")]
pub enum PlacementSource {
    /// The task's own dates/duration
    Explicit,
    /// Relative mode default for an undated task
    Default,
    /// Set by this dependency (the last one applied)
    Dependency(DependencyId),
    /// No placement could be derived
    Unscheduled,
}

/// The computed placement for one task
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledTask {
    pub task_id: TaskId,
    pub placement: Option<Placement>,
    pub source: PlacementSource,
    /// First day, absolute mode only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    /// Last day (inclusive), absolute mode only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

/// A local problem found while scheduling
#[derive(Debug, Clone, Error, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ScheduleIssue {
    /// Tasks on (and downstream of) the cycle keep their own placement
    #[error("Cyclic dependency through {}", join(.task_ids))]
    CyclicDependency { task_ids: Vec<TaskId> },

    /// The dependency was skipped
    #[error("Dependency {dependency} references unknown task {task}")]
    UnknownTaskReference {
        dependency: DependencyId,
        task: TaskId,
    },

    /// The dependency was skipped
    #[error("Dependency {dependency} links task {task} to itself")]
    SelfDependency {
        dependency: DependencyId,
        task: TaskId,
    },

    /// The predecessor has no placement, so the dependency was skipped
    #[error("Dependency {dependency} skipped: task {task} has no dates")]
    MissingAnchor {
        dependency: DependencyId,
        task: TaskId,
    },
}

fn join(ids: &[TaskId]) -> String {
    ids.iter()
        .map(TaskId::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Result of [`compute_schedule`], one entry per input task in input order
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub mode: ScheduleMode,
    /// Calendar day of offset 0, if any task (or the context) has a date
    pub origin: Option<NaiveDate>,
    pub tasks: Vec<ScheduledTask>,
    pub issues: Vec<ScheduleIssue>,
}

impl Schedule {
    /// Looks up the entry for a task
    pub fn get(&self, task_id: &TaskId) -> Option<&ScheduledTask> {
        self.tasks.iter().find(|t| &t.task_id == task_id)
    }

    /// Returns true if any cycle was found
    pub fn has_cycles(&self) -> bool {
        self.issues
            .iter()
            .any(|i| matches!(i, ScheduleIssue::CyclicDependency { .. }))
    }

    /// Earliest start and latest exclusive end over all placed tasks
    pub fn extent(&self) -> Option<(i64, i64)> {
        let placed = self.tasks.iter().filter_map(|t| t.placement);
        placed.fold(None, |acc, p| match acc {
            None => Some((p.relative_start, p.end())),
            Some((lo, hi)) => Some((lo.min(p.relative_start), hi.max(p.end()))),
        })
    }

    /// Calendar date for a day offset
    pub fn date_of(&self, day: i64) -> Option<NaiveDate> {
        offset_date(self.origin?, day)
    }
}

pub(crate) fn offset_date(origin: NaiveDate, day: i64) -> Option<NaiveDate> {
    if day >= 0 {
        origin.checked_add_days(Days::new(day as u64))
    } else {
        origin.checked_sub_days(Days::new(day.unsigned_abs()))
    }
}
