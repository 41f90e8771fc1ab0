//! Document consistency checks
//!
//! Documents produced by other tools (or edited by hand) can break the
//! invariants the store layer maintains. `Project::validate` reports every
//! such problem without touching the document.

use chrono::NaiveDate;
use std::collections::HashSet;
use thiserror::Error;

use super::graph::find_cycles;
use super::id::{DependencyId, ResourceId, StatusId, TaskId};
use super::project::Project;
use super::task::inclusive_days;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum Problem {
    #[error("Project has no statuses")]
    NoStatuses,

    #[error("Duplicate task id: {0}")]
    DuplicateTaskId(TaskId),

    #[error("Task {task} has unknown parent {parent}")]
    MissingParent { task: TaskId, parent: TaskId },

    #[error("Task {0} is its own ancestor")]
    ParentCycle(TaskId),

    #[error("Task {task} has unknown status {status}")]
    UnknownStatus { task: TaskId, status: StatusId },

    #[error("Task {task} references unknown resource {resource}")]
    UnknownResource { task: TaskId, resource: ResourceId },

    #[error("Task {task} has progress {progress} (expected 0-100)")]
    ProgressOutOfRange { task: TaskId, progress: u8 },

    #[error("Task {task} ends on {end}, before it starts on {start}")]
    InvertedDates {
        task: TaskId,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("Task {task} spans {span} day(s) but has duration {duration}; its dates win")]
    DurationMismatch { task: TaskId, duration: u32, span: u32 },

    #[error("Dependency {dependency} references unknown task {task}")]
    DanglingDependency {
        dependency: DependencyId,
        task: TaskId,
    },

    #[error("Dependency {dependency} links task {task} to itself")]
    SelfDependency {
        dependency: DependencyId,
        task: TaskId,
    },

    #[error("Dependency cycle through {}", join(.0))]
    DependencyCycle(Vec<TaskId>),
}

fn join(ids: &[TaskId]) -> String {
    ids.iter()
        .map(TaskId::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}

impl Project {
    /// Lists every invariant violation in the document
    pub fn validate(&self) -> Vec<Problem> {
        let mut problems = Vec::new();

        if self.statuses.is_empty() {
            problems.push(Problem::NoStatuses);
        }

        let mut seen = HashSet::new();
        for task in &self.tasks {
            if !seen.insert(&task.id) {
                problems.push(Problem::DuplicateTaskId(task.id.clone()));
            }
        }

        for task in &self.tasks {
            if let Some(parent) = &task.parent_id {
                if self.task(parent).is_none() {
                    problems.push(Problem::MissingParent {
                        task: task.id.clone(),
                        parent: parent.clone(),
                    });
                } else if self.is_ancestor(&task.id, &task.id) {
                    problems.push(Problem::ParentCycle(task.id.clone()));
                }
            }

            if self.status(&task.status).is_none() {
                problems.push(Problem::UnknownStatus {
                    task: task.id.clone(),
                    status: task.status.clone(),
                });
            }

            for resource in [&task.responsible_id, &task.ball_holder_id]
                .into_iter()
                .flatten()
            {
                if self.resource(resource).is_none() {
                    problems.push(Problem::UnknownResource {
                        task: task.id.clone(),
                        resource: resource.clone(),
                    });
                }
            }

            if let (Some(start), Some(end)) = (task.start_date, task.end_date) {
                match (inclusive_days(start, end), task.duration) {
                    (None, _) => problems.push(Problem::InvertedDates {
                        task: task.id.clone(),
                        start,
                        end,
                    }),
                    (Some(span), Some(duration)) if span != duration => {
                        problems.push(Problem::DurationMismatch {
                            task: task.id.clone(),
                            duration,
                            span,
                        })
                    }
                    _ => {}
                }
            }

            if task.progress > 100 {
                problems.push(Problem::ProgressOutOfRange {
                    task: task.id.clone(),
                    progress: task.progress,
                });
            }
        }

        for dep in &self.dependencies {
            if dep.predecessor_id == dep.successor_id {
                problems.push(Problem::SelfDependency {
                    dependency: dep.id.clone(),
                    task: dep.predecessor_id.clone(),
                });
                continue;
            }
            for endpoint in [&dep.predecessor_id, &dep.successor_id] {
                if self.task(endpoint).is_none() {
                    problems.push(Problem::DanglingDependency {
                        dependency: dep.id.clone(),
                        task: endpoint.clone(),
                    });
                }
            }
        }

        problems.extend(
            find_cycles(&self.tasks, &self.dependencies)
                .into_iter()
                .map(Problem::DependencyCycle),
        );

        problems
    }
}
