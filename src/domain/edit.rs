//! Store-layer edits
//!
//! Every user action that changes a document goes through one of these
//! methods. They keep the document's referential invariants intact:
//! no parent cycles, no dangling status/resource references, at least
//! one status, and an acyclic dependency set.

use chrono::{NaiveDate, Utc};
use thiserror::Error;

use super::dependency::{DependencyType, TaskDependency};
use super::graph::{DependencyGraph, GraphError};
use super::id::{DependencyId, ResourceId, StatusId, TaskId};
use super::project::Project;
use super::resource::{Resource, StatusConfig};
use super::task::{Task, TaskPatch};

#[derive(Debug, Error, PartialEq)]
pub enum EditError {
    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("Resource not found: {0}")]
    ResourceNotFound(ResourceId),

    #[error("Status not found: {0}")]
    StatusNotFound(StatusId),

    #[error("Dependency not found: {0}")]
    DependencyNotFound(DependencyId),

    #[error("Cannot delete the last remaining status")]
    LastStatus,

    #[error("Moving {0} under {1} would make it its own ancestor")]
    ParentCycle(TaskId, TaskId),

    #[error("Progress must be between 0 and 100, got {0}")]
    InvalidProgress(u8),

    #[error("End date {end} is before start date {start}")]
    InvertedDates { start: NaiveDate, end: NaiveDate },

    #[error("Dependency {0} -> {1} already exists")]
    DuplicateDependency(TaskId, TaskId),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

impl Project {
    fn next_order(&self, parent: Option<&TaskId>) -> u32 {
        self.children(parent)
            .last()
            .map(|t| t.order + 1)
            .unwrap_or(0)
    }

    fn require_task(&self, id: &TaskId) -> Result<(), EditError> {
        self.task(id)
            .map(|_| ())
            .ok_or_else(|| EditError::TaskNotFound(id.clone()))
    }

    fn require_resource(&self, id: &ResourceId) -> Result<(), EditError> {
        self.resource(id)
            .map(|_| ())
            .ok_or_else(|| EditError::ResourceNotFound(id.clone()))
    }

    /// Appends a task at the end of `parent`'s children
    pub fn add_task(
        &mut self,
        name: impl Into<String>,
        parent: Option<&TaskId>,
    ) -> Result<TaskId, EditError> {
        if let Some(parent) = parent {
            self.require_task(parent)?;
        }
        let status = self
            .first_status()
            .map(|s| s.id.clone())
            .ok_or(EditError::LastStatus)?;

        let name = name.into();
        let id = TaskId::generate(&name, Utc::now());
        let mut task = Task::new(id.clone(), name, status);
        task.parent_id = parent.cloned();
        task.order = self.next_order(parent);

        self.tasks.push(task);
        self.touch();
        Ok(id)
    }

    /// Applies a partial update to a task
    pub fn update_task(&mut self, id: &TaskId, patch: TaskPatch) -> Result<(), EditError> {
        if let Some(progress) = patch.progress {
            if progress > 100 {
                return Err(EditError::InvalidProgress(progress));
            }
        }
        if let Some(status) = &patch.status {
            if self.status(status).is_none() {
                return Err(EditError::StatusNotFound(status.clone()));
            }
        }
        for resource in [&patch.responsible_id, &patch.ball_holder_id]
            .into_iter()
            .flatten()
            .flatten()
        {
            self.require_resource(resource)?;
        }

        let task = self
            .task_mut(id)
            .ok_or_else(|| EditError::TaskNotFound(id.clone()))?;

        let start = patch.start_date.unwrap_or(task.start_date);
        let end = patch.end_date.unwrap_or(task.end_date);
        if let (Some(start), Some(end)) = (start, end) {
            if end < start {
                return Err(EditError::InvertedDates { start, end });
            }
        }

        if let Some(name) = patch.name {
            task.name = name;
        }
        task.start_date = start;
        task.end_date = end;
        if let Some(duration) = patch.duration {
            task.duration = duration;
        }
        if let Some(progress) = patch.progress {
            task.progress = progress;
        }
        if let Some(status) = patch.status {
            task.status = status;
        }
        if let Some(responsible) = patch.responsible_id {
            task.responsible_id = responsible;
        }
        if let Some(ball_holder) = patch.ball_holder_id {
            task.ball_holder_id = ball_holder;
        }

        self.touch();
        Ok(())
    }

    /// Reparents a task and places it at `index` among its new siblings.
    ///
    /// Sibling `order` values of the destination are renumbered `0..n`.
    pub fn move_task(
        &mut self,
        id: &TaskId,
        new_parent: Option<&TaskId>,
        index: Option<usize>,
    ) -> Result<(), EditError> {
        self.require_task(id)?;
        if let Some(parent) = new_parent {
            self.require_task(parent)?;
            if parent == id || self.is_ancestor(id, parent) {
                return Err(EditError::ParentCycle(id.clone(), parent.clone()));
            }
        }

        let mut siblings: Vec<TaskId> = self
            .children(new_parent)
            .into_iter()
            .filter(|t| &t.id != id)
            .map(|t| t.id.clone())
            .collect();
        let at = index.unwrap_or(siblings.len()).min(siblings.len());
        siblings.insert(at, id.clone());

        if let Some(task) = self.task_mut(id) {
            task.parent_id = new_parent.cloned();
        }
        for (order, sibling) in siblings.iter().enumerate() {
            if let Some(task) = self.task_mut(sibling) {
                task.order = order as u32;
            }
        }

        self.touch();
        Ok(())
    }

    /// Deletes a task with its whole subtree and every dependency touching it.
    ///
    /// Returns the ids of all removed tasks.
    pub fn delete_task(&mut self, id: &TaskId) -> Result<Vec<TaskId>, EditError> {
        self.require_task(id)?;

        let mut removed = vec![id.clone()];
        removed.extend(self.descendants(id));

        self.tasks.retain(|t| !removed.contains(&t.id));
        self.dependencies
            .retain(|d| !removed.iter().any(|r| d.touches(r)));

        self.touch();
        Ok(removed)
    }

    /// Adds a resource and returns its id
    pub fn add_resource(
        &mut self,
        name: impl Into<String>,
        color: impl Into<String>,
    ) -> ResourceId {
        let name = name.into();
        let id = ResourceId::generate(&name, Utc::now());
        self.resources.push(Resource::new(id.clone(), name, color));
        self.touch();
        id
    }

    /// Changes a resource's name, color or availability (clamped to 100)
    pub fn update_resource(
        &mut self,
        id: &ResourceId,
        name: Option<String>,
        color: Option<String>,
        availability: Option<u8>,
    ) -> Result<(), EditError> {
        let resource = self
            .resources
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or_else(|| EditError::ResourceNotFound(id.clone()))?;
        if let Some(name) = name {
            resource.name = name;
        }
        if let Some(color) = color {
            resource.color = color;
        }
        if let Some(availability) = availability {
            resource.availability = availability.min(100);
        }
        self.touch();
        Ok(())
    }

    /// Deletes a resource and clears every task slot that referenced it.
    ///
    /// Returns the number of tasks that were updated.
    pub fn delete_resource(&mut self, id: &ResourceId) -> Result<usize, EditError> {
        self.require_resource(id)?;
        self.resources.retain(|r| &r.id != id);

        let mut updated = 0;
        for task in self.tasks.iter_mut().filter(|t| t.references_resource(id)) {
            if task.responsible_id.as_ref() == Some(id) {
                task.responsible_id = None;
            }
            if task.ball_holder_id.as_ref() == Some(id) {
                task.ball_holder_id = None;
            }
            updated += 1;
        }

        self.touch();
        Ok(updated)
    }

    /// Appends a status after the current last one
    pub fn add_status(&mut self, name: impl Into<String>, color: impl Into<String>) -> StatusId {
        let name = name.into();
        let id = StatusId::generate(&name, Utc::now());
        let order = self
            .statuses
            .iter()
            .map(|s| s.order + 1)
            .max()
            .unwrap_or(0);
        self.statuses
            .push(StatusConfig::new(id.clone(), name, color, order));
        self.touch();
        id
    }

    /// Deletes a status; tasks in it move to the first remaining status.
    ///
    /// The last remaining status can never be deleted.
    pub fn delete_status(&mut self, id: &StatusId) -> Result<(), EditError> {
        if self.status(id).is_none() {
            return Err(EditError::StatusNotFound(id.clone()));
        }
        if self.statuses.len() <= 1 {
            return Err(EditError::LastStatus);
        }

        self.statuses.retain(|s| &s.id != id);
        if let Some(fallback) = self.first_status().map(|s| s.id.clone()) {
            for task in self.tasks.iter_mut().filter(|t| &t.status == id) {
                task.status = fallback.clone();
            }
        }

        self.touch();
        Ok(())
    }

    /// Sets status display order to match `ids`; unknown ids are rejected
    pub fn reorder_statuses(&mut self, ids: &[StatusId]) -> Result<(), EditError> {
        for id in ids {
            if self.status(id).is_none() {
                return Err(EditError::StatusNotFound(id.clone()));
            }
        }

        // Statuses missing from `ids` keep their relative order after the listed ones
        let rest: Vec<StatusId> = self
            .ordered_statuses()
            .into_iter()
            .filter(|s| !ids.contains(&s.id))
            .map(|s| s.id.clone())
            .collect();

        for (order, id) in ids.iter().chain(rest.iter()).enumerate() {
            if let Some(status) = self.statuses.iter_mut().find(|s| &s.id == id) {
                status.order = order as u32;
            }
        }
        self.statuses.sort_by_key(|s| s.order);

        self.touch();
        Ok(())
    }

    /// Links two tasks; rejects self links, unknown tasks, duplicates and cycles
    pub fn add_dependency(
        &mut self,
        predecessor: &TaskId,
        successor: &TaskId,
        dep_type: DependencyType,
        lag: i32,
    ) -> Result<DependencyId, EditError> {
        if self.dependencies.iter().any(|d| {
            &d.predecessor_id == predecessor
                && &d.successor_id == successor
                && d.dep_type == dep_type
        }) {
            return Err(EditError::DuplicateDependency(
                predecessor.clone(),
                successor.clone(),
            ));
        }

        DependencyGraph::build(&self.tasks, &self.dependencies)
            .check_dependency(predecessor, successor)?;

        let seed = format!("{}{}", predecessor, successor);
        let id = DependencyId::generate(&seed, Utc::now());
        self.dependencies.push(TaskDependency::new(
            id.clone(),
            predecessor.clone(),
            successor.clone(),
            dep_type,
            lag,
        ));

        self.touch();
        Ok(id)
    }

    /// Removes a dependency by id
    pub fn remove_dependency(&mut self, id: &DependencyId) -> Result<TaskDependency, EditError> {
        let pos = self
            .dependencies
            .iter()
            .position(|d| &d.id == id)
            .ok_or_else(|| EditError::DependencyNotFound(id.clone()))?;
        let removed = self.dependencies.remove(pos);
        self.touch();
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn add_task_appends_to_siblings() {
        let mut project = Project::new("Demo");
        let a = project.add_task("A", None).unwrap();
        let b = project.add_task("B", None).unwrap();
        let a1 = project.add_task("A1", Some(&a)).unwrap();

        assert_eq!(project.task(&a).unwrap().order, 0);
        assert_eq!(project.task(&b).unwrap().order, 1);
        assert_eq!(project.task(&a1).unwrap().order, 0);
        assert_eq!(project.task(&a1).unwrap().parent_id, Some(a));
        assert_eq!(project.task(&b).unwrap().status.as_str(), "todo");
    }

    #[test]
    fn add_task_under_unknown_parent_fails() {
        let mut project = Project::new("Demo");
        let ghost: TaskId = "ghost".parse().unwrap();
        assert_eq!(
            project.add_task("A", Some(&ghost)),
            Err(EditError::TaskNotFound(ghost))
        );
        assert!(project.tasks.is_empty());
    }

    #[test]
    fn update_task_validates_references() {
        let mut project = Project::new("Demo");
        let a = project.add_task("A", None).unwrap();

        let bad_status = TaskPatch {
            status: Some("nope".parse().unwrap()),
            ..Default::default()
        };
        assert!(matches!(
            project.update_task(&a, bad_status),
            Err(EditError::StatusNotFound(_))
        ));

        let bad_resource = TaskPatch {
            ball_holder_id: Some(Some("r-missing".parse().unwrap())),
            ..Default::default()
        };
        assert!(matches!(
            project.update_task(&a, bad_resource),
            Err(EditError::ResourceNotFound(_))
        ));

        let bad_progress = TaskPatch {
            progress: Some(101),
            ..Default::default()
        };
        assert_eq!(
            project.update_task(&a, bad_progress),
            Err(EditError::InvalidProgress(101))
        );
    }

    #[test]
    fn update_task_applies_fields() {
        let mut project = Project::new("Demo");
        let a = project.add_task("A", None).unwrap();
        let alice = project.add_resource("Alice", "#ff0000");

        project
            .update_task(
                &a,
                TaskPatch {
                    name: Some("Renamed".into()),
                    start_date: Some(Some(date("2024-01-01"))),
                    end_date: Some(Some(date("2024-01-05"))),
                    progress: Some(40),
                    status: Some("done".parse().unwrap()),
                    responsible_id: Some(Some(alice.clone())),
                    ..Default::default()
                },
            )
            .unwrap();

        let task = project.task(&a).unwrap();
        assert_eq!(task.name, "Renamed");
        assert_eq!(task.span_days(), Some(5));
        assert_eq!(task.progress, 40);
        assert_eq!(task.status.as_str(), "done");
        assert_eq!(task.responsible_id, Some(alice));
    }

    #[test]
    fn update_task_rejects_inverted_dates() {
        let mut project = Project::new("Demo");
        let a = project.add_task("A", None).unwrap();
        let patch = TaskPatch {
            start_date: Some(Some(date("2024-01-05"))),
            end_date: Some(Some(date("2024-01-01"))),
            ..Default::default()
        };
        assert!(matches!(
            project.update_task(&a, patch),
            Err(EditError::InvertedDates { .. })
        ));
        assert!(project.task(&a).unwrap().start_date.is_none());
    }

    #[test]
    fn move_task_rejects_own_descendant() {
        let mut project = Project::new("Demo");
        let a = project.add_task("A", None).unwrap();
        let b = project.add_task("B", Some(&a)).unwrap();
        let c = project.add_task("C", Some(&b)).unwrap();

        assert_eq!(
            project.move_task(&a, Some(&c), None),
            Err(EditError::ParentCycle(a.clone(), c.clone()))
        );
        assert_eq!(
            project.move_task(&a, Some(&a), None),
            Err(EditError::ParentCycle(a.clone(), a.clone()))
        );
        assert!(project.task(&a).unwrap().parent_id.is_none());
    }

    #[test]
    fn move_task_renumbers_siblings() {
        let mut project = Project::new("Demo");
        let a = project.add_task("A", None).unwrap();
        let b = project.add_task("B", None).unwrap();
        let c = project.add_task("C", None).unwrap();

        project.move_task(&c, None, Some(0)).unwrap();
        let names: Vec<_> = project.roots().iter().map(|t| t.name.clone()).collect();
        assert_eq!(names, vec!["C", "A", "B"]);

        project.move_task(&b, Some(&a), None).unwrap();
        assert_eq!(project.children(Some(&a)).len(), 1);
        assert_eq!(project.task(&b).unwrap().order, 0);
    }

    #[test]
    fn delete_task_removes_subtree_and_links() {
        let mut project = Project::new("Demo");
        let a = project.add_task("A", None).unwrap();
        let a1 = project.add_task("A1", Some(&a)).unwrap();
        let b = project.add_task("B", None).unwrap();
        project
            .add_dependency(&a1, &b, DependencyType::FinishToStart, 0)
            .unwrap();

        let removed = project.delete_task(&a).unwrap();
        assert_eq!(removed, vec![a, a1]);
        assert_eq!(project.tasks.len(), 1);
        assert!(project.dependencies.is_empty());
        assert!(project.task(&b).is_some());
    }

    #[test]
    fn update_resource_fields() {
        let mut project = Project::new("Demo");
        let alice = project.add_resource("Alice", "#f00");

        project
            .update_resource(&alice, Some("Alicia".into()), None, Some(150))
            .unwrap();
        let resource = project.resource(&alice).unwrap();
        assert_eq!(resource.name, "Alicia");
        assert_eq!(resource.color, "#f00");
        assert_eq!(resource.availability, 100);

        let missing: ResourceId = "r-missing".parse().unwrap();
        assert_eq!(
            project.update_resource(&missing, None, None, Some(10)),
            Err(EditError::ResourceNotFound(missing))
        );
    }

    #[test]
    fn delete_resource_cascades() {
        let mut project = Project::new("Demo");
        let alice = project.add_resource("Alice", "#f00");
        let bob = project.add_resource("Bob", "#00f");
        let a = project.add_task("A", None).unwrap();
        let b = project.add_task("B", None).unwrap();

        project
            .update_task(
                &a,
                TaskPatch {
                    responsible_id: Some(Some(alice.clone())),
                    ball_holder_id: Some(Some(alice.clone())),
                    ..Default::default()
                },
            )
            .unwrap();
        project
            .update_task(
                &b,
                TaskPatch {
                    responsible_id: Some(Some(bob.clone())),
                    ..Default::default()
                },
            )
            .unwrap();

        let updated = project.delete_resource(&alice).unwrap();
        assert_eq!(updated, 1);

        let a = project.task(&a).unwrap();
        assert!(a.responsible_id.is_none());
        assert!(a.ball_holder_id.is_none());
        assert_eq!(project.task(&b).unwrap().responsible_id, Some(bob));
        assert_eq!(project.resources.len(), 1);
    }

    #[test]
    fn last_status_cannot_be_deleted() {
        let mut project = Project::new("Demo");
        let ids: Vec<_> = project.statuses.iter().map(|s| s.id.clone()).collect();

        project.delete_status(&ids[0]).unwrap();
        project.delete_status(&ids[1]).unwrap();
        assert_eq!(project.delete_status(&ids[2]), Err(EditError::LastStatus));
        assert_eq!(project.statuses.len(), 1);
    }

    #[test]
    fn deleting_status_moves_tasks_to_first_remaining() {
        let mut project = Project::new("Demo");
        let a = project.add_task("A", None).unwrap();
        let todo: StatusId = "todo".parse().unwrap();

        project.delete_status(&todo).unwrap();
        assert_eq!(project.task(&a).unwrap().status.as_str(), "in-progress");
    }

    #[test]
    fn reorder_statuses_puts_listed_first() {
        let mut project = Project::new("Demo");
        let done: StatusId = "done".parse().unwrap();
        project.reorder_statuses(&[done]).unwrap();

        let names: Vec<_> = project.ordered_statuses().iter().map(|s| s.name.clone()).collect();
        assert_eq!(names, vec!["Done", "To Do", "In Progress"]);
        assert_eq!(project.first_status().unwrap().name, "Done");
    }

    #[test]
    fn add_dependency_rejects_invalid_links() {
        let mut project = Project::new("Demo");
        let a = project.add_task("A", None).unwrap();
        let b = project.add_task("B", None).unwrap();

        project
            .add_dependency(&a, &b, DependencyType::FinishToStart, 0)
            .unwrap();

        assert!(matches!(
            project.add_dependency(&a, &b, DependencyType::FinishToStart, 2),
            Err(EditError::DuplicateDependency(_, _))
        ));
        assert!(matches!(
            project.add_dependency(&b, &a, DependencyType::StartToStart, 0),
            Err(EditError::Graph(GraphError::CycleDetected(_, _)))
        ));
        assert!(matches!(
            project.add_dependency(&a, &a, DependencyType::FinishToStart, 0),
            Err(EditError::Graph(GraphError::SelfDependency(_)))
        ));
        assert_eq!(project.dependencies.len(), 1);
    }

    #[test]
    fn add_dependency_despite_broken_links_in_document() {
        let mut project = Project::new("Demo");
        let a = project.add_task("A", None).unwrap();
        let b = project.add_task("B", None).unwrap();
        let c = project.add_task("C", None).unwrap();
        let d = project.add_task("D", None).unwrap();
        let ghost: TaskId = "t-ghost".parse().unwrap();

        // A hand-edited document: a dangling link and a C <-> D loop
        for (i, (from, to)) in [(&a, &ghost), (&c, &d), (&d, &c)].into_iter().enumerate() {
            project.dependencies.push(TaskDependency::new(
                format!("d-broken{}", i).parse().unwrap(),
                from.clone(),
                to.clone(),
                DependencyType::FinishToStart,
                0,
            ));
        }

        let id = project
            .add_dependency(&a, &b, DependencyType::FinishToStart, 0)
            .unwrap();
        assert!(project.dependencies.iter().any(|dep| dep.id == id));

        assert_eq!(
            project.add_dependency(&b, &ghost, DependencyType::FinishToStart, 0),
            Err(EditError::Graph(GraphError::TaskNotFound(ghost)))
        );
        assert!(matches!(
            project.add_dependency(&b, &a, DependencyType::FinishToStart, 0),
            Err(EditError::Graph(GraphError::CycleDetected(_, _)))
        ));
    }

    #[test]
    fn remove_dependency_by_id() {
        let mut project = Project::new("Demo");
        let a = project.add_task("A", None).unwrap();
        let b = project.add_task("B", None).unwrap();
        let dep = project
            .add_dependency(&a, &b, DependencyType::StartToStart, -1)
            .unwrap();

        let removed = project.remove_dependency(&dep).unwrap();
        assert_eq!(removed.lag, -1);
        assert!(matches!(
            project.remove_dependency(&dep),
            Err(EditError::DependencyNotFound(_))
        ));
    }
}
