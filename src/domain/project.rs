//! Project document model
//!
//! A `Project` is the unit of persistence, undo/redo and autosave. It owns
//! every task, resource, status and dependency outright, so `Clone` yields a
//! fully independent snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::dependency::TaskDependency;
use super::id::{ProjectId, ResourceId, StatusId, TaskId};
use super::resource::{Resource, StatusConfig};
use super::task::Task;

/// A project document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub resources: Vec<Resource>,
    #[serde(default)]
    pub statuses: Vec<StatusConfig>,
    /// Absent in older documents, which means "no dependencies"
    #[serde(default)]
    pub dependencies: Vec<TaskDependency>,
}

impl Project {
    /// Creates an empty project seeded with the default statuses
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let now = Utc::now();
        Self {
            id: ProjectId::generate(&name, now),
            name,
            description: None,
            created_at: now,
            updated_at: now,
            tasks: Vec::new(),
            resources: Vec::new(),
            statuses: StatusConfig::defaults(),
            dependencies: Vec::new(),
        }
    }

    /// Touch the modified timestamp.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    pub fn task_mut(&mut self, id: &TaskId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| &t.id == id)
    }

    pub fn resource(&self, id: &ResourceId) -> Option<&Resource> {
        self.resources.iter().find(|r| &r.id == id)
    }

    pub fn status(&self, id: &StatusId) -> Option<&StatusConfig> {
        self.statuses.iter().find(|s| &s.id == id)
    }

    /// Statuses sorted by display order
    pub fn ordered_statuses(&self) -> Vec<&StatusConfig> {
        let mut statuses: Vec<_> = self.statuses.iter().collect();
        statuses.sort_by_key(|s| s.order);
        statuses
    }

    /// The status new tasks start in (lowest display order)
    pub fn first_status(&self) -> Option<&StatusConfig> {
        self.statuses.iter().min_by_key(|s| s.order)
    }

    /// Children of `parent` (or root tasks for `None`), sorted by `order`
    pub fn children(&self, parent: Option<&TaskId>) -> Vec<&Task> {
        let mut children: Vec<_> = self
            .tasks
            .iter()
            .filter(|t| t.parent_id.as_ref() == parent)
            .collect();
        children.sort_by_key(|t| t.order);
        children
    }

    /// Top-level tasks, sorted by `order`
    pub fn roots(&self) -> Vec<&Task> {
        self.children(None)
    }

    /// All tasks below `id`, depth-first in sibling order
    pub fn descendants(&self, id: &TaskId) -> Vec<TaskId> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        let mut stack: Vec<TaskId> = self
            .children(Some(id))
            .into_iter()
            .rev()
            .map(|t| t.id.clone())
            .collect();

        while let Some(next) = stack.pop() {
            // Guards against parent cycles in hand-edited documents
            if !seen.insert(next.clone()) {
                continue;
            }
            stack.extend(
                self.children(Some(&next))
                    .into_iter()
                    .rev()
                    .map(|t| t.id.clone()),
            );
            out.push(next);
        }

        out
    }

    /// Returns true if `ancestor` appears on the parent chain of `id`
    pub fn is_ancestor(&self, ancestor: &TaskId, id: &TaskId) -> bool {
        let mut seen = HashSet::new();
        let mut current = self.task(id).and_then(|t| t.parent_id.clone());

        while let Some(parent) = current {
            if &parent == ancestor {
                return true;
            }
            if !seen.insert(parent.clone()) {
                return false;
            }
            current = self.task(&parent).and_then(|t| t.parent_id.clone());
        }

        false
    }

    /// Tasks in WBS order: each parent followed by its subtree
    pub fn wbs_order(&self) -> Vec<(usize, &Task)> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        let mut stack: Vec<(usize, &Task)> =
            self.roots().into_iter().rev().map(|t| (0, t)).collect();

        while let Some((depth, task)) = stack.pop() {
            if !seen.insert(&task.id) {
                continue;
            }
            stack.extend(
                self.children(Some(&task.id))
                    .into_iter()
                    .rev()
                    .map(|c| (depth + 1, c)),
            );
            out.push((depth, task));
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> TaskId {
        s.parse().unwrap()
    }

    fn tree() -> Project {
        // a
        // ├── b
        // │   └── d
        // └── c
        // e
        let mut project = Project::new("Tree");
        let status = project.statuses[0].id.clone();
        let specs = [
            ("a", None, 0),
            ("c", Some("a"), 1),
            ("b", Some("a"), 0),
            ("d", Some("b"), 0),
            ("e", None, 1),
        ];
        for (name, parent, order) in specs {
            let mut task = Task::new(id(name), name, status.clone());
            task.parent_id = parent.map(id);
            task.order = order;
            project.tasks.push(task);
        }
        project
    }

    #[test]
    fn new_project_has_default_statuses() {
        let project = Project::new("Demo");
        assert_eq!(project.statuses.len(), 3);
        assert!(project.id.as_str().starts_with("p-"));
        assert_eq!(project.first_status().unwrap().id.as_str(), "todo");
    }

    #[test]
    fn children_sorted_by_order() {
        let project = tree();
        let names: Vec<_> = project
            .children(Some(&id("a")))
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(names, vec!["b", "c"]);

        let roots: Vec<_> = project.roots().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(roots, vec!["a", "e"]);
    }

    #[test]
    fn descendants_depth_first() {
        let project = tree();
        assert_eq!(project.descendants(&id("a")), vec![id("b"), id("d"), id("c")]);
        assert!(project.descendants(&id("e")).is_empty());
    }

    #[test]
    fn ancestry() {
        let project = tree();
        assert!(project.is_ancestor(&id("a"), &id("d")));
        assert!(!project.is_ancestor(&id("d"), &id("a")));
        assert!(!project.is_ancestor(&id("e"), &id("d")));
    }

    #[test]
    fn wbs_order_with_depth() {
        let project = tree();
        let rows: Vec<_> = project
            .wbs_order()
            .iter()
            .map(|(depth, t)| (*depth, t.name.clone()))
            .collect();
        assert_eq!(
            rows,
            vec![
                (0, "a".to_string()),
                (1, "b".to_string()),
                (2, "d".to_string()),
                (1, "c".to_string()),
                (0, "e".to_string()),
            ]
        );
    }

    #[test]
    fn missing_dependencies_field_means_none() {
        let json = r#"{
            "id": "p1", "name": "Old",
            "createdAt": "2024-01-01T00:00:00Z", "updatedAt": "2024-01-01T00:00:00Z",
            "tasks": [], "resources": [],
            "statuses": [{"id": "todo", "name": "To Do", "color": "fff", "order": 0}]
        }"#;
        let project: Project = serde_json::from_str(json).unwrap();
        assert!(project.dependencies.is_empty());
        assert!(project.description.is_none());
    }

    #[test]
    fn clone_is_independent() {
        let original = tree();
        let mut copy = original.clone();
        copy.tasks[0].name = "renamed".into();
        assert_eq!(original.tasks[0].name, "a");
    }
}
