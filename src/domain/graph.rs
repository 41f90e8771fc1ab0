//! Dependency graph for tasks
//!
//! Validates edits to the dependency set: rejects self-dependencies,
//! dangling endpoints and cycles. Uses petgraph for graph operations.
//!
//! Documents loaded from disk may already contain cycles; [`find_cycles`]
//! reports them without relying on call-stack depth.

use petgraph::algo::{has_path_connecting, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;
use thiserror::Error;

use super::dependency::TaskDependency;
use super::id::TaskId;
use super::task::Task;

#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    #[error("Adding dependency would create a cycle: {0} -> {1}")]
    CycleDetected(TaskId, TaskId),

    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("Self-dependency not allowed: {0}")]
    SelfDependency(TaskId),
}

/// A predecessor -> successor graph over a task set
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// The underlying directed graph
    graph: DiGraph<TaskId, ()>,

    /// Map from TaskId to node index
    node_map: HashMap<TaskId, NodeIndex>,
}

impl DependencyGraph {
    /// Creates an empty dependency graph
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            node_map: HashMap::new(),
        }
    }

    /// Builds a graph from tasks and their dependency links.
    ///
    /// Links naming unknown tasks and self-links are left out, and existing
    /// cycles are kept as they are, so a damaged document still yields a
    /// graph that new links can be checked against.
    pub fn build<'a>(
        tasks: impl IntoIterator<Item = &'a Task>,
        dependencies: impl IntoIterator<Item = &'a TaskDependency>,
    ) -> Self {
        let mut graph = Self::new();

        for task in tasks {
            graph.add_task(task.id.clone());
        }

        for dep in dependencies {
            let (Some(&pred), Some(&succ)) = (
                graph.node_map.get(&dep.predecessor_id),
                graph.node_map.get(&dep.successor_id),
            ) else {
                continue;
            };
            if pred != succ && graph.graph.find_edge(pred, succ).is_none() {
                graph.graph.add_edge(pred, succ, ());
            }
        }

        graph
    }

    /// Adds a task to the graph
    pub fn add_task(&mut self, task_id: TaskId) {
        if !self.node_map.contains_key(&task_id) {
            let idx = self.graph.add_node(task_id.clone());
            self.node_map.insert(task_id, idx);
        }
    }

    fn index(&self, task: &TaskId) -> Result<NodeIndex, GraphError> {
        self.node_map
            .get(task)
            .copied()
            .ok_or_else(|| GraphError::TaskNotFound(task.clone()))
    }

    /// Checks whether `predecessor -> successor` could be added
    pub fn check_dependency(
        &self,
        predecessor: &TaskId,
        successor: &TaskId,
    ) -> Result<(), GraphError> {
        if predecessor == successor {
            return Err(GraphError::SelfDependency(predecessor.clone()));
        }

        let pred_idx = self.index(predecessor)?;
        let succ_idx = self.index(successor)?;

        // The new edge closes a cycle iff the successor already reaches the predecessor
        if has_path_connecting(&self.graph, succ_idx, pred_idx, None) {
            return Err(GraphError::CycleDetected(
                predecessor.clone(),
                successor.clone(),
            ));
        }

        Ok(())
    }

    /// Adds an edge: `predecessor` must be scheduled before `successor`
    pub fn add_dependency(
        &mut self,
        predecessor: &TaskId,
        successor: &TaskId,
    ) -> Result<(), GraphError> {
        self.check_dependency(predecessor, successor)?;

        let pred_idx = self.index(predecessor)?;
        let succ_idx = self.index(successor)?;
        if self.graph.find_edge(pred_idx, succ_idx).is_none() {
            self.graph.add_edge(pred_idx, succ_idx, ());
        }

        Ok(())
    }

    /// Returns the direct predecessors of a task
    pub fn predecessors(&self, task_id: &TaskId) -> Vec<TaskId> {
        self.neighbors(task_id, petgraph::Direction::Incoming)
    }

    /// Returns the direct successors of a task
    pub fn successors(&self, task_id: &TaskId) -> Vec<TaskId> {
        self.neighbors(task_id, petgraph::Direction::Outgoing)
    }

    fn neighbors(&self, task_id: &TaskId, direction: petgraph::Direction) -> Vec<TaskId> {
        let task_idx = match self.node_map.get(task_id) {
            Some(idx) => *idx,
            None => return vec![],
        };

        self.graph
            .neighbors_directed(task_idx, direction)
            .filter_map(|idx| self.graph.node_weight(idx).cloned())
            .collect()
    }

    /// Returns all tasks in topological order (predecessors before successors)
    pub fn topological_order(&self) -> Vec<TaskId> {
        // Edges are only ever inserted after a reachability check, so toposort succeeds
        toposort(&self.graph, None)
            .map(|order| {
                order
                    .into_iter()
                    .filter_map(|idx| self.graph.node_weight(idx).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns true if the graph contains the task
    pub fn contains(&self, task_id: &TaskId) -> bool {
        self.node_map.contains_key(task_id)
    }

    /// Returns the number of tasks in the graph
    pub fn len(&self) -> usize {
        self.node_map.len()
    }

    /// Returns true if the graph is empty
    pub fn is_empty(&self) -> bool {
        self.node_map.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    /// Not visited yet
    White,
    /// On the current search path
    Gray,
    /// Fully explored
    Black,
}

/// Finds dependency cycles with an iterative three-color depth-first search.
///
/// Each cycle lists its tasks along predecessor -> successor edges, starting
/// at the task where the search re-entered the current path. Links naming
/// unknown tasks and self-links are ignored here; callers report those
/// separately. Runs in O(tasks + dependencies).
pub fn find_cycles<'a>(
    tasks: &[Task],
    dependencies: impl IntoIterator<Item = &'a TaskDependency>,
) -> Vec<Vec<TaskId>> {
    let mut index: HashMap<&TaskId, usize> = HashMap::with_capacity(tasks.len());
    for (i, task) in tasks.iter().enumerate() {
        index.entry(&task.id).or_insert(i);
    }

    let mut adjacency = vec![Vec::new(); tasks.len()];
    for dep in dependencies {
        if let (Some(&p), Some(&s)) = (index.get(&dep.predecessor_id), index.get(&dep.successor_id)) {
            if p != s {
                adjacency[p].push(s);
            }
        }
    }

    let mut marks = vec![Mark::White; tasks.len()];
    let mut cycles = Vec::new();

    for root in 0..tasks.len() {
        if marks[root] != Mark::White {
            continue;
        }

        // (node, index of the next outgoing edge to follow)
        let mut stack = vec![(root, 0usize)];
        marks[root] = Mark::Gray;

        while let Some(frame) = stack.last_mut() {
            let node = frame.0;
            match adjacency[node].get(frame.1).copied() {
                Some(child) => {
                    frame.1 += 1;
                    match marks[child] {
                        Mark::White => {
                            marks[child] = Mark::Gray;
                            stack.push((child, 0));
                        }
                        Mark::Gray => {
                            let from = stack.iter().position(|(n, _)| *n == child).unwrap_or(0);
                            cycles.push(
                                stack[from..]
                                    .iter()
                                    .map(|(n, _)| tasks[*n].id.clone())
                                    .collect(),
                            );
                        }
                        Mark::Black => {}
                    }
                }
                None => {
                    marks[node] = Mark::Black;
                    stack.pop();
                }
            }
        }
    }

    cycles
}
