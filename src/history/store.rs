//! Bounded undo/redo stacks over whole-project snapshots

use std::collections::VecDeque;

use crate::domain::Project;

/// Number of undo steps kept by default
pub const DEFAULT_CAPACITY: usize = 50;

/// Undo/redo history.
///
/// `past` holds older snapshots (most recent last), `future` holds undone
/// snapshots (most recently undone last). Every snapshot is an owned clone,
/// so nothing stored here aliases the live document or anything handed back
/// to the caller.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    past: VecDeque<Project>,
    future: Vec<Project>,
    capacity: usize,
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryStore {
    /// Creates an empty history with the default capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates an empty history keeping at most `capacity` undo steps
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            past: VecDeque::with_capacity(capacity + 1),
            future: Vec::new(),
            capacity,
        }
    }

    /// Records a snapshot and discards the redo branch.
    ///
    /// When `past` overflows, the oldest entries are evicted.
    pub fn push_state(&mut self, project: &Project) {
        self.past.push_back(project.clone());
        self.future.clear();
        while self.past.len() > self.capacity {
            self.past.pop_front();
        }
    }

    /// Steps back: returns the previous snapshot and stashes `current` for redo.
    ///
    /// Returns `None` (and changes nothing) when there is nothing to undo.
    pub fn undo(&mut self, current: &Project) -> Option<Project> {
        let previous = self.past.pop_back()?;
        self.future.push(current.clone());
        Some(previous)
    }

    /// Steps forward: returns the next snapshot and stashes `current` for undo.
    ///
    /// Returns `None` (and changes nothing) when there is nothing to redo.
    pub fn redo(&mut self, current: &Project) -> Option<Project> {
        let next = self.future.pop()?;
        self.past.push_back(current.clone());
        while self.past.len() > self.capacity {
            self.past.pop_front();
        }
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// Drops all history, e.g. when another document is opened
    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }

    pub fn past_len(&self) -> usize {
        self.past.len()
    }

    pub fn future_len(&self) -> usize {
        self.future.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Stored undo snapshots, oldest first
    pub fn past(&self) -> impl Iterator<Item = &Project> {
        self.past.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str) -> Project {
        Project::new(name)
    }

    #[test]
    fn empty_history_is_noop() {
        let mut history = HistoryStore::new();
        let current = named("current");

        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert!(history.undo(&current).is_none());
        assert!(history.redo(&current).is_none());
        assert_eq!(history.past_len(), 0);
        assert_eq!(history.future_len(), 0);
    }

    #[test]
    fn undo_returns_last_push_and_enables_redo() {
        let mut history = HistoryStore::new();
        history.push_state(&named("v1"));
        history.push_state(&named("v2"));

        let restored = history.undo(&named("v3")).unwrap();
        assert_eq!(restored.name, "v2");
        assert!(history.can_redo());

        let again = history.redo(&restored).unwrap();
        assert_eq!(again.name, "v3");
        assert_eq!(history.past_len(), 2);
        assert!(!history.can_redo());
    }

    #[test]
    fn push_discards_redo_branch() {
        let mut history = HistoryStore::new();
        history.push_state(&named("v1"));
        history.undo(&named("v2")).unwrap();
        assert!(history.can_redo());

        history.push_state(&named("v1-edited"));
        assert!(!history.can_redo());
    }

    #[test]
    fn capacity_evicts_oldest() {
        let mut history = HistoryStore::new();
        for i in 1..=55 {
            history.push_state(&named(&format!("push {}", i)));
        }

        assert_eq!(history.past_len(), 50);
        assert_eq!(history.past().next().unwrap().name, "push 6");
        assert_eq!(history.past().last().unwrap().name, "push 55");
    }

    #[test]
    fn stored_snapshot_is_isolated_from_live_document() {
        let mut history = HistoryStore::new();
        let mut live = named("live");
        let task = live.add_task("Original", None).unwrap();

        history.push_state(&live);
        live.task_mut(&task).unwrap().name = "Renamed".into();

        let stored = history.past().next().unwrap();
        assert_eq!(stored.task(&task).unwrap().name, "Original");
    }

    #[test]
    fn returned_snapshot_is_isolated_from_future_entry() {
        let mut history = HistoryStore::new();
        let mut live = named("live");
        let task = live.add_task("Original", None).unwrap();
        history.push_state(&live);

        let mut restored = history.undo(&live).unwrap();
        restored.task_mut(&task).unwrap().name = "Changed after undo".into();

        let redone = history.redo(&restored).unwrap();
        assert_eq!(redone.task(&task).unwrap().name, "Original");
    }

    #[test]
    fn clear_empties_both_stacks() {
        let mut history = HistoryStore::with_capacity(3);
        history.push_state(&named("v1"));
        history.push_state(&named("v2"));
        history.undo(&named("v3"));

        history.clear();
        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert_eq!(history.capacity(), 3);
    }
}
