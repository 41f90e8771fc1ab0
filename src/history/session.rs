//! Editing session
//!
//! Owns the live document together with its history and recorder, so each
//! open document carries its own undo state instead of sharing a global one.

use std::time::Duration;

use super::recorder::{ChangeRecorder, Observation};
use super::store::HistoryStore;
use crate::domain::Project;
use crate::storage::HistoryConfig;

/// A single document being edited
#[derive(Debug)]
pub struct EditSession {
    project: Project,
    history: HistoryStore,
    recorder: ChangeRecorder,
}

impl EditSession {
    /// Starts a session with default history settings
    pub fn new(project: Project, now: Duration) -> Self {
        Self::with_config(project, &HistoryConfig::default(), now)
    }

    /// Starts a session with explicit history settings
    pub fn with_config(project: Project, config: &HistoryConfig, now: Duration) -> Self {
        let mut session = Self {
            project,
            history: HistoryStore::with_capacity(config.capacity),
            recorder: ChangeRecorder::new(config.debounce()),
        };
        session
            .recorder
            .observe(&session.project, now, &mut session.history);
        session
    }

    /// Replaces the document (new/open). History never carries over.
    pub fn open(&mut self, project: Project, now: Duration) {
        self.recorder.reset();
        self.history.clear();
        self.project = project;
        self.recorder.observe(&self.project, now, &mut self.history);
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Consumes the session, returning the live document
    pub fn into_project(self) -> Project {
        self.project
    }

    /// Applies a mutation and records it (debounced)
    pub fn edit<T>(&mut self, now: Duration, f: impl FnOnce(&mut Project) -> T) -> T {
        let result = f(&mut self.project);
        self.recorder.observe(&self.project, now, &mut self.history);
        result
    }

    /// Re-checks the live document, e.g. after an external collaborator changed it
    pub fn observe(&mut self, now: Duration) -> Observation {
        self.recorder.observe(&self.project, now, &mut self.history)
    }

    /// Advances the logical clock; returns true if a burst was committed
    pub fn tick(&mut self, now: Duration) -> bool {
        self.recorder.poll(now, &mut self.history)
    }

    /// Restores the previous state; returns false if there was nothing to undo
    pub fn undo(&mut self, now: Duration) -> bool {
        // An uncommitted burst is still an undoable step
        self.recorder.flush(&mut self.history);

        match self.history.undo(&self.project) {
            Some(previous) => {
                self.apply_replay(previous, now);
                true
            }
            None => false,
        }
    }

    /// Re-applies an undone state; returns false if there was nothing to redo
    pub fn redo(&mut self, now: Duration) -> bool {
        // A fresh edit after undo already discarded the redo branch
        if self.recorder.has_pending() {
            return false;
        }

        match self.history.redo(&self.project) {
            Some(next) => {
                self.apply_replay(next, now);
                true
            }
            None => false,
        }
    }

    fn apply_replay(&mut self, project: Project, now: Duration) {
        self.project = project;
        self.recorder.mark_replay();
        self.recorder.observe(&self.project, now, &mut self.history);
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo() || self.recorder.has_pending()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo() && !self.recorder.has_pending()
    }
}
