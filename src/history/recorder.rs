//! Debounced history recording
//!
//! Decides when a document change becomes an undo step. A burst of edits
//! separated by less than the debounce delay collapses into one step whose
//! undo target is the state before the burst started.
//!
//! Time is a logical clock supplied by the caller (`Duration` since the
//! session started); there are no threads or real timers. At most one
//! timer is pending at a time.

use std::time::Duration;

use super::store::HistoryStore;
use crate::domain::Project;

/// Default quiet period before a burst is committed
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// What [`ChangeRecorder::observe`] did with a document state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// Structurally equal to the last seen state
    Unchanged,
    /// First state after (re)loading, adopted silently
    Baseline,
    /// Produced by undo/redo, adopted silently
    Replayed,
    /// A user edit; the timer now fires at this logical time
    Scheduled { deadline: Duration },
}

#[derive(Debug, Clone)]
struct PendingBurst {
    /// State before the first edit of the burst
    previous: Project,
    deadline: Duration,
}

/// Watches document states and pushes coalesced snapshots into history
#[derive(Debug, Clone)]
pub struct ChangeRecorder {
    delay: Duration,
    last_seen: Option<Project>,
    pending: Option<PendingBurst>,
    replaying: bool,
}

impl Default for ChangeRecorder {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

impl ChangeRecorder {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_seen: None,
            pending: None,
            replaying: false,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Forgets the baseline and cancels any pending timer.
    ///
    /// The next observed state is adopted without creating an undo step.
    pub fn reset(&mut self) {
        self.pending = None;
        self.last_seen = None;
        self.replaying = false;
    }

    /// Flags the next observed change as coming from undo/redo
    pub fn mark_replay(&mut self) {
        self.replaying = true;
    }

    /// Returns true while a burst is waiting for its timer
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Logical time at which the pending burst will be committed
    pub fn deadline(&self) -> Option<Duration> {
        self.pending.as_ref().map(|p| p.deadline)
    }

    /// Looks at the current document state at logical time `now`
    pub fn observe(
        &mut self,
        project: &Project,
        now: Duration,
        history: &mut HistoryStore,
    ) -> Observation {
        // A timer that ran out before this change still counts as quiescence
        self.poll(now, history);

        let Some(last_seen) = self.last_seen.as_ref() else {
            self.last_seen = Some(project.clone());
            self.replaying = false;
            return Observation::Baseline;
        };

        if last_seen == project {
            self.replaying = false;
            return Observation::Unchanged;
        }

        if self.replaying {
            self.replaying = false;
            self.pending = None;
            self.last_seen = Some(project.clone());
            return Observation::Replayed;
        }

        let seen = self.last_seen.replace(project.clone());
        let previous = match (self.pending.take(), seen) {
            (Some(burst), _) => burst.previous,
            (None, Some(seen)) => seen,
            (None, None) => project.clone(),
        };

        let deadline = now + self.delay;
        self.pending = Some(PendingBurst { previous, deadline });
        Observation::Scheduled { deadline }
    }

    /// Commits the pending burst if its timer has elapsed at `now`
    pub fn poll(&mut self, now: Duration, history: &mut HistoryStore) -> bool {
        match &self.pending {
            Some(burst) if burst.deadline <= now => self.flush(history),
            _ => false,
        }
    }

    /// Commits the pending burst immediately, regardless of its timer
    pub fn flush(&mut self, history: &mut HistoryStore) -> bool {
        match self.pending.take() {
            Some(burst) => {
                history.push_state(&burst.previous);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn rename(project: &Project, name: &str) -> Project {
        let mut next = project.clone();
        next.name = name.to_string();
        next
    }

    #[test]
    fn first_observation_is_baseline() {
        let mut recorder = ChangeRecorder::default();
        let mut history = HistoryStore::new();
        let project = Project::new("v0");

        assert_eq!(recorder.observe(&project, ms(0), &mut history), Observation::Baseline);
        assert_eq!(recorder.observe(&project, ms(10), &mut history), Observation::Unchanged);
        assert!(!history.can_undo());
    }

    #[test]
    fn burst_collapses_into_one_entry() {
        let mut recorder = ChangeRecorder::default();
        let mut history = HistoryStore::new();
        let v0 = Project::new("v0");
        recorder.observe(&v0, ms(0), &mut history);

        let v1 = rename(&v0, "v1");
        let v2 = rename(&v0, "v2");
        let v3 = rename(&v0, "v3");
        recorder.observe(&v1, ms(1000), &mut history);
        recorder.observe(&v2, ms(1050), &mut history);
        assert_eq!(
            recorder.observe(&v3, ms(1100), &mut history),
            Observation::Scheduled { deadline: ms(1400) }
        );

        assert!(!recorder.poll(ms(1399), &mut history));
        assert!(!history.can_undo());

        assert!(recorder.poll(ms(1450), &mut history));
        assert_eq!(history.past_len(), 1);
        assert_eq!(history.past().next().unwrap().name, "v0");
        assert!(!recorder.has_pending());
    }

    #[test]
    fn separate_bursts_make_separate_entries() {
        let mut recorder = ChangeRecorder::default();
        let mut history = HistoryStore::new();
        let v0 = Project::new("v0");
        recorder.observe(&v0, ms(0), &mut history);

        let v1 = rename(&v0, "v1");
        recorder.observe(&v1, ms(100), &mut history);
        // Arrives after v1's timer ran out without a poll in between
        let v2 = rename(&v0, "v2");
        recorder.observe(&v2, ms(1000), &mut history);
        recorder.poll(ms(2000), &mut history);

        let names: Vec<_> = history.past().map(|p| p.name.clone()).collect();
        assert_eq!(names, vec!["v0", "v1"]);
    }

    #[test]
    fn replayed_change_does_not_arm_timer() {
        let mut recorder = ChangeRecorder::default();
        let mut history = HistoryStore::new();
        let v0 = Project::new("v0");
        recorder.observe(&v0, ms(0), &mut history);

        recorder.mark_replay();
        let restored = rename(&v0, "restored");
        assert_eq!(recorder.observe(&restored, ms(10), &mut history), Observation::Replayed);
        assert!(!recorder.has_pending());

        // The flag is consumed: the next change is a normal edit
        let edited = rename(&v0, "edited");
        assert!(matches!(
            recorder.observe(&edited, ms(20), &mut history),
            Observation::Scheduled { .. }
        ));
    }

    #[test]
    fn reset_cancels_pending_and_rebaselines() {
        let mut recorder = ChangeRecorder::default();
        let mut history = HistoryStore::new();
        let v0 = Project::new("v0");
        recorder.observe(&v0, ms(0), &mut history);
        recorder.observe(&rename(&v0, "v1"), ms(10), &mut history);
        assert!(recorder.has_pending());

        recorder.reset();
        assert!(!recorder.has_pending());
        assert_eq!(
            recorder.observe(&Project::new("other"), ms(20), &mut history),
            Observation::Baseline
        );
        recorder.poll(ms(10_000), &mut history);
        assert!(!history.can_undo());
    }

    #[test]
    fn flush_commits_early() {
        let mut recorder = ChangeRecorder::new(ms(5000));
        let mut history = HistoryStore::new();
        let v0 = Project::new("v0");
        recorder.observe(&v0, ms(0), &mut history);
        recorder.observe(&rename(&v0, "v1"), ms(1), &mut history);

        assert!(recorder.flush(&mut history));
        assert!(!recorder.flush(&mut history));
        assert_eq!(history.past().next().unwrap().name, "v0");
    }
}
