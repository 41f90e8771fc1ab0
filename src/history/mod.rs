//! # Undo/Redo History
//!
//! Whole-document snapshot history rather than inverse commands: every
//! undo step is a complete, independently owned [`Project`](crate::domain::Project).
//!
//! ## Components
//!
//! | Type | Role |
//! |------|------|
//! | [`HistoryStore`] | Bounded `past` / unbounded `future` snapshot stacks |
//! | [`ChangeRecorder`] | Debounces edits into single undo steps |
//! | [`EditSession`] | One open document with its own store and recorder |
//!
//! ## Recording policy
//!
//! - the first state after opening a document is the baseline, not an undo step
//! - edits closer together than the debounce delay form one step whose undo
//!   target is the state before the first edit
//! - states installed by undo/redo are adopted without re-recording

mod store;
mod recorder;
mod session;

pub use store::{HistoryStore, DEFAULT_CAPACITY};
pub use recorder::{ChangeRecorder, Observation, DEFAULT_DEBOUNCE};
pub use session::EditSession;
