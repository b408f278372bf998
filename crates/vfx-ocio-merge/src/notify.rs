//! Conflict notification.
//!
//! Section mergers report every conflict through a [`ConflictSink`]. With
//! `error_on_conflict` off the message is a warning and the merge goes on;
//! with it on the first conflict aborts the merge.

use std::cell::RefCell;

use crate::error::{MergeError, MergeResult};

/// Receiver of merge conflicts.
pub trait ConflictSink {
    /// Records a non-fatal conflict.
    fn warn(&self, message: &str);

    /// Builds the error that aborts the merge.
    fn fatal(&self, message: &str) -> MergeError {
        MergeError::Conflict(message.to_string())
    }
}

/// Routes a conflict to the sink, failing when `fatal` is set.
pub fn notify(sink: &dyn ConflictSink, message: &str, fatal: bool) -> MergeResult<()> {
    if fatal {
        Err(sink.fatal(message))
    } else {
        sink.warn(message);
        Ok(())
    }
}

/// Logs conflicts as `tracing` warnings.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ConflictSink for TracingSink {
    fn warn(&self, message: &str) {
        tracing::warn!("{}", message);
    }
}

/// Keeps every message, fatal ones included.
#[derive(Debug, Default)]
pub struct CollectingSink {
    warnings: RefCell<Vec<String>>,
    fatal: RefCell<Option<String>>,
}

impl CollectingSink {
    /// Empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Warnings received so far, in order.
    pub fn warnings(&self) -> Vec<String> {
        self.warnings.borrow().clone()
    }

    /// Number of warnings received.
    pub fn len(&self) -> usize {
        self.warnings.borrow().len()
    }

    /// True if no warning was received.
    pub fn is_empty(&self) -> bool {
        self.warnings.borrow().is_empty()
    }

    /// The message that aborted the merge, if any.
    pub fn fatal_message(&self) -> Option<String> {
        self.fatal.borrow().clone()
    }

    /// True if some warning contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.warnings.borrow().iter().any(|w| w.contains(needle))
    }
}

impl ConflictSink for CollectingSink {
    fn warn(&self, message: &str) {
        tracing::warn!("{}", message);
        self.warnings.borrow_mut().push(message.to_string());
    }

    fn fatal(&self, message: &str) -> MergeError {
        *self.fatal.borrow_mut() = Some(message.to_string());
        MergeError::Conflict(message.to_string())
    }
}
