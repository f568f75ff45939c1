//! Hooks for reporting progress to whatever front end drives the conversion
//!
//! The orchestrator calls these methods as a run advances. A CLI, TUI or GUI
//! implements [`FeedbackSink`] to show the messages to the user.

use std::sync::Mutex;

/// How prominently a feedback message should be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Clears or replaces earlier feedback
    Neutral,
    /// A stage started or finished normally
    Progress,
    /// The user has to change their selection
    Warning,
    /// Something failed; the run has stopped
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub message: String,
    pub severity: Severity,
}

impl Feedback {
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
        }
    }

    pub fn progress(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Progress)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Warning)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Error)
    }

    pub fn clear() -> Self {
        Self::new(String::new(), Severity::Neutral)
    }
}

/// Receiver of user-visible progress and failure messages.
pub trait FeedbackSink: Send + Sync {
    fn notify(&self, feedback: Feedback);
}

/// No-op implementation for callers that do not display progress
pub struct NoOpFeedback;

impl FeedbackSink for NoOpFeedback {
    fn notify(&self, _feedback: Feedback) {}
}

/// Keeps every message in order; handy for front ends that render a log.
#[derive(Default)]
pub struct RecordingFeedback {
    messages: Mutex<Vec<Feedback>>,
}

impl RecordingFeedback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<Feedback> {
        self.messages
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    pub fn last(&self) -> Option<Feedback> {
        self.messages
            .lock()
            .ok()
            .and_then(|guard| guard.last().cloned())
    }
}

impl FeedbackSink for RecordingFeedback {
    fn notify(&self, feedback: Feedback) {
        if let Ok(mut guard) = self.messages.lock() {
            guard.push(feedback);
        }
    }
}
