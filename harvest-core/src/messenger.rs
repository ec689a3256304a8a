//! Messaging collaborator abstraction.
//!
//! [`Messenger`] is transport-agnostic; the browser-driven implementation lives in
//! webdriver-messenger. Steps report [`StepOutcome`] instead of failing hard so that a
//! missing element or a timed-out wait never tears down the caller.

use async_trait::async_trait;
use std::fmt;

use crate::error::Result;

/// Opaque handle to an open automation session (e.g. a WebDriver session id).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionHandle {
    pub id: String,
}

impl SessionHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// Result of a single automation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Done,
    /// Step did not complete; carries a human-readable reason.
    Failed(String),
}

impl StepOutcome {
    pub fn failed(reason: impl Into<String>) -> Self {
        StepOutcome::Failed(reason.into())
    }
}

/// Source and destination channel access. One session is used by one caller at a time.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Opens a new automation session. Errors here are collaborator-level failures.
    async fn open_session(&self) -> Result<SessionHandle>;

    /// Opens the named channel within a bounded wait.
    async fn navigate_to_channel(&self, session: &SessionHandle, channel: &str) -> StepOutcome;

    /// Returns the currently rendered messages in source order. Empty on failure.
    async fn fetch_visible_messages(&self, session: &SessionHandle) -> Vec<String>;

    /// Types and sends `text` into the open channel.
    async fn send_message(&self, session: &SessionHandle, text: &str) -> StepOutcome;

    /// Releases the session. Must not fail; problems are logged by the implementation.
    async fn close_session(&self, session: SessionHandle);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_outcome_failed() {
        assert_eq!(
            StepOutcome::failed("channel not found"),
            StepOutcome::Failed("channel not found".to_string())
        );
        assert_ne!(StepOutcome::failed("x"), StepOutcome::Done);
    }

    #[test]
    fn test_session_handle_display() {
        let handle = SessionHandle::new("abc123");
        assert_eq!(handle.to_string(), "abc123");
    }
}
