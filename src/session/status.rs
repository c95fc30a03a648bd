//! Session status shared by the input capture and the orchestrator

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;

/// What the assistant is doing right now
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Status {
    /// Waiting for input
    #[default]
    Idle,
    /// Microphone open
    Listening,
    /// Waiting on a transcript or a reply
    Processing,
    /// Something failed; the message is user-facing
    Error(String),
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Listening => f.write_str("listening…"),
            Self::Processing => f.write_str("processing…"),
            Self::Error(message) => write!(f, "error ({message})"),
        }
    }
}

/// Shared, observable status
#[derive(Debug, Clone)]
pub struct StatusIndicator {
    tx: Arc<watch::Sender<Status>>,
}

impl Default for StatusIndicator {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusIndicator {
    /// Create an indicator starting at [`Status::Idle`]
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Status::Idle);
        Self { tx: Arc::new(tx) }
    }

    /// Current status
    #[must_use]
    pub fn get(&self) -> Status {
        self.tx.borrow().clone()
    }

    /// Replace the status
    pub fn set(&self, status: Status) {
        tracing::trace!(%status, "status changed");
        self.tx.send_replace(status);
    }

    /// Watch for changes
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Status> {
        self.tx.subscribe()
    }

    /// Set `status` until the returned guard drops, then go back to idle
    #[must_use = "status resets as soon as the guard is dropped"]
    pub fn enter(&self, status: Status) -> StatusGuard {
        self.set(status);
        StatusGuard {
            indicator: self.clone(),
        }
    }
}

/// Resets the status to idle on drop, including on early return or cancellation
#[derive(Debug)]
pub struct StatusGuard {
    indicator: StatusIndicator,
}

impl Drop for StatusGuard {
    fn drop(&mut self) {
        self.indicator.set(Status::Idle);
    }
}
