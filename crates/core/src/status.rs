//! Status events — loosely-coupled progress notifications for UI layers.
//!
//! The agent loop publishes unconditionally; absence of a subscriber is a
//! no-op, not an error. Events are purely observational — no backpressure,
//! no buffering guarantee, and a UI may drop them.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// What the agent is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    /// Waiting on the model
    Thinking,
    /// Executing a tool
    Tool,
    /// The turn produced a final answer
    Done,
}

/// A single status update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusEvent {
    pub kind: StatusKind,
    pub text: String,
}

impl StatusEvent {
    pub fn thinking(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Thinking,
            text: text.into(),
        }
    }

    pub fn tool(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Tool,
            text: text.into(),
        }
    }

    pub fn done(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Done,
            text: text.into(),
        }
    }
}

/// A broadcast-based sink for status events.
pub struct StatusBus {
    sender: broadcast::Sender<StatusEvent>,
}

impl StatusBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers. No subscribers is fine.
    pub fn publish(&self, event: StatusEvent) {
        let _ = self.sender.send(event);
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<StatusEvent> {
        self.sender.subscribe()
    }
}

impl Default for StatusBus {
    fn default() -> Self {
        Self::new(64)
    }
}
