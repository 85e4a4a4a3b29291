//! Run events and the bounded event sink used by the streaming adapter.
//!
//! Producers emit events as the orchestration loop progresses; a slow or
//! absent consumer must never wedge the loop. Non-terminal events are
//! dropped when the queue is full; terminal events get a bounded wait.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// How long a terminal event may wait for queue space before being dropped.
const TERMINAL_SEND_WAIT: Duration = Duration::from_secs(5);

/// A discrete event emitted during one orchestration run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEvent {
    /// The run has started.
    Start { analysis_id: String },

    /// A tool was dispatched; `summary` is its human-readable outcome.
    ToolCall { name: String, summary: String },

    /// The final user-visible response.
    Response { content: String },

    /// The run failed; `message` is the structured failure text.
    Error { message: String },

    /// Terminating sentinel; always the last event of a stream.
    Done,
}

impl RunEvent {
    /// Terminal events are load-bearing for correctness and must not be
    /// dropped lightly.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunEvent::Response { .. } | RunEvent::Error { .. } | RunEvent::Done
        )
    }
}

/// Bounded sender half of a per-run event queue.
#[derive(Clone)]
pub struct EventSink {
    tx: mpsc::Sender<RunEvent>,
}

impl EventSink {
    /// Create a sink and its receiver with the given queue capacity.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<RunEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Emit an event.
    ///
    /// Non-terminal events are dropped when the queue is full. Terminal
    /// events wait for space, but only up to a bound, so a dead consumer
    /// cannot block the producing run forever.
    pub async fn emit(&self, event: RunEvent) {
        if event.is_terminal() {
            if let Err(e) = self.tx.send_timeout(event, TERMINAL_SEND_WAIT).await {
                warn!("Dropping terminal run event: {}", e);
            }
        } else if let Err(mpsc::error::TrySendError::Full(dropped)) = self.tx.try_send(event) {
            debug!("Event queue full, dropping {:?}", dropped);
        }
    }
}
