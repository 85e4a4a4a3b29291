//! Streaming delivery - discrete run events as they occur.
//!
//! Each call gets its own bounded event queue. The worker pushes events
//! while the run progresses; the caller drains them in arrival order until
//! the `done` sentinel. Draining uses a short poll timeout so worker
//! completion is detected even when the queue is briefly empty.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::agent::{EventSink, RunEvent};
use crate::assistant::Assistant;
use crate::store::DisplayEntry;

const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Per-call event-stream delivery.
pub struct StreamingDelivery {
    assistant: Arc<Assistant>,
}

impl StreamingDelivery {
    pub fn new(assistant: Arc<Assistant>) -> Self {
        Self { assistant }
    }

    /// Start a run and return the event stream for it.
    ///
    /// The stream yields `start`, then `tool_call` events as tools
    /// execute, then `response` (or `error`), and always terminates with
    /// `done`.
    pub fn open(&self, message: impl Into<String>, context: Option<Value>) -> EventStream {
        let message = message.into();
        let (sink, rx) = EventSink::channel(self.assistant.stream_capacity());
        let assistant = self.assistant.clone();

        let worker = tokio::spawn(async move {
            let analysis_id = Uuid::new_v4().to_string();
            sink.emit(RunEvent::Start {
                analysis_id: analysis_id.clone(),
            })
            .await;

            // The run executes on its own supervised task: even a panic in
            // the loop still yields an `error` event and the `done`
            // sentinel.
            let run = {
                let assistant = assistant.clone();
                let sink = sink.clone();
                let message = message.clone();
                tokio::spawn(async move {
                    assistant
                        .orchestrator()
                        .run(&message, context.as_ref(), Some(&sink))
                        .await
                })
            };

            match run.await {
                Ok(Ok(response)) => {
                    assistant
                        .display()
                        .push(DisplayEntry::user(&message, Some(analysis_id.clone())));
                    assistant
                        .display()
                        .push(DisplayEntry::assistant(&response, Some(analysis_id)));
                }
                Ok(Err(e)) => {
                    sink.emit(RunEvent::Error {
                        message: e.to_string(),
                    })
                    .await;
                }
                Err(e) => {
                    sink.emit(RunEvent::Error {
                        message: format!("worker crashed: {}", e),
                    })
                    .await;
                }
            }

            sink.emit(RunEvent::Done).await;
        });

        EventStream { rx, worker }
    }
}

/// The receiving half of one streamed run.
pub struct EventStream {
    rx: mpsc::Receiver<RunEvent>,
    worker: JoinHandle<()>,
}

impl EventStream {
    /// Next event in arrival order, or `None` when the stream is over.
    ///
    /// Polls with a short timeout so a finished worker is detected even
    /// if the queue is briefly empty.
    pub async fn next_event(&mut self) -> Option<RunEvent> {
        loop {
            match tokio::time::timeout(POLL_INTERVAL, self.rx.recv()).await {
                Ok(event) => return event,
                Err(_) => {
                    if self.worker.is_finished() {
                        return self.rx.try_recv().ok();
                    }
                }
            }
        }
    }

    /// Whether the producing worker has completed.
    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }

    /// Drain the whole stream into a vector (stops after `done`).
    pub async fn collect(mut self) -> Vec<RunEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.next_event().await {
            let done = event == RunEvent::Done;
            events.push(event);
            if done {
                break;
            }
        }
        events
    }
}
