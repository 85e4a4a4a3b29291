//! Background + polling delivery.
//!
//! Dispatch spawns the run on a worker and returns a ticket immediately;
//! callers retrieve the result later by analysis id, or reconstruct the
//! conversation from the display log by cursor. Worker failures are
//! encoded in the stored response so pollers never hang on a dead run.

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::assistant::Assistant;
use crate::store::{DisplayEntry, DisplayUpdates, PendingResult};

/// What a caller gets back at dispatch time.
#[derive(Debug, Clone)]
pub struct AnalysisTicket {
    pub analysis_id: String,
    pub brief_message: String,
}

/// Background-worker delivery with poll-based retrieval.
pub struct PollingDelivery {
    assistant: Arc<Assistant>,
}

impl PollingDelivery {
    pub fn new(assistant: Arc<Assistant>) -> Self {
        Self { assistant }
    }

    /// Start a background analysis and return its ticket immediately.
    pub fn dispatch(&self, message: impl Into<String>, context: Option<Value>) -> AnalysisTicket {
        let message = message.into();
        let analysis_id = Uuid::new_v4().to_string();
        let brief_message = format!(
            "Working on it. Analysis {} is running in the background.",
            &analysis_id[..8]
        );

        self.assistant.pending().register(&analysis_id, &brief_message);
        self.assistant
            .display()
            .push(DisplayEntry::user(&message, Some(analysis_id.clone())));
        self.assistant
            .display()
            .push(DisplayEntry::assistant(&brief_message, Some(analysis_id.clone())));

        let assistant = self.assistant.clone();
        let id = analysis_id.clone();
        tokio::spawn(async move {
            info!("Background analysis {} started", id);

            // The run executes on its own supervised task: even a panic in
            // the loop still completes the registry entry, so pollers
            // never hang on a dead analysis.
            let run = {
                let assistant = assistant.clone();
                tokio::spawn(async move {
                    assistant.orchestrator().run(&message, context.as_ref(), None).await
                })
            };

            let response = match run.await {
                Ok(Ok(text)) => text,
                Ok(Err(e)) => {
                    warn!("Background analysis {} failed: {}", id, e);
                    format!("Analysis failed: {}", e)
                }
                Err(e) => {
                    warn!("Background analysis {} worker crashed: {}", id, e);
                    format!("Analysis failed: worker crashed: {}", e)
                }
            };
            assistant.pending().complete(&id, &response);
            assistant
                .display()
                .push(DisplayEntry::assistant(&response, Some(id)));
        });

        AnalysisTicket {
            analysis_id,
            brief_message,
        }
    }

    /// Retrieve a result by id; see `PendingResultRegistry::take`.
    pub fn take(&self, analysis_id: &str) -> Option<PendingResult> {
        self.assistant.pending().take(analysis_id)
    }

    /// All analyses still in flight.
    pub fn list_pending(&self) -> Vec<PendingResult> {
        self.assistant.pending().list_pending()
    }

    /// Display-log entries this client has not seen yet.
    pub fn display_updates(&self, client_id: &str, full_history: bool) -> DisplayUpdates {
        self.assistant.display().updates_for(client_id, full_history)
    }
}
