//! The assistant service object.
//!
//! Wires the orchestrator to the shared stores and the tool dispatcher.
//! Constructed once per process with injected dependencies and passed by
//! handle; the delivery adapters are thin views over it.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::agent::{LlmClient, Orchestrator, OrchestratorConfig, PromptBuilder, ProviderRegistry};
use crate::config::Config;
use crate::services::{InMemoryProjects, StaticMarketData};
use crate::store::{ConversationStore, DisplayLog, PendingResultRegistry};
use crate::tools::ToolRunner;
use crate::Result;

/// Snapshot of the assistant's runtime state.
#[derive(Debug, Clone, Serialize)]
pub struct AssistantStatus {
    pub model: String,
    pub history_messages: usize,
    pub display_entries: usize,
    pub pending_analyses: usize,
}

/// Process-wide assistant: orchestrator plus shared stores.
pub struct Assistant {
    orchestrator: Orchestrator,
    history: Arc<ConversationStore>,
    display: Arc<DisplayLog>,
    pending: Arc<PendingResultRegistry>,
    model: String,
    stream_capacity: usize,
}

impl Assistant {
    /// Build an assistant from explicit collaborators.
    pub fn new(client: Arc<dyn LlmClient>, tools: Arc<ToolRunner>, config: &Config) -> Self {
        let history = Arc::new(ConversationStore::new(config.history_limit));
        let model = client.model().to_string();

        let orchestrator_config = OrchestratorConfig {
            max_iterations: config.max_iterations,
            llm_timeout: Duration::from_secs(config.llm_timeout_secs),
        };
        let orchestrator = Orchestrator::new(client, tools, history.clone(), orchestrator_config)
            .with_prompt(PromptBuilder::new().with_history_limit(config.history_limit));

        Self {
            orchestrator,
            history,
            display: Arc::new(DisplayLog::new()),
            pending: Arc::new(PendingResultRegistry::new()),
            model,
            stream_capacity: config.stream_capacity,
        }
    }

    /// Build an assistant from configuration, backed by the demo catalog.
    pub fn with_demo_catalog(config: &Config) -> Result<Self> {
        let client: Arc<dyn LlmClient> = Arc::from(ProviderRegistry::create(config)?);
        let tools = Arc::new(ToolRunner::with_services(
            Arc::new(InMemoryProjects::with_demo_data()),
            Arc::new(StaticMarketData::with_demo_data()),
        ));
        Ok(Self::new(client, tools, config))
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    pub fn history(&self) -> &Arc<ConversationStore> {
        &self.history
    }

    pub fn display(&self) -> &Arc<DisplayLog> {
        &self.display
    }

    pub fn pending(&self) -> &Arc<PendingResultRegistry> {
        &self.pending
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn stream_capacity(&self) -> usize {
        self.stream_capacity
    }

    /// Current runtime state.
    pub fn status(&self) -> AssistantStatus {
        AssistantStatus {
            model: self.model.clone(),
            history_messages: self.history.len(),
            display_entries: self.display.len(),
            pending_analyses: self.pending.list_pending().len(),
        }
    }

    /// Clear conversation history and start fresh. The display log is
    /// append-only and stays intact.
    pub fn reset(&self) -> usize {
        self.history.clear()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::agent::llm::ScriptedClient;

    pub(crate) fn scripted_assistant(client: ScriptedClient) -> Arc<Assistant> {
        let tools = Arc::new(ToolRunner::with_services(
            Arc::new(InMemoryProjects::with_demo_data()),
            Arc::new(StaticMarketData::with_demo_data()),
        ));
        Arc::new(Assistant::new(
            Arc::new(client),
            tools,
            &Config::default(),
        ))
    }

    #[tokio::test]
    async fn test_status_reflects_state() {
        let assistant =
            scripted_assistant(ScriptedClient::from_texts(vec!["<response>hi</response>"]));

        let before = assistant.status();
        assert_eq!(before.history_messages, 0);
        assert_eq!(before.pending_analyses, 0);

        assistant.orchestrator().run("hello", None, None).await.unwrap();

        let after = assistant.status();
        assert_eq!(after.history_messages, 2);
        assert_eq!(after.model, "scripted-model");
    }

    #[tokio::test]
    async fn test_reset_clears_history() {
        let assistant =
            scripted_assistant(ScriptedClient::from_texts(vec!["<response>hi</response>"]));
        assistant.orchestrator().run("hello", None, None).await.unwrap();

        assert_eq!(assistant.reset(), 2);
        assert_eq!(assistant.history().len(), 0);
    }
}
