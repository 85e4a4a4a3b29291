//! Orchestration loop - iterative tool-calling until a terminal response.
//!
//! One `run` call drives the LLM through thinking / tool-execution cycles
//! until it produces a `<response>` block, recovering from replies that
//! neither call a tool nor answer, and falling back to an untooled
//! completion once the iteration cap is exhausted.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::store::ConversationStore;
use crate::tools::{ToolDefinition, ToolRunner};
use crate::Result;
use crate::error::Error;

use super::context::PromptBuilder;
use super::events::{EventSink, RunEvent};
use super::framing::{self, Framed};
use super::llm::{LlmClient, LlmResponse, ToolChoice};
use super::message::Message;

/// Corrective reminder injected when a reply neither calls a tool nor
/// answers. Injected at most once per run; the iteration cap remains the
/// authoritative termination guard.
const STUCK_REMINDER: &str = "Reminder: call one of the available tools or answer \
inside <response></response> tags. Thinking alone is not sufficient.";

/// Tuning knobs for one orchestrator instance.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Hard cap on thinking/tool-execution iterations per run.
    pub max_iterations: usize,
    /// Deadline for each individual LLM call.
    pub llm_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_iterations: 30,
            llm_timeout: Duration::from_secs(120),
        }
    }
}

/// The orchestration engine: LLM calls, tool dispatch, and context
/// feedback, bounded by an iteration cap.
pub struct Orchestrator {
    client: Arc<dyn LlmClient>,
    tools: Arc<ToolRunner>,
    history: Arc<ConversationStore>,
    prompt: PromptBuilder,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(
        client: Arc<dyn LlmClient>,
        tools: Arc<ToolRunner>,
        history: Arc<ConversationStore>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            client,
            tools,
            history,
            prompt: PromptBuilder::new(),
            config,
        }
    }

    pub fn with_prompt(mut self, prompt: PromptBuilder) -> Self {
        self.prompt = prompt;
        self
    }

    /// Run the loop for a single user message and return the final
    /// user-visible response.
    ///
    /// On success exactly one user and one assistant message are recorded
    /// in the conversation history; tool traffic stays in the transient
    /// transcript. On provider failure the run aborts with no history
    /// mutation.
    pub async fn run(
        &self,
        user_message: &str,
        caller_context: Option<&Value>,
        sink: Option<&EventSink>,
    ) -> Result<String> {
        let definitions = self.tools.definitions();
        let mut transcript =
            self.prompt
                .build_transcript(&self.history.snapshot(), user_message, caller_context);
        let mut reminded = false;

        info!("Starting orchestration for message: {} chars", user_message.len());

        for iteration in 0..self.config.max_iterations {
            debug!("Iteration {}/{}", iteration + 1, self.config.max_iterations);

            let reply = self.chat(&transcript, &definitions, ToolChoice::Auto).await?;

            if let Some(content) = reply.content.as_deref() {
                if let Framed::Response(text) = framing::classify(content) {
                    return self.finish(user_message, text, sink).await;
                }
            }

            if reply.has_tool_calls() {
                self.execute_tools(&mut transcript, &reply, sink).await;
                continue;
            }

            // Stuck: neither a tool call nor a terminal response.
            debug!("Reply had no tool calls and no response tag");
            if let Some(content) = reply.content {
                if !content.is_empty() {
                    transcript.push(Message::assistant(content));
                }
            }
            if !reminded {
                transcript.push(Message::system(STUCK_REMINDER));
                reminded = true;
            }
        }

        // Cap exhausted: force a final untooled completion and take what
        // we get.
        warn!(
            "Iteration cap ({}) reached, forcing untooled reply",
            self.config.max_iterations
        );
        let reply = self.chat(&transcript, &[], ToolChoice::None).await?;
        let content = reply.content.unwrap_or_default();
        let text = framing::extract_response(&content).unwrap_or_else(|| content.trim().to_string());
        self.finish(user_message, text, sink).await
    }

    async fn execute_tools(
        &self,
        transcript: &mut Vec<Message>,
        reply: &LlmResponse,
        sink: Option<&EventSink>,
    ) {
        transcript.push(Message::assistant_with_tools(
            reply.content.clone().unwrap_or_default(),
            reply.tool_calls.clone(),
        ));

        // Execute in the order the model requested; every result lands in
        // the transcript before the next thinking step.
        for call in &reply.tool_calls {
            debug!("Executing tool: {} with args: {}", call.name, call.arguments);
            let result = self.tools.execute(&call.name, call.arguments.clone()).await;
            emit(
                sink,
                RunEvent::ToolCall {
                    name: call.name.clone(),
                    summary: result.summary.clone(),
                },
            )
            .await;
            transcript.push(Message::tool_result(&call.id, result.to_content()));
        }
    }

    async fn finish(
        &self,
        user_message: &str,
        text: String,
        sink: Option<&EventSink>,
    ) -> Result<String> {
        info!("Orchestration completed with response: {} chars", text.len());
        self.history.record_exchange(user_message, &text);
        emit(sink, RunEvent::Response { content: text.clone() }).await;
        Ok(text)
    }

    async fn chat(
        &self,
        transcript: &[Message],
        tools: &[ToolDefinition],
        choice: ToolChoice,
    ) -> Result<LlmResponse> {
        match tokio::time::timeout(
            self.config.llm_timeout,
            self.client.chat(transcript, tools, choice),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(Error::Provider(format!(
                "LLM call exceeded deadline of {}s",
                self.config.llm_timeout.as_secs()
            ))),
        }
    }
}

async fn emit(sink: Option<&EventSink>, event: RunEvent) {
    if let Some(sink) = sink {
        sink.emit(event).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::llm::ScriptedClient;
    use crate::agent::message::ToolCallRequest;
    use crate::agent::llm::Usage;
    use crate::tools::DummyTool;
    use serde_json::json;

    fn runner_with_dummy(name: &str, result: &str) -> Arc<ToolRunner> {
        let mut runner = ToolRunner::new();
        runner.register(DummyTool {
            name: name.to_string(),
            result: result.to_string(),
        });
        Arc::new(runner)
    }

    fn orchestrator(
        client: ScriptedClient,
        tools: Arc<ToolRunner>,
        max_iterations: usize,
    ) -> (Orchestrator, Arc<ConversationStore>) {
        let history = Arc::new(ConversationStore::new(40));
        let config = OrchestratorConfig {
            max_iterations,
            ..OrchestratorConfig::default()
        };
        (
            Orchestrator::new(Arc::new(client), tools, history.clone(), config),
            history,
        )
    }

    #[tokio::test]
    async fn test_simple_response() {
        let client = ScriptedClient::from_texts(vec!["<response>Hello, human!</response>"]);
        let (orch, history) = orchestrator(client, Arc::new(ToolRunner::new()), 10);

        let response = orch.run("Hi there", None, None).await.unwrap();

        assert_eq!(response, "Hello, human!");
        assert_eq!(history.len(), 2);
    }

    #[tokio::test]
    async fn test_tool_then_response() {
        let client = ScriptedClient::new(vec![
            LlmResponse::tool_call("list_projects", json!({})),
            LlmResponse::text("<response>You have 3 projects: A, B, C</response>"),
        ]);
        let tools = runner_with_dummy("list_projects", "Found 3 projects");
        let (orch, history) = orchestrator(client, tools, 10);

        let (sink, mut rx) = EventSink::channel(16);
        let response = orch.run("list my projects", None, Some(&sink)).await.unwrap();

        assert_eq!(response, "You have 3 projects: A, B, C");
        // Exactly one user + one assistant message, no tool traffic.
        assert_eq!(history.len(), 2);

        let first = rx.try_recv().unwrap();
        assert!(matches!(first, RunEvent::ToolCall { ref name, .. } if name == "list_projects"));
        let second = rx.try_recv().unwrap();
        assert!(matches!(second, RunEvent::Response { .. }));
    }

    #[tokio::test]
    async fn test_exactly_two_llm_calls_for_one_tool() {
        let client = ScriptedClient::new(vec![
            LlmResponse::tool_call("list_projects", json!({})),
            LlmResponse::text("<response>done</response>"),
        ]);
        let tools = runner_with_dummy("list_projects", "ok");
        let history = Arc::new(ConversationStore::new(40));
        let client = Arc::new(client);
        let orch = Orchestrator::new(
            client.clone(),
            tools,
            history,
            OrchestratorConfig::default(),
        );

        orch.run("list my projects", None, None).await.unwrap();
        assert_eq!(client.calls(), 2);
    }

    #[tokio::test]
    async fn test_tool_calls_execute_in_request_order() {
        let reply = LlmResponse {
            content: None,
            tool_calls: vec![
                ToolCallRequest {
                    id: "tc_1".to_string(),
                    name: "first".to_string(),
                    arguments: json!({}),
                },
                ToolCallRequest {
                    id: "tc_2".to_string(),
                    name: "second".to_string(),
                    arguments: json!({}),
                },
            ],
            finish_reason: "tool_calls".to_string(),
            usage: Usage::default(),
        };
        let client = ScriptedClient::new(vec![reply, LlmResponse::text("<response>ok</response>")]);

        let mut runner = ToolRunner::new();
        runner.register(DummyTool {
            name: "first".to_string(),
            result: "one".to_string(),
        });
        runner.register(DummyTool {
            name: "second".to_string(),
            result: "two".to_string(),
        });
        let (orch, _) = orchestrator(client, Arc::new(runner), 10);

        let (sink, mut rx) = EventSink::channel(16);
        orch.run("do both", None, Some(&sink)).await.unwrap();

        assert!(matches!(rx.try_recv().unwrap(), RunEvent::ToolCall { ref name, .. } if name == "first"));
        assert!(matches!(rx.try_recv().unwrap(), RunEvent::ToolCall { ref name, .. } if name == "second"));
    }

    #[tokio::test]
    async fn test_stuck_reply_recovers_after_reminder() {
        let client = ScriptedClient::from_texts(vec![
            "let me ponder this for a while",
            "<response>pondered</response>",
        ]);
        let history = Arc::new(ConversationStore::new(40));
        let client = Arc::new(client);
        let orch = Orchestrator::new(
            client.clone(),
            Arc::new(ToolRunner::new()),
            history,
            OrchestratorConfig::default(),
        );

        let response = orch.run("hm", None, None).await.unwrap();
        assert_eq!(response, "pondered");
        assert_eq!(client.calls(), 2);
    }

    #[tokio::test]
    async fn test_cap_exhaustion_falls_back_to_untooled_reply() {
        let client = ScriptedClient::repeating(LlmResponse::text("just musing, no tags"));
        let history = Arc::new(ConversationStore::new(40));
        let client = Arc::new(client);
        let cap = 3;
        let orch = Orchestrator::new(
            client.clone(),
            Arc::new(ToolRunner::new()),
            history.clone(),
            OrchestratorConfig {
                max_iterations: cap,
                ..OrchestratorConfig::default()
            },
        );

        let response = orch.run("loop forever", None, None).await.unwrap();

        // Raw content used as-is, after cap + 1 calls total.
        assert_eq!(response, "just musing, no tags");
        assert_eq!(client.calls(), cap + 1);
        assert_eq!(history.len(), 2);
    }

    #[tokio::test]
    async fn test_fallback_extracts_late_response_tag() {
        let client = ScriptedClient::new(vec![
            LlmResponse::text("a"),
            LlmResponse::text("b"),
            LlmResponse::text("<response>late but tagged</response>"),
        ]);
        let (orch, _) = orchestrator(client, Arc::new(ToolRunner::new()), 2);

        let response = orch.run("slow", None, None).await.unwrap();
        assert_eq!(response, "late but tagged");
    }

    #[tokio::test]
    async fn test_provider_failure_leaves_history_untouched() {
        let client = ScriptedClient::new(vec![]);
        let (orch, history) = orchestrator(client, Arc::new(ToolRunner::new()), 10);

        let result = orch.run("hello", None, None).await;

        assert!(matches!(result, Err(Error::Provider(_))));
        assert_eq!(history.len(), 0);
    }

    #[tokio::test]
    async fn test_multiple_tool_iterations_record_one_exchange() {
        let client = ScriptedClient::new(vec![
            LlmResponse::tool_call("probe", json!({"step": 1})),
            LlmResponse::tool_call("probe", json!({"step": 2})),
            LlmResponse::tool_call("probe", json!({"step": 3})),
            LlmResponse::text("<response>three probes later</response>"),
        ]);
        let tools = runner_with_dummy("probe", "probed");
        let (orch, history) = orchestrator(client, tools, 10);

        let response = orch.run("probe it", None, None).await.unwrap();
        assert_eq!(response, "three probes later");
        assert_eq!(history.len(), 2);
    }
}
