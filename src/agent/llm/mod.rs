//! LLM client abstraction layer.
//!
//! This module provides:
//! - [`LlmClient`] trait for swappable LLM providers
//! - [`ProviderRegistry`] for dynamic provider creation
//! - Concrete implementation: OpenAI-compatible chat completions
//!
//! # Adding a New Provider
//!
//! 1. Create a new file (e.g., `anthropic.rs`)
//! 2. Implement `LlmClient` trait
//! 3. Add to `ProviderRegistry::create()`
//! 4. Add config fields in `config.rs`

mod types;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::Error;
use crate::tools::ToolDefinition;
use crate::Result;

pub use types::*;

pub mod openai;

pub use openai::OpenAiClient;

use super::message::{Message, ToolCallRequest};

/// Whether the model may request tool calls for this completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolChoice {
    /// The model decides between calling tools and answering.
    Auto,
    /// Tool calling disabled; the model must answer with text.
    None,
}

/// Response from an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// Text content of the response.
    pub content: Option<String>,

    /// Tool calls requested by the LLM.
    pub tool_calls: Vec<ToolCallRequest>,

    /// Reason the response finished.
    pub finish_reason: String,

    /// Token usage statistics.
    pub usage: Usage,
}

impl LlmResponse {
    /// Create a simple text response.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            tool_calls: vec![],
            finish_reason: "stop".to_string(),
            usage: Usage::default(),
        }
    }

    /// Create a response requesting a single tool call.
    pub fn tool_call(name: &str, arguments: serde_json::Value) -> Self {
        Self {
            content: None,
            tool_calls: vec![ToolCallRequest {
                id: format!("tc_{}", name),
                name: name.to_string(),
                arguments,
            }],
            finish_reason: "tool_calls".to_string(),
            usage: Usage::default(),
        }
    }

    /// Check if response has tool calls.
    #[inline]
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// Token usage information.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub total_tokens: usize,
}

/// LLM client trait — swappable provider abstraction.
///
/// Implement this trait to add a new LLM provider.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send messages and get response.
    async fn chat(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
        tool_choice: ToolChoice,
    ) -> Result<LlmResponse>;

    /// Get the model this client targets.
    fn model(&self) -> &str;
}

/// Provider registry — creates LLM clients dynamically.
///
/// # Example
///
/// ```ignore
/// let client = ProviderRegistry::create(&config)?;
/// let response = client.chat(&messages, &tools, ToolChoice::Auto).await?;
/// ```
pub struct ProviderRegistry;

impl ProviderRegistry {
    /// Create an LLM client from configuration.
    ///
    /// Supported providers:
    /// - `"openai"`: any OpenAI-compatible chat-completions endpoint
    pub fn create(config: &Config) -> Result<Box<dyn LlmClient>> {
        match config.provider.as_str() {
            "openai" => {
                let client = OpenAiClient::new(&config.api_key, &config.model)
                    .with_base_url(&config.base_url)
                    .with_sampling(config.temperature, config.max_tokens);
                Ok(Box::new(client))
            }
            other => Err(Error::Config(format!("Unknown provider: {other}"))),
        }
    }

    /// List available provider names.
    pub fn available() -> &'static [&'static str] {
        &["openai"]
    }
}

/// Scripted LLM client for testing.
///
/// Pops one canned reply per `chat` call; optionally repeats the last
/// reply forever so iteration-cap behavior can be exercised.
#[cfg(test)]
pub struct ScriptedClient {
    replies: std::sync::Mutex<std::collections::VecDeque<LlmResponse>>,
    repeat_last: bool,
    calls: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl ScriptedClient {
    /// Create with a fixed reply sequence.
    pub fn new(replies: Vec<LlmResponse>) -> Self {
        Self {
            replies: std::sync::Mutex::new(replies.into()),
            repeat_last: false,
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Create with predefined text responses.
    pub fn from_texts(texts: Vec<&str>) -> Self {
        Self::new(texts.iter().map(|t| LlmResponse::text(*t)).collect())
    }

    /// Create with a single reply repeated on every call.
    pub fn repeating(reply: LlmResponse) -> Self {
        Self {
            replies: std::sync::Mutex::new(vec![reply].into()),
            repeat_last: true,
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Number of `chat` calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
#[async_trait]
impl LlmClient for ScriptedClient {
    async fn chat(
        &self,
        _messages: &[Message],
        _tools: &[ToolDefinition],
        _tool_choice: ToolChoice,
    ) -> Result<LlmResponse> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let mut replies = self.replies.lock().unwrap();
        let reply = replies
            .pop_front()
            .ok_or_else(|| Error::Provider("No more scripted replies".to_string()))?;
        if self.repeat_last && replies.is_empty() {
            replies.push_back(reply.clone());
        }
        Ok(reply)
    }

    fn model(&self) -> &str {
        "scripted-model"
    }
}
