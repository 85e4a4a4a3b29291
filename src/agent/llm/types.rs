//! Wire types for OpenAI-compatible chat-completions responses.

use serde::Deserialize;

/// Top-level chat-completions response.
#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<Choice>,
    pub usage: Option<UsageInfo>,
}

/// A single response choice.
#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
    pub finish_reason: Option<String>,
}

/// The assistant message inside a choice.
#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    pub content: Option<String>,
    pub tool_calls: Option<Vec<WireToolCall>>,
}

/// Tool call requested by the model.
#[derive(Debug, Deserialize)]
pub struct WireToolCall {
    pub id: String,
    pub function: WireFunction,
}

/// Function name plus JSON-encoded arguments.
#[derive(Debug, Deserialize)]
pub struct WireFunction {
    pub name: String,
    /// Arguments arrive as a JSON string, not an object.
    pub arguments: String,
}

/// Token usage accounting.
#[derive(Debug, Deserialize)]
pub struct UsageInfo {
    pub prompt_tokens: Option<usize>,
    pub completion_tokens: Option<usize>,
    pub total_tokens: Option<usize>,
}
