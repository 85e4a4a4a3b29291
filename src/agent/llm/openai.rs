//! OpenAI-compatible LLM client implementation.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::warn;

use crate::error::Error;
use crate::tools::ToolDefinition;
use crate::Result;

use super::super::message::{Message, Role, ToolCallRequest};
use super::{ChatCompletionResponse, LlmClient, LlmResponse, ToolChoice, Usage};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Chat-completions client for OpenAI-compatible endpoints.
#[derive(Clone)]
pub struct OpenAiClient {
    api_key: String,
    base_url: String,
    model: String,
    temperature: f64,
    max_tokens: usize,
    client: Client,
}

impl OpenAiClient {
    /// Create a new client with an API key.
    pub fn new(api_key: &str, model: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: model.to_string(),
            temperature: 0.7,
            max_tokens: 1000,
            client: Client::new(),
        }
    }

    /// Point the client at a different OpenAI-compatible endpoint.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Override sampling settings.
    pub fn with_sampling(mut self, temperature: f64, max_tokens: usize) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    fn build_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn convert_messages(&self, messages: &[Message]) -> Vec<Value> {
        messages
            .iter()
            .map(|m| {
                let role = match m.role {
                    Role::System => "system",
                    Role::User => "user",
                    Role::Assistant => "assistant",
                    Role::Tool => "tool",
                };

                if m.role == Role::Tool {
                    json!({
                        "role": "tool",
                        "tool_call_id": m.tool_call_id.as_deref().unwrap_or("unknown"),
                        "content": m.content
                    })
                } else if let Some(ref tool_calls) = m.tool_calls {
                    let calls: Vec<Value> = tool_calls
                        .iter()
                        .map(|tc| {
                            json!({
                                "id": tc.id,
                                "type": "function",
                                "function": {
                                    "name": tc.name,
                                    "arguments": tc.arguments.to_string()
                                }
                            })
                        })
                        .collect();

                    json!({
                        "role": role,
                        "content": m.content,
                        "tool_calls": calls
                    })
                } else {
                    json!({
                        "role": role,
                        "content": m.content
                    })
                }
            })
            .collect()
    }

    fn convert_tools(&self, tools: &[ToolDefinition]) -> Value {
        let declarations: Vec<Value> = tools
            .iter()
            .map(|t| {
                json!({
                    "type": "function",
                    "function": {
                        "name": t.name,
                        "description": t.description,
                        "parameters": t.parameters
                    }
                })
            })
            .collect();
        Value::Array(declarations)
    }

    fn parse_response(&self, response: ChatCompletionResponse) -> Result<LlmResponse> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::Provider("No choices in response".to_string()))?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| {
                let arguments = serde_json::from_str(&tc.function.arguments).unwrap_or_else(|e| {
                    warn!("Unparseable tool arguments for {}: {}", tc.function.name, e);
                    json!({})
                });
                ToolCallRequest {
                    id: tc.id,
                    name: tc.function.name,
                    arguments,
                }
            })
            .collect();

        let usage = response
            .usage
            .map(|u| Usage {
                prompt_tokens: u.prompt_tokens.unwrap_or(0),
                completion_tokens: u.completion_tokens.unwrap_or(0),
                total_tokens: u.total_tokens.unwrap_or(0),
            })
            .unwrap_or_default();

        Ok(LlmResponse {
            content: choice.message.content,
            tool_calls,
            finish_reason: choice.finish_reason.unwrap_or_else(|| "stop".to_string()),
            usage,
        })
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn chat(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
        tool_choice: ToolChoice,
    ) -> Result<LlmResponse> {
        let mut request = json!({
            "model": self.model,
            "messages": self.convert_messages(messages),
            "temperature": self.temperature,
            "max_tokens": self.max_tokens
        });

        if tool_choice == ToolChoice::Auto && !tools.is_empty() {
            request["tools"] = self.convert_tools(tools);
            request["tool_choice"] = json!("auto");
        }

        let response = self
            .client
            .post(self.build_url())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Provider(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(Error::Provider(format!(
                "API error ({}): {}",
                status, error_text
            )));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::Provider(format!("Malformed response: {}", e)))?;
        self.parse_response(completion)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> OpenAiClient {
        OpenAiClient::new("sk-test", "gpt-4o")
    }

    #[test]
    fn test_convert_messages_tool_result() {
        let messages = vec![Message::tool_result("tc_1", "{\"success\":true}")];
        let converted = client().convert_messages(&messages);
        assert_eq!(converted[0]["role"], "tool");
        assert_eq!(converted[0]["tool_call_id"], "tc_1");
    }

    #[test]
    fn test_convert_messages_assistant_with_tools() {
        let calls = vec![ToolCallRequest {
            id: "tc_1".to_string(),
            name: "list_projects".to_string(),
            arguments: json!({"sort_by": "name"}),
        }];
        let messages = vec![Message::assistant_with_tools("", calls)];
        let converted = client().convert_messages(&messages);
        assert_eq!(converted[0]["tool_calls"][0]["function"]["name"], "list_projects");
        // Arguments must be a JSON-encoded string on the wire.
        assert!(converted[0]["tool_calls"][0]["function"]["arguments"].is_string());
    }

    #[test]
    fn test_parse_response_with_tool_call() {
        let wire = json!({
            "choices": [{
                "message": {
                    "content": null,
                    "tool_calls": [{
                        "id": "call_abc",
                        "type": "function",
                        "function": {
                            "name": "load_project",
                            "arguments": "{\"project_name\": \"alpha\"}"
                        }
                    }]
                },
                "finish_reason": "tool_calls"
            }],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        });
        let parsed: ChatCompletionResponse = serde_json::from_value(wire).unwrap();
        let response = client().parse_response(parsed).unwrap();

        assert!(response.has_tool_calls());
        assert_eq!(response.tool_calls[0].name, "load_project");
        assert_eq!(response.tool_calls[0].arguments["project_name"], "alpha");
        assert_eq!(response.usage.total_tokens, 15);
    }

    #[test]
    fn test_parse_response_empty_choices() {
        let parsed: ChatCompletionResponse =
            serde_json::from_value(json!({"choices": [], "usage": null})).unwrap();
        assert!(client().parse_response(parsed).is_err());
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let c = client().with_base_url("http://localhost:8080/v1/");
        assert_eq!(c.build_url(), "http://localhost:8080/v1/chat/completions");
    }
}
