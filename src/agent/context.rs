//! Prompt builder for assistant transcripts.
//!
//! Builds the system prompt (persona, tag protocol, optional caller
//! context) and assembles the working transcript with history windowing.

use serde_json::Value;

use super::message::Message;

/// Maximum history messages to include in a transcript (prevents
/// unbounded growth of the LLM context window).
pub const MAX_HISTORY_MESSAGES: usize = 40;

/// Builds system prompts and working transcripts.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    history_limit: usize,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self {
            history_limit: MAX_HISTORY_MESSAGES,
        }
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// Build the system prompt, folding in caller context when present.
    pub fn system_prompt(&self, caller_context: Option<&Value>) -> String {
        let mut prompt = self.identity();

        if let Some(context) = caller_context {
            let rendered = serde_json::to_string_pretty(context)
                .unwrap_or_else(|_| context.to_string());
            prompt.push_str("\n\n## Current Context\n\n");
            prompt.push_str(&rendered);
        }

        prompt
    }

    /// Build the working transcript for an LLM call: system prompt,
    /// windowed history, then the current user message.
    pub fn build_transcript(
        &self,
        history: &[Message],
        current: &str,
        caller_context: Option<&Value>,
    ) -> Vec<Message> {
        let windowed = if history.len() > self.history_limit {
            &history[history.len() - self.history_limit..]
        } else {
            history
        };

        let mut messages = Vec::with_capacity(windowed.len() + 2);
        messages.push(Message::system(self.system_prompt(caller_context)));
        messages.extend(windowed.iter().cloned());
        messages.push(Message::user(current));
        messages
    }

    fn identity(&self) -> String {
        r#"# Sibyl

You are Sibyl, an AI analyst for a portfolio sensitivity-analysis platform.

You help users understand:
- Portfolio optimization and risk analysis
- Sensitivity analysis and parameter perturbation
- Classical vs. hybrid vs. quantum analysis approaches
- Interpreting test run results and metrics

Be concise and accurate. Explain quantitative concepts intuitively before
going technical.

## Tools
You have tools to list, load, create, and modify projects, to search and
inspect test runs, and to look up market quotes. When the user refers to a
project or test run, load it before answering questions about it.

## Output protocol
- You may reason privately inside <thinking>...</thinking>.
- When you need data or must change something, call a tool.
- When you are ready to answer the user, and only then, wrap the final
  answer in <response>...</response>.
- Every turn must end with either a tool call or a <response> block.
  Thinking alone is not sufficient."#
            .to_string()
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_system_prompt_mentions_protocol() {
        let prompt = PromptBuilder::new().system_prompt(None);
        assert!(prompt.contains("Sibyl"));
        assert!(prompt.contains("<response>"));
    }

    #[test]
    fn test_system_prompt_folds_in_context() {
        let context = json!({"open_project": "alpha"});
        let prompt = PromptBuilder::new().system_prompt(Some(&context));
        assert!(prompt.contains("Current Context"));
        assert!(prompt.contains("alpha"));
    }

    #[test]
    fn test_build_transcript_shape() {
        let builder = PromptBuilder::new();
        let messages = builder.build_transcript(&[], "Hello", None);

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, super::super::message::Role::System);
        assert_eq!(messages[1].role, super::super::message::Role::User);
        assert_eq!(messages[1].content, "Hello");
    }

    #[test]
    fn test_history_windowing() {
        let builder = PromptBuilder::new().with_history_limit(10);

        let mut history = Vec::new();
        for i in 0..100 {
            history.push(Message::user(format!("Message {}", i)));
        }

        let messages = builder.build_transcript(&history, "Current", None);

        // system + 10 windowed + current
        assert_eq!(messages.len(), 12);

        // Last history message should be the most recent
        let last_history = &messages[messages.len() - 2];
        assert!(last_history.content.contains("99"));
    }
}
