//! Synchronous delivery - call and block until the response is ready.

use std::sync::Arc;

use serde_json::Value;

use crate::assistant::Assistant;
use crate::store::DisplayEntry;
use crate::Result;

/// Blocking call-and-return delivery.
pub struct SyncDelivery {
    assistant: Arc<Assistant>,
}

impl SyncDelivery {
    pub fn new(assistant: Arc<Assistant>) -> Self {
        Self { assistant }
    }

    /// Send a message and wait for the final response.
    ///
    /// The completed exchange is mirrored into the display log so polling
    /// clients see it too. A failed run mutates nothing.
    pub async fn send(&self, message: &str, context: Option<&Value>) -> Result<String> {
        let response = self.assistant.orchestrator().run(message, context, None).await?;

        self.assistant.display().push(DisplayEntry::user(message, None));
        self.assistant.display().push(DisplayEntry::assistant(&response, None));

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::llm::{LlmResponse, ScriptedClient};
    use crate::assistant::tests::scripted_assistant;
    use serde_json::json;

    #[tokio::test]
    async fn test_send_returns_response_and_mirrors_display() {
        let client = ScriptedClient::new(vec![
            LlmResponse::tool_call("list_projects", json!({})),
            LlmResponse::text("<response>You have 3 projects.</response>"),
        ]);
        let assistant = scripted_assistant(client);
        let delivery = SyncDelivery::new(assistant.clone());

        let response = delivery.send("list my projects", None).await.unwrap();

        assert_eq!(response, "You have 3 projects.");
        assert_eq!(assistant.display().len(), 2);
        assert_eq!(assistant.history().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_send_leaves_display_untouched() {
        let assistant = scripted_assistant(ScriptedClient::new(vec![]));
        let delivery = SyncDelivery::new(assistant.clone());

        assert!(delivery.send("hello", None).await.is_err());
        assert_eq!(assistant.display().len(), 0);
    }
}
