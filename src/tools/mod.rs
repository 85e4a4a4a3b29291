//! Tools module - assistant capabilities
//!
//! Tools are the backend actions the assistant can take: loading and
//! searching catalog data, mutating project parameters, and looking up
//! market quotes.

mod runner;
mod market;
mod params;
mod projects;
mod test_runs;

pub use market::MarketQuoteTool;
pub use params::UpdateBlockParametersTool;
pub use projects::{CreateProjectTool, ListProjectsTool, LoadProjectTool};
pub use runner::{ToolDefinition, ToolRunner};
pub use test_runs::{LoadTestRunTool, SearchTestRunsTool};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::Result;

/// Uniform result of one tool execution, fed back into the LLM context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Short human-readable outcome, also surfaced in run events.
    pub summary: String,
}

impl ToolResult {
    /// Create a successful result.
    pub fn ok(summary: impl Into<String>, data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            summary: summary.into(),
        }
    }

    /// Create an error result.
    pub fn err(error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            success: false,
            data: None,
            summary: error.clone(),
            error: Some(error),
        }
    }

    /// Render for inclusion in the LLM context.
    pub fn to_content(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| self.summary.clone())
    }
}

/// Tool trait - interface for all assistant tools
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name used in function calls
    fn name(&self) -> &str;

    /// Description of what the tool does
    fn description(&self) -> &str;

    /// JSON Schema for parameters
    fn parameters(&self) -> Value;

    /// Execute the tool with given arguments
    async fn execute(&self, args: Value) -> Result<ToolResult>;

    /// Convert to tool definition for LLM
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters(),
        }
    }
}

/// Pull a required string argument, as a validation error when missing.
pub(crate) fn require_str<'a>(args: &'a Value, key: &str) -> std::result::Result<&'a str, ToolResult> {
    args.get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ToolResult::err(format!("{} is required", key)))
}

/// Dummy tool for testing
pub struct DummyTool {
    pub name: String,
    pub result: String,
}

#[async_trait]
impl Tool for DummyTool {
    fn name(&self) -> &str { &self.name }
    fn description(&self) -> &str { "Dummy tool for testing" }
    fn parameters(&self) -> Value { serde_json::json!({"type": "object"}) }

    async fn execute(&self, _args: Value) -> Result<ToolResult> {
        Ok(ToolResult::ok(self.result.clone(), Value::Null))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_result_ok() {
        let result = ToolResult::ok("Loaded project 'alpha'", json!({"name": "alpha"}));
        assert!(result.success);
        assert!(result.error.is_none());
        assert_eq!(result.summary, "Loaded project 'alpha'");
    }

    #[test]
    fn test_tool_result_err_mirrors_summary() {
        let result = ToolResult::err("project_name is required");
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("project_name is required"));
        assert_eq!(result.summary, "project_name is required");
    }

    #[test]
    fn test_to_content_is_json() {
        let content = ToolResult::ok("ok", json!({"n": 1})).to_content();
        let parsed: Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed["success"], true);
        assert_eq!(parsed["data"]["n"], 1);
    }

    #[test]
    fn test_require_str() {
        let args = json!({"name": "alpha", "blank": "  "});
        assert_eq!(require_str(&args, "name").unwrap(), "alpha");
        assert!(require_str(&args, "missing").is_err());
        assert!(require_str(&args, "blank").is_err());
    }
}
