//! Tool runner - manages and dispatches tools
//!
//! The runner is an error boundary: handler failures and unknown tool
//! names come back as `ToolResult { success: false }` and never propagate
//! into the orchestration loop.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::services::{MarketDataService, ProjectService};

use super::market::MarketQuoteTool;
use super::params::UpdateBlockParametersTool;
use super::projects::{CreateProjectTool, ListProjectsTool, LoadProjectTool};
use super::test_runs::{LoadTestRunTool, SearchTestRunsTool};
use super::{Tool, ToolResult};

/// Tool definition for LLM
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Tool runner manages registered tools and dispatches calls to them
pub struct ToolRunner {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRunner {
    /// Create an empty tool runner
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Create a tool runner with the full catalog tool set
    pub fn with_services(
        projects: Arc<dyn ProjectService>,
        market: Arc<dyn MarketDataService>,
    ) -> Self {
        let mut runner = Self::new();

        // Catalog lookups
        runner.register(ListProjectsTool::new(projects.clone()));
        runner.register(LoadProjectTool::new(projects.clone()));
        runner.register(LoadTestRunTool::new(projects.clone()));
        runner.register(SearchTestRunsTool::new(projects.clone()));

        // Catalog mutations
        runner.register(CreateProjectTool::new(projects.clone()));
        runner.register(UpdateBlockParametersTool::new(projects));

        // Market data
        runner.register(MarketQuoteTool::new(market));

        runner
    }

    /// Register a tool
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        self.tools.insert(tool.name().to_string(), Box::new(tool));
    }

    /// Get tool definitions for LLM
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values()
            .map(|t| t.to_definition())
            .collect()
    }

    /// Dispatch a tool call by name. Never fails: unknown names and
    /// handler errors are reported inside the result.
    pub async fn execute(&self, name: &str, args: Value) -> ToolResult {
        let tool = match self.tools.get(name) {
            Some(tool) => tool,
            None => return ToolResult::err(format!("Unknown tool: {}", name)),
        };

        debug!("Dispatching tool: {} with args: {}", name, args);
        match tool.execute(args).await {
            Ok(result) => result,
            Err(e) => {
                warn!("Tool {} failed: {}", name, e);
                ToolResult::err(format!("Error executing tool: {}", e))
            }
        }
    }

    /// Check if a tool exists
    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// List registered tool names
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }
}

impl Default for ToolRunner {
    fn default() -> Self {
        Self::new()
    }
}
