//! Parameter mutation tool - update block parameters on a project

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::services::{ProjectService, BLOCK_TYPES};
use crate::Result;

use super::{require_str, Tool, ToolResult};

/// Update the parameters of one model block in one project.
///
/// Performs exactly one persisted mutation per call.
pub struct UpdateBlockParametersTool {
    projects: Arc<dyn ProjectService>,
}

impl UpdateBlockParametersTool {
    pub fn new(projects: Arc<dyn ProjectService>) -> Self {
        Self { projects }
    }
}

#[async_trait]
impl Tool for UpdateBlockParametersTool {
    fn name(&self) -> &str { "update_block_parameters" }
    fn description(&self) -> &str {
        "Update the parameters of a model block (classical, hybrid, or quantum) in a project"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "project_name": {
                    "type": "string",
                    "description": "The project to modify (case-insensitive)"
                },
                "block_type": {
                    "type": "string",
                    "enum": BLOCK_TYPES,
                    "description": "Which block to update"
                },
                "parameters": {
                    "type": "object",
                    "description": "New parameter values for the block"
                }
            },
            "required": ["project_name", "block_type", "parameters"]
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let project_name = match require_str(&args, "project_name") {
            Ok(name) => name,
            Err(result) => return Ok(result),
        };
        let block_type = match require_str(&args, "block_type") {
            Ok(bt) => bt,
            Err(result) => return Ok(result),
        };
        let parameters = match args.get("parameters") {
            Some(p) if p.is_object() => p.clone(),
            Some(_) => return Ok(ToolResult::err("parameters must be an object")),
            None => return Ok(ToolResult::err("parameters is required")),
        };

        match self
            .projects
            .update_block_parameters(project_name, block_type, parameters)
        {
            Ok(project) => Ok(ToolResult::ok(
                format!("Updated {} block parameters in '{}'", block_type, project.name),
                json!({
                    "project_id": project.project_id,
                    "name": project.name,
                    "block_type": block_type,
                    "parameters": project.blocks.get(block_type).map(|b| b.parameters.clone()),
                    "last_modified": project.last_modified,
                }),
            )),
            Err(e) => Ok(ToolResult::err(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::InMemoryProjects;

    fn tool() -> UpdateBlockParametersTool {
        UpdateBlockParametersTool::new(Arc::new(InMemoryProjects::with_demo_data()))
    }

    #[tokio::test]
    async fn test_update_parameters() {
        let result = tool()
            .execute(json!({
                "project_name": "alpha growth",
                "block_type": "classical",
                "parameters": {"volatility": 0.3}
            }))
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(result.data.unwrap()["parameters"]["volatility"], 0.3);
    }

    #[tokio::test]
    async fn test_update_rejects_bad_block_type() {
        let result = tool()
            .execute(json!({
                "project_name": "alpha growth",
                "block_type": "psychic",
                "parameters": {}
            }))
            .await
            .unwrap();
        assert!(!result.success);
    }

    #[tokio::test]
    async fn test_update_rejects_non_object_parameters() {
        let result = tool()
            .execute(json!({
                "project_name": "alpha growth",
                "block_type": "classical",
                "parameters": "volatility=0.3"
            }))
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.error.unwrap().contains("object"));
    }
}
