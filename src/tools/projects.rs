//! Project tools - list, load, and create catalog projects

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::services::ProjectService;
use crate::Result;

use super::{require_str, Tool, ToolResult};

fn project_payload(project: &crate::services::Project) -> Value {
    let blocks_placed: Vec<&str> = project
        .blocks
        .iter()
        .filter(|(_, b)| b.placed)
        .map(|(t, _)| t.as_str())
        .collect();

    json!({
        "project_id": project.project_id,
        "name": project.name,
        "description": project.description,
        "created": project.created,
        "last_modified": project.last_modified,
        "blocks_placed": blocks_placed,
        "block_details": project.blocks,
        "test_run_count": project.test_runs.len(),
    })
}

/// List all available projects
pub struct ListProjectsTool {
    projects: Arc<dyn ProjectService>,
}

impl ListProjectsTool {
    pub fn new(projects: Arc<dyn ProjectService>) -> Self {
        Self { projects }
    }
}

#[async_trait]
impl Tool for ListProjectsTool {
    fn name(&self) -> &str { "list_projects" }
    fn description(&self) -> &str {
        "List all available projects with their basic information"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "sort_by": {
                    "type": "string",
                    "enum": ["name", "created", "last_modified"],
                    "description": "Field to sort projects by",
                    "default": "last_modified"
                },
                "ascending": {
                    "type": "boolean",
                    "description": "Sort in ascending order (false for descending)",
                    "default": false
                }
            }
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let sort_by = args.get("sort_by").and_then(|v| v.as_str()).unwrap_or("last_modified");
        let ascending = args.get("ascending").and_then(|v| v.as_bool()).unwrap_or(false);

        if !["name", "created", "last_modified"].contains(&sort_by) {
            return Ok(ToolResult::err(format!("Invalid sort_by field: {}", sort_by)));
        }

        let mut projects = self.projects.list_projects()?;
        match sort_by {
            "name" => projects.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase())),
            "created" => projects.sort_by_key(|p| p.created),
            _ => projects.sort_by_key(|p| p.last_modified),
        }
        if !ascending {
            projects.reverse();
        }

        let listed: Vec<Value> = projects
            .iter()
            .map(|p| {
                json!({
                    "name": p.name,
                    "project_id": p.project_id,
                    "created": p.created,
                    "last_modified": p.last_modified,
                    "description": p.description,
                })
            })
            .collect();

        Ok(ToolResult::ok(
            format!("Found {} projects", listed.len()),
            Value::Array(listed),
        ))
    }
}

/// Load a single project by name
pub struct LoadProjectTool {
    projects: Arc<dyn ProjectService>,
}

impl LoadProjectTool {
    pub fn new(projects: Arc<dyn ProjectService>) -> Self {
        Self { projects }
    }
}

#[async_trait]
impl Tool for LoadProjectTool {
    fn name(&self) -> &str { "load_project" }
    fn description(&self) -> &str {
        "Load a project by name to analyze its configuration, blocks, parameters, and state"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "project_name": {
                    "type": "string",
                    "description": "The name of the project to load (case-insensitive)"
                }
            },
            "required": ["project_name"]
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let name = match require_str(&args, "project_name") {
            Ok(name) => name,
            Err(result) => return Ok(result),
        };

        match self.projects.load_project(name)? {
            Some(project) => Ok(ToolResult::ok(
                format!("Loaded project '{}' (ID: {})", project.name, project.project_id),
                project_payload(&project),
            )),
            None => {
                let available: Vec<String> = self
                    .projects
                    .list_projects()?
                    .into_iter()
                    .map(|p| p.name)
                    .collect();
                Ok(ToolResult::err(format!(
                    "Project '{}' not found. Available projects: {}",
                    name,
                    available.join(", ")
                )))
            }
        }
    }
}

/// Create a new project
pub struct CreateProjectTool {
    projects: Arc<dyn ProjectService>,
}

impl CreateProjectTool {
    pub fn new(projects: Arc<dyn ProjectService>) -> Self {
        Self { projects }
    }
}

#[async_trait]
impl Tool for CreateProjectTool {
    fn name(&self) -> &str { "create_project" }
    fn description(&self) -> &str {
        "Create a new, empty project in the catalog"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "name": {
                    "type": "string",
                    "description": "Name for the new project (must be unique)"
                },
                "description": {
                    "type": "string",
                    "description": "Optional short description"
                }
            },
            "required": ["name"]
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let name = match require_str(&args, "name") {
            Ok(name) => name,
            Err(result) => return Ok(result),
        };
        let description = args.get("description").and_then(|v| v.as_str()).unwrap_or("");

        match self.projects.create_project(name, description) {
            Ok(project) => Ok(ToolResult::ok(
                format!("Created project '{}' (ID: {})", project.name, project.project_id),
                project_payload(&project),
            )),
            Err(e) => Ok(ToolResult::err(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::InMemoryProjects;

    fn service() -> Arc<dyn ProjectService> {
        Arc::new(InMemoryProjects::with_demo_data())
    }

    #[tokio::test]
    async fn test_list_projects_sorted_by_name() {
        let tool = ListProjectsTool::new(service());
        let result = tool
            .execute(json!({"sort_by": "name", "ascending": true}))
            .await
            .unwrap();

        assert!(result.success);
        let names: Vec<&str> = result.data.as_ref().unwrap()
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Alpha Growth", "Barbell", "Steady Income"]);
    }

    #[tokio::test]
    async fn test_list_projects_rejects_bad_sort_field() {
        let tool = ListProjectsTool::new(service());
        let result = tool.execute(json!({"sort_by": "color"})).await.unwrap();
        assert!(!result.success);
    }

    #[tokio::test]
    async fn test_load_project_case_insensitive() {
        let tool = LoadProjectTool::new(service());
        let result = tool
            .execute(json!({"project_name": "ALPHA growth"}))
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(result.data.unwrap()["name"], "Alpha Growth");
    }

    #[tokio::test]
    async fn test_load_project_not_found_lists_available() {
        let tool = LoadProjectTool::new(service());
        let result = tool.execute(json!({"project_name": "ghost"})).await.unwrap();

        assert!(!result.success);
        let error = result.error.unwrap();
        assert!(error.contains("Available projects:"));
        assert!(error.contains("Alpha Growth"));
    }

    #[tokio::test]
    async fn test_load_project_missing_argument() {
        let tool = LoadProjectTool::new(service());
        let result = tool.execute(json!({})).await.unwrap();
        assert!(!result.success);
        assert!(result.error.unwrap().contains("required"));
    }

    #[tokio::test]
    async fn test_create_project() {
        let tool = CreateProjectTool::new(service());
        let result = tool
            .execute(json!({"name": "Fresh", "description": "brand new"}))
            .await
            .unwrap();
        assert!(result.success);

        // A second create with the same name reports the conflict inline.
        let again = tool.execute(json!({"name": "fresh"})).await.unwrap();
        assert!(!again.success);
    }
}
