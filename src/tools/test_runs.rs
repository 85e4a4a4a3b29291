//! Test run tools - load and search sensitivity test runs

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Datelike, Duration, NaiveDate, Utc};
use serde_json::{json, Value};

use crate::services::{ProjectService, TestRun};
use crate::Result;

use super::{require_str, Tool, ToolResult};

fn run_payload(run: &TestRun) -> Value {
    json!({
        "test_run_id": run.test_run_id,
        "project_id": run.project_id,
        "timestamp": run.timestamp,
        "block_type": run.block_type,
        "asset": run.asset,
        "parameter": run.parameter,
        "range_tested": run.range_tested,
        "parameters": run.parameters,
        "results_summary": {
            "data_points": run.results.len(),
            "baseline_volatility_daily": run.baseline_volatility_daily,
            "baseline_volatility_annualized": run.baseline_volatility_annualized,
        },
        "analytics": run.analytics,
        // First few data points as a sample
        "sample_results": run.results.iter().take(3).collect::<Vec<_>>(),
    })
}

/// Load a single test run by ID
pub struct LoadTestRunTool {
    projects: Arc<dyn ProjectService>,
}

impl LoadTestRunTool {
    pub fn new(projects: Arc<dyn ProjectService>) -> Self {
        Self { projects }
    }
}

#[async_trait]
impl Tool for LoadTestRunTool {
    fn name(&self) -> &str { "load_test_run" }
    fn description(&self) -> &str {
        "Load a specific test run by its ID to analyze results, parameters, and metrics"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "test_run_id": {
                    "type": "string",
                    "description": "The test run ID, e.g. test-run-0001"
                }
            },
            "required": ["test_run_id"]
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let id = match require_str(&args, "test_run_id") {
            Ok(id) => id,
            Err(result) => return Ok(result),
        };

        match self.projects.load_test_run(id)? {
            Some(run) => Ok(ToolResult::ok(
                format!("Loaded test run {} ({} - {})", run.test_run_id, run.block_type, run.asset),
                run_payload(&run),
            )),
            None => Ok(ToolResult::err(format!("Test run '{}' not found", id))),
        }
    }
}

/// Search test runs by date and attribute filters
pub struct SearchTestRunsTool {
    projects: Arc<dyn ProjectService>,
}

impl SearchTestRunsTool {
    pub fn new(projects: Arc<dyn ProjectService>) -> Self {
        Self { projects }
    }

    fn filter_by_date(&self, runs: Vec<TestRun>, date_filter: &str, args: &Value) -> std::result::Result<Vec<TestRun>, ToolResult> {
        let today = Utc::now().date_naive();

        let (start, end) = match date_filter {
            "today" => (today, today),
            "yesterday" => {
                let d = today - Duration::days(1);
                (d, d)
            }
            "this_week" => (today - Duration::days(today.weekday().num_days_from_monday() as i64), today),
            "last_week" => {
                let start = today - Duration::days(today.weekday().num_days_from_monday() as i64 + 7);
                (start, start + Duration::days(6))
            }
            "last_month" => (today - Duration::days(30), today),
            "specific_date" => {
                let date = parse_date(args, "specific_date")?;
                (date, date)
            }
            "date_range" => (parse_date(args, "start_date")?, parse_date(args, "end_date")?),
            "recent" => {
                let mut sorted = runs;
                sorted.sort_by_key(|r| std::cmp::Reverse(r.timestamp));
                return Ok(sorted);
            }
            other => {
                return Err(ToolResult::err(format!("Invalid date_filter: {}", other)));
            }
        };

        let mut filtered: Vec<TestRun> = runs
            .into_iter()
            .filter(|r| {
                let date = r.timestamp.date_naive();
                date >= start && date <= end
            })
            .collect();
        filtered.sort_by_key(|r| std::cmp::Reverse(r.timestamp));
        Ok(filtered)
    }
}

fn parse_date(args: &Value, key: &str) -> std::result::Result<NaiveDate, ToolResult> {
    let raw = args
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| ToolResult::err(format!("{} is required for this date_filter", key)))?;
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| ToolResult::err(format!("{} must be in YYYY-MM-DD format, got '{}'", key, raw)))
}

#[async_trait]
impl Tool for SearchTestRunsTool {
    fn name(&self) -> &str { "search_test_runs" }
    fn description(&self) -> &str {
        "Search for test runs by date range or get the most recent test runs"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "date_filter": {
                    "type": "string",
                    "enum": ["today", "yesterday", "this_week", "last_week", "last_month", "specific_date", "date_range", "recent"],
                    "description": "Type of date filter to apply"
                },
                "specific_date": {
                    "type": "string",
                    "description": "Specific date in YYYY-MM-DD format (only used when date_filter is 'specific_date')"
                },
                "start_date": {
                    "type": "string",
                    "description": "Start date in YYYY-MM-DD format (only used when date_filter is 'date_range')"
                },
                "end_date": {
                    "type": "string",
                    "description": "End date in YYYY-MM-DD format (only used when date_filter is 'date_range')"
                },
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of results to return",
                    "default": 10,
                    "minimum": 1,
                    "maximum": 50
                },
                "project_filter": {
                    "type": "string",
                    "description": "Optional: filter results to a specific project name"
                },
                "asset_filter": {
                    "type": "string",
                    "description": "Optional: filter results to a specific asset (e.g., 'AAPL')"
                },
                "block_type_filter": {
                    "type": "string",
                    "enum": ["classical", "hybrid", "quantum"],
                    "description": "Optional: filter results to a specific block type"
                }
            },
            "required": ["date_filter"]
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let date_filter = match require_str(&args, "date_filter") {
            Ok(f) => f,
            Err(result) => return Ok(result),
        };

        let limit = args.get("limit").and_then(|v| v.as_u64()).unwrap_or(10) as usize;
        if !(1..=50).contains(&limit) {
            return Ok(ToolResult::err("limit must be between 1 and 50"));
        }

        let runs = self.projects.list_test_runs()?;
        let mut filtered = match self.filter_by_date(runs, date_filter, &args) {
            Ok(runs) => runs,
            Err(result) => return Ok(result),
        };

        if let Some(project) = args.get("project_filter").and_then(|v| v.as_str()) {
            let needle = project.to_lowercase();
            filtered.retain(|r| r.project_id.to_lowercase().contains(&needle));
        }
        if let Some(asset) = args.get("asset_filter").and_then(|v| v.as_str()) {
            let needle = asset.to_uppercase();
            filtered.retain(|r| r.asset == needle);
        }
        if let Some(block_type) = args.get("block_type_filter").and_then(|v| v.as_str()) {
            filtered.retain(|r| r.block_type == block_type);
        }

        filtered.truncate(limit);
        let results: Vec<Value> = filtered.iter().map(run_payload).collect();

        Ok(ToolResult::ok(
            format!("Found {} test runs matching criteria", results.len()),
            Value::Array(results),
        ))
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
    async fn test_load_test_run() {
        let tool = LoadTestRunTool::new(service());
        let result = tool
            .execute(json!({"test_run_id": "test-run-0001"}))
            .await
            .unwrap();

        assert!(result.success);
        let data = result.data.unwrap();
        assert_eq!(data["asset"], "AAPL");
        assert_eq!(data["results_summary"]["data_points"], 3);
    }

    #[tokio::test]
    async fn test_load_test_run_not_found() {
        let tool = LoadTestRunTool::new(service());
        let result = tool
            .execute(json!({"test_run_id": "test-run-9999"}))
            .await
            .unwrap();
        assert!(!result.success);
    }

    #[tokio::test]
    async fn test_search_recent_sorts_newest_first() {
        let tool = SearchTestRunsTool::new(service());
        let result = tool.execute(json!({"date_filter": "recent"})).await.unwrap();

        assert!(result.success);
        let runs = result.data.unwrap();
        let runs = runs.as_array().unwrap();
        assert_eq!(runs.len(), 3);
        assert_eq!(runs[0]["test_run_id"], "test-run-0003");
    }

    #[tokio::test]
    async fn test_search_with_asset_filter_and_limit() {
        let tool = SearchTestRunsTool::new(service());
        let result = tool
            .execute(json!({"date_filter": "recent", "asset_filter": "aapl", "limit": 1}))
            .await
            .unwrap();

        assert!(result.success);
        let runs = result.data.unwrap();
        let runs = runs.as_array().unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0]["asset"], "AAPL");
    }

    #[tokio::test]
    async fn test_search_block_type_filter() {
        let tool = SearchTestRunsTool::new(service());
        let result = tool
            .execute(json!({"date_filter": "last_month", "block_type_filter": "quantum"}))
            .await
            .unwrap();

        assert!(result.success);
        let runs = result.data.unwrap();
        assert_eq!(runs.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_search_invalid_inputs_report_inline() {
        let tool = SearchTestRunsTool::new(service());

        let result = tool.execute(json!({"date_filter": "fortnight"})).await.unwrap();
        assert!(!result.success);

        let result = tool
            .execute(json!({"date_filter": "specific_date", "specific_date": "last tuesday"}))
            .await
            .unwrap();
        assert!(!result.success);

        let result = tool
            .execute(json!({"date_filter": "recent", "limit": 500}))
            .await
            .unwrap();
        assert!(!result.success);
    }
}
