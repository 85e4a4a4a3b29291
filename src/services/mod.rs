//! Collaborator services - the project catalog and market data.
//!
//! Persistence is out of scope for this crate: tools talk to these traits,
//! and the in-memory implementations back tests and the demo CLI. A
//! database- or file-backed implementation plugs in behind the same seam.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::Error;
use crate::Result;

/// A model block placed in a project (classical, hybrid, or quantum).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub placed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<(f64, f64)>,
    pub parameters: Value,
}

/// A portfolio analysis project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub project_id: String,
    pub name: String,
    pub description: String,
    pub created: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    /// Blocks keyed by block type.
    pub blocks: HashMap<String, Block>,
    pub test_runs: Vec<String>,
}

/// A single sensitivity test run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestRun {
    pub test_run_id: String,
    pub project_id: String,
    pub timestamp: DateTime<Utc>,
    pub block_type: String,
    pub asset: String,
    /// The perturbed parameter (e.g. "volatility").
    pub parameter: String,
    pub range_tested: Vec<f64>,
    pub parameters: Value,
    pub results: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline_volatility_daily: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline_volatility_annualized: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analytics: Option<Value>,
}

/// A market quote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub price: f64,
    pub currency: String,
    pub as_of: DateTime<Utc>,
}

/// Block types a project may carry.
pub const BLOCK_TYPES: [&str; 3] = ["classical", "hybrid", "quantum"];

/// Access to projects and test runs.
pub trait ProjectService: Send + Sync {
    fn list_projects(&self) -> Result<Vec<Project>>;

    /// Load a project by name, case-insensitively.
    fn load_project(&self, name: &str) -> Result<Option<Project>>;

    /// Create a new project. Errors if the name is already taken.
    fn create_project(&self, name: &str, description: &str) -> Result<Project>;

    /// Replace the parameters of one block in one project. The single
    /// externally visible mutation of this service.
    fn update_block_parameters(
        &self,
        project_name: &str,
        block_type: &str,
        parameters: Value,
    ) -> Result<Project>;

    fn list_test_runs(&self) -> Result<Vec<TestRun>>;

    fn load_test_run(&self, test_run_id: &str) -> Result<Option<TestRun>>;
}

/// Market data lookups.
pub trait MarketDataService: Send + Sync {
    fn quote(&self, symbol: &str) -> Result<Option<Quote>>;
}

/// In-memory project catalog.
pub struct InMemoryProjects {
    projects: Mutex<HashMap<String, Project>>,
    test_runs: Mutex<HashMap<String, TestRun>>,
}

impl InMemoryProjects {
    pub fn new() -> Self {
        Self {
            projects: Mutex::new(HashMap::new()),
            test_runs: Mutex::new(HashMap::new()),
        }
    }

    /// A catalog pre-seeded with a few projects and runs, for the demo CLI
    /// and tests.
    pub fn with_demo_data() -> Self {
        let store = Self::new();
        let now = Utc::now();

        for (name, description, days_old) in [
            ("Alpha Growth", "Tech-heavy growth portfolio", 30),
            ("Steady Income", "Dividend-focused income portfolio", 12),
            ("Barbell", "Low-risk core with speculative tail", 2),
        ] {
            let mut project = Project {
                project_id: Uuid::new_v4().to_string(),
                name: name.to_string(),
                description: description.to_string(),
                created: now - Duration::days(days_old),
                last_modified: now - Duration::days(days_old / 2),
                blocks: HashMap::new(),
                test_runs: Vec::new(),
            };
            project.blocks.insert(
                "classical".to_string(),
                Block {
                    placed: true,
                    position: Some((120.0, 80.0)),
                    parameters: json!({"volatility": 0.18, "steps": 20}),
                },
            );
            store.projects.lock().unwrap().insert(project.name.to_lowercase(), project);
        }

        for (suffix, block_type, asset, days_old) in [
            ("0001", "classical", "AAPL", 9),
            ("0002", "quantum", "MSFT", 1),
            ("0003", "hybrid", "AAPL", 0),
        ] {
            let run = TestRun {
                test_run_id: format!("test-run-{}", suffix),
                project_id: "alpha growth".to_string(),
                timestamp: now - Duration::days(days_old),
                block_type: block_type.to_string(),
                asset: asset.to_string(),
                parameter: "volatility".to_string(),
                range_tested: vec![-0.05, 0.05],
                parameters: json!({"steps": 20, "asset": asset}),
                results: vec![
                    json!({"delta": -0.05, "portfolio_volatility": 0.151}),
                    json!({"delta": 0.0, "portfolio_volatility": 0.162}),
                    json!({"delta": 0.05, "portfolio_volatility": 0.176}),
                ],
                baseline_volatility_daily: Some(0.0102),
                baseline_volatility_annualized: Some(0.162),
                analytics: None,
            };
            store.test_runs.lock().unwrap().insert(run.test_run_id.clone(), run);
        }

        store
    }
}

impl Default for InMemoryProjects {
    fn default() -> Self {
        Self::new()
    }
}

impl ProjectService for InMemoryProjects {
    fn list_projects(&self) -> Result<Vec<Project>> {
        Ok(self.projects.lock().unwrap().values().cloned().collect())
    }

    fn load_project(&self, name: &str) -> Result<Option<Project>> {
        Ok(self.projects.lock().unwrap().get(&name.to_lowercase()).cloned())
    }

    fn create_project(&self, name: &str, description: &str) -> Result<Project> {
        let mut projects = self.projects.lock().unwrap();
        let key = name.to_lowercase();
        if projects.contains_key(&key) {
            return Err(Error::Catalog(format!("Project '{}' already exists", name)));
        }

        let now = Utc::now();
        let project = Project {
            project_id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            description: description.to_string(),
            created: now,
            last_modified: now,
            blocks: HashMap::new(),
            test_runs: Vec::new(),
        };
        projects.insert(key, project.clone());
        Ok(project)
    }

    fn update_block_parameters(
        &self,
        project_name: &str,
        block_type: &str,
        parameters: Value,
    ) -> Result<Project> {
        if !BLOCK_TYPES.contains(&block_type) {
            return Err(Error::Catalog(format!(
                "Unknown block type '{}'. Valid types: {}",
                block_type,
                BLOCK_TYPES.join(", ")
            )));
        }

        let mut projects = self.projects.lock().unwrap();
        let project = projects
            .get_mut(&project_name.to_lowercase())
            .ok_or_else(|| Error::Catalog(format!("Project '{}' not found", project_name)))?;

        let block = project
            .blocks
            .entry(block_type.to_string())
            .or_insert_with(|| Block {
                placed: true,
                position: None,
                parameters: json!({}),
            });
        block.parameters = parameters;
        project.last_modified = Utc::now();
        Ok(project.clone())
    }

    fn list_test_runs(&self) -> Result<Vec<TestRun>> {
        Ok(self.test_runs.lock().unwrap().values().cloned().collect())
    }

    fn load_test_run(&self, test_run_id: &str) -> Result<Option<TestRun>> {
        Ok(self.test_runs.lock().unwrap().get(test_run_id).cloned())
    }
}

/// Market data served from a fixed quote table.
pub struct StaticMarketData {
    quotes: HashMap<String, f64>,
}

impl StaticMarketData {
    pub fn new(quotes: HashMap<String, f64>) -> Self {
        Self { quotes }
    }

    /// A small default quote table for the demo CLI and tests.
    pub fn with_demo_data() -> Self {
        let quotes = [
            ("AAPL", 227.52),
            ("MSFT", 424.15),
            ("GOOG", 191.3),
            ("SPY", 563.8),
        ]
        .into_iter()
        .map(|(s, p)| (s.to_string(), p))
        .collect();
        Self::new(quotes)
    }
}

impl MarketDataService for StaticMarketData {
    fn quote(&self, symbol: &str) -> Result<Option<Quote>> {
        Ok(self.quotes.get(&symbol.to_uppercase()).map(|price| Quote {
            symbol: symbol.to_uppercase(),
            price: *price,
            currency: "USD".to_string(),
            as_of: Utc::now(),
        }))
    }
}
