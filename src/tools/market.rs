//! Market data tool - quote lookups

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::services::MarketDataService;
use crate::Result;

use super::{require_str, Tool, ToolResult};

/// Look up the latest quote for a symbol
pub struct MarketQuoteTool {
    market: Arc<dyn MarketDataService>,
}

impl MarketQuoteTool {
    pub fn new(market: Arc<dyn MarketDataService>) -> Self {
        Self { market }
    }
}

#[async_trait]
impl Tool for MarketQuoteTool {
    fn name(&self) -> &str { "market_quote" }
    fn description(&self) -> &str {
        "Look up the latest market quote for an asset symbol"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "symbol": {
                    "type": "string",
                    "description": "Ticker symbol, e.g. AAPL"
                }
            },
            "required": ["symbol"]
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let symbol = match require_str(&args, "symbol") {
            Ok(symbol) => symbol,
            Err(result) => return Ok(result),
        };

        match self.market.quote(symbol)? {
            Some(quote) => Ok(ToolResult::ok(
                format!("{} is at {:.2} {}", quote.symbol, quote.price, quote.currency),
                json!(quote),
            )),
            None => Ok(ToolResult::err(format!("No quote available for '{}'", symbol))),
        }
    }
}
