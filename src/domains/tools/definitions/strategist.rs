//! Strategist server tools: LLM-backed trading decisions.

use std::sync::Arc;

use rmcp::model::JsonObject;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use crate::domains::decision::DecisionEngine;
use crate::domains::tools::{AdapterError, ToolError, ToolRegistry};

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarketConditionsParams {
    /// Current market data snapshot.
    pub market_data: JsonObject,
    /// Current vault statistics.
    pub vault_stats: JsonObject,
    /// Open positions.
    pub positions: Vec<Value>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RiskParams {
    /// Position to evaluate.
    pub position: JsonObject,
    /// Market volatility in percent.
    pub market_volatility: f64,
    /// Vault exposure in percent.
    pub vault_exposure: f64,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionPlanParams {
    /// Trading decision to execute.
    pub decision: JsonObject,
    /// Open positions.
    pub current_positions: Vec<Value>,
    /// Liquidity available in APT.
    pub available_liquidity: f64,
}

pub const ANALYZE_MARKET_CONDITIONS: &str = "analyze_market_conditions";
pub const EVALUATE_RISK_PARAMETERS: &str = "evaluate_risk_parameters";
pub const GENERATE_EXECUTION_PLAN: &str = "generate_execution_plan";

pub fn registry() -> Result<ToolRegistry<DecisionEngine>, ToolError> {
    ToolRegistry::builder()
        .tool(
            ANALYZE_MARKET_CONDITIONS,
            "Analyze market data, vault stats and positions to produce a trading decision",
            |e: Arc<DecisionEngine>, p: MarketConditionsParams| async move {
                Ok::<_, AdapterError>(
                    e.analyze_market_conditions(
                        &Value::Object(p.market_data),
                        &Value::Object(p.vault_stats),
                        &p.positions,
                    )
                    .await,
                )
            },
        )
        .tool(
            EVALUATE_RISK_PARAMETERS,
            "Evaluate risk management parameters for a position",
            |e: Arc<DecisionEngine>, p: RiskParams| async move {
                Ok::<_, AdapterError>(
                    e.evaluate_risk_parameters(
                        &Value::Object(p.position),
                        p.market_volatility,
                        p.vault_exposure,
                    )
                    .await,
                )
            },
        )
        .tool(
            GENERATE_EXECUTION_PLAN,
            "Generate a step-by-step execution plan for a trading decision",
            |e: Arc<DecisionEngine>, p: ExecutionPlanParams| async move {
                Ok::<_, AdapterError>(
                    e.generate_execution_plan(
                        &Value::Object(p.decision),
                        &p.current_positions,
                        p.available_liquidity,
                    )
                    .await,
                )
            },
        )
        .build()
}
