//! LLM-backed decision engine.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{info, warn};

use super::completion::{CompletionClient, CompletionError, CompletionRequest};
use super::documents::{DecisionDocument, ExecutionPlan, MarketDecision, RiskAssessment, parse_document};
use crate::core::config::DecisionConfig;

const STRATEGIST_SYSTEM: &str = "You are an expert DeFi trading strategist for HyperFill on Aptos. \
Make data-driven decisions to maximize profits while managing risk. Always respond with valid JSON.";

const RISK_SYSTEM: &str = "You are a risk management specialist. \
Provide conservative, data-driven risk parameters to protect capital. Always respond with valid JSON.";

const EXECUTION_SYSTEM: &str = "You are an execution specialist. \
Create detailed, actionable plans for trading decisions on Aptos blockchain. Always respond with valid JSON.";

/// Sampling parameters of one operation.
#[derive(Debug, Clone, Copy)]
struct Sampling {
    temperature: f32,
    max_tokens: u32,
}

const MARKET_SAMPLING: Sampling = Sampling {
    temperature: 0.3,
    max_tokens: 1000,
};
const RISK_SAMPLING: Sampling = Sampling {
    temperature: 0.2,
    max_tokens: 500,
};
const EXECUTION_SAMPLING: Sampling = Sampling {
    temperature: 0.1,
    max_tokens: 800,
};

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Decision-engine adapter.
pub struct DecisionEngine {
    completion: Arc<dyn CompletionClient>,
    config: DecisionConfig,
    timeout: Duration,
}

impl DecisionEngine {
    pub fn new(completion: Arc<dyn CompletionClient>, config: DecisionConfig, timeout: Duration) -> Self {
        Self {
            completion,
            config,
            timeout,
        }
    }

    pub async fn analyze_market_conditions(
        &self,
        market_data: &Value,
        vault_stats: &Value,
        positions: &[Value],
    ) -> MarketDecision {
        let prompt = format!(
            "As the Executive Agent for HyperFill trading platform on Aptos, analyze the following data and provide trading decisions:

MARKET DATA:
{}

VAULT STATS:
{}

CURRENT POSITIONS:
{}

Based on this data, provide a strategic trading decision with the following format:
{{
  \"action\": \"buy|sell|hold|close_position|allocate_liquidity\",
  \"asset\": \"APT\",
  \"amount\": number,
  \"price\": number,
  \"confidence\": number (0-1),
  \"reasoning\": \"explanation of decision\",
  \"risk_level\": \"low|medium|high\",
  \"expected_profit\": number,
  \"stop_loss\": number,
  \"take_profit\": number
}}

Consider market volatility and trends, available liquidity in the vault, risk management, \
profit optimization and position sizing based on vault capacity.",
            pretty(market_data),
            pretty(vault_stats),
            pretty(&Value::Array(positions.to_vec())),
        );
        self.decide(&self.config.strategy_model, STRATEGIST_SYSTEM, prompt, MARKET_SAMPLING)
            .await
    }

    pub async fn evaluate_risk_parameters(
        &self,
        position: &Value,
        market_volatility: f64,
        vault_exposure: f64,
    ) -> RiskAssessment {
        let prompt = format!(
            "Evaluate risk parameters for a trading position:

POSITION:
{}

MARKET VOLATILITY: {market_volatility}%
VAULT EXPOSURE: {vault_exposure}%

Provide risk management recommendations:
{{
  \"position_size_adjustment\": number (-1 to 1, where 0 = no change),
  \"stop_loss_distance\": number (percentage),
  \"take_profit_distance\": number (percentage),
  \"max_exposure_percent\": number,
  \"risk_score\": number (1-10),
  \"recommendations\": [\"string array of specific actions\"]
}}",
            pretty(position),
        );
        self.decide(&self.config.risk_model, RISK_SYSTEM, prompt, RISK_SAMPLING)
            .await
    }

    pub async fn generate_execution_plan(
        &self,
        decision: &Value,
        current_positions: &[Value],
        available_liquidity: f64,
    ) -> ExecutionPlan {
        let prompt = format!(
            "Generate a detailed execution plan for this trading decision:

DECISION:
{}

CURRENT POSITIONS:
{}

AVAILABLE LIQUIDITY: {available_liquidity} APT

Create a step-by-step execution plan:
{{
  \"steps\": [
    {{
      \"order\": number,
      \"action\": \"string\",
      \"parameters\": {{}},
      \"estimated_gas\": number,
      \"success_probability\": number
    }}
  ],
  \"total_estimated_cost\": number,
  \"execution_time_estimate\": \"string\",
  \"prerequisites\": [\"string array\"],
  \"risk_mitigation\": [\"string array\"]
}}",
            pretty(decision),
            pretty(&Value::Array(current_positions.to_vec())),
        );
        self.decide(&self.config.execution_model, EXECUTION_SYSTEM, prompt, EXECUTION_SAMPLING)
            .await
    }

    /// Run one completion and parse it, falling back on any failure.
    async fn decide<D: DecisionDocument>(
        &self,
        model: &str,
        system: &str,
        prompt: String,
        sampling: Sampling,
    ) -> D {
        let request = CompletionRequest {
            model: model.to_string(),
            system: system.to_string(),
            prompt,
            temperature: sampling.temperature,
            max_tokens: sampling.max_tokens,
        };

        let text = match tokio::time::timeout(self.timeout, self.completion.complete(request)).await {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => return Self::fallback(model, &e.to_string()),
            Err(_) => return Self::fallback(model, &CompletionError::Timeout(self.timeout).to_string()),
        };

        match parse_document::<D>(&text) {
            Ok(document) => {
                info!(model, "Decision document accepted");
                document
            }
            Err(reason) => Self::fallback(model, &format!("unusable completion: {reason}")),
        }
    }

    fn fallback<D: DecisionDocument>(model: &str, reason: &str) -> D {
        warn!(model, "Decision engine falling back: {}", reason);
        D::fallback()
    }
}
