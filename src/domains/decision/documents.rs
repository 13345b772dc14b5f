//! Typed decision documents and their parsing.
//!
//! A completion is accepted only if it parses into the full document and
//! passes [`DecisionDocument::check`]; otherwise the fallback is used.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

pub trait DecisionDocument: Serialize + DeserializeOwned + Sized {
    /// Document returned whenever the completion cannot be used.
    fn fallback() -> Self;

    /// Range checks beyond what the type system enforces.
    fn check(&self) -> Result<(), String> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeAction {
    Buy,
    Sell,
    Hold,
    ClosePosition,
    AllocateLiquidity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketDecision {
    pub action: TradeAction,
    pub asset: String,
    pub amount: f64,
    pub price: f64,
    pub confidence: f64,
    pub reasoning: String,
    pub risk_level: RiskLevel,
    pub expected_profit: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
}

impl DecisionDocument for MarketDecision {
    fn fallback() -> Self {
        Self {
            action: TradeAction::Hold,
            asset: "APT".to_string(),
            amount: 0.0,
            price: 0.0,
            confidence: 0.1,
            reasoning: "Error in AI analysis, defaulting to hold".to_string(),
            risk_level: RiskLevel::Low,
            expected_profit: 0.0,
            stop_loss: 0.0,
            take_profit: 0.0,
        }
    }

    fn check(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(format!("confidence {} outside 0..1", self.confidence));
        }
        if self.amount < 0.0 {
            return Err(format!("negative amount {}", self.amount));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub position_size_adjustment: f64,
    pub stop_loss_distance: f64,
    pub take_profit_distance: f64,
    pub max_exposure_percent: f64,
    pub risk_score: f64,
    pub recommendations: Vec<String>,
}

impl DecisionDocument for RiskAssessment {
    fn fallback() -> Self {
        Self {
            position_size_adjustment: 0.0,
            stop_loss_distance: 5.0,
            take_profit_distance: 10.0,
            max_exposure_percent: 10.0,
            risk_score: 5.0,
            recommendations: vec![
                "Maintain current position".to_string(),
                "Monitor market conditions".to_string(),
            ],
        }
    }

    fn check(&self) -> Result<(), String> {
        if !(-1.0..=1.0).contains(&self.position_size_adjustment) {
            return Err(format!(
                "position_size_adjustment {} outside -1..1",
                self.position_size_adjustment
            ));
        }
        if !(1.0..=10.0).contains(&self.risk_score) {
            return Err(format!("risk_score {} outside 1..10", self.risk_score));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionStep {
    pub order: u32,
    pub action: String,
    #[serde(default)]
    pub parameters: Value,
    pub estimated_gas: f64,
    pub success_probability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    pub steps: Vec<ExecutionStep>,
    pub total_estimated_cost: f64,
    pub execution_time_estimate: String,
    pub prerequisites: Vec<String>,
    pub risk_mitigation: Vec<String>,
}

impl DecisionDocument for ExecutionPlan {
    fn fallback() -> Self {
        Self {
            steps: Vec::new(),
            total_estimated_cost: 0.0,
            execution_time_estimate: "Unknown".to_string(),
            prerequisites: Vec::new(),
            risk_mitigation: Vec::new(),
        }
    }
}

/// Strip a surrounding markdown code fence, if any.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. `json`) on the opening line.
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Parse completion text into a checked document.
pub fn parse_document<D: DecisionDocument>(text: &str) -> Result<D, String> {
    let body = strip_code_fence(text);
    let document: D = serde_json::from_str(body).map_err(|e| e.to_string())?;
    document.check()?;
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const DECISION: &str = r#"{
        "action": "buy", "asset": "APT", "amount": 2.0, "price": 12.4,
        "confidence": 0.72, "reasoning": "uptrend", "risk_level": "medium",
        "expected_profit": 0.3, "stop_loss": 11.8, "take_profit": 13.1
    }"#;

    #[test]
    fn test_parse_plain_json() {
        let decision: MarketDecision = parse_document(DECISION).unwrap();
        assert_eq!(decision.action, TradeAction::Buy);
        assert_eq!(decision.risk_level, RiskLevel::Medium);
    }

    #[test]
    fn test_parse_fenced_json() {
        let fenced = format!("```json\n{DECISION}\n```");
        let decision: MarketDecision = parse_document(&fenced).unwrap();
        assert_eq!(decision.confidence, 0.72);
    }

    #[test]
    fn test_missing_field_rejected() {
        let partial = r#"{ "action": "hold", "asset": "APT" }"#;
        assert!(parse_document::<MarketDecision>(partial).is_err());
    }

    #[test]
    fn test_out_of_range_rejected() {
        let bad = DECISION.replace("0.72", "7.2");
        assert!(
            parse_document::<MarketDecision>(&bad)
                .unwrap_err()
                .contains("confidence")
        );

        let risk = json!({
            "position_size_adjustment": 0.0, "stop_loss_distance": 5, "take_profit_distance": 10,
            "max_exposure_percent": 10, "risk_score": 11, "recommendations": []
        })
        .to_string();
        assert!(parse_document::<RiskAssessment>(&risk).is_err());
    }

    #[test]
    fn test_fallback_documents_match_wire_shape() {
        assert_eq!(
            serde_json::to_value(MarketDecision::fallback()).unwrap(),
            json!({
                "action": "hold", "asset": "APT", "amount": 0.0, "price": 0.0,
                "confidence": 0.1, "reasoning": "Error in AI analysis, defaulting to hold",
                "risk_level": "low", "expected_profit": 0.0, "stop_loss": 0.0, "take_profit": 0.0
            })
        );
        assert_eq!(
            serde_json::to_value(RiskAssessment::fallback()).unwrap(),
            json!({
                "position_size_adjustment": 0.0, "stop_loss_distance": 5.0,
                "take_profit_distance": 10.0, "max_exposure_percent": 10.0, "risk_score": 5.0,
                "recommendations": ["Maintain current position", "Monitor market conditions"]
            })
        );
        assert_eq!(
            serde_json::to_value(ExecutionPlan::fallback()).unwrap(),
            json!({
                "steps": [], "total_estimated_cost": 0.0, "execution_time_estimate": "Unknown",
                "prerequisites": [], "risk_mitigation": []
            })
        );
    }

    #[test]
    fn test_execution_plan_with_steps() {
        let plan: ExecutionPlan = parse_document(
            &json!({
                "steps": [{ "order": 1, "action": "allocate", "estimated_gas": 0.002, "success_probability": 0.9 }],
                "total_estimated_cost": 0.002, "execution_time_estimate": "1 minute",
                "prerequisites": ["funded vault"], "risk_mitigation": []
            })
            .to_string(),
        )
        .unwrap();
        assert_eq!(plan.steps[0].parameters, Value::Null);
    }
}
