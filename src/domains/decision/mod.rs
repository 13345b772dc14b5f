//! Decision-engine domain.

mod completion;
pub mod documents;
mod engine;

pub use completion::{CompletionClient, CompletionError, CompletionRequest, GroqClient};
pub use documents::{DecisionDocument, ExecutionPlan, ExecutionStep, MarketDecision, RiskAssessment};
pub use engine::DecisionEngine;
