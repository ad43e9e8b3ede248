use crate::domain::assessment::RiskAssessment;
use crate::domain::ratios::FinancialRatios;
use crate::llm::error::PredictError;

pub mod error;
pub mod gateway;
pub mod json;
pub mod prompt;

/// A remote model that classifies a ratio set into a risk assessment.
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    fn model(&self) -> &str;

    async fn predict_risk(&self, ratios: &FinancialRatios) -> Result<RiskAssessment, PredictError>;
}
