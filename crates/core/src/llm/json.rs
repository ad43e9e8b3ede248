use crate::domain::assessment::RiskAssessment;
use crate::domain::contract::LlmRiskAssessment;
use crate::llm::error::PredictError;

/// Removes optional markdown fencing around a model reply: a leading
/// "```json" or "```", and a trailing "```".
pub fn strip_code_fences(text: &str) -> &str {
    let mut inner = text.trim();
    if let Some(rest) = inner.strip_prefix("```json") {
        inner = rest;
    }
    if let Some(rest) = inner.strip_prefix("```") {
        inner = rest;
    }
    if let Some(rest) = inner.strip_suffix("```") {
        inner = rest;
    }
    inner.trim()
}

pub fn parse_assessment(text: &str) -> Result<RiskAssessment, PredictError> {
    let json_str = strip_code_fences(text);
    let parsed = serde_json::from_str::<LlmRiskAssessment>(json_str)
        .map_err(|e| PredictError::MalformedPayload(e.to_string()))?;
    Ok(parsed.validate_and_into_assessment())
}
