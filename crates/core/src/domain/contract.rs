use crate::domain::assessment::{CategoryScores, Impact, RiskAssessment, RiskFactor, RiskLevel};
use serde::{Deserialize, Serialize};

const SCORE_MIN: f64 = 0.0;
const SCORE_MAX: f64 = 100.0;

/// Assessment exactly as the model emits it. Enum fields are strict (an
/// unknown value fails deserialization); numeric fields are loose and get
/// normalized by [`LlmRiskAssessment::validate_and_into_assessment`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmRiskAssessment {
    pub overall_risk: RiskLevel,
    pub risk_score: f64,
    pub confidence: f64,
    pub category_scores: LlmCategoryScores,
    pub factors: Vec<LlmRiskFactor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmCategoryScores {
    pub liquidity: f64,
    pub profitability: f64,
    pub leverage: f64,
    pub efficiency: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmRiskFactor {
    pub name: String,
    pub impact: Impact,
    pub description: String,
}

fn clamp_score(field: &'static str, raw: f64) -> i32 {
    let clamped = raw.round().clamp(SCORE_MIN, SCORE_MAX);
    if clamped != raw {
        tracing::debug!(field, raw, clamped, "normalized model score");
    }
    clamped as i32
}

impl LlmRiskAssessment {
    /// Rounds and clamps every score into `0..=100` and trims factor text.
    pub fn validate_and_into_assessment(self) -> RiskAssessment {
        let factors = self
            .factors
            .into_iter()
            .map(|f| RiskFactor {
                name: f.name.trim().to_string(),
                impact: f.impact,
                description: f.description.trim().to_string(),
            })
            .collect();

        RiskAssessment {
            overall_risk: self.overall_risk,
            risk_score: clamp_score("riskScore", self.risk_score),
            confidence: clamp_score("confidence", self.confidence),
            category_scores: CategoryScores {
                liquidity: clamp_score("liquidity", self.category_scores.liquidity),
                profitability: clamp_score("profitability", self.category_scores.profitability),
                leverage: clamp_score("leverage", self.category_scores.leverage),
                efficiency: clamp_score("efficiency", self.category_scores.efficiency),
            },
            factors,
        }
    }
}
