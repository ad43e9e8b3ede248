//! Industry benchmark scoring and the sample ratio sets offered next to the
//! input form.

use crate::domain::assessment::{CategoryScores, RiskAssessment, RiskLevel};
use crate::domain::ratios::{FinancialRatios, IndustryPreset};
use serde::Serialize;

/// Preset used for comparison when the caller does not pick one.
pub const DEFAULT_COMPARISON_INDUSTRY: &str = "technology";

// Rounds half toward positive infinity so `x.5` scores land where a
// browser's `Math.round` puts them.
fn round_score(x: f64) -> i32 {
    (x.max(0.0) + 0.5).floor() as i32
}

fn average(scores: &CategoryScores) -> i32 {
    let sum = scores.liquidity + scores.profitability + scores.leverage + scores.efficiency;
    round_score(f64::from(sum) / 4.0)
}

/// Heuristic 0..=100 category scores for a ratio set, higher meaning
/// healthier. Deterministic; no model involved.
pub fn benchmark_scores(r: &FinancialRatios) -> CategoryScores {
    let liquidity = (r.current_ratio / 2.0 * 50.0
        + r.quick_ratio / 1.5 * 30.0
        + r.cash_ratio / 0.5 * 20.0)
        .min(100.0);
    let profitability = (r.gross_profit_margin / 50.0 * 25.0
        + r.net_profit_margin / 15.0 * 25.0
        + r.return_on_assets / 10.0 * 25.0
        + r.return_on_equity / 20.0 * 25.0)
        .min(100.0);
    let coverage_shortfall = ((5.0 - r.interest_coverage) / 5.0).max(0.0);
    let leverage = (100.0
        - (r.debt_to_equity / 3.0 * 40.0 + r.debt_ratio / 1.0 * 30.0 + coverage_shortfall * 30.0))
        .min(100.0);
    let efficiency = (r.asset_turnover / 2.0 * 40.0
        + r.inventory_turnover / 10.0 * 30.0
        + r.receivables_turnover / 12.0 * 30.0)
        .min(100.0);

    CategoryScores {
        liquidity: round_score(liquidity),
        profitability: round_score(profitability),
        leverage: round_score(leverage),
        efficiency: round_score(efficiency),
    }
}

/// An assessment's category scores set against an industry's benchmark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndustryComparison {
    pub industry: &'static str,
    pub industry_name: &'static str,
    pub yours: CategoryScores,
    pub industry_scores: CategoryScores,
    pub your_average: i32,
    pub industry_average: i32,
    /// `your_average - industry_average`; negative means below the industry.
    pub difference: i32,
}

impl IndustryPreset {
    pub fn benchmark_scores(&self) -> CategoryScores {
        benchmark_scores(&self.ratios)
    }

    pub fn compare(&self, assessment: &RiskAssessment) -> IndustryComparison {
        let industry_scores = self.benchmark_scores();
        let your_average = average(&assessment.category_scores);
        let industry_average = average(&industry_scores);
        IndustryComparison {
            industry: self.key,
            industry_name: self.name,
            yours: assessment.category_scores,
            industry_scores,
            your_average,
            industry_average,
            difference: your_average - industry_average,
        }
    }
}

/// Example ratio set for a company of the given risk profile.
pub fn sample_ratios(level: RiskLevel) -> FinancialRatios {
    match level {
        RiskLevel::Low => FinancialRatios {
            current_ratio: 2.5,
            quick_ratio: 1.8,
            cash_ratio: 0.6,
            gross_profit_margin: 45.0,
            net_profit_margin: 18.0,
            return_on_assets: 15.0,
            return_on_equity: 22.0,
            debt_to_equity: 0.5,
            debt_ratio: 0.3,
            interest_coverage: 12.0,
            asset_turnover: 1.5,
            inventory_turnover: 10.0,
            receivables_turnover: 12.0,
        },
        RiskLevel::Medium => FinancialRatios {
            current_ratio: 1.3,
            quick_ratio: 0.9,
            cash_ratio: 0.25,
            gross_profit_margin: 28.0,
            net_profit_margin: 8.0,
            return_on_assets: 6.0,
            return_on_equity: 12.0,
            debt_to_equity: 1.8,
            debt_ratio: 0.6,
            interest_coverage: 3.0,
            asset_turnover: 0.9,
            inventory_turnover: 5.0,
            receivables_turnover: 6.0,
        },
        RiskLevel::High => FinancialRatios {
            current_ratio: 0.7,
            quick_ratio: 0.4,
            cash_ratio: 0.1,
            gross_profit_margin: 15.0,
            net_profit_margin: -2.0,
            return_on_assets: -3.0,
            return_on_equity: -8.0,
            debt_to_equity: 4.5,
            debt_ratio: 0.85,
            interest_coverage: 0.8,
            asset_turnover: 0.5,
            inventory_turnover: 2.0,
            receivables_turnover: 3.0,
        },
    }
}
