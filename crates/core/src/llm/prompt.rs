use crate::domain::ratios::FinancialRatios;

// Output quality depends on this wording; keep edits deliberate.
pub const SYSTEM_PROMPT: &str = concat!(
    // The trailing space on the first line is part of the prompt.
    "You are a financial risk assessment AI that uses Gradient Boosting classification methodology. \n",
    r#"You analyze financial ratios and provide risk assessments.

IMPORTANT: You must respond with ONLY a valid JSON object, no markdown, no explanation, just the JSON.

The JSON must have this exact structure:
{
  "overallRisk": "low" | "medium" | "high",
  "riskScore": number (0-100, higher = healthier),
  "confidence": number (80-99),
  "categoryScores": {
    "liquidity": number (0-100),
    "profitability": number (0-100),
    "leverage": number (0-100),
    "efficiency": number (0-100)
  },
  "factors": [
    {
      "name": "string",
      "impact": "positive" | "negative" | "neutral",
      "description": "string"
    }
  ]
}

Risk Classification Guidelines (Gradient Boosting approach):
- LIQUIDITY: Current Ratio < 1 is concerning, > 2 is strong. Quick Ratio < 0.5 is risky.
- PROFITABILITY: Negative margins = high risk. ROE > 15% is strong.
- LEVERAGE: Debt/Equity > 2 is risky. Interest Coverage < 1.5 is critical.
- EFFICIENCY: Low turnover ratios indicate operational inefficiency.

Score each category 0-100, then weight: Liquidity 25%, Profitability 30%, Leverage 25%, Efficiency 20%.
Overall score >= 65 = Low Risk, 40-64 = Medium Risk, < 40 = High Risk.

Provide 3-4 key risk factors with their impact."#
);

pub fn user_prompt(r: &FinancialRatios) -> String {
    format!(
        "Analyze these financial ratios and return the risk assessment JSON:

LIQUIDITY RATIOS:
- Current Ratio: {}
- Quick Ratio: {}
- Cash Ratio: {}

PROFITABILITY RATIOS:
- Gross Profit Margin: {}%
- Net Profit Margin: {}%
- Return on Assets: {}%
- Return on Equity: {}%

LEVERAGE RATIOS:
- Debt to Equity: {}
- Debt Ratio: {}
- Interest Coverage: {}

EFFICIENCY RATIOS:
- Asset Turnover: {}
- Inventory Turnover: {}
- Receivables Turnover: {}

Return ONLY the JSON object with your assessment.",
        r.current_ratio,
        r.quick_ratio,
        r.cash_ratio,
        r.gross_profit_margin,
        r.net_profit_margin,
        r.return_on_assets,
        r.return_on_equity,
        r.debt_to_equity,
        r.debt_ratio,
        r.interest_coverage,
        r.asset_turnover,
        r.inventory_turnover,
        r.receivables_turnover,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_prompt_carries_weights_and_thresholds() {
        assert!(SYSTEM_PROMPT.contains(
            "Liquidity 25%, Profitability 30%, Leverage 25%, Efficiency 20%"
        ));
        assert!(SYSTEM_PROMPT.contains("Overall score >= 65 = Low Risk, 40-64 = Medium Risk, < 40 = High Risk."));
        assert!(SYSTEM_PROMPT.starts_with("You are a financial risk assessment AI"));
        assert!(SYSTEM_PROMPT.ends_with("Provide 3-4 key risk factors with their impact."));
    }

    #[test]
    fn user_prompt_groups_ratios_by_category() {
        let ratios = FinancialRatios {
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
        };
        let prompt = user_prompt(&ratios);

        assert!(prompt.starts_with("Analyze these financial ratios"));
        assert!(prompt.contains("LIQUIDITY RATIOS:\n- Current Ratio: 0.7\n- Quick Ratio: 0.4\n- Cash Ratio: 0.1\n"));
        assert!(prompt.contains("- Gross Profit Margin: 15%\n- Net Profit Margin: -2%"));
        assert!(prompt.contains("LEVERAGE RATIOS:\n- Debt to Equity: 4.5\n- Debt Ratio: 0.85\n- Interest Coverage: 0.8\n"));
        assert!(prompt.contains("- Receivables Turnover: 3\n\nReturn ONLY the JSON object"));
    }
}
