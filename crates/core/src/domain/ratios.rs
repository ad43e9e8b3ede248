use anyhow::bail;
use serde::{Deserialize, Serialize};

/// The 13-field ratio set describing one company's financial posture.
///
/// Values are unbounded; the only normalization applied is that free-text
/// input which is not a finite number becomes `0.0` (see [`parse_ratio_input`]).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialRatios {
    // Liquidity
    pub current_ratio: f64,
    pub quick_ratio: f64,
    pub cash_ratio: f64,
    // Profitability (percentages)
    pub gross_profit_margin: f64,
    pub net_profit_margin: f64,
    pub return_on_assets: f64,
    pub return_on_equity: f64,
    // Leverage
    pub debt_to_equity: f64,
    pub debt_ratio: f64,
    pub interest_coverage: f64,
    // Efficiency
    pub asset_turnover: f64,
    pub inventory_turnover: f64,
    pub receivables_turnover: f64,
}

impl Default for FinancialRatios {
    /// Starting values of the input form.
    fn default() -> Self {
        Self {
            current_ratio: 1.5,
            quick_ratio: 1.0,
            cash_ratio: 0.3,
            gross_profit_margin: 30.0,
            net_profit_margin: 10.0,
            return_on_assets: 8.0,
            return_on_equity: 15.0,
            debt_to_equity: 1.2,
            debt_ratio: 0.55,
            interest_coverage: 4.0,
            asset_turnover: 1.2,
            inventory_turnover: 6.0,
            receivables_turnover: 8.0,
        }
    }
}

/// Coerces raw form text into a ratio value.
///
/// Reads the longest numeric prefix after leading whitespace (`"1.5x"` is
/// `1.5`, `"-3e2kg"` is `-300`). Input with no numeric prefix, or one that
/// overflows, becomes `0.0`; this is never reported to the caller.
pub fn parse_ratio_input(raw: &str) -> f64 {
    numeric_prefix(raw.trim_start())
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// `[+-]digits[.digits][(e|E)[+-]digits]`, with at least one mantissa digit.
fn numeric_prefix(s: &str) -> &str {
    let bytes = s.as_bytes();
    let digits_from = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let int_end = digits_from(end);
    let mut mantissa_digits = int_end - end;
    end = int_end;

    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        mantissa_digits += frac_end - (end + 1);
        end = frac_end;
    }
    if mantissa_digits == 0 {
        return "";
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_end = digits_from(exp);
        if exp_end > exp {
            end = exp_end;
        }
    }
    &s[..end]
}

impl FinancialRatios {
    pub const FIELD_NAMES: [&'static str; 13] = [
        "currentRatio",
        "quickRatio",
        "cashRatio",
        "grossProfitMargin",
        "netProfitMargin",
        "returnOnAssets",
        "returnOnEquity",
        "debtToEquity",
        "debtRatio",
        "interestCoverage",
        "assetTurnover",
        "inventoryTurnover",
        "receivablesTurnover",
    ];

    fn field_mut(&mut self, name: &str) -> Option<&mut f64> {
        let normalized: String = name
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();

        let slot = match normalized.as_str() {
            "currentratio" => &mut self.current_ratio,
            "quickratio" => &mut self.quick_ratio,
            "cashratio" => &mut self.cash_ratio,
            "grossprofitmargin" => &mut self.gross_profit_margin,
            "netprofitmargin" => &mut self.net_profit_margin,
            "returnonassets" => &mut self.return_on_assets,
            "returnonequity" => &mut self.return_on_equity,
            "debttoequity" => &mut self.debt_to_equity,
            "debtratio" => &mut self.debt_ratio,
            "interestcoverage" => &mut self.interest_coverage,
            "assetturnover" => &mut self.asset_turnover,
            "inventoryturnover" => &mut self.inventory_turnover,
            "receivablesturnover" => &mut self.receivables_turnover,
            _ => return None,
        };
        Some(slot)
    }

    /// Sets one ratio from raw text. Accepts camelCase, snake_case or
    /// kebab-case field names. Unknown names are an error; unparsable values
    /// are not (they become `0.0`).
    pub fn set_from_input(&mut self, name: &str, raw: &str) -> anyhow::Result<()> {
        let Some(slot) = self.field_mut(name) else {
            bail!(
                "unknown ratio '{name}' (expected one of: {})",
                Self::FIELD_NAMES.join(", ")
            );
        };
        *slot = parse_ratio_input(raw);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct IndustryPreset {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub ratios: FinancialRatios,
}

pub static INDUSTRY_PRESETS: [IndustryPreset; 5] = [
    IndustryPreset {
        key: "retail",
        name: "Retail",
        description: "Avg. retail industry benchmarks",
        ratios: FinancialRatios {
            current_ratio: 1.5,
            quick_ratio: 0.5,
            cash_ratio: 0.2,
            gross_profit_margin: 25.0,
            net_profit_margin: 3.0,
            return_on_assets: 5.0,
            return_on_equity: 12.0,
            debt_to_equity: 1.5,
            debt_ratio: 0.6,
            interest_coverage: 4.0,
            asset_turnover: 2.5,
            inventory_turnover: 8.0,
            receivables_turnover: 15.0,
        },
    },
    IndustryPreset {
        key: "technology",
        name: "Technology",
        description: "Avg. tech industry benchmarks",
        ratios: FinancialRatios {
            current_ratio: 2.8,
            quick_ratio: 2.5,
            cash_ratio: 1.5,
            gross_profit_margin: 65.0,
            net_profit_margin: 20.0,
            return_on_assets: 12.0,
            return_on_equity: 25.0,
            debt_to_equity: 0.4,
            debt_ratio: 0.25,
            interest_coverage: 20.0,
            asset_turnover: 0.8,
            inventory_turnover: 12.0,
            receivables_turnover: 10.0,
        },
    },
    IndustryPreset {
        key: "manufacturing",
        name: "Manufacturing",
        description: "Avg. manufacturing benchmarks",
        ratios: FinancialRatios {
            current_ratio: 1.8,
            quick_ratio: 1.0,
            cash_ratio: 0.3,
            gross_profit_margin: 30.0,
            net_profit_margin: 6.0,
            return_on_assets: 7.0,
            return_on_equity: 14.0,
            debt_to_equity: 1.0,
            debt_ratio: 0.5,
            interest_coverage: 6.0,
            asset_turnover: 1.2,
            inventory_turnover: 6.0,
            receivables_turnover: 8.0,
        },
    },
    IndustryPreset {
        key: "hospitality",
        name: "Hospitality",
        description: "Avg. hospitality benchmarks",
        ratios: FinancialRatios {
            current_ratio: 0.9,
            quick_ratio: 0.7,
            cash_ratio: 0.2,
            gross_profit_margin: 60.0,
            net_profit_margin: 5.0,
            return_on_assets: 4.0,
            return_on_equity: 10.0,
            debt_to_equity: 2.0,
            debt_ratio: 0.65,
            interest_coverage: 3.0,
            asset_turnover: 0.9,
            inventory_turnover: 20.0,
            receivables_turnover: 25.0,
        },
    },
    IndustryPreset {
        key: "realestate",
        name: "Real Estate",
        description: "Avg. real estate benchmarks",
        ratios: FinancialRatios {
            current_ratio: 1.2,
            quick_ratio: 1.0,
            cash_ratio: 0.4,
            gross_profit_margin: 40.0,
            net_profit_margin: 15.0,
            return_on_assets: 3.0,
            return_on_equity: 8.0,
            debt_to_equity: 1.8,
            debt_ratio: 0.6,
            interest_coverage: 2.5,
            asset_turnover: 0.2,
            inventory_turnover: 2.0,
            receivables_turnover: 6.0,
        },
    },
];

pub fn find_preset(key: &str) -> Option<&'static IndustryPreset> {
    let key = key.trim().to_ascii_lowercase().replace(['-', '_', ' '], "");
    INDUSTRY_PRESETS.iter().find(|p| p.key == key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unparsable_input_becomes_zero() {
        assert_eq!(parse_ratio_input("1.25"), 1.25);
        assert_eq!(parse_ratio_input(" -3 "), -3.0);
        assert_eq!(parse_ratio_input(""), 0.0);
        assert_eq!(parse_ratio_input("abc"), 0.0);
        assert_eq!(parse_ratio_input("NaN"), 0.0);
        assert_eq!(parse_ratio_input("inf"), 0.0);
        assert_eq!(parse_ratio_input("-"), 0.0);
        assert_eq!(parse_ratio_input("."), 0.0);
        assert_eq!(parse_ratio_input("1e999"), 0.0);
    }

    #[test]
    fn trailing_text_after_a_number_is_ignored() {
        assert_eq!(parse_ratio_input("1.5x"), 1.5);
        assert_eq!(parse_ratio_input("12abc"), 12.0);
        assert_eq!(parse_ratio_input("  45%"), 45.0);
        assert_eq!(parse_ratio_input(".5"), 0.5);
        assert_eq!(parse_ratio_input("5."), 5.0);
        assert_eq!(parse_ratio_input("-3e2kg"), -300.0);
        assert_eq!(parse_ratio_input("1e"), 1.0);
        assert_eq!(parse_ratio_input("2E+x"), 2.0);
        assert_eq!(parse_ratio_input("+7.25 times"), 7.25);
        assert_eq!(parse_ratio_input("1.2.3"), 1.2);
    }

    #[test]
    fn set_from_input_accepts_name_variants() {
        let mut ratios = FinancialRatios::default();
        ratios.set_from_input("debtToEquity", "4.5").unwrap();
        assert_eq!(ratios.debt_to_equity, 4.5);
        ratios.set_from_input("return_on_equity", "-8").unwrap();
        assert_eq!(ratios.return_on_equity, -8.0);
        ratios.set_from_input("cash-ratio", "oops").unwrap();
        assert_eq!(ratios.cash_ratio, 0.0);
    }

    #[test]
    fn set_from_input_rejects_unknown_name() {
        let mut ratios = FinancialRatios::default();
        let err = ratios.set_from_input("ebitda", "1").unwrap_err();
        assert!(err.to_string().contains("unknown ratio"));
        assert_eq!(ratios, FinancialRatios::default());
    }

    #[test]
    fn deserializes_camel_case_and_requires_every_field() {
        let ratios: FinancialRatios = serde_json::from_value(json!({
            "currentRatio": 0.7, "quickRatio": 0.4, "cashRatio": 0.1,
            "grossProfitMargin": 15, "netProfitMargin": -2,
            "returnOnAssets": -3, "returnOnEquity": -8,
            "debtToEquity": 4.5, "debtRatio": 0.85, "interestCoverage": 0.8,
            "assetTurnover": 0.5, "inventoryTurnover": 2, "receivablesTurnover": 3,
        }))
        .unwrap();
        assert_eq!(ratios.debt_ratio, 0.85);
        assert_eq!(ratios.gross_profit_margin, 15.0);

        let missing = serde_json::from_value::<FinancialRatios>(json!({"currentRatio": 1.0}));
        assert!(missing.is_err());
    }

    #[test]
    fn presets_are_addressable_by_loose_key() {
        assert_eq!(find_preset("Real Estate").unwrap().key, "realestate");
        assert_eq!(find_preset("technology").unwrap().ratios.debt_to_equity, 0.4);
        assert!(find_preset("mining").is_none());
    }
}
