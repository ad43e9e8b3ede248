use anyhow::Context;
use ratiorisk_core::domain::assessment::RiskLevel;
use ratiorisk_core::domain::benchmark::sample_ratios;
use ratiorisk_core::domain::ratios::{find_preset, FinancialRatios, IndustryPreset, INDUSTRY_PRESETS};

/// Parses a `name=value` override. The value is kept as raw text; coercion
/// happens when it is applied.
pub fn parse_override(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{s}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing ratio name in '{s}'"));
    }
    Ok((name.to_string(), value.to_string()))
}

pub fn parse_sample(s: &str) -> Result<RiskLevel, String> {
    s.trim()
        .to_ascii_lowercase()
        .parse::<RiskLevel>()
        .map_err(|e| format!("{e} (expected low, medium or high)"))
}

pub fn require_preset(key: &str) -> anyhow::Result<&'static IndustryPreset> {
    find_preset(key).with_context(|| {
        let known: Vec<&str> = INDUSTRY_PRESETS.iter().map(|p| p.key).collect();
        format!("unknown preset '{key}' (expected one of: {})", known.join(", "))
    })
}

/// Starts from the preset, a sample set, or the form defaults, and applies
/// overrides in order.
pub fn build_ratios(
    preset: Option<&str>,
    sample: Option<RiskLevel>,
    overrides: &[(String, String)],
) -> anyhow::Result<FinancialRatios> {
    let mut ratios = match (preset, sample) {
        (Some(key), _) => require_preset(key)?.ratios,
        (None, Some(level)) => sample_ratios(level),
        (None, None) => FinancialRatios::default(),
    };

    for (name, raw) in overrides {
        ratios.set_from_input(name, raw)?;
    }
    Ok(ratios)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_override_splits_on_first_equals() {
        assert_eq!(
            parse_override("debtToEquity=4.5").unwrap(),
            ("debtToEquity".to_string(), "4.5".to_string())
        );
        assert_eq!(
            parse_override(" cash_ratio =a=b").unwrap(),
            ("cash_ratio".to_string(), "a=b".to_string())
        );
        assert!(parse_override("debtToEquity").is_err());
        assert!(parse_override("=1").is_err());
    }

    #[test]
    fn overrides_apply_on_top_of_preset() {
        let overrides = vec![
            ("debtToEquity".to_string(), "4.5".to_string()),
            ("netProfitMargin".to_string(), "n/a".to_string()),
        ];
        let ratios = build_ratios(Some("retail"), None, &overrides).unwrap();
        assert_eq!(ratios.debt_to_equity, 4.5);
        assert_eq!(ratios.net_profit_margin, 0.0);
        assert_eq!(ratios.receivables_turnover, 15.0);
    }

    #[test]
    fn defaults_to_form_values_without_preset() {
        assert_eq!(build_ratios(None, None, &[]).unwrap(), FinancialRatios::default());
    }

    #[test]
    fn unknown_preset_or_ratio_is_an_error() {
        assert!(build_ratios(Some("mining"), None, &[]).is_err());
        let bad = vec![("ebitda".to_string(), "1".to_string())];
        assert!(build_ratios(None, None, &bad).is_err());
    }

    #[test]
    fn sample_set_is_a_starting_point_for_overrides() {
        let overrides = vec![("cashRatio".to_string(), "0.9".to_string())];
        let ratios = build_ratios(None, Some(RiskLevel::High), &overrides).unwrap();
        assert_eq!(ratios.debt_to_equity, 4.5);
        assert_eq!(ratios.cash_ratio, 0.9);
    }

    #[test]
    fn parse_sample_accepts_levels_only() {
        assert_eq!(parse_sample("Medium").unwrap(), RiskLevel::Medium);
        assert!(parse_sample("severe").is_err());
    }
}
