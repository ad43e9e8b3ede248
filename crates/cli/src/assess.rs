use anyhow::Context;
use ratiorisk_core::domain::assessment::RiskAssessment;
use ratiorisk_core::domain::benchmark::IndustryComparison;
use ratiorisk_core::domain::history::NewHistoryRecord;
use ratiorisk_core::domain::ratios::{FinancialRatios, IndustryPreset};
use ratiorisk_core::llm::LlmClient;
use ratiorisk_core::session::SessionId;
use ratiorisk_core::storage::history::HistoryStore;
use serde::Serialize;
use std::io::Write;
use uuid::Uuid;

pub struct AssessInput {
    pub session_id: SessionId,
    pub company_name: Option<String>,
    pub ratios: FinancialRatios,
    pub compare_with: Option<&'static IndustryPreset>,
}

#[derive(Debug)]
pub struct AssessOutcome {
    pub assessment: RiskAssessment,
    /// `None` when saving was skipped or failed.
    pub saved_id: Option<Uuid>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Report<'a> {
    assessment: &'a RiskAssessment,
    #[serde(skip_serializing_if = "Option::is_none")]
    industry_comparison: Option<IndustryComparison>,
}

/// Predicts, writes the report to `out`, then saves to history.
///
/// The report is written before the save is attempted. A failed save is
/// logged and reported to sentry but does not fail the run; a failed
/// prediction does, and nothing is written or saved.
pub async fn run_assessment<W: Write>(
    llm: &dyn LlmClient,
    store: Option<&dyn HistoryStore>,
    input: AssessInput,
    out: &mut W,
) -> anyhow::Result<AssessOutcome> {
    let assessment = llm.predict_risk(&input.ratios).await.map_err(|e| {
        let err = anyhow::Error::new(e);
        sentry_anyhow::capture_anyhow(&err);
        err
    })?;

    let report = Report {
        assessment: &assessment,
        industry_comparison: input.compare_with.map(|p| p.compare(&assessment)),
    };
    serde_json::to_writer_pretty(&mut *out, &report).context("failed to write assessment")?;
    writeln!(out).context("failed to write assessment")?;
    out.flush().ok();

    let Some(store) = store else {
        tracing::info!("history store unavailable, assessment not saved");
        return Ok(AssessOutcome {
            assessment,
            saved_id: None,
        });
    };

    let record = NewHistoryRecord::new(
        input.session_id,
        input.company_name,
        input.ratios,
        assessment.clone(),
    );
    let saved_id = match store.insert(record).await {
        Ok(saved) => {
            tracing::info!(id = %saved.id, "saved assessment to history");
            Some(saved.id)
        }
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::warn!(error = %e, "assessment computed but not saved to history");
            None
        }
    };

    Ok(AssessOutcome {
        assessment,
        saved_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratiorisk_core::domain::assessment::{CategoryScores, RiskLevel};
    use ratiorisk_core::domain::history::HistoryRecord;
    use ratiorisk_core::domain::ratios::find_preset;
    use ratiorisk_core::llm::error::PredictError;
    use ratiorisk_core::storage::history::MemoryHistoryStore;
    use serde_json::Value;

    struct FixedLlm(Result<RiskAssessment, u16>);

    #[async_trait::async_trait]
    impl LlmClient for FixedLlm {
        fn model(&self) -> &str {
            "fixed"
        }

        async fn predict_risk(&self, _: &FinancialRatios) -> Result<RiskAssessment, PredictError> {
            self.0
                .clone()
                .map_err(PredictError::from_upstream_status)
        }
    }

    struct BrokenStore;

    #[async_trait::async_trait]
    impl HistoryStore for BrokenStore {
        async fn insert(&self, _: NewHistoryRecord) -> anyhow::Result<HistoryRecord> {
            anyhow::bail!("insert assessment_history failed")
        }

        async fn list(&self, _: &SessionId) -> anyhow::Result<Vec<HistoryRecord>> {
            Ok(vec![])
        }

        async fn delete(&self, _: Uuid, _: &SessionId) -> anyhow::Result<u64> {
            Ok(0)
        }
    }

    fn assessment() -> RiskAssessment {
        RiskAssessment {
            overall_risk: RiskLevel::High,
            risk_score: 78,
            confidence: 90,
            category_scores: CategoryScores {
                liquidity: 30,
                profitability: 15,
                leverage: 10,
                efficiency: 48,
            },
            factors: vec![],
        }
    }

    fn input(compare_with: Option<&'static IndustryPreset>) -> AssessInput {
        AssessInput {
            session_id: SessionId::parse("session_1_abc").unwrap(),
            company_name: Some(" Acme ".to_string()),
            ratios: FinancialRatios::default(),
            compare_with,
        }
    }

    #[tokio::test]
    async fn failed_save_still_prints_and_succeeds() {
        let llm = FixedLlm(Ok(assessment()));
        let mut out = Vec::new();

        let outcome = run_assessment(&llm, Some(&BrokenStore), input(None), &mut out)
            .await
            .unwrap();

        assert_eq!(outcome.saved_id, None);
        assert_eq!(outcome.assessment, assessment());
        let printed: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(printed["assessment"]["overallRisk"], "high");
        assert!(printed.get("industryComparison").is_none());
    }

    #[tokio::test]
    async fn successful_save_is_listed_under_the_session() {
        let llm = FixedLlm(Ok(assessment()));
        let store = MemoryHistoryStore::new();
        let mut out = Vec::new();

        let outcome = run_assessment(&llm, Some(&store), input(None), &mut out)
            .await
            .unwrap();

        let session = SessionId::parse("session_1_abc").unwrap();
        let listed = store.list(&session).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(Some(listed[0].id), outcome.saved_id);
        assert_eq!(listed[0].company_name.as_deref(), Some("Acme"));
    }

    #[tokio::test]
    async fn without_store_nothing_is_saved() {
        let llm = FixedLlm(Ok(assessment()));
        let mut out = Vec::new();

        let outcome = run_assessment(&llm, None, input(None), &mut out).await.unwrap();

        assert_eq!(outcome.saved_id, None);
        assert!(!out.is_empty());
    }

    #[tokio::test]
    async fn failed_prediction_writes_and_saves_nothing() {
        let llm = FixedLlm(Err(429));
        let store = MemoryHistoryStore::new();
        let mut out = Vec::new();

        let err = run_assessment(&llm, Some(&store), input(None), &mut out)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), PredictError::RateLimited.to_string());
        assert!(out.is_empty());
        let session = SessionId::parse("session_1_abc").unwrap();
        assert!(store.list(&session).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn report_carries_industry_comparison() {
        let llm = FixedLlm(Ok(assessment()));
        let mut out = Vec::new();

        run_assessment(&llm, None, input(find_preset("technology")), &mut out)
            .await
            .unwrap();

        let printed: Value = serde_json::from_slice(&out).unwrap();
        let cmp = &printed["industryComparison"];
        assert_eq!(cmp["industry"], "technology");
        assert_eq!(cmp["yourAverage"], 26);
        assert_eq!(cmp["industryAverage"], 91);
        assert_eq!(cmp["difference"], -65);
    }
}
