use crate::domain::assessment::RiskAssessment;
use crate::domain::ratios::FinancialRatios;
use crate::session::SessionId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of records returned by a history listing.
pub const HISTORY_LIST_LIMIT: i64 = 10;

/// One saved assessment. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub session_id: SessionId,
    pub company_name: Option<String>,
    pub ratios: FinancialRatios,
    pub assessment: RiskAssessment,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewHistoryRecord {
    pub session_id: SessionId,
    pub company_name: Option<String>,
    pub ratios: FinancialRatios,
    pub assessment: RiskAssessment,
}

impl NewHistoryRecord {
    pub fn new(
        session_id: SessionId,
        company_name: Option<String>,
        ratios: FinancialRatios,
        assessment: RiskAssessment,
    ) -> Self {
        let company_name = company_name
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        Self {
            session_id,
            company_name,
            ratios,
            assessment,
        }
    }
}
