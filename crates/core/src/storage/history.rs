use crate::domain::assessment::{CategoryScores, RiskAssessment, RiskFactor};
use crate::domain::history::{HistoryRecord, NewHistoryRecord, HISTORY_LIST_LIMIT};
use crate::domain::ratios::FinancialRatios;
use crate::session::SessionId;
use anyhow::Context;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use std::sync::Mutex;
use uuid::Uuid;

/// Session-scoped storage of past assessments.
///
/// Every read and delete is filtered by the caller's session id; a record is
/// never visible to any other session.
#[async_trait::async_trait]
pub trait HistoryStore: Send + Sync {
    async fn insert(&self, record: NewHistoryRecord) -> anyhow::Result<HistoryRecord>;

    /// Most recent records first, at most [`HISTORY_LIST_LIMIT`].
    async fn list(&self, session_id: &SessionId) -> anyhow::Result<Vec<HistoryRecord>>;

    /// Returns the number of rows removed (0 or 1). A missing id and an id
    /// owned by another session are indistinguishable.
    async fn delete(&self, id: Uuid, session_id: &SessionId) -> anyhow::Result<u64>;
}

#[derive(Debug, Clone)]
pub struct PgHistoryStore {
    pool: sqlx::PgPool,
}

impl PgHistoryStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }

    async fn begin_scoped(
        &self,
        session_id: &SessionId,
    ) -> anyhow::Result<sqlx::Transaction<'static, sqlx::Postgres>> {
        let mut tx = self.pool.begin().await.context("begin transaction failed")?;
        // Transaction-local; consumed by the row-level-security policy.
        sqlx::query("SELECT set_config('app.session_id', $1, true)")
            .persistent(false)
            .bind(session_id.as_str())
            .execute(&mut *tx)
            .await
            .context("failed to scope transaction to session")?;
        Ok(tx)
    }
}

const SELECT_COLUMNS: &str = "id, created_at, session_id, company_name, \
     current_ratio, quick_ratio, cash_ratio, gross_profit_margin, net_profit_margin, \
     return_on_assets, return_on_equity, debt_to_equity, debt_ratio, interest_coverage, \
     asset_turnover, inventory_turnover, receivables_turnover, \
     overall_risk, risk_score, confidence, liquidity_score, profitability_score, \
     leverage_score, efficiency_score, factors";

#[derive(Debug, sqlx::FromRow)]
struct HistoryRow {
    id: Uuid,
    created_at: DateTime<Utc>,
    session_id: String,
    company_name: Option<String>,
    current_ratio: f64,
    quick_ratio: f64,
    cash_ratio: f64,
    gross_profit_margin: f64,
    net_profit_margin: f64,
    return_on_assets: f64,
    return_on_equity: f64,
    debt_to_equity: f64,
    debt_ratio: f64,
    interest_coverage: f64,
    asset_turnover: f64,
    inventory_turnover: f64,
    receivables_turnover: f64,
    overall_risk: String,
    risk_score: i32,
    confidence: i32,
    liquidity_score: i32,
    profitability_score: i32,
    leverage_score: i32,
    efficiency_score: i32,
    factors: Json<Vec<RiskFactor>>,
}

impl TryFrom<HistoryRow> for HistoryRecord {
    type Error = anyhow::Error;

    fn try_from(row: HistoryRow) -> anyhow::Result<Self> {
        let session_id = SessionId::parse(&row.session_id)
            .with_context(|| format!("blank session_id in DB for id={}", row.id))?;
        let overall_risk = row
            .overall_risk
            .parse()
            .with_context(|| format!("invalid overall_risk in DB for id={}", row.id))?;

        Ok(HistoryRecord {
            id: row.id,
            created_at: row.created_at,
            session_id,
            company_name: row.company_name,
            ratios: FinancialRatios {
                current_ratio: row.current_ratio,
                quick_ratio: row.quick_ratio,
                cash_ratio: row.cash_ratio,
                gross_profit_margin: row.gross_profit_margin,
                net_profit_margin: row.net_profit_margin,
                return_on_assets: row.return_on_assets,
                return_on_equity: row.return_on_equity,
                debt_to_equity: row.debt_to_equity,
                debt_ratio: row.debt_ratio,
                interest_coverage: row.interest_coverage,
                asset_turnover: row.asset_turnover,
                inventory_turnover: row.inventory_turnover,
                receivables_turnover: row.receivables_turnover,
            },
            assessment: RiskAssessment {
                overall_risk,
                risk_score: row.risk_score,
                confidence: row.confidence,
                category_scores: CategoryScores {
                    liquidity: row.liquidity_score,
                    profitability: row.profitability_score,
                    leverage: row.leverage_score,
                    efficiency: row.efficiency_score,
                },
                factors: row.factors.0,
            },
        })
    }
}

#[async_trait::async_trait]
impl HistoryStore for PgHistoryStore {
    async fn insert(&self, record: NewHistoryRecord) -> anyhow::Result<HistoryRecord> {
        let mut tx = self.begin_scoped(&record.session_id).await?;

        let r = &record.ratios;
        let a = &record.assessment;
        let (id, created_at): (Uuid, DateTime<Utc>) = sqlx::query_as(
            "INSERT INTO assessment_history (\
                 session_id, company_name, \
                 current_ratio, quick_ratio, cash_ratio, gross_profit_margin, net_profit_margin, \
                 return_on_assets, return_on_equity, debt_to_equity, debt_ratio, interest_coverage, \
                 asset_turnover, inventory_turnover, receivables_turnover, \
                 overall_risk, risk_score, confidence, liquidity_score, profitability_score, \
                 leverage_score, efficiency_score, factors) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, \
                     $16, $17, $18, $19, $20, $21, $22, $23) \
             RETURNING id, created_at",
        )
        .bind(record.session_id.as_str())
        .bind(&record.company_name)
        .bind(r.current_ratio)
        .bind(r.quick_ratio)
        .bind(r.cash_ratio)
        .bind(r.gross_profit_margin)
        .bind(r.net_profit_margin)
        .bind(r.return_on_assets)
        .bind(r.return_on_equity)
        .bind(r.debt_to_equity)
        .bind(r.debt_ratio)
        .bind(r.interest_coverage)
        .bind(r.asset_turnover)
        .bind(r.inventory_turnover)
        .bind(r.receivables_turnover)
        .bind(a.overall_risk.as_str())
        .bind(a.risk_score)
        .bind(a.confidence)
        .bind(a.category_scores.liquidity)
        .bind(a.category_scores.profitability)
        .bind(a.category_scores.leverage)
        .bind(a.category_scores.efficiency)
        .bind(Json(&a.factors))
        .fetch_one(&mut *tx)
        .await
        .context("insert assessment_history failed")?;

        tx.commit().await.context("commit transaction failed")?;

        Ok(HistoryRecord {
            id,
            created_at,
            session_id: record.session_id,
            company_name: record.company_name,
            ratios: record.ratios,
            assessment: record.assessment,
        })
    }

    async fn list(&self, session_id: &SessionId) -> anyhow::Result<Vec<HistoryRecord>> {
        let mut tx = self.begin_scoped(session_id).await?;

        let rows = sqlx::query_as::<_, HistoryRow>(&format!(
            "SELECT {SELECT_COLUMNS} \
             FROM assessment_history \
             WHERE session_id = $1 \
             ORDER BY created_at DESC \
             LIMIT $2"
        ))
        .bind(session_id.as_str())
        .bind(HISTORY_LIST_LIMIT)
        .fetch_all(&mut *tx)
        .await
        .context("select assessment_history failed")?;

        tx.commit().await.context("commit transaction failed")?;

        rows.into_iter().map(HistoryRecord::try_from).collect()
    }

    async fn delete(&self, id: Uuid, session_id: &SessionId) -> anyhow::Result<u64> {
        let mut tx = self.begin_scoped(session_id).await?;

        let res = sqlx::query("DELETE FROM assessment_history WHERE id = $1 AND session_id = $2")
            .bind(id)
            .bind(session_id.as_str())
            .execute(&mut *tx)
            .await
            .context("delete assessment_history failed")?;

        tx.commit().await.context("commit transaction failed")?;
        Ok(res.rows_affected())
    }
}

/// Process-local store with the same scoping rules as [`PgHistoryStore`].
#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    records: Mutex<Vec<HistoryRecord>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> anyhow::Result<std::sync::MutexGuard<'_, Vec<HistoryRecord>>> {
        self.records
            .lock()
            .map_err(|_| anyhow::anyhow!("history store lock poisoned"))
    }
}

#[async_trait::async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn insert(&self, record: NewHistoryRecord) -> anyhow::Result<HistoryRecord> {
        let stored = HistoryRecord {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            session_id: record.session_id,
            company_name: record.company_name,
            ratios: record.ratios,
            assessment: record.assessment,
        };
        self.lock()?.push(stored.clone());
        Ok(stored)
    }

    async fn list(&self, session_id: &SessionId) -> anyhow::Result<Vec<HistoryRecord>> {
        let records = self.lock()?;
        // Insertion order breaks created_at ties, newest last.
        let mut out: Vec<(usize, &HistoryRecord)> = records
            .iter()
            .enumerate()
            .filter(|(_, r)| &r.session_id == session_id)
            .collect();
        out.sort_by(|(ia, a), (ib, b)| b.created_at.cmp(&a.created_at).then(ib.cmp(ia)));
        Ok(out
            .into_iter()
            .take(HISTORY_LIST_LIMIT as usize)
            .map(|(_, r)| r.clone())
            .collect())
    }

    async fn delete(&self, id: Uuid, session_id: &SessionId) -> anyhow::Result<u64> {
        let mut records = self.lock()?;
        let before = records.len();
        records.retain(|r| !(r.id == id && &r.session_id == session_id));
        Ok((before - records.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::assessment::{Impact, RiskLevel};

    fn assessment(level: RiskLevel, score: i32) -> RiskAssessment {
        RiskAssessment {
            overall_risk: level,
            risk_score: score,
            confidence: 90,
            category_scores: CategoryScores {
                liquidity: 40,
                profitability: 20,
                leverage: 10,
                efficiency: 50,
            },
            factors: vec![RiskFactor {
                name: "Leverage".to_string(),
                impact: Impact::Negative,
                description: "Debt to equity of 4.5".to_string(),
            }],
        }
    }

    fn session(name: &str) -> SessionId {
        SessionId::parse(name).unwrap()
    }

    #[tokio::test]
    async fn insert_then_list_round_trips() {
        let store = MemoryHistoryStore::new();
        let new = NewHistoryRecord::new(
            session("session_a"),
            Some("  Acme Corp ".to_string()),
            FinancialRatios::default(),
            assessment(RiskLevel::High, 28),
        );

        let inserted = store.insert(new.clone()).await.unwrap();
        let listed = store.list(&session("session_a")).await.unwrap();

        assert_eq!(listed, vec![inserted.clone()]);
        assert_eq!(inserted.company_name.as_deref(), Some("Acme Corp"));
        assert_eq!(inserted.ratios, new.ratios);
        assert_eq!(inserted.assessment, new.assessment);
    }

    #[tokio::test]
    async fn list_is_scoped_newest_first_and_limited() {
        let store = MemoryHistoryStore::new();
        for score in 0..12 {
            store
                .insert(NewHistoryRecord::new(
                    session("a"),
                    None,
                    FinancialRatios::default(),
                    assessment(RiskLevel::Medium, score),
                ))
                .await
                .unwrap();
        }
        store
            .insert(NewHistoryRecord::new(
                session("b"),
                None,
                FinancialRatios::default(),
                assessment(RiskLevel::Low, 99),
            ))
            .await
            .unwrap();

        let listed = store.list(&session("a")).await.unwrap();
        assert_eq!(listed.len(), HISTORY_LIST_LIMIT as usize);
        assert_eq!(listed[0].assessment.risk_score, 11);
        assert_eq!(listed[9].assessment.risk_score, 2);
        assert!(listed.iter().all(|r| r.session_id == session("a")));

        assert!(store.list(&session("nobody")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_requires_matching_session() {
        let store = MemoryHistoryStore::new();
        let owned_by_b = store
            .insert(NewHistoryRecord::new(
                session("b"),
                None,
                FinancialRatios::default(),
                assessment(RiskLevel::High, 20),
            ))
            .await
            .unwrap();

        assert_eq!(store.delete(owned_by_b.id, &session("a")).await.unwrap(), 0);
        assert_eq!(store.list(&session("b")).await.unwrap().len(), 1);

        assert_eq!(store.delete(Uuid::new_v4(), &session("b")).await.unwrap(), 0);
        assert_eq!(store.delete(owned_by_b.id, &session("b")).await.unwrap(), 1);
        assert!(store.list(&session("b")).await.unwrap().is_empty());
    }

    #[test]
    fn row_with_unknown_risk_level_is_rejected() {
        let row = HistoryRow {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            session_id: "s".to_string(),
            company_name: None,
            current_ratio: 1.0,
            quick_ratio: 1.0,
            cash_ratio: 1.0,
            gross_profit_margin: 1.0,
            net_profit_margin: 1.0,
            return_on_assets: 1.0,
            return_on_equity: 1.0,
            debt_to_equity: 1.0,
            debt_ratio: 1.0,
            interest_coverage: 1.0,
            asset_turnover: 1.0,
            inventory_turnover: 1.0,
            receivables_turnover: 1.0,
            overall_risk: "unknown".to_string(),
            risk_score: 1,
            confidence: 1,
            liquidity_score: 1,
            profitability_score: 1,
            leverage_score: 1,
            efficiency_score: 1,
            factors: Json(vec![]),
        };
        assert!(HistoryRecord::try_from(row).is_err());
    }
}
