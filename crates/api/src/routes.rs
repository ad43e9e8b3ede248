use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::{header, Method, StatusCode},
    middleware,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use ratiorisk_core::domain::assessment::RiskAssessment;
use ratiorisk_core::domain::history::{HistoryRecord, NewHistoryRecord};
use ratiorisk_core::domain::ratios::FinancialRatios;
use ratiorisk_core::llm::error::PredictError;
use ratiorisk_core::llm::LlmClient;
use ratiorisk_core::session::SessionId;
use ratiorisk_core::storage::history::HistoryStore;

use crate::session_guard::{require_session, SESSION_HEADER};

#[derive(Clone)]
pub struct AppState {
    pub llm: Option<Arc<dyn LlmClient>>,
    pub history: Option<Arc<dyn HistoryStore>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

pub type ApiError = (StatusCode, Json<ErrorBody>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(ErrorBody::new(message)))
}

pub fn router(state: AppState) -> Router {
    let history = Router::new()
        .route("/history", get(list_history).post(create_history))
        .route("/history/:id", delete(delete_history))
        .route_layer(middleware::from_fn(require_session));

    Router::new()
        .route("/healthz", get(healthz))
        .route("/predict-risk", post(predict_risk).options(preflight))
        .merge(history)
        .with_state(state)
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::HeaderName::from_static("x-client-info"),
            header::HeaderName::from_static("apikey"),
            header::HeaderName::from_static(SESSION_HEADER),
        ])
}

async fn healthz() -> &'static str {
    "ok"
}

async fn preflight() -> StatusCode {
    StatusCode::OK
}

#[derive(Debug, Deserialize)]
struct PredictRequest {
    ratios: FinancialRatios,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictResponse {
    pub assessment: RiskAssessment,
}

async fn predict_risk(
    State(state): State<AppState>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    let Json(PredictRequest { ratios }) =
        payload.map_err(|e| api_error(StatusCode::BAD_REQUEST, e.body_text()))?;

    let Some(llm) = &state.llm else {
        tracing::error!("predict-risk called without a configured AI gateway");
        return Err(api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "AI_GATEWAY_API_KEY is required",
        ));
    };

    tracing::debug!(?ratios, "received financial ratios for analysis");

    match llm.predict_risk(&ratios).await {
        Ok(assessment) => Ok(Json(PredictResponse { assessment })),
        Err(err) => {
            if let PredictError::Internal(inner) = &err {
                sentry_anyhow::capture_anyhow(inner);
            }
            tracing::error!(error = %err, status = err.status_code(), "predict-risk failed");
            let status = StatusCode::from_u16(err.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            Err(api_error(status, err.to_string()))
        }
    }
}

fn require_history(state: &AppState) -> Result<&Arc<dyn HistoryStore>, ApiError> {
    state
        .history
        .as_ref()
        .ok_or_else(|| api_error(StatusCode::SERVICE_UNAVAILABLE, "History store unavailable"))
}

async fn list_history(
    State(state): State<AppState>,
    Extension(session_id): Extension<SessionId>,
) -> Result<Json<Vec<HistoryRecord>>, ApiError> {
    let store = require_history(&state)?;
    let records = store.list(&session_id).await.map_err(|e| {
        sentry_anyhow::capture_anyhow(&e);
        tracing::error!(error = %e, "failed to load history");
        api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load history")
    })?;
    Ok(Json(records))
}

#[derive(Debug, Deserialize)]
struct CreateHistoryRequest {
    #[serde(default)]
    company_name: Option<String>,
    ratios: FinancialRatios,
    assessment: RiskAssessment,
}

async fn create_history(
    State(state): State<AppState>,
    Extension(session_id): Extension<SessionId>,
    payload: Result<Json<CreateHistoryRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<HistoryRecord>), ApiError> {
    let Json(body) = payload.map_err(|e| api_error(StatusCode::BAD_REQUEST, e.body_text()))?;
    let store = require_history(&state)?;

    let record = NewHistoryRecord::new(session_id, body.company_name, body.ratios, body.assessment);
    let saved = store.insert(record).await.map_err(|e| {
        sentry_anyhow::capture_anyhow(&e);
        tracing::error!(error = %e, "failed to save assessment");
        api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to save assessment")
    })?;

    tracing::info!(id = %saved.id, "saved assessment to history");
    Ok((StatusCode::CREATED, Json(saved)))
}

async fn delete_history(
    State(state): State<AppState>,
    Extension(session_id): Extension<SessionId>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id.map_err(|e| api_error(StatusCode::BAD_REQUEST, e.body_text()))?;
    let store = require_history(&state)?;

    let deleted = store.delete(id, &session_id).await.map_err(|e| {
        sentry_anyhow::capture_anyhow(&e);
        tracing::error!(error = %e, %id, "failed to delete assessment");
        api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to delete")
    })?;

    tracing::debug!(%id, deleted, "history delete");
    Ok(StatusCode::NO_CONTENT)
}
