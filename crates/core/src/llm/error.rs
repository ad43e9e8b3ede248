use thiserror::Error;

/// Failures of a risk prediction, each mapped to the HTTP status the proxy
/// answers with. Messages are user-facing.
#[derive(Debug, Error)]
pub enum PredictError {
    #[error("Rate limit exceeded. Please try again in a moment.")]
    RateLimited,

    #[error("API credits exhausted. Please add credits to continue.")]
    QuotaExhausted,

    #[error("AI Gateway error: {status}")]
    Upstream { status: u16 },

    #[error("No content in AI response")]
    EmptyResponse,

    /// The reply text was not an assessment (invalid JSON, unknown enum value,
    /// missing field). Reported as a 500 like any other internal failure.
    #[error("{0}")]
    MalformedPayload(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl PredictError {
    pub fn status_code(&self) -> u16 {
        match self {
            PredictError::RateLimited => 429,
            PredictError::QuotaExhausted => 402,
            PredictError::Upstream { .. }
            | PredictError::EmptyResponse
            | PredictError::MalformedPayload(_)
            | PredictError::Internal(_) => 500,
        }
    }

    /// Maps a non-success upstream status to its failure class.
    pub fn from_upstream_status(status: u16) -> Self {
        match status {
            429 => PredictError::RateLimited,
            402 => PredictError::QuotaExhausted,
            other => PredictError::Upstream { status: other },
        }
    }
}
