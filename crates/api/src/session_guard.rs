//! Rejects history requests that do not carry a session token.

use axum::{
    extract::{Query, Request},
    http::StatusCode,
    middleware::Next,
    response::Response,
    Json,
};
use ratiorisk_core::session::SessionId;
use serde::Deserialize;

use crate::routes::{ApiError, ErrorBody};

/// Header carrying the caller's session token.
pub const SESSION_HEADER: &str = "x-session-id";

/// Query string accepted when the header is absent.
#[derive(Debug, Deserialize)]
struct SessionQuery {
    session_id: Option<String>,
}

fn extract_session_id(request: &Request) -> Option<SessionId> {
    if let Some(value) = request.headers().get(SESSION_HEADER) {
        if let Some(id) = value.to_str().ok().and_then(SessionId::parse) {
            return Some(id);
        }
    }

    let Query(query) = Query::<SessionQuery>::try_from_uri(request.uri()).ok()?;
    query.session_id.as_deref().and_then(SessionId::parse)
}

/// Resolves the session token and attaches it to the request as an
/// extension; handlers behind this layer read it with `Extension<SessionId>`.
pub async fn require_session(mut request: Request, next: Next) -> Result<Response, ApiError> {
    let Some(session_id) = extract_session_id(&request) else {
        tracing::debug!(path = %request.uri().path(), "request without session id rejected");
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(ErrorBody::new(format!(
                "missing session id ({SESSION_HEADER} header)"
            ))),
        ));
    };

    request.extensions_mut().insert(session_id);
    Ok(next.run(request).await)
}
