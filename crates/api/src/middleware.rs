use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;

use zap_core::{CorrelationId, RpcError, RpcErrorCode};

use crate::context::SessionContext;
use crate::handler::HandlerError;
use crate::response::CORRELATION_ID_HEADER;
use crate::session::SessionStore;

pub const SESSION_COOKIE: &str = "session_token";

#[derive(Clone)]
pub struct SessionState {
    pub sessions: Arc<dyn SessionStore>,
}

/// Require an active session for RPC procedures.
///
/// Accepts a bearer token or the session cookie. Rejections use the RPC
/// error shape (`UNAUTHORIZED`).
pub async fn session_middleware(
    State(state): State<SessionState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let session = session_token(req.headers())
        .and_then(|token| state.sessions.lookup(token, Utc::now()));

    let Some(session) = session else {
        let correlation_id =
            incoming_correlation_id(req.headers()).unwrap_or_else(CorrelationId::generate);
        tracing::warn!(
            %correlation_id,
            path = %req.uri().path(),
            "rejected call without an active session"
        );
        let error = RpcError::new(RpcErrorCode::Unauthorized, "Unauthorized access");
        return HandlerError::rpc(error, correlation_id).into_response();
    };

    req.extensions_mut().insert(SessionContext::new(session));
    next.run(req).await
}

/// Correlation ID propagated by an upstream caller, if any.
pub fn incoming_correlation_id(headers: &HeaderMap) -> Option<CorrelationId> {
    let value = headers.get(CORRELATION_ID_HEADER)?.to_str().ok()?.trim();
    (!value.is_empty()).then(|| CorrelationId::from(value))
}

fn session_token(headers: &HeaderMap) -> Option<&str> {
    extract_bearer(headers).or_else(|| extract_cookie(headers, SESSION_COOKIE))
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

fn extract_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, v)| *k == name && !v.is_empty())
        .map(|(_, v)| v)
}
