//! HTTP error responses for API routes.

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use thiserror::Error;

use zap_core::{CorrelationId, Failure, GENERIC_MESSAGE, MAX_STACK_LINES};

use crate::config::Mode;

pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";
pub const ERROR_TYPE_HEADER: &str = "x-error-type";

/// JSON body of an API route error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub code: String,
    pub status_code: u16,
    pub timestamp: String,
    pub correlation_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// Error body plus the status it is sent with.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{status} {}: {}", body.error, body.message)]
pub struct ApiErrorResponse {
    pub status: u16,
    pub body: ErrorResponse,
}

impl ApiErrorResponse {
    /// Build the response for a failure.
    ///
    /// Production never exposes messages of unclassified failures; details
    /// (cause, stack) only appear in development, and for typed and
    /// unclassified errors only when `include_stack` is set. Validation issues
    /// are always included.
    pub fn from_failure(
        failure: &Failure,
        correlation_id: &CorrelationId,
        include_stack: bool,
        mode: Mode,
    ) -> Self {
        let dev = mode.is_development();
        let (error, message, code, status, details) = match failure {
            Failure::Typed(err) => {
                let details = (dev && include_stack).then(|| {
                    let mut d = Map::new();
                    if let Some(stack) = failure.stack(MAX_STACK_LINES) {
                        d.insert("stack".into(), Value::String(stack));
                    }
                    if let Some(cause) = err.cause() {
                        d.insert("cause".into(), cause.to_json());
                    }
                    Value::Object(d)
                });
                (
                    err.name().to_string(),
                    err.message().to_string(),
                    err.code().to_string(),
                    err.http_status(),
                    details,
                )
            }
            Failure::Validation(issues) => (
                "ValidationError".to_string(),
                "Invalid input data".to_string(),
                "VALIDATION_ERROR".to_string(),
                400,
                serde_json::to_value(issues).ok(),
            ),
            Failure::Error { error, .. } => (
                "InternalServerError".to_string(),
                if dev { error.to_string() } else { GENERIC_MESSAGE.to_string() },
                "INTERNAL_SERVER_ERROR".to_string(),
                500,
                (dev && include_stack).then(|| json!({ "stack": failure.stack(MAX_STACK_LINES) })),
            ),
            Failure::Value(value) => (
                "UnknownError".to_string(),
                GENERIC_MESSAGE.to_string(),
                "UNKNOWN_ERROR".to_string(),
                500,
                dev.then(|| json!({ "error": value_string(value) })),
            ),
        };

        Self {
            status,
            body: ErrorResponse {
                error,
                message,
                code,
                status_code: status,
                timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
                correlation_id: correlation_id.to_string(),
                details,
            },
        }
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut res = (status, Json(&self.body)).into_response();
        insert_header(&mut res, CORRELATION_ID_HEADER, &self.body.correlation_id);
        insert_header(&mut res, ERROR_TYPE_HEADER, &self.body.error);
        res
    }
}

/// Set a header, skipping values that are not valid header text (caller-supplied
/// correlation IDs are not validated).
pub(crate) fn insert_header(res: &mut Response, name: &'static str, value: &str) {
    if let Ok(value) = HeaderValue::from_str(value) {
        res.headers_mut().insert(HeaderName::from_static(name), value);
    }
}

fn value_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zap_core::{AppError, ValidationIssue, ValidationIssues};

    fn id() -> CorrelationId {
        CorrelationId::from("cid-1")
    }

    #[test]
    fn typed_error_maps_status_code_and_name() {
        let failure = Failure::from(AppError::not_found("User with email x@y.com not found"));
        let res = ApiErrorResponse::from_failure(&failure, &id(), false, Mode::Production);
        assert_eq!(res.status, 404);
        assert_eq!(res.body.code, "NOT_FOUND");
        assert_eq!(res.body.error, "NotFoundError");
        assert_eq!(res.body.message, "User with email x@y.com not found");
        assert_eq!(res.body.correlation_id, "cid-1");
        assert!(res.body.details.is_none());
    }

    #[test]
    fn typed_error_details_need_dev_and_include_stack() {
        let failure =
            Failure::from(AppError::conflict("dup").with_cause(json!({"field": "email"})));
        let dev = ApiErrorResponse::from_failure(&failure, &id(), true, Mode::Development);
        assert_eq!(dev.body.details.unwrap()["cause"]["value"]["field"], "email");

        let prod = ApiErrorResponse::from_failure(&failure, &id(), true, Mode::Production);
        assert!(prod.body.details.is_none());
        let dev_no_stack =
            ApiErrorResponse::from_failure(&failure, &id(), false, Mode::Development);
        assert!(dev_no_stack.body.details.is_none());
    }

    #[test]
    fn validation_is_bad_request_with_issues() {
        let issues =
            ValidationIssues::from(vec![ValidationIssue::new("email", "email", "invalid email")]);
        let failure = Failure::from(issues);
        let res = ApiErrorResponse::from_failure(&failure, &id(), false, Mode::Production);
        assert_eq!(res.status, 400);
        assert_eq!(res.body.code, "VALIDATION_ERROR");
        assert_eq!(res.body.error, "ValidationError");
        assert_eq!(res.body.details.unwrap()[0]["path"], "email");
    }

    #[test]
    fn production_hides_unclassified_messages() {
        let failure = Failure::from(anyhow::anyhow!("password=hunter2 leaked in query"));
        let res = ApiErrorResponse::from_failure(&failure, &id(), true, Mode::Production);
        assert_eq!(res.status, 500);
        assert_eq!(res.body.message, GENERIC_MESSAGE);
        assert!(res.body.details.is_none());
    }

    #[test]
    fn development_shows_unclassified_messages_and_stack() {
        let failure = Failure::from(anyhow::anyhow!("root cause").context("while loading user"));
        let res = ApiErrorResponse::from_failure(&failure, &id(), true, Mode::Development);
        assert_eq!(res.body.message, "while loading user");
        let stack = res.body.details.unwrap()["stack"].as_str().unwrap().to_string();
        assert!(stack.lines().count() <= MAX_STACK_LINES);
        assert!(stack.contains("while loading user"));
    }

    #[test]
    fn opaque_values_are_unknown_errors() {
        let failure = Failure::from(json!(17));
        let prod = ApiErrorResponse::from_failure(&failure, &id(), false, Mode::Production);
        assert_eq!(prod.body.code, "UNKNOWN_ERROR");
        assert_eq!(prod.body.message, GENERIC_MESSAGE);
        assert!(prod.body.details.is_none());

        let dev = ApiErrorResponse::from_failure(&failure, &id(), false, Mode::Development);
        assert_eq!(dev.body.details.unwrap()["error"], "17");
    }

    #[test]
    fn application_kinds_are_sent_as_500() {
        let failure = Failure::from(AppError::mail("smtp unreachable"));
        let res = ApiErrorResponse::from_failure(&failure, &id(), false, Mode::Production);
        assert_eq!(res.status, 500);
        assert_eq!(res.body.code, "MAIL_ERROR");
    }

    #[test]
    fn timestamp_is_rfc3339() {
        let failure = Failure::from("x");
        let res = ApiErrorResponse::from_failure(&failure, &id(), false, Mode::Production);
        assert!(chrono::DateTime::parse_from_rfc3339(&res.body.timestamp).is_ok());
    }

    #[test]
    fn into_response_sets_headers() {
        let failure = Failure::from(AppError::unauthorized("no session"));
        let res = ApiErrorResponse::from_failure(&failure, &id(), false, Mode::Production)
            .into_response();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(res.headers()[CORRELATION_ID_HEADER], "cid-1");
        assert_eq!(res.headers()[ERROR_TYPE_HEADER], "UnauthorizedError");
    }

    #[test]
    fn invalid_header_ids_do_not_break_the_response() {
        let failure = Failure::from(AppError::bad_request("bad"));
        let weird = CorrelationId::from("line\nbreak");
        let res = ApiErrorResponse::from_failure(&failure, &weird, false, Mode::Production)
            .into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert!(res.headers().get(CORRELATION_ID_HEADER).is_none());
    }
}
