//! RPC protocol error shape.
//!
//! The RPC transport only understands a fixed set of error codes. Anything
//! else is reported as `INTERNAL_SERVER_ERROR` so clients never see a code
//! they cannot decode.

use core::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{AppError, Cause};
use crate::issues::ValidationIssues;

/// Error codes recognized by the RPC transport.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RpcErrorCode {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    MethodNotSupported,
    NotAcceptable,
    Timeout,
    Conflict,
    PreconditionFailed,
    PayloadTooLarge,
    UnsupportedMediaType,
    UnprocessableContent,
    TooManyRequests,
    ClientClosedRequest,
    InternalServerError,
    NotImplemented,
    BadGateway,
    ServiceUnavailable,
    GatewayTimeout,
}

impl RpcErrorCode {
    pub const ALL: [RpcErrorCode; 19] = [
        RpcErrorCode::BadRequest,
        RpcErrorCode::Unauthorized,
        RpcErrorCode::Forbidden,
        RpcErrorCode::NotFound,
        RpcErrorCode::MethodNotSupported,
        RpcErrorCode::NotAcceptable,
        RpcErrorCode::Timeout,
        RpcErrorCode::Conflict,
        RpcErrorCode::PreconditionFailed,
        RpcErrorCode::PayloadTooLarge,
        RpcErrorCode::UnsupportedMediaType,
        RpcErrorCode::UnprocessableContent,
        RpcErrorCode::TooManyRequests,
        RpcErrorCode::ClientClosedRequest,
        RpcErrorCode::InternalServerError,
        RpcErrorCode::NotImplemented,
        RpcErrorCode::BadGateway,
        RpcErrorCode::ServiceUnavailable,
        RpcErrorCode::GatewayTimeout,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            RpcErrorCode::BadRequest => "BAD_REQUEST",
            RpcErrorCode::Unauthorized => "UNAUTHORIZED",
            RpcErrorCode::Forbidden => "FORBIDDEN",
            RpcErrorCode::NotFound => "NOT_FOUND",
            RpcErrorCode::MethodNotSupported => "METHOD_NOT_SUPPORTED",
            RpcErrorCode::NotAcceptable => "NOT_ACCEPTABLE",
            RpcErrorCode::Timeout => "TIMEOUT",
            RpcErrorCode::Conflict => "CONFLICT",
            RpcErrorCode::PreconditionFailed => "PRECONDITION_FAILED",
            RpcErrorCode::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            RpcErrorCode::UnsupportedMediaType => "UNSUPPORTED_MEDIA_TYPE",
            RpcErrorCode::UnprocessableContent => "UNPROCESSABLE_CONTENT",
            RpcErrorCode::TooManyRequests => "TOO_MANY_REQUESTS",
            RpcErrorCode::ClientClosedRequest => "CLIENT_CLOSED_REQUEST",
            RpcErrorCode::InternalServerError => "INTERNAL_SERVER_ERROR",
            RpcErrorCode::NotImplemented => "NOT_IMPLEMENTED",
            RpcErrorCode::BadGateway => "BAD_GATEWAY",
            RpcErrorCode::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            RpcErrorCode::GatewayTimeout => "GATEWAY_TIMEOUT",
        }
    }

    pub const fn status(self) -> u16 {
        match self {
            RpcErrorCode::BadRequest => 400,
            RpcErrorCode::Unauthorized => 401,
            RpcErrorCode::Forbidden => 403,
            RpcErrorCode::NotFound => 404,
            RpcErrorCode::MethodNotSupported => 405,
            RpcErrorCode::NotAcceptable => 406,
            RpcErrorCode::Timeout => 408,
            RpcErrorCode::Conflict => 409,
            RpcErrorCode::PreconditionFailed => 412,
            RpcErrorCode::PayloadTooLarge => 413,
            RpcErrorCode::UnsupportedMediaType => 415,
            RpcErrorCode::UnprocessableContent => 422,
            RpcErrorCode::TooManyRequests => 429,
            RpcErrorCode::ClientClosedRequest => 499,
            RpcErrorCode::InternalServerError => 500,
            RpcErrorCode::NotImplemented => 501,
            RpcErrorCode::BadGateway => 502,
            RpcErrorCode::ServiceUnavailable => 503,
            RpcErrorCode::GatewayTimeout => 504,
        }
    }

    /// Look up a code by its wire name. `None` for codes the transport does
    /// not define.
    pub fn parse(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == code)
    }

    /// Like [`parse`](Self::parse) but unknown codes fall back to
    /// `INTERNAL_SERVER_ERROR`.
    pub fn parse_or_internal(code: &str) -> Self {
        Self::parse(code).unwrap_or(RpcErrorCode::InternalServerError)
    }
}

impl fmt::Display for RpcErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload carried in `data`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RpcErrorData {
    pub message: String,
    pub cause: Option<Cause>,
}

/// Error as sent over the RPC transport.
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[error("{code}: {message}")]
pub struct RpcError {
    /// Whether the procedure declared this error up front. Errors produced by
    /// the handler pipeline are never declared.
    pub defined: bool,
    pub code: RpcErrorCode,
    pub status: u16,
    pub message: String,
    pub data: RpcErrorData,
}

impl RpcError {
    pub fn new(code: RpcErrorCode, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            defined: false,
            code,
            status: code.status(),
            data: RpcErrorData {
                message: message.clone(),
                cause: None,
            },
            message,
        }
    }

    pub fn with_cause(mut self, cause: Option<Cause>) -> Self {
        self.data.cause = cause;
        self
    }

    /// `BAD_REQUEST` for input rejected by the procedure's schema.
    pub fn input_validation(issues: ValidationIssues) -> Self {
        Self::new(RpcErrorCode::BadRequest, "Input validation failed")
            .with_cause(Some(Cause::Validation { issues }))
    }
}

impl AppError {
    /// Convert into the RPC transport's error shape.
    pub fn to_rpc_error(&self) -> RpcError {
        RpcError::new(RpcErrorCode::parse_or_internal(self.code()), self.message())
            .with_cause(self.cause().cloned())
    }
}

impl From<AppError> for RpcError {
    fn from(err: AppError) -> Self {
        err.to_rpc_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn wire_names_round_trip() {
        for code in RpcErrorCode::ALL {
            assert_eq!(RpcErrorCode::parse(code.as_str()), Some(code));
            let json = serde_json::to_value(code).unwrap();
            assert_eq!(json, code.as_str());
        }
    }

    #[test]
    fn http_kinds_keep_their_code() {
        let rpc = AppError::not_found("user missing").to_rpc_error();
        assert_eq!(rpc.code, RpcErrorCode::NotFound);
        assert_eq!(rpc.status, 404);
        assert_eq!(rpc.data.message, "user missing");
    }

    #[test]
    fn unknown_codes_fall_back_to_internal() {
        for kind in [
            ErrorKind::Mail,
            ErrorKind::PushNotification,
            ErrorKind::Application,
            ErrorKind::Client,
            ErrorKind::FileOperation,
        ] {
            let rpc = AppError::from_kind(kind).to_rpc_error();
            assert_eq!(rpc.code, RpcErrorCode::InternalServerError, "{kind}");
            assert_eq!(rpc.status, 500);
        }
    }

    #[test]
    fn cause_is_carried_in_data() {
        let err = AppError::conflict("dup").with_cause(serde_json::json!({"field": "email"}));
        let rpc = err.to_rpc_error();
        let json = serde_json::to_value(&rpc).unwrap();
        assert_eq!(json["code"], "CONFLICT");
        assert_eq!(json["defined"], false);
        assert_eq!(json["data"]["cause"]["value"]["field"], "email");
    }

    #[test]
    fn input_validation_is_bad_request_with_issues() {
        let issues = ValidationIssues::from(vec![crate::issues::ValidationIssue::new(
            "subscription.endpoint",
            "url",
            "failed `url` check",
        )]);
        let rpc = RpcError::input_validation(issues);
        assert_eq!(rpc.code, RpcErrorCode::BadRequest);
        assert_eq!(rpc.status, 400);
        let json = serde_json::to_value(&rpc).unwrap();
        assert_eq!(json["data"]["cause"]["kind"], "validation");
        assert_eq!(json["data"]["cause"]["issues"][0]["path"], "subscription.endpoint");
    }
}
