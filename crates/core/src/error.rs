//! Error taxonomy.
//!
//! Every failure the application reports is an [`AppError`]: a closed
//! [`ErrorKind`] plus a human message and an optional [`Cause`]. The kind alone
//! determines the stable machine code and (for HTTP-based kinds) the status.

use core::fmt;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::issues::ValidationIssues;

/// Result type used across the application layer.
pub type AppResult<T> = Result<T, AppError>;

/// Closed set of failure categories.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Unclassified failure.
    InternalServer,
    NotFound,
    BadRequest,
    Unauthorized,
    Forbidden,
    Conflict,
    /// Outbound mail could not be prepared or delivered.
    Mail,
    /// Web Push configuration or delivery failure.
    PushNotification,
    Application,
    Client,
    FileOperation,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 11] = [
        ErrorKind::InternalServer,
        ErrorKind::NotFound,
        ErrorKind::BadRequest,
        ErrorKind::Unauthorized,
        ErrorKind::Forbidden,
        ErrorKind::Conflict,
        ErrorKind::Mail,
        ErrorKind::PushNotification,
        ErrorKind::Application,
        ErrorKind::Client,
        ErrorKind::FileOperation,
    ];

    /// Kind name as exposed in `error` fields and `x-error-type` headers.
    pub const fn name(self) -> &'static str {
        match self {
            ErrorKind::InternalServer => "InternalServerError",
            ErrorKind::NotFound => "NotFoundError",
            ErrorKind::BadRequest => "BadRequestError",
            ErrorKind::Unauthorized => "UnauthorizedError",
            ErrorKind::Forbidden => "ForbiddenError",
            ErrorKind::Conflict => "ConflictError",
            ErrorKind::Mail => "MailError",
            ErrorKind::PushNotification => "PushNotificationError",
            ErrorKind::Application => "ApplicationError",
            ErrorKind::Client => "ClientError",
            ErrorKind::FileOperation => "FileOperationError",
        }
    }

    /// Stable machine-readable code.
    pub const fn code(self) -> &'static str {
        match self {
            ErrorKind::InternalServer => "INTERNAL_SERVER_ERROR",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::BadRequest => "BAD_REQUEST",
            ErrorKind::Unauthorized => "UNAUTHORIZED",
            ErrorKind::Forbidden => "FORBIDDEN",
            ErrorKind::Conflict => "CONFLICT",
            ErrorKind::Mail => "MAIL_ERROR",
            ErrorKind::PushNotification => "PUSH_NOTIFICATION_ERROR",
            ErrorKind::Application => "APPLICATION_ERROR",
            ErrorKind::Client => "CLIENT_ERROR",
            ErrorKind::FileOperation => "FILE_OPERATION_ERROR",
        }
    }

    /// Reverse of [`code`](Self::code).
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.code() == code)
    }

    /// HTTP status for HTTP-based kinds, `None` for application-level kinds.
    pub const fn status_code(self) -> Option<u16> {
        match self {
            ErrorKind::InternalServer => Some(500),
            ErrorKind::NotFound => Some(404),
            ErrorKind::BadRequest => Some(400),
            ErrorKind::Unauthorized => Some(401),
            ErrorKind::Forbidden => Some(403),
            ErrorKind::Conflict => Some(409),
            ErrorKind::Mail
            | ErrorKind::PushNotification
            | ErrorKind::Application
            | ErrorKind::Client
            | ErrorKind::FileOperation => None,
        }
    }

    /// Status used when the kind has to travel over HTTP anyway.
    pub const fn http_status(self) -> u16 {
        match self.status_code() {
            Some(status) => status,
            None => 500,
        }
    }

    pub const fn is_http(self) -> bool {
        self.status_code().is_some()
    }

    pub const fn default_message(self) -> &'static str {
        match self {
            ErrorKind::InternalServer => "Internal Server Error",
            ErrorKind::NotFound => "Not Found",
            ErrorKind::BadRequest => "Bad Request",
            ErrorKind::Unauthorized => "Unauthorized",
            ErrorKind::Forbidden => "Forbidden",
            ErrorKind::Conflict => "Conflict",
            ErrorKind::Mail => "Mail Error",
            ErrorKind::PushNotification => "Push Notification Error",
            ErrorKind::Application => "Application Error",
            ErrorKind::Client => "Client Error",
            ErrorKind::FileOperation => "File Operation Error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What an [`AppError`] wraps.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Cause {
    /// Per-field validation issues.
    Validation { issues: ValidationIssues },
    /// Another error, captured as its rendered source chain.
    Error {
        error_type: String,
        message: String,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        chain: Vec<String>,
    },
    /// A non-error value.
    Value { value: Value },
}

impl Cause {
    pub fn from_error(
        error_type: impl Into<String>,
        err: &(dyn std::error::Error + 'static),
    ) -> Self {
        let mut chain = Vec::new();
        let mut source = err.source();
        while let Some(inner) = source {
            chain.push(inner.to_string());
            source = inner.source();
        }
        Cause::Error {
            error_type: error_type.into(),
            message: err.to_string(),
            chain,
        }
    }

    pub fn from_anyhow(error_type: impl Into<String>, err: &anyhow::Error) -> Self {
        Cause::Error {
            error_type: error_type.into(),
            message: err.to_string(),
            chain: err.chain().skip(1).map(|e| e.to_string()).collect(),
        }
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl fmt::Display for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cause::Validation { issues } => write!(f, "{} validation issue(s)", issues.len()),
            Cause::Error { error_type, message, .. } => write!(f, "{error_type}: {message}"),
            Cause::Value { value } => write!(f, "{value}"),
        }
    }
}

impl From<ValidationIssues> for Cause {
    fn from(issues: ValidationIssues) -> Self {
        Cause::Validation { issues }
    }
}

impl From<Value> for Cause {
    fn from(value: Value) -> Self {
        Cause::Value { value }
    }
}

/// A classified application failure.
///
/// Kind, and therefore code and status, is fixed at construction.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct AppError {
    kind: ErrorKind,
    message: String,
    cause: Option<Cause>,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            cause: None,
        }
    }

    /// Error carrying the kind's default message.
    pub fn from_kind(kind: ErrorKind) -> Self {
        Self::new(kind, kind.default_message())
    }

    pub fn with_cause(mut self, cause: impl Into<Cause>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::InternalServer, msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, msg)
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, msg)
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, msg)
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, msg)
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, msg)
    }

    pub fn mail(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Mail, msg)
    }

    pub fn push_notification(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::PushNotification, msg)
    }

    pub fn application(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Application, msg)
    }

    pub fn client(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Client, msg)
    }

    pub fn file_operation(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::FileOperation, msg)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status_code(&self) -> Option<u16> {
        self.kind.status_code()
    }

    pub fn http_status(&self) -> u16 {
        self.kind.http_status()
    }

    pub fn cause(&self) -> Option<&Cause> {
        self.cause.as_ref()
    }

    /// Stable JSON form: `error`, `message`, `code`, then `statusCode` for
    /// HTTP-based kinds and `cause` when present.
    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        out.insert("error".into(), Value::from(self.name()));
        out.insert("message".into(), Value::from(self.message.as_str()));
        out.insert("code".into(), Value::from(self.code()));
        if let Some(status) = self.status_code() {
            out.insert("statusCode".into(), Value::from(status));
        }
        if let Some(cause) = &self.cause {
            out.insert("cause".into(), cause.to_json());
        }
        Value::Object(out)
    }
}

impl From<ErrorKind> for AppError {
    fn from(kind: ErrorKind) -> Self {
        Self::from_kind(kind)
    }
}

impl Serialize for AppError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}
