//! Arbitrary failures raised by wrapped operations and their normalization.
//!
//! A wrapped operation may fail with anything: an already classified
//! [`AppError`], a set of validation issues, some library error, or a bare
//! value. [`Failure`] holds all four so the pipeline can log and reshape them
//! without losing information, and [`Failure::normalize`] collapses them into
//! one canonical [`AppError`].

use core::fmt;

use serde::Serialize;
use serde_json::Value;
use validator::ValidationErrors;

use crate::error::{AppError, Cause, ErrorKind};
use crate::issues::ValidationIssues;

/// Message used when a failure's own text must not be shown.
pub const GENERIC_MESSAGE: &str = "An unexpected error occurred";

/// Anything a wrapped operation can fail with.
#[derive(Debug)]
pub enum Failure {
    /// Already part of the taxonomy.
    Typed(AppError),
    /// Input failed schema validation.
    Validation(ValidationIssues),
    /// Unclassified error.
    Error {
        type_name: &'static str,
        error: anyhow::Error,
    },
    /// Not an error at all (a string, a number, a JSON blob).
    Value(Value),
}

impl Failure {
    /// Wrap a concrete error, remembering its type name for logs.
    pub fn error<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Failure::Error {
            type_name: short_type_name::<E>(),
            error: anyhow::Error::new(error),
        }
    }

    /// Wrap any serializable value.
    pub fn value(value: impl Serialize) -> Self {
        match serde_json::to_value(value) {
            Ok(v) => Failure::Value(v),
            Err(e) => Failure::Value(Value::String(e.to_string())),
        }
    }

    /// Name used for `error_type` in failure logs.
    pub fn type_name(&self) -> &str {
        match self {
            Failure::Typed(err) => err.name(),
            Failure::Validation(_) => "ValidationError",
            Failure::Error { type_name, .. } => *type_name,
            Failure::Value(value) => json_type(value),
        }
    }

    /// Best available human message. Never fails.
    pub fn message(&self) -> String {
        match self {
            Failure::Typed(err) => err.message().to_string(),
            Failure::Validation(_) => "Validation failed".to_string(),
            Failure::Error { error, .. } => error.to_string(),
            Failure::Value(value) => value_to_string(value),
        }
    }

    /// Up to `max_lines` lines describing where the failure came from.
    ///
    /// For unclassified errors this is the rendered source chain (plus the
    /// backtrace when one was captured); typed errors render their cause.
    pub fn stack(&self, max_lines: usize) -> Option<String> {
        let rendered = match self {
            Failure::Typed(err) => {
                let cause = err.cause()?;
                format!("{}: {}\nCaused by: {cause}", err.name(), err.message())
            }
            Failure::Error { error, .. } => format!("{error:?}"),
            Failure::Validation(_) | Failure::Value(_) => return None,
        };
        Some(truncate_lines(&rendered, max_lines))
    }

    /// Collapse into the canonical taxonomy.
    ///
    /// Typed errors pass through untouched, so normalizing twice is the same
    /// as normalizing once.
    pub fn normalize(self) -> AppError {
        match self {
            Failure::Typed(err) => err,
            Failure::Validation(issues) => {
                AppError::new(ErrorKind::InternalServer, "Validation failed").with_cause(issues)
            }
            Failure::Error { type_name, error } => {
                let cause = Cause::from_anyhow(type_name, &error);
                AppError::new(ErrorKind::InternalServer, error.to_string()).with_cause(cause)
            }
            Failure::Value(value) => {
                AppError::new(ErrorKind::InternalServer, value_to_string(&value)).with_cause(value)
            }
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.type_name(), self.message())
    }
}

impl From<AppError> for Failure {
    fn from(err: AppError) -> Self {
        Failure::Typed(err)
    }
}

impl From<ErrorKind> for Failure {
    fn from(kind: ErrorKind) -> Self {
        Failure::Typed(AppError::from_kind(kind))
    }
}

impl From<ValidationIssues> for Failure {
    fn from(issues: ValidationIssues) -> Self {
        Failure::Validation(issues)
    }
}

impl From<ValidationErrors> for Failure {
    fn from(errors: ValidationErrors) -> Self {
        Failure::Validation(errors.into())
    }
}

impl From<anyhow::Error> for Failure {
    fn from(error: anyhow::Error) -> Self {
        // A typed error that travelled through anyhow is still typed.
        match error.downcast::<AppError>() {
            Ok(typed) => Failure::Typed(typed),
            Err(error) => Failure::Error {
                type_name: "Error",
                error,
            },
        }
    }
}

impl From<std::io::Error> for Failure {
    fn from(error: std::io::Error) -> Self {
        Failure::error(error)
    }
}

impl From<serde_json::Error> for Failure {
    fn from(error: serde_json::Error) -> Self {
        Failure::error(error)
    }
}

impl From<String> for Failure {
    fn from(value: String) -> Self {
        Failure::Value(Value::String(value))
    }
}

impl From<&str> for Failure {
    fn from(value: &str) -> Self {
        Failure::Value(Value::String(value.to_string()))
    }
}

impl From<Value> for Failure {
    fn from(value: Value) -> Self {
        Failure::Value(value)
    }
}

impl From<Failure> for AppError {
    fn from(failure: Failure) -> Self {
        failure.normalize()
    }
}

/// Keep the first `max_lines` lines of `text`.
pub fn truncate_lines(text: &str, max_lines: usize) -> String {
    text.lines().take(max_lines).collect::<Vec<_>>().join("\n")
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    // Drop generic arguments before taking the last path segment.
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issues::ValidationIssue;
    use serde_json::json;

    fn sample_failures() -> Vec<Failure> {
        vec![
            AppError::conflict("email taken").into(),
            ValidationIssues::from(vec![ValidationIssue::new("email", "email", "bad")]).into(),
            anyhow::anyhow!("db connection reset").into(),
            std::io::Error::new(std::io::ErrorKind::Other, "disk full").into(),
            "plain string".into(),
            json!(42).into(),
            json!(null).into(),
            json!({"weird": [1, 2, 3]}).into(),
        ]
    }

    #[test]
    fn normalize_is_total() {
        for failure in sample_failures() {
            let err = failure.normalize();
            assert!(!err.code().is_empty());
            assert!(!err.name().is_empty());
            assert!(err.to_json().get("message").is_some());
        }
    }

    #[test]
    fn typed_errors_pass_through_unchanged() {
        let original = AppError::not_found("nope").with_cause(json!({"id": 7}));
        let once = Failure::from(original.clone()).normalize();
        assert_eq!(once, original);
        let twice = Failure::from(once.clone()).normalize();
        assert_eq!(twice, once);
    }

    #[test]
    fn validation_becomes_internal_with_issues() {
        let issues =
            ValidationIssues::from(vec![ValidationIssue::new("name", "length", "too short")]);
        let err = Failure::from(issues.clone()).normalize();
        assert_eq!(err.kind(), ErrorKind::InternalServer);
        assert_eq!(err.message(), "Validation failed");
        assert_eq!(err.cause(), Some(&Cause::Validation { issues }));
    }

    #[test]
    fn generic_errors_keep_their_message() {
        let err = Failure::from(anyhow::anyhow!("boom")).normalize();
        assert_eq!(err.kind(), ErrorKind::InternalServer);
        assert_eq!(err.message(), "boom");
    }

    #[test]
    fn non_error_values_are_coerced() {
        assert_eq!(Failure::from("oops").normalize().message(), "oops");
        assert_eq!(Failure::from(json!(404)).normalize().message(), "404");
        assert_eq!(Failure::value(json!(null)).type_name(), "null");
    }

    #[test]
    fn app_error_inside_anyhow_stays_typed() {
        let wrapped: anyhow::Error = AppError::forbidden("no").into();
        let failure = Failure::from(wrapped);
        assert!(matches!(failure, Failure::Typed(ref e) if e.kind() == ErrorKind::Forbidden));
    }

    #[test]
    fn concrete_errors_record_their_type_name() {
        let failure = Failure::from(std::io::Error::new(std::io::ErrorKind::Other, "x"));
        assert_eq!(failure.type_name(), "Error");
        let failure = Failure::error(AppError::internal("y"));
        assert_eq!(failure.type_name(), "AppError");
    }

    #[test]
    fn stack_is_truncated_and_optional() {
        let err = anyhow::anyhow!("root").context("layer 1").context("layer 2");
        let failure = Failure::from(err);
        let stack = failure.stack(2).unwrap();
        assert!(stack.lines().count() <= 2);

        assert!(Failure::from("s").stack(5).is_none());
        assert!(Failure::from(AppError::internal("no cause")).stack(5).is_none());
    }

    #[test]
    fn truncate_lines_keeps_prefix() {
        assert_eq!(truncate_lines("a\nb\nc", 2), "a\nb");
        assert_eq!(truncate_lines("", 5), "");
    }
}
