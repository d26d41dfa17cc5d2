//! Handler log records.
//!
//! Every record carries the invocation's correlation ID so success, failure
//! and error-detail lines for one call can be joined.

use serde_json::Value;
use zap_core::{CorrelationId, Failure, MAX_STACK_LINES};

/// Handler finished successfully.
pub fn log_success(
    correlation_id: &CorrelationId,
    handler_type: &str,
    duration_ms: u64,
    context: &Value,
) {
    tracing::info!(
        correlation_id = %correlation_id,
        handler_type,
        duration_ms,
        context = %context,
        "{handler_type} completed in {duration_ms}ms"
    );
}

/// Handler failed. Emits the error detail record first, then the summary.
pub fn log_failure(
    failure: &Failure,
    correlation_id: &CorrelationId,
    handler_type: &str,
    duration_ms: u64,
    context: &Value,
) {
    log_server_error(failure, Some(correlation_id));
    tracing::error!(
        correlation_id = %correlation_id,
        handler_type,
        duration_ms,
        error_type = failure.type_name(),
        context = %context,
        "{handler_type} failed after {duration_ms}ms"
    );
}

/// Detailed record of a failure: type, message, cause and a truncated stack.
pub fn log_server_error(failure: &Failure, correlation_id: Option<&CorrelationId>) {
    let correlation_id = correlation_id.map(|c| c.as_str()).unwrap_or("-");
    let stack = failure.stack(MAX_STACK_LINES).unwrap_or_default();

    match failure {
        Failure::Typed(err) => {
            let cause = err.cause().map(|c| c.to_string()).unwrap_or_default();
            tracing::error!(
                correlation_id,
                error_type = err.name(),
                code = err.code(),
                cause = %cause,
                stack = %stack,
                "{}",
                err.message()
            );
        }
        Failure::Validation(issues) => {
            let issues = serde_json::to_string(issues).unwrap_or_default();
            tracing::error!(
                correlation_id,
                error_type = "ValidationError",
                issues = %issues,
                "Validation failed"
            );
        }
        Failure::Error { type_name, error } => {
            tracing::error!(
                correlation_id,
                error_type = *type_name,
                stack = %stack,
                "{error}"
            );
        }
        Failure::Value(value) => {
            tracing::error!(correlation_id, error_type = "UnknownError", "{value}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    use serde_json::json;
    use tracing_subscriber::fmt::MakeWriter;
    use zap_core::{AppError, ValidationIssue, ValidationIssues};

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Capture {
        fn lines(&self) -> Vec<Value> {
            let buf = self.0.lock().unwrap();
            String::from_utf8_lossy(&buf)
                .lines()
                .map(|l| serde_json::from_str(l).unwrap())
                .collect()
        }
    }

    impl Write for Capture {
        fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(data);
            Ok(data.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Capture {
        type Writer = Capture;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn capture(f: impl FnOnce()) -> Vec<Value> {
        let out = Capture::default();
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_writer(out.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        out.lines()
    }

    #[test]
    fn success_record_carries_correlation_fields() {
        let id = CorrelationId::from("abc");
        let lines = capture(|| log_success(&id, "api-route", 12, &json!({"route": "/users"})));
        assert_eq!(lines.len(), 1);
        let fields = &lines[0]["fields"];
        assert_eq!(fields["correlation_id"], "abc");
        assert_eq!(fields["handler_type"], "api-route");
        assert_eq!(fields["duration_ms"], 12);
        assert_eq!(lines[0]["level"], "INFO");
    }

    #[test]
    fn failure_record_follows_detail_record() {
        let id = CorrelationId::from("def");
        let failure = Failure::from(AppError::not_found("gone"));
        let lines = capture(|| log_failure(&failure, &id, "server-action", 3, &Value::Null));
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["fields"]["error_type"], "NotFoundError");
        assert_eq!(lines[0]["fields"]["message"], "gone");
        assert_eq!(lines[1]["fields"]["error_type"], "NotFoundError");
        assert_eq!(lines[1]["fields"]["correlation_id"], "def");
        assert_eq!(lines[1]["level"], "ERROR");
    }

    #[test]
    fn every_failure_variant_logs() {
        let failures = vec![
            Failure::from(ValidationIssues::from(vec![ValidationIssue::new("a", "b", "c")])),
            Failure::from(anyhow::anyhow!("root").context("outer")),
            Failure::from(json!({"odd": true})),
            Failure::from(json!(null)),
        ];
        for failure in &failures {
            let lines = capture(|| log_server_error(failure, None));
            assert_eq!(lines.len(), 1);
            assert_eq!(lines[0]["fields"]["correlation_id"], "-");
        }
    }
}
