//! Handler wrapper: correlation, timing, logging and failure shaping.
//!
//! Every API route, server action and RPC procedure runs its body through a
//! [`Handler`]. On success the value is returned untouched. On failure the
//! wrapper logs once, then reshapes the failure for the caller according to
//! the [`HandlerType`]:
//!
//! - `api-route`: an [`ApiErrorResponse`] (JSON body, status, headers);
//! - `server-action`: the normalized [`AppError`];
//! - `rpc-procedure`: an [`RpcError`] in the transport's code set.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use zap_core::{AppError, CorrelationId, ErrorKind, Failure, RpcError};
use zap_observability::logging::{log_failure, log_success};

use crate::config::Mode;
use crate::response::{ApiErrorResponse, CORRELATION_ID_HEADER, ERROR_TYPE_HEADER, insert_header};

/// Invocation context of a wrapped handler.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HandlerType {
    #[default]
    ApiRoute,
    ServerAction,
    RpcProcedure,
}

impl HandlerType {
    pub const fn as_str(self) -> &'static str {
        match self {
            HandlerType::ApiRoute => "api-route",
            HandlerType::ServerAction => "server-action",
            HandlerType::RpcProcedure => "rpc-procedure",
        }
    }
}

impl core::fmt::Display for HandlerType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per call-site options. Built once, never mutated by the wrapper.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HandlerOptions {
    pub handler_type: HandlerType,
    /// Generated per invocation when absent.
    pub correlation_id: Option<CorrelationId>,
    pub context: Map<String, Value>,
    pub include_stack: bool,
}

impl HandlerOptions {
    pub fn new(handler_type: HandlerType) -> Self {
        Self {
            handler_type,
            ..Self::default()
        }
    }

    pub fn with_correlation_id(mut self, id: impl Into<CorrelationId>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    /// Use `id` when present; otherwise keep generating per invocation.
    pub fn with_optional_correlation_id(mut self, id: Option<CorrelationId>) -> Self {
        if id.is_some() {
            self.correlation_id = id;
        }
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    pub fn include_stack(mut self, include: bool) -> Self {
        self.include_stack = include;
        self
    }

    fn context_json(&self) -> Value {
        if self.context.is_empty() {
            Value::Null
        } else {
            Value::Object(self.context.clone())
        }
    }
}

/// Failure as handed back to the caller of a wrapped handler.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// `api-route`: a ready-to-send HTTP error.
    #[error(transparent)]
    Response(ApiErrorResponse),
    /// `server-action`: the normalized typed error.
    #[error(transparent)]
    Action(AppError),
    /// `rpc-procedure`: the RPC transport's error shape.
    #[error("{error}")]
    Rpc {
        error: RpcError,
        correlation_id: CorrelationId,
    },
}

impl HandlerError {
    pub fn rpc(error: RpcError, correlation_id: CorrelationId) -> Self {
        HandlerError::Rpc {
            error,
            correlation_id,
        }
    }

    /// Collapse to a typed error, whatever shape the failure took.
    pub fn into_app_error(self) -> AppError {
        match self {
            HandlerError::Action(err) => err,
            HandlerError::Response(res) => {
                let kind =
                    ErrorKind::from_code(&res.body.code).unwrap_or(ErrorKind::InternalServer);
                AppError::new(kind, res.body.message)
            }
            HandlerError::Rpc { error, .. } => {
                let kind =
                    ErrorKind::from_code(error.code.as_str()).unwrap_or(ErrorKind::InternalServer);
                AppError::new(kind, error.message)
            }
        }
    }
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        match self {
            HandlerError::Response(res) => res.into_response(),
            HandlerError::Action(err) => {
                let status = StatusCode::from_u16(err.http_status())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                let mut res = (status, Json(err.to_json())).into_response();
                insert_header(&mut res, ERROR_TYPE_HEADER, err.name());
                res
            }
            HandlerError::Rpc {
                error,
                correlation_id,
            } => {
                let status =
                    StatusCode::from_u16(error.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                let mut res = (status, Json(&error)).into_response();
                insert_header(&mut res, CORRELATION_ID_HEADER, correlation_id.as_str());
                res
            }
        }
    }
}

/// Outcome of an [`ErrorInterceptor`].
#[derive(Debug)]
pub enum Interception {
    /// The interceptor produced the caller-facing error itself.
    Handled(HandlerError),
    /// Continue with the default per-handler-type dispatch.
    Pass(Failure),
}

/// Hook that runs after logging and before the default dispatch.
pub trait ErrorInterceptor: Send + Sync {
    fn intercept(
        &self,
        failure: Failure,
        correlation_id: &CorrelationId,
        options: &HandlerOptions,
    ) -> Interception;
}

/// Wraps async operations with the error pipeline.
#[derive(Clone, Default)]
pub struct Handler {
    mode: Mode,
    interceptor: Option<Arc<dyn ErrorInterceptor>>,
}

impl core::fmt::Debug for Handler {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Handler")
            .field("mode", &self.mode)
            .field("interceptor", &self.interceptor.is_some())
            .finish()
    }
}

impl Handler {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            interceptor: None,
        }
    }

    pub fn with_interceptor(mut self, interceptor: impl ErrorInterceptor + 'static) -> Self {
        self.interceptor = Some(Arc::new(interceptor));
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Run `op` under `options`.
    pub async fn run<T, E, F>(&self, options: &HandlerOptions, op: F) -> Result<T, HandlerError>
    where
        F: Future<Output = Result<T, E>>,
        E: Into<Failure>,
    {
        let correlation_id = options
            .correlation_id
            .clone()
            .unwrap_or_else(CorrelationId::generate);
        let started = Instant::now();

        match op.await {
            Ok(value) => {
                if self.mode.is_development() {
                    log_success(
                        &correlation_id,
                        options.handler_type.as_str(),
                        elapsed_ms(started),
                        &options.context_json(),
                    );
                }
                Ok(value)
            }
            Err(err) => Err(self.handle_failure(err.into(), correlation_id, started, options)),
        }
    }

    /// Wrap an API route body.
    pub async fn with_api_handler<T, E, F>(
        &self,
        options: HandlerOptions,
        op: F,
    ) -> Result<T, HandlerError>
    where
        F: Future<Output = Result<T, E>>,
        E: Into<Failure>,
    {
        let options = HandlerOptions {
            handler_type: HandlerType::ApiRoute,
            ..options
        };
        self.run(&options, op).await
    }

    /// Wrap a server action. Failures come back as typed errors.
    pub async fn with_server_action_handler<T, E, F>(
        &self,
        options: HandlerOptions,
        op: F,
    ) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, E>>,
        E: Into<Failure>,
    {
        let options = HandlerOptions {
            handler_type: HandlerType::ServerAction,
            ..options
        };
        self.run(&options, op).await.map_err(HandlerError::into_app_error)
    }

    /// Wrap an RPC procedure body. Tags the log context with `type = rpc`.
    ///
    /// Input validation failures are answered with `BAD_REQUEST`; everything
    /// else goes through normalization first.
    pub async fn with_rpc_handler<T, E, F>(
        &self,
        options: HandlerOptions,
        op: F,
    ) -> Result<T, HandlerError>
    where
        F: Future<Output = Result<T, E>>,
        E: Into<Failure>,
    {
        let mut options = HandlerOptions {
            handler_type: HandlerType::RpcProcedure,
            ..options
        };
        options
            .context
            .entry("type")
            .or_insert_with(|| Value::from("rpc"));
        self.run(&options, op).await
    }

    fn handle_failure(
        &self,
        failure: Failure,
        correlation_id: CorrelationId,
        started: Instant,
        options: &HandlerOptions,
    ) -> HandlerError {
        log_failure(
            &failure,
            &correlation_id,
            options.handler_type.as_str(),
            elapsed_ms(started),
            &options.context_json(),
        );

        let failure = match &self.interceptor {
            Some(interceptor) => match interceptor.intercept(failure, &correlation_id, options) {
                Interception::Handled(err) => return err,
                Interception::Pass(failure) => failure,
            },
            None => failure,
        };

        match options.handler_type {
            HandlerType::ServerAction => HandlerError::Action(failure.normalize()),
            HandlerType::RpcProcedure => {
                let error = match failure {
                    Failure::Validation(issues) => RpcError::input_validation(issues),
                    other => other.normalize().to_rpc_error(),
                };
                HandlerError::rpc(error, correlation_id)
            }
            HandlerType::ApiRoute => HandlerError::Response(ApiErrorResponse::from_failure(
                &failure,
                &correlation_id,
                options.include_stack,
                self.mode,
            )),
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
