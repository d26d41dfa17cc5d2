//! `zap-core`: transport-free error handling building blocks.
//!
//! This crate holds the error taxonomy, failure normalization, the RPC error
//! shape and correlation IDs. It knows nothing about HTTP frameworks or
//! logging sinks.

pub mod correlation;
pub mod error;
pub mod failure;
pub mod issues;
pub mod rpc;

pub use correlation::CorrelationId;
pub use error::{AppError, AppResult, Cause, ErrorKind};
pub use failure::{Failure, GENERIC_MESSAGE, truncate_lines};
pub use issues::{ValidationIssue, ValidationIssues};
pub use rpc::{RpcError, RpcErrorCode, RpcErrorData};

/// Maximum number of stack/chain lines included in logs and error details.
pub const MAX_STACK_LINES: usize = 5;
