//! HTTP API: error pipeline, routing, and request/response mapping.

pub mod actions;
pub mod app;
pub mod config;
pub mod context;
pub mod handler;
pub mod input;
pub mod middleware;
pub mod push;
pub mod response;
pub mod session;
pub mod users;

pub use config::{AppConfig, Mode, VapidConfig};
pub use handler::{
    ErrorInterceptor, Handler, HandlerError, HandlerOptions, HandlerType, Interception,
};
pub use response::{ApiErrorResponse, ErrorResponse};
