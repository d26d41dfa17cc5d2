//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: stores, push service and the handler wrapper
//! - `routes/`: HTTP routes + handlers (one file per area)

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use crate::middleware;

pub mod routes;
pub mod services;

pub use services::AppServices;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(services: Arc<AppServices>) -> Router {
    let session_state = middleware::SessionState {
        sessions: services.sessions(),
    };

    // RPC procedures: require an active session.
    let rpc = routes::rpc_router().layer(axum::middleware::from_fn_with_state(
        session_state,
        middleware::session_middleware,
    ));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router())
        .nest("/rpc", rpc)
        .layer(ServiceBuilder::new().layer(Extension(services)))
}
