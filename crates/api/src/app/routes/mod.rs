use axum::{routing::{get, post}, Router};

pub mod pwa;
pub mod system;
pub mod users;

/// Public API routes.
pub fn router() -> Router {
    Router::new().route("/users/:email", get(users::get_user))
}

/// RPC procedures (mounted under `/rpc`, session required).
pub fn rpc_router() -> Router {
    Router::new()
        .route("/pwa/subscribe", post(pwa::subscribe))
        .route("/pwa/unsubscribe", post(pwa::unsubscribe))
}
