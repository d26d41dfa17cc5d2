use std::sync::Arc;

use axum::{body::Bytes, extract::Extension, http::HeaderMap, Json};

use zap_core::Failure;

use crate::app::services::AppServices;
use crate::context::SessionContext;
use crate::handler::{HandlerError, HandlerOptions};
use crate::input::parse_json_body;
use crate::middleware::incoming_correlation_id;
use crate::push::{Ack, SubscribeInput};

fn options(headers: &HeaderMap, procedure: &str) -> HandlerOptions {
    HandlerOptions::default()
        .with_optional_correlation_id(incoming_correlation_id(headers))
        .with_context("procedure", procedure)
}

/// The body is decoded inside the handler so malformed JSON is logged and
/// answered in the RPC error shape.
pub async fn subscribe(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Ack>, HandlerError> {
    let ack = services
        .handler()
        .with_rpc_handler(options(&headers, "pwa.subscribe"), async {
            let input: SubscribeInput = parse_json_body(&body)?;
            services
                .push()
                .subscribe(session.user_id(), input.subscription)
                .await
                .map_err(Failure::from)
        })
        .await?;

    Ok(Json(ack))
}

pub async fn unsubscribe(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
    headers: HeaderMap,
) -> Result<Json<Ack>, HandlerError> {
    let ack = services
        .handler()
        .with_rpc_handler(options(&headers, "pwa.unsubscribe"), async {
            services.push().unsubscribe(session.user_id()).await
        })
        .await?;

    Ok(Json(ack))
}
