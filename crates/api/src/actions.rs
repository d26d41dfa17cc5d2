//! Server actions: in-process entry points called by the rendering layer.
//!
//! Failures come back as typed [`AppError`]s, already logged.

use serde_json::Value;

use zap_core::{AppError, Failure};

use crate::app::services::AppServices;
use crate::context::SessionContext;
use crate::handler::HandlerOptions;
use crate::input::parse_input;
use crate::push::{Ack, SubscribeInput};
use crate::users::{User, get_user_by_email};

pub async fn subscribe_to_push_action(
    services: &AppServices,
    session: &SessionContext,
    input: Value,
) -> Result<Ack, AppError> {
    let options = HandlerOptions::default().with_context("action", "pwa.subscribe");
    services
        .handler()
        .with_server_action_handler(options, async {
            let input: SubscribeInput = parse_input(input)?;
            services
                .push()
                .subscribe(session.user_id(), input.subscription)
                .await
                .map_err(Failure::from)
        })
        .await
}

pub async fn unsubscribe_from_push_action(
    services: &AppServices,
    session: &SessionContext,
) -> Result<Ack, AppError> {
    let options = HandlerOptions::default().with_context("action", "pwa.unsubscribe");
    services
        .handler()
        .with_server_action_handler(options, services.push().unsubscribe(session.user_id()))
        .await
}

pub async fn find_user_action(services: &AppServices, email: &str) -> Result<User, AppError> {
    let options = HandlerOptions::default().with_context("action", "users.find");
    services
        .handler()
        .with_server_action_handler(options, async { get_user_by_email(services.users(), email) })
        .await
}
