use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::HeaderMap,
    Json,
};
use serde::Serialize;

use crate::app::services::AppServices;
use crate::handler::{HandlerError, HandlerOptions};
use crate::middleware::incoming_correlation_id;
use crate::users::{User, get_user_by_email};

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub name: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_string(),
            email: user.email,
            name: user.name,
        }
    }
}

pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
    Path(email): Path<String>,
) -> Result<Json<UserResponse>, HandlerError> {
    let options = HandlerOptions::default()
        .with_optional_correlation_id(incoming_correlation_id(&headers))
        .with_context("route", "GET /users/:email")
        .include_stack(true);

    let user = services
        .handler()
        .with_api_handler(options, async { get_user_by_email(services.users(), &email) })
        .await?;

    Ok(Json(user.into()))
}
