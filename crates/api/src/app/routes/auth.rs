use std::sync::Arc;

use axum::{
    extract::Extension,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use findoc_auth::{AccountDirectory, AuthError};

use crate::app::dto::{self, SessionData, UserView};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;
use crate::extract::ApiJson;

pub fn public_router() -> Router {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

pub fn router() -> Router {
    Router::new()
        .route("/auth/me", get(me))
        .route("/auth/logout", post(logout))
}

#[tracing::instrument(skip_all, fields(username = %body.username))]
pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<dto::LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    let (token, principal) = services
        .tokens
        .authenticate(&body.username, &body.password)
        .await?;
    let user = load_user(&services, principal.id).await?;

    Ok(Json(json!({
        "message": "Login successful",
        "data": SessionData { user, token },
    })))
}

#[tracing::instrument(skip_all)]
pub async fn refresh(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<dto::RefreshRequest>,
) -> Result<Json<Value>, ApiError> {
    let (token, principal) = services.tokens.refresh(&body.refresh_token).await?;
    let user = load_user(&services, principal.id).await?;

    Ok(Json(json!({
        "message": "Token refreshed",
        "data": SessionData { user, token },
    })))
}

pub async fn me(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
) -> Result<Json<Value>, ApiError> {
    let user = load_user(&services, principal.user_id()).await?;
    Ok(Json(json!({ "data": user })))
}

/// Credentials are stateless; the client discards its pair.
pub async fn logout(principal: PrincipalContext) -> Json<Value> {
    tracing::info!(user_id = %principal.user_id(), "logout");
    Json(json!({ "message": "Logout successful" }))
}

async fn load_user(services: &AppServices, id: findoc_core::UserId) -> Result<UserView, ApiError> {
    let account = services
        .accounts
        .find_by_id(id)
        .await?
        .ok_or(ApiError::Auth(AuthError::InvalidOrExpiredToken))?;
    Ok(UserView::from(&account))
}
