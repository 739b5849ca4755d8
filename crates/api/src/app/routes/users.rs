use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use findoc_auth::{AccountDirectory, AuthError, Denial, Role, RoleRequirement};
use findoc_core::UserId;
use findoc_infra::AccountStore;

use crate::app::dto::{self, UserView};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;
use crate::extract::ApiJson;
use crate::middleware::require_role;

/// Account administration. Super admins only, except password resets which
/// admins may perform as well.
pub fn router() -> Router {
    let super_admin = Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:id/deactivate", post(deactivate_user))
        .route("/:id/activate", post(activate_user))
        .route_layer(axum::middleware::from_fn_with_state(
            RoleRequirement::Exactly(Role::SuperAdmin),
            require_role,
        ));

    let admin = Router::new()
        .route("/:id/reset-password", post(reset_password))
        .route_layer(axum::middleware::from_fn_with_state(
            RoleRequirement::AtLeast(Role::Admin),
            require_role,
        ));

    super_admin.merge(admin)
}

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let users: Vec<UserView> = services
        .accounts
        .list()
        .await?
        .iter()
        .map(UserView::from)
        .collect();
    Ok(Json(json!({ "data": users })))
}

#[tracing::instrument(skip_all, fields(username = %body.username, role = %body.role))]
pub async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    ApiJson(body): ApiJson<dto::CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let account = services
        .create_account(&body.username, &body.password, &body.name, body.role)
        .await?;
    tracing::info!(created_by = %principal.user_id(), user_id = %account.id, "account created");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User created",
            "data": UserView::from(&account),
        })),
    ))
}

pub async fn deactivate_user(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id: UserId = id.parse()?;
    if id == principal.user_id() {
        return Err(ApiError::BadRequest(
            "cannot deactivate your own account".to_string(),
        ));
    }
    set_active(&services, &principal, id, false).await
}

pub async fn activate_user(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id: UserId = id.parse()?;
    set_active(&services, &principal, id, true).await
}

/// Replace another account's password.
///
/// The caller must dominate the target's role, so an admin cannot take over a
/// super admin account.
#[tracing::instrument(skip_all, fields(by = %principal.user_id(), user_id = %id))]
pub async fn reset_password(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<dto::ResetPasswordRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id: UserId = id.parse()?;
    let target = services
        .accounts
        .find_by_id(id)
        .await?
        .ok_or(ApiError::NotFound("user"))?;

    if !principal.role().dominates(target.role) {
        tracing::warn!(target_role = %target.role, "password reset refused");
        return Err(AuthError::AccessDenied(Denial::MinimumRole(target.role)).into());
    }

    let password_hash = services
        .hasher
        .hash(&body.new_password)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let account = services.accounts.set_password_hash(id, password_hash).await?;
    tracing::info!("password reset");

    Ok(Json(json!({
        "message": "Password reset",
        "data": UserView::from(&account),
    })))
}

async fn set_active(
    services: &AppServices,
    principal: &PrincipalContext,
    id: UserId,
    active: bool,
) -> Result<Json<serde_json::Value>, ApiError> {
    let account = services
        .accounts
        .set_active(id, active)
        .await
        .map_err(|e| match e {
            findoc_auth::StoreError::NotFound => ApiError::NotFound("user"),
            other => ApiError::Store(other),
        })?;
    tracing::info!(by = %principal.user_id(), user_id = %id, active, "account activation changed");

    let message = if active { "User activated" } else { "User deactivated" };
    Ok(Json(json!({
        "message": message,
        "data": UserView::from(&account),
    })))
}
