//! Reference-data endpoints, one router per kind.
//!
//! Listing everything and mutating are admin-level; the active list feeds
//! document forms and is open to operators.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde_json::json;

use findoc_auth::{guard_delete, Role, RoleRequirement};
use findoc_core::{ReferenceId, ReferenceInput, ReferenceKind, ReferenceRecord};

use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;
use crate::extract::ApiJson;
use crate::middleware::require_role;

pub fn router(kind: ReferenceKind) -> Router {
    let admin = Router::new()
        .route("/", get(list_records).post(create_record))
        .route("/:id", get(get_record).put(update_record).delete(delete_record))
        .route_layer(axum::middleware::from_fn_with_state(
            RoleRequirement::AtLeast(Role::Admin),
            require_role,
        ));

    let operator = Router::new()
        .route("/active", get(list_active_records))
        .route_layer(axum::middleware::from_fn_with_state(
            RoleRequirement::AtLeast(Role::Operator),
            require_role,
        ));

    admin.merge(operator).layer(Extension(kind))
}

pub async fn list_records(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(kind): Extension<ReferenceKind>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let records = services.references.list(kind).await?;
    Ok(Json(json!({ "data": records })))
}

pub async fn list_active_records(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(kind): Extension<ReferenceKind>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let records = services.references.list_active(kind).await?;
    Ok(Json(json!({ "data": records })))
}

#[tracing::instrument(skip_all, fields(kind = %kind))]
pub async fn create_record(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(kind): Extension<ReferenceKind>,
    ApiJson(body): ApiJson<ReferenceInput>,
) -> Result<impl IntoResponse, ApiError> {
    let record = ReferenceRecord::create(kind, body, Utc::now())?;
    let record = services.references.insert(record).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Record created",
            "data": record,
        })),
    ))
}

pub async fn get_record(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(kind): Extension<ReferenceKind>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let record = load_record(&services, kind, &id).await?;
    Ok(Json(json!({ "data": record })))
}

#[tracing::instrument(skip_all, fields(kind = %kind, record_id = %id))]
pub async fn update_record(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(kind): Extension<ReferenceKind>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<ReferenceInput>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut record = load_record(&services, kind, &id).await?;
    record.update(body)?;
    let record = services.references.update(record).await?;

    Ok(Json(json!({
        "message": "Record updated",
        "data": record,
    })))
}

#[tracing::instrument(skip_all, fields(kind = %kind, record_id = %id, user_id = %principal.user_id()))]
pub async fn delete_record(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(kind): Extension<ReferenceKind>,
    principal: PrincipalContext,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id: ReferenceId = id.parse()?;
    if services.references.get(kind, id).await?.is_none() {
        return Err(ApiError::NotFound("record"));
    }

    guard_delete(id, |record_id| services.documents.count_referencing(kind, record_id)).await?;
    services.references.delete(kind, id).await?;
    tracing::info!("reference record deleted");

    Ok(Json(json!({ "message": "Record deleted" })))
}

async fn load_record(
    services: &AppServices,
    kind: ReferenceKind,
    raw_id: &str,
) -> Result<ReferenceRecord, ApiError> {
    let id: ReferenceId = raw_id.parse()?;
    services
        .references
        .get(kind, id)
        .await?
        .ok_or(ApiError::NotFound("record"))
}
