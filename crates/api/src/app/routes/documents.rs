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

use findoc_auth::check_access;
use findoc_core::{Document, DocumentId, DocumentInput, ReferenceId, ReferenceKind};

use crate::app::dto;
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;
use crate::extract::{ApiJson, ApiQuery};

/// Financial documents. Any authenticated role; operators only see and touch
/// their own.
pub fn router() -> Router {
    Router::new()
        .route("/", get(list_documents).post(create_document))
        .route(
            "/:id",
            get(get_document).put(update_document).delete(delete_document),
        )
}

#[tracing::instrument(skip_all, fields(user_id = %principal.user_id()))]
pub async fn list_documents(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    ApiQuery(query): ApiQuery<dto::DocumentQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let filter = principal.scope().narrow(query.into_filter());
    let documents = services.documents.list(&filter).await?;
    Ok(Json(json!({ "data": documents })))
}

pub async fn get_document(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let document = load_accessible(&services, &principal, &id).await?;
    Ok(Json(json!({ "data": document })))
}

#[tracing::instrument(skip_all, fields(user_id = %principal.user_id()))]
pub async fn create_document(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    ApiJson(body): ApiJson<DocumentInput>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_references_exist(&services, &body).await?;
    let document = Document::create(body, principal.user_id(), Utc::now())?;
    let document = services.documents.insert(document).await?;
    tracing::info!(document_id = %document.id, "document created");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Document created",
            "data": document,
        })),
    ))
}

#[tracing::instrument(skip_all, fields(user_id = %principal.user_id(), document_id = %id))]
pub async fn update_document(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<DocumentInput>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut document = load_accessible(&services, &principal, &id).await?;
    ensure_references_exist(&services, &body).await?;
    document.update(body, Utc::now())?;
    let document = services.documents.update(document).await?;

    Ok(Json(json!({
        "message": "Document updated",
        "data": document,
    })))
}

#[tracing::instrument(skip_all, fields(user_id = %principal.user_id(), document_id = %id))]
pub async fn delete_document(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let document = load_accessible(&services, &principal, &id).await?;
    services.documents.delete(document.id).await?;
    tracing::info!("document deleted");
    Ok(Json(json!({ "message": "Document deleted" })))
}

/// Fetch a document and apply the ownership check.
///
/// Missing is 404 regardless of role; present but foreign is 403.
async fn load_accessible(
    services: &AppServices,
    principal: &PrincipalContext,
    raw_id: &str,
) -> Result<Document, ApiError> {
    let id: DocumentId = raw_id.parse()?;
    let document = services
        .documents
        .get(id)
        .await?
        .ok_or(ApiError::NotFound("document"))?;
    check_access(principal.principal(), &document)?;
    Ok(document)
}

async fn ensure_references_exist(services: &AppServices, input: &DocumentInput) -> Result<(), ApiError> {
    let refs: [(ReferenceKind, ReferenceId); 4] = [
        (ReferenceKind::OrganizationalUnit, input.unit_id),
        (ReferenceKind::Official, input.official_id),
        (ReferenceKind::DocumentType, input.document_type_id),
        (ReferenceKind::FundingSource, input.funding_source_id),
    ];

    for (kind, id) in refs {
        if services.references.get(kind, id).await?.is_none() {
            return Err(ApiError::BadRequest(format!("unknown {kind} {id}")));
        }
    }
    Ok(())
}
