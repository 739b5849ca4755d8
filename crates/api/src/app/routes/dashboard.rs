use std::sync::Arc;

use axum::{extract::Extension, routing::get, Json, Router};
use serde_json::json;

use findoc_core::DocumentFilter;

use crate::app::dto::{DashboardStats, StatsQuery};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;
use crate::extract::ApiQuery;

pub fn router() -> Router {
    Router::new().route("/stats", get(stats))
}

/// Document count and total amount over the caller's visible documents.
pub async fn stats(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    ApiQuery(query): ApiQuery<StatsQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let filter = principal.scope().narrow(DocumentFilter {
        year: query.year,
        ..DocumentFilter::default()
    });
    let documents = services.documents.list(&filter).await?;

    let stats = DashboardStats::from_documents(query.year, &documents)?;
    Ok(Json(json!({ "data": stats })))
}
