use axum::Router;

use findoc_core::ReferenceKind;

pub mod auth;
pub mod dashboard;
pub mod documents;
pub mod reference;
pub mod system;
pub mod users;

/// Endpoints reachable without a bearer token.
pub fn public_router() -> Router {
    auth::public_router()
}

/// Router for all authenticated endpoints, mounted under `/api`.
pub fn router() -> Router {
    Router::new()
        .merge(auth::router())
        .nest("/users", users::router())
        .nest("/dokumen", documents::router())
        .nest("/dashboard", dashboard::router())
        .nest("/unit-kerja", reference::router(ReferenceKind::OrganizationalUnit))
        .nest("/pptk", reference::router(ReferenceKind::Official))
        .nest("/sumber-dana", reference::router(ReferenceKind::FundingSource))
        .nest("/jenis-dokumen", reference::router(ReferenceKind::DocumentType))
}
