use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use findoc_auth::{AuthError, Principal, Role, VisibilityScope};
use findoc_core::UserId;

use crate::app::errors::ApiError;

/// Authenticated caller for a request.
///
/// Inserted by the auth middleware; handlers take it as an extractor. A
/// handler reached without it answers 401.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal: Principal,
}

impl PrincipalContext {
    pub fn new(principal: Principal) -> Self {
        Self { principal }
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn user_id(&self) -> UserId {
        self.principal.id
    }

    pub fn role(&self) -> Role {
        self.principal.role
    }

    pub fn scope(&self) -> VisibilityScope {
        VisibilityScope::for_principal(&self.principal)
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for PrincipalContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<PrincipalContext>()
            .cloned()
            .ok_or(ApiError::Auth(AuthError::AuthenticationRequired))
    }
}
