use std::sync::Arc;

use axum::{
    extract::State,
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};

use findoc_auth::{AuthError, RoleRequirement, TokenService};

use crate::app::errors::ApiError;
use crate::context::PrincipalContext;

#[derive(Clone)]
pub struct AuthState {
    pub tokens: Arc<TokenService>,
}

/// Resolve the bearer token into a live principal, or answer 401.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let Some(token) = extract_bearer(req.headers()).map(str::to_owned) else {
        tracing::debug!(path = %req.uri().path(), "missing bearer token");
        return ApiError::Auth(AuthError::AuthenticationRequired).into_response();
    };

    let principal = match state.tokens.resolve_principal(&token).await {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!(error = e.code(), path = %req.uri().path(), "request authentication failed");
            return ApiError::Auth(e).into_response();
        }
    };

    req.extensions_mut().insert(PrincipalContext::new(principal));

    next.run(req).await
}

/// Route layer enforcing a [`RoleRequirement`].
///
/// Must sit inside [`auth_middleware`].
pub async fn require_role(
    State(requirement): State<RoleRequirement>,
    req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let verdict = requirement.check(
        req.extensions()
            .get::<PrincipalContext>()
            .map(PrincipalContext::principal),
    );

    match verdict {
        Ok(()) => next.run(req).await,
        Err(e) => ApiError::Auth(e).into_response(),
    }
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(axum::http::header::AUTHORIZATION)?;
    let header = header.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();

    if token.is_empty() {
        return None;
    }

    Some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_str(value).unwrap(),
        );
        h
    }

    #[test]
    fn bearer_token_is_extracted() {
        assert_eq!(extract_bearer(&headers("Bearer abc.def")), Some("abc.def"));
        assert_eq!(extract_bearer(&headers("Bearer   abc ")), Some("abc"));
    }

    #[test]
    fn malformed_headers_yield_nothing() {
        assert_eq!(extract_bearer(&HeaderMap::new()), None);
        assert_eq!(extract_bearer(&headers("Basic dXNlcjpwdw==")), None);
        assert_eq!(extract_bearer(&headers("Bearer ")), None);
        assert_eq!(extract_bearer(&headers("abc.def")), None);
    }
}
