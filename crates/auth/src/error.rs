//! Error taxonomy for the auth core.
//!
//! Every variant is terminal for the request. The HTTP layer matches on these
//! exhaustively to pick a status code.

use thiserror::Error;

use crate::Role;

/// Failure reported by an external store collaborator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

/// Why an authenticated caller was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Denial {
    MinimumRole(Role),
    ExactRole(Role),
    AnyOf(Vec<Role>),
    NotOwner,
}

impl core::fmt::Display for Denial {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Denial::MinimumRole(role) | Denial::ExactRole(role) => {
                write!(f, "Required role: {role}")
            }
            Denial::AnyOf(roles) => {
                let names: Vec<&str> = roles.iter().map(|r| r.as_str()).collect();
                write!(f, "Required one of: {}", names.join(", "))
            }
            Denial::NotOwner => f.write_str("Document belongs to another user"),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Unknown username or wrong password; the two are never distinguished.
    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("user account is inactive")]
    UserInactive,

    /// Malformed, badly signed, expired, not-yet-valid or wrong-kind token.
    #[error("invalid or expired token")]
    InvalidOrExpiredToken,

    #[error("authentication required")]
    AuthenticationRequired,

    #[error("access denied. {0}")]
    AccessDenied(Denial),

    #[error("invalid role configuration")]
    InvalidRoleConfiguration,

    #[error("cannot delete: referenced by {count} documents")]
    Referenced { count: u64 },

    #[error("credential signing failed")]
    Signing,

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl From<crate::UnknownRole> for AuthError {
    fn from(_: crate::UnknownRole) -> Self {
        AuthError::InvalidRoleConfiguration
    }
}

impl AuthError {
    /// Stable machine-readable code for responses and log fields.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::UserInactive => "user_inactive",
            AuthError::InvalidOrExpiredToken => "invalid_or_expired_token",
            AuthError::AuthenticationRequired => "authentication_required",
            AuthError::AccessDenied(_) => "access_denied",
            AuthError::InvalidRoleConfiguration => "invalid_role_configuration",
            AuthError::Referenced { .. } => "referenced",
            AuthError::Signing => "signing_error",
            AuthError::Store(_) => "store_error",
        }
    }
}
