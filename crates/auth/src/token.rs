//! Credential issuance and verification.
//!
//! Tokens are HS256 JWTs signed with a process-wide secret. Nothing about
//! issued tokens is stored: a pair stays valid until it expires.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Serialize;
use thiserror::Error;

use crate::{
    validate_claims, AccountDirectory, AuthError, Claims, PasswordError, PasswordHasher, Principal,
    TokenKind,
};

/// Issuer name and lifetimes for issued credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenConfig {
    /// Written to `iss` and required on validation.
    pub issuer: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl TokenConfig {
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            access_ttl: Duration::minutes(60),
            refresh_ttl: Duration::minutes(20160),
        }
    }

    pub fn with_lifetimes(mut self, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        self.access_ttl = access_ttl;
        self.refresh_ttl = refresh_ttl;
        self
    }
}

/// Startup-time misconfiguration. Never produced per request.
#[derive(Debug, Error)]
pub enum TokenConfigError {
    #[error("signing secret must not be empty")]
    EmptySecret,

    #[error("issuer must not be empty")]
    EmptyIssuer,

    #[error("token lifetimes must be positive")]
    NonPositiveLifetime,

    #[error("access token lifetime must be shorter than refresh token lifetime")]
    AccessNotShorter,

    #[error("password hasher misconfigured: {0}")]
    Hasher(#[from] PasswordError),
}

/// Access + refresh token issued together at login and on every renewal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CredentialPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub token_type: &'static str,
}

pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    header: Header,
    validation: Validation,
    config: TokenConfig,
    accounts: Arc<dyn AccountDirectory>,
    hasher: PasswordHasher,
    /// Verified against when the username is unknown, so a miss costs the
    /// same as a wrong password.
    decoy_hash: String,
}

impl TokenService {
    pub fn new(
        secret: &[u8],
        config: TokenConfig,
        accounts: Arc<dyn AccountDirectory>,
        hasher: PasswordHasher,
    ) -> Result<Self, TokenConfigError> {
        if secret.is_empty() {
            return Err(TokenConfigError::EmptySecret);
        }
        if config.issuer.trim().is_empty() {
            return Err(TokenConfigError::EmptyIssuer);
        }
        if config.access_ttl <= Duration::zero() || config.refresh_ttl <= Duration::zero() {
            return Err(TokenConfigError::NonPositiveLifetime);
        }
        if config.access_ttl >= config.refresh_ttl {
            return Err(TokenConfigError::AccessNotShorter);
        }

        // Temporal checks run against our own clock in `validate_at`.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.set_required_spec_claims(&["exp", "nbf", "iss", "sub"]);
        validation.set_issuer(&[config.issuer.as_str()]);

        let decoy_hash = hasher.hash("findoc-decoy-password")?;

        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            header: Header::new(Algorithm::HS256),
            validation,
            config,
            accounts,
            hasher,
            decoy_hash,
        })
    }

    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    pub fn issue_pair(&self, principal: &Principal) -> Result<CredentialPair, AuthError> {
        self.issue_pair_at(principal, Utc::now())
    }

    /// Issue a pair as if the current time were `now`.
    pub fn issue_pair_at(
        &self,
        principal: &Principal,
        now: DateTime<Utc>,
    ) -> Result<CredentialPair, AuthError> {
        let access_token = self.sign(principal, TokenKind::Access, now, self.config.access_ttl)?;
        let refresh_token = self.sign(principal, TokenKind::Refresh, now, self.config.refresh_ttl)?;

        Ok(CredentialPair {
            access_token,
            refresh_token,
            expires_in: self.config.access_ttl.num_seconds(),
            token_type: "Bearer",
        })
    }

    fn sign(
        &self,
        principal: &Principal,
        kind: TokenKind,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<String, AuthError> {
        let claims = Claims {
            sub: principal.id,
            username: principal.username.clone(),
            role: principal.role,
            kind,
            iat: now,
            nbf: now,
            exp: now + ttl,
            iss: self.config.issuer.clone(),
        };

        jsonwebtoken::encode(&self.header, &claims, &self.encoding).map_err(|e| {
            tracing::error!(error = %e, kind = kind.as_str(), "failed to sign credential");
            AuthError::Signing
        })
    }

    pub fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        self.validate_at(token, Utc::now())
    }

    /// Verify signature, algorithm, issuer and the `nbf <= now < exp` window.
    ///
    /// Every failure collapses into `InvalidOrExpiredToken`; the concrete
    /// reason only reaches the debug log.
    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AuthError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|e| {
                tracing::debug!(reason = %e, "token rejected");
                AuthError::InvalidOrExpiredToken
            })?;

        validate_claims(&data.claims, now).map_err(|e| {
            tracing::debug!(reason = %e, sub = %data.claims.sub, "token rejected");
            AuthError::InvalidOrExpiredToken
        })?;

        Ok(data.claims)
    }

    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<(CredentialPair, Principal), AuthError> {
        let Some(account) = self.accounts.find_by_username(username).await? else {
            let _ = self.hasher.verify(password, &self.decoy_hash);
            tracing::warn!(error = "invalid_credentials", "login failed");
            return Err(AuthError::InvalidCredentials);
        };

        if !account.active {
            tracing::warn!(error = "user_inactive", user_id = %account.id, "login failed");
            return Err(AuthError::UserInactive);
        }

        if !self.hasher.verify(password, &account.password_hash) {
            tracing::warn!(error = "invalid_credentials", "login failed");
            return Err(AuthError::InvalidCredentials);
        }

        let principal = account.principal();
        let pair = self.issue_pair(&principal)?;
        tracing::info!(user_id = %principal.id, role = %principal.role, "login succeeded");

        Ok((pair, principal))
    }

    /// Exchange a refresh token for a brand-new pair.
    ///
    /// The presented pair is not invalidated; it expires on its own.
    pub async fn refresh(&self, refresh_token: &str) -> Result<(CredentialPair, Principal), AuthError> {
        let principal = self.live_principal(refresh_token, TokenKind::Refresh).await?;
        let pair = self.issue_pair(&principal)?;
        tracing::info!(user_id = %principal.id, "credentials refreshed");

        Ok((pair, principal))
    }

    /// Resolve the caller behind an access token against the live account.
    pub async fn resolve_principal(&self, access_token: &str) -> Result<Principal, AuthError> {
        self.live_principal(access_token, TokenKind::Access).await
    }

    async fn live_principal(&self, token: &str, expected: TokenKind) -> Result<Principal, AuthError> {
        let claims = self.validate(token)?;

        if claims.kind != expected {
            tracing::debug!(
                expected = expected.as_str(),
                actual = claims.kind.as_str(),
                "token kind mismatch"
            );
            return Err(AuthError::InvalidOrExpiredToken);
        }

        let account = self
            .accounts
            .find_by_id(claims.sub)
            .await?
            .ok_or(AuthError::InvalidOrExpiredToken)?;

        if !account.active {
            tracing::warn!(user_id = %account.id, "token presented for inactive account");
            return Err(AuthError::UserInactive);
        }

        Ok(account.principal())
    }
}
