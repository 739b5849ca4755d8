//! Store and credential-service wiring.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

use findoc_auth::{
    Account, AccountDirectory, PasswordError, PasswordHasher, Role, StoreError, TokenConfig,
    TokenConfigError, TokenService,
};
use findoc_core::UserId;
use findoc_infra::{
    AccountStore, DocumentStore, InMemoryAccountStore, InMemoryDocumentStore,
    InMemoryReferenceStore, ReferenceStore,
};

use crate::app::errors::ApiError;
use crate::config::AppConfig;

pub const SEED_SUPERADMIN_USERNAME: &str = "superadmin";

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("token service misconfigured: {0}")]
    Token(#[from] TokenConfigError),

    #[error("password hashing failed: {0}")]
    Password(#[from] PasswordError),

    #[error("store unavailable: {0}")]
    Store(#[from] StoreError),

    #[error("persistent stores requested but DATABASE_URL is missing")]
    MissingDatabaseUrl,

    #[error("persistent stores require the `postgres` feature")]
    PersistenceUnavailable,

    #[cfg(feature = "postgres")]
    #[error("database connection failed: {0}")]
    Database(#[from] sqlx::Error),
}

/// Shared handles passed to every handler.
pub struct AppServices {
    pub accounts: Arc<dyn AccountStore>,
    pub documents: Arc<dyn DocumentStore>,
    pub references: Arc<dyn ReferenceStore>,
    pub tokens: Arc<TokenService>,
    pub hasher: PasswordHasher,
}

impl AppServices {
    /// Hash `password` and store a new account.
    pub async fn create_account(
        &self,
        username: &str,
        password: &str,
        name: &str,
        role: Role,
    ) -> Result<Account, ApiError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(ApiError::BadRequest("username is required".to_string()));
        }
        let password_hash = self
            .hasher
            .hash(password)
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;

        let account = Account {
            id: UserId::new(),
            username: username.to_string(),
            password_hash,
            name: name.trim().to_string(),
            role,
            active: true,
            created_at: Utc::now(),
        };
        Ok(self.accounts.create(account).await?)
    }
}

pub async fn build_services(config: &AppConfig) -> Result<AppServices, StartupError> {
    if config.use_persistent_stores {
        return build_persistent_services(config).await;
    }

    tracing::info!("using in-memory stores");
    let services = assemble(
        config,
        Arc::new(InMemoryAccountStore::new()),
        Arc::new(InMemoryDocumentStore::new()),
        Arc::new(InMemoryReferenceStore::new()),
    )?;
    seed_superadmin(&services, config).await?;
    Ok(services)
}

#[cfg(feature = "postgres")]
async fn build_persistent_services(config: &AppConfig) -> Result<AppServices, StartupError> {
    use findoc_infra::{
        ensure_schema, PostgresAccountStore, PostgresDocumentStore, PostgresReferenceStore,
    };

    let url = config
        .database_url
        .as_deref()
        .ok_or(StartupError::MissingDatabaseUrl)?;
    let pool = sqlx::PgPool::connect(url).await?;
    ensure_schema(&pool).await?;
    tracing::info!("using postgres stores");

    let services = assemble(
        config,
        Arc::new(PostgresAccountStore::new(pool.clone())),
        Arc::new(PostgresDocumentStore::new(pool.clone())),
        Arc::new(PostgresReferenceStore::new(pool)),
    )?;
    seed_superadmin(&services, config).await?;
    Ok(services)
}

#[cfg(not(feature = "postgres"))]
async fn build_persistent_services(_config: &AppConfig) -> Result<AppServices, StartupError> {
    Err(StartupError::PersistenceUnavailable)
}

fn assemble<A, D, R>(
    config: &AppConfig,
    accounts: Arc<A>,
    documents: Arc<D>,
    references: Arc<R>,
) -> Result<AppServices, StartupError>
where
    A: AccountStore + 'static,
    D: DocumentStore + 'static,
    R: ReferenceStore + 'static,
{
    let hasher = PasswordHasher::new(config.bcrypt_cost);
    let directory: Arc<dyn AccountDirectory> = accounts.clone();
    let token_config = TokenConfig::new(config.app_name.clone())
        .with_lifetimes(config.access_ttl, config.refresh_ttl);
    let tokens = TokenService::new(config.jwt_secret.as_bytes(), token_config, directory, hasher)?;

    Ok(AppServices {
        accounts,
        documents,
        references,
        tokens: Arc::new(tokens),
        hasher,
    })
}

async fn seed_superadmin(services: &AppServices, config: &AppConfig) -> Result<(), StartupError> {
    if services
        .accounts
        .find_by_username(SEED_SUPERADMIN_USERNAME)
        .await?
        .is_some()
    {
        return Ok(());
    }

    let account = Account {
        id: UserId::new(),
        username: SEED_SUPERADMIN_USERNAME.to_string(),
        password_hash: services.hasher.hash(&config.seed_superadmin_password)?,
        name: "Super Administrator".to_string(),
        role: Role::SuperAdmin,
        active: true,
        created_at: Utc::now(),
    };
    services.accounts.create(account).await?;
    tracing::info!(username = SEED_SUPERADMIN_USERNAME, "seeded super admin account");
    Ok(())
}
