use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use findoc_core::{Entity, UserId};

use crate::{Role, StoreError};

/// The authenticated caller, resolved fresh for each request.
///
/// Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: UserId,
    pub username: String,
    pub role: Role,
    pub active: bool,
}

/// Credential-store record.
#[derive(Clone, PartialEq, Eq)]
pub struct Account {
    pub id: UserId,
    pub username: String,
    pub password_hash: String,
    pub name: String,
    pub role: Role,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn principal(&self) -> Principal {
        Principal {
            id: self.id,
            username: self.username.clone(),
            role: self.role,
            active: self.active,
        }
    }
}

impl core::fmt::Debug for Account {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("password_hash", &"<redacted>")
            .field("name", &self.name)
            .field("role", &self.role)
            .field("active", &self.active)
            .field("created_at", &self.created_at)
            .finish()
    }
}

impl Entity for Account {
    type Id = UserId;

    fn id(&self) -> UserId {
        self.id
    }
}

/// Lookup capability the auth core needs from the credential store.
///
/// `Ok(None)` means "no such account"; `Err` is a store failure.
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, StoreError>;
    async fn find_by_id(&self, id: UserId) -> Result<Option<Account>, StoreError>;
}

#[async_trait]
impl<S> AccountDirectory for Arc<S>
where
    S: AccountDirectory + ?Sized,
{
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, StoreError> {
        (**self).find_by_username(username).await
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<Account>, StoreError> {
        (**self).find_by_id(id).await
    }
}
