use std::sync::Arc;

use async_trait::async_trait;

use findoc_auth::{Account, AccountDirectory, StoreError};
use findoc_core::{
    Document, DocumentFilter, DocumentId, ReferenceId, ReferenceKind, ReferenceRecord, UserId,
};

/// Credential store. Lookups come from [`AccountDirectory`].
#[async_trait]
pub trait AccountStore: AccountDirectory {
    /// Insert a new account. Usernames are unique (`Conflict`).
    async fn create(&self, account: Account) -> Result<Account, StoreError>;

    async fn set_active(&self, id: UserId, active: bool) -> Result<Account, StoreError>;

    async fn set_password_hash(&self, id: UserId, password_hash: String) -> Result<Account, StoreError>;

    /// All accounts, ordered by username.
    async fn list(&self) -> Result<Vec<Account>, StoreError>;
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert(&self, document: Document) -> Result<Document, StoreError>;

    /// Replace a stored document by id (`NotFound` if absent).
    async fn update(&self, document: Document) -> Result<Document, StoreError>;

    async fn get(&self, id: DocumentId) -> Result<Option<Document>, StoreError>;

    /// Documents matching every condition in `filter`, newest first.
    async fn list(&self, filter: &DocumentFilter) -> Result<Vec<Document>, StoreError>;

    async fn delete(&self, id: DocumentId) -> Result<(), StoreError>;

    /// How many documents point at reference record `id` of `kind`.
    async fn count_referencing(&self, kind: ReferenceKind, id: ReferenceId) -> Result<u64, StoreError>;
}

#[async_trait]
pub trait ReferenceStore: Send + Sync {
    /// Insert a record. Codes are unique per kind (`Conflict`).
    async fn insert(&self, record: ReferenceRecord) -> Result<ReferenceRecord, StoreError>;

    async fn get(&self, kind: ReferenceKind, id: ReferenceId) -> Result<Option<ReferenceRecord>, StoreError>;

    /// Replace a stored record (`NotFound` if absent, `Conflict` on a taken code).
    async fn update(&self, record: ReferenceRecord) -> Result<ReferenceRecord, StoreError>;

    /// All records of `kind`, ordered by code.
    async fn list(&self, kind: ReferenceKind) -> Result<Vec<ReferenceRecord>, StoreError>;

    async fn list_active(&self, kind: ReferenceKind) -> Result<Vec<ReferenceRecord>, StoreError>;

    async fn delete(&self, kind: ReferenceKind, id: ReferenceId) -> Result<(), StoreError>;
}

#[async_trait]
impl<S> AccountStore for Arc<S>
where
    S: AccountStore + ?Sized,
{
    async fn create(&self, account: Account) -> Result<Account, StoreError> {
        (**self).create(account).await
    }

    async fn set_active(&self, id: UserId, active: bool) -> Result<Account, StoreError> {
        (**self).set_active(id, active).await
    }

    async fn set_password_hash(&self, id: UserId, password_hash: String) -> Result<Account, StoreError> {
        (**self).set_password_hash(id, password_hash).await
    }

    async fn list(&self) -> Result<Vec<Account>, StoreError> {
        (**self).list().await
    }
}

#[async_trait]
impl<S> DocumentStore for Arc<S>
where
    S: DocumentStore + ?Sized,
{
    async fn insert(&self, document: Document) -> Result<Document, StoreError> {
        (**self).insert(document).await
    }

    async fn update(&self, document: Document) -> Result<Document, StoreError> {
        (**self).update(document).await
    }

    async fn get(&self, id: DocumentId) -> Result<Option<Document>, StoreError> {
        (**self).get(id).await
    }

    async fn list(&self, filter: &DocumentFilter) -> Result<Vec<Document>, StoreError> {
        (**self).list(filter).await
    }

    async fn delete(&self, id: DocumentId) -> Result<(), StoreError> {
        (**self).delete(id).await
    }

    async fn count_referencing(&self, kind: ReferenceKind, id: ReferenceId) -> Result<u64, StoreError> {
        (**self).count_referencing(kind, id).await
    }
}

#[async_trait]
impl<S> ReferenceStore for Arc<S>
where
    S: ReferenceStore + ?Sized,
{
    async fn insert(&self, record: ReferenceRecord) -> Result<ReferenceRecord, StoreError> {
        (**self).insert(record).await
    }

    async fn get(&self, kind: ReferenceKind, id: ReferenceId) -> Result<Option<ReferenceRecord>, StoreError> {
        (**self).get(kind, id).await
    }

    async fn update(&self, record: ReferenceRecord) -> Result<ReferenceRecord, StoreError> {
        (**self).update(record).await
    }

    async fn list(&self, kind: ReferenceKind) -> Result<Vec<ReferenceRecord>, StoreError> {
        (**self).list(kind).await
    }

    async fn list_active(&self, kind: ReferenceKind) -> Result<Vec<ReferenceRecord>, StoreError> {
        (**self).list_active(kind).await
    }

    async fn delete(&self, kind: ReferenceKind, id: ReferenceId) -> Result<(), StoreError> {
        (**self).delete(kind, id).await
    }
}
