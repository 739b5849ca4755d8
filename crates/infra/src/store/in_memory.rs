use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use findoc_auth::{Account, AccountDirectory, StoreError};
use findoc_core::{
    Document, DocumentFilter, DocumentId, ReferenceId, ReferenceKind, ReferenceRecord, UserId,
};

use super::r#trait::{AccountStore, DocumentStore, ReferenceStore};

fn poisoned() -> StoreError {
    StoreError::backend("in-memory store lock poisoned")
}

/// In-memory account store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryAccountStore {
    accounts: RwLock<HashMap<UserId, Account>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountDirectory for InMemoryAccountStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, StoreError> {
        let map = self.accounts.read().map_err(|_| poisoned())?;
        Ok(map.values().find(|a| a.username == username).cloned())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<Account>, StoreError> {
        let map = self.accounts.read().map_err(|_| poisoned())?;
        Ok(map.get(&id).cloned())
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn create(&self, account: Account) -> Result<Account, StoreError> {
        let mut map = self.accounts.write().map_err(|_| poisoned())?;
        if map.values().any(|a| a.username == account.username) {
            return Err(StoreError::Conflict(format!(
                "username '{}' already exists",
                account.username
            )));
        }
        map.insert(account.id, account.clone());
        Ok(account)
    }

    async fn set_active(&self, id: UserId, active: bool) -> Result<Account, StoreError> {
        let mut map = self.accounts.write().map_err(|_| poisoned())?;
        let account = map.get_mut(&id).ok_or(StoreError::NotFound)?;
        account.active = active;
        Ok(account.clone())
    }

    async fn set_password_hash(&self, id: UserId, password_hash: String) -> Result<Account, StoreError> {
        let mut map = self.accounts.write().map_err(|_| poisoned())?;
        let account = map.get_mut(&id).ok_or(StoreError::NotFound)?;
        account.password_hash = password_hash;
        Ok(account.clone())
    }

    async fn list(&self) -> Result<Vec<Account>, StoreError> {
        let map = self.accounts.read().map_err(|_| poisoned())?;
        let mut accounts: Vec<Account> = map.values().cloned().collect();
        accounts.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(accounts)
    }
}

/// In-memory document store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    documents: RwLock<HashMap<DocumentId, Document>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn insert(&self, document: Document) -> Result<Document, StoreError> {
        let mut map = self.documents.write().map_err(|_| poisoned())?;
        if map.contains_key(&document.id) {
            return Err(StoreError::Conflict(format!("document {} already exists", document.id)));
        }
        map.insert(document.id, document.clone());
        Ok(document)
    }

    async fn update(&self, document: Document) -> Result<Document, StoreError> {
        let mut map = self.documents.write().map_err(|_| poisoned())?;
        let slot = map.get_mut(&document.id).ok_or(StoreError::NotFound)?;
        *slot = document.clone();
        Ok(document)
    }

    async fn get(&self, id: DocumentId) -> Result<Option<Document>, StoreError> {
        let map = self.documents.read().map_err(|_| poisoned())?;
        Ok(map.get(&id).cloned())
    }

    async fn list(&self, filter: &DocumentFilter) -> Result<Vec<Document>, StoreError> {
        let map = self.documents.read().map_err(|_| poisoned())?;
        let mut docs: Vec<Document> = map.values().filter(|d| filter.matches(d)).cloned().collect();
        docs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(docs)
    }

    async fn delete(&self, id: DocumentId) -> Result<(), StoreError> {
        let mut map = self.documents.write().map_err(|_| poisoned())?;
        map.remove(&id).map(|_| ()).ok_or(StoreError::NotFound)
    }

    async fn count_referencing(&self, kind: ReferenceKind, id: ReferenceId) -> Result<u64, StoreError> {
        let map = self.documents.read().map_err(|_| poisoned())?;
        Ok(map.values().filter(|d| d.reference(kind) == id).count() as u64)
    }
}

/// In-memory reference-data store for tests/dev. One table per kind.
#[derive(Debug, Default)]
pub struct InMemoryReferenceStore {
    records: RwLock<HashMap<(ReferenceKind, ReferenceId), ReferenceRecord>>,
}

impl InMemoryReferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn sorted(
        map: &HashMap<(ReferenceKind, ReferenceId), ReferenceRecord>,
        kind: ReferenceKind,
        active_only: bool,
    ) -> Vec<ReferenceRecord> {
        let mut records: Vec<ReferenceRecord> = map
            .iter()
            .filter_map(|((k, _id), r)| {
                if *k == kind && (!active_only || r.active) {
                    Some(r.clone())
                } else {
                    None
                }
            })
            .collect();
        records.sort_by(|a, b| a.code.cmp(&b.code));
        records
    }
}

#[async_trait]
impl ReferenceStore for InMemoryReferenceStore {
    async fn insert(&self, record: ReferenceRecord) -> Result<ReferenceRecord, StoreError> {
        let mut map = self.records.write().map_err(|_| poisoned())?;
        if map
            .values()
            .any(|r| r.kind == record.kind && r.code == record.code)
        {
            return Err(StoreError::Conflict(format!(
                "{} code '{}' already exists",
                record.kind, record.code
            )));
        }
        map.insert((record.kind, record.id), record.clone());
        Ok(record)
    }

    async fn get(&self, kind: ReferenceKind, id: ReferenceId) -> Result<Option<ReferenceRecord>, StoreError> {
        let map = self.records.read().map_err(|_| poisoned())?;
        Ok(map.get(&(kind, id)).cloned())
    }

    async fn update(&self, record: ReferenceRecord) -> Result<ReferenceRecord, StoreError> {
        let mut map = self.records.write().map_err(|_| poisoned())?;
        if !map.contains_key(&(record.kind, record.id)) {
            return Err(StoreError::NotFound);
        }
        if map
            .values()
            .any(|r| r.kind == record.kind && r.code == record.code && r.id != record.id)
        {
            return Err(StoreError::Conflict(format!(
                "{} code '{}' already exists",
                record.kind, record.code
            )));
        }
        map.insert((record.kind, record.id), record.clone());
        Ok(record)
    }

    async fn list(&self, kind: ReferenceKind) -> Result<Vec<ReferenceRecord>, StoreError> {
        let map = self.records.read().map_err(|_| poisoned())?;
        Ok(Self::sorted(&map, kind, false))
    }

    async fn list_active(&self, kind: ReferenceKind) -> Result<Vec<ReferenceRecord>, StoreError> {
        let map = self.records.read().map_err(|_| poisoned())?;
        Ok(Self::sorted(&map, kind, true))
    }

    async fn delete(&self, kind: ReferenceKind, id: ReferenceId) -> Result<(), StoreError> {
        let mut map = self.records.write().map_err(|_| poisoned())?;
        map.remove(&(kind, id)).map(|_| ()).ok_or(StoreError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use findoc_auth::Role;
    use findoc_core::{DocumentInput, ReferenceInput};

    fn account(username: &str) -> Account {
        Account {
            id: UserId::new(),
            username: username.to_string(),
            password_hash: "$2b$04$hash".to_string(),
            name: username.to_string(),
            role: Role::Operator,
            active: true,
            created_at: Utc::now(),
        }
    }

    fn document(owner: UserId, unit: ReferenceId, date: Option<NaiveDate>) -> Document {
        let input = DocumentInput {
            number: String::new(),
            date,
            unit_id: unit,
            official_id: ReferenceId::new(),
            document_type_id: ReferenceId::new(),
            funding_source_id: ReferenceId::new(),
            amount: 10,
            description: "doc".to_string(),
        };
        Document::create(input, owner, Utc::now()).unwrap()
    }

    #[tokio::test]
    async fn duplicate_username_conflicts() {
        let store = InMemoryAccountStore::new();
        store.create(account("op")).await.unwrap();
        let err = store.create(account("op")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn set_active_is_visible_to_lookups() {
        let store = InMemoryAccountStore::new();
        let a = store.create(account("op")).await.unwrap();

        store.set_active(a.id, false).await.unwrap();
        let found = store.find_by_username("op").await.unwrap().unwrap();
        assert!(!found.active);

        assert_eq!(
            store.set_active(UserId::new(), true).await.unwrap_err(),
            StoreError::NotFound
        );
    }

    #[tokio::test]
    async fn password_hash_is_replaced_in_place() {
        let store = InMemoryAccountStore::new();
        let a = store.create(account("op")).await.unwrap();

        let updated = store
            .set_password_hash(a.id, "$2b$04$other".to_string())
            .await
            .unwrap();
        assert_eq!(updated.password_hash, "$2b$04$other");
        assert_eq!(
            store.find_by_id(a.id).await.unwrap().unwrap().password_hash,
            "$2b$04$other"
        );
        assert_eq!(
            store
                .set_password_hash(UserId::new(), "x".to_string())
                .await
                .unwrap_err(),
            StoreError::NotFound
        );
    }

    #[tokio::test]
    async fn document_list_applies_filter_and_counts_references() {
        let store = InMemoryDocumentStore::new();
        let owner = UserId::new();
        let other = UserId::new();
        let unit = ReferenceId::new();

        store
            .insert(document(owner, unit, NaiveDate::from_ymd_opt(2024, 5, 1)))
            .await
            .unwrap();
        store
            .insert(document(owner, ReferenceId::new(), NaiveDate::from_ymd_opt(2023, 5, 1)))
            .await
            .unwrap();
        store.insert(document(other, unit, None)).await.unwrap();

        let mine = store
            .list(&DocumentFilter {
                created_by: Some(owner),
                ..DocumentFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(mine.len(), 2);

        let in_2024 = store
            .list(&DocumentFilter {
                year: Some(2024),
                ..DocumentFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(in_2024.len(), 1);

        assert_eq!(
            store
                .count_referencing(ReferenceKind::OrganizationalUnit, unit)
                .await
                .unwrap(),
            2
        );
        assert_eq!(
            store
                .count_referencing(ReferenceKind::FundingSource, unit)
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn document_delete_and_update_report_missing() {
        let store = InMemoryDocumentStore::new();
        let doc = document(UserId::new(), ReferenceId::new(), None);

        assert_eq!(store.update(doc.clone()).await.unwrap_err(), StoreError::NotFound);
        store.insert(doc.clone()).await.unwrap();
        store.delete(doc.id).await.unwrap();
        assert_eq!(store.delete(doc.id).await.unwrap_err(), StoreError::NotFound);
        assert!(store.get(doc.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn reference_listing_is_per_kind_and_active_aware() {
        let store = InMemoryReferenceStore::new();
        let now = Utc::now();
        let mk = |code: &str, active| ReferenceInput {
            code: code.to_string(),
            name: code.to_string(),
            active: Some(active),
        };

        store
            .insert(ReferenceRecord::create(ReferenceKind::FundingSource, mk("B", true), now).unwrap())
            .await
            .unwrap();
        store
            .insert(ReferenceRecord::create(ReferenceKind::FundingSource, mk("A", false), now).unwrap())
            .await
            .unwrap();
        store
            .insert(ReferenceRecord::create(ReferenceKind::DocumentType, mk("A", true), now).unwrap())
            .await
            .unwrap();

        let all = store.list(ReferenceKind::FundingSource).await.unwrap();
        assert_eq!(
            all.iter().map(|r| r.code.as_str()).collect::<Vec<_>>(),
            vec!["A", "B"]
        );
        assert_eq!(store.list_active(ReferenceKind::FundingSource).await.unwrap().len(), 1);

        let dup = ReferenceRecord::create(ReferenceKind::FundingSource, mk("A", true), now).unwrap();
        assert!(matches!(store.insert(dup).await, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn reference_update_keeps_codes_unique_per_kind() {
        let store = InMemoryReferenceStore::new();
        let now = Utc::now();
        let mk = |code: &str| ReferenceInput {
            code: code.to_string(),
            name: code.to_string(),
            active: None,
        };

        let a = store
            .insert(ReferenceRecord::create(ReferenceKind::Official, mk("A"), now).unwrap())
            .await
            .unwrap();
        let mut b = store
            .insert(ReferenceRecord::create(ReferenceKind::Official, mk("B"), now).unwrap())
            .await
            .unwrap();

        b.update(mk("A")).unwrap();
        assert!(matches!(store.update(b.clone()).await, Err(StoreError::Conflict(_))));

        // Keeping its own code is not a collision.
        let mut a_renamed = a.clone();
        a_renamed.update(ReferenceInput { name: "Renamed".to_string(), ..mk("A") }).unwrap();
        let stored = store.update(a_renamed).await.unwrap();
        assert_eq!(stored.name, "Renamed");

        let missing = ReferenceRecord::create(ReferenceKind::Official, mk("Z"), now).unwrap();
        assert_eq!(store.update(missing).await.unwrap_err(), StoreError::NotFound);
    }
}
