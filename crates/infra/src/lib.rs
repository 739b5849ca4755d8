//! Infrastructure layer: account, document and reference-data stores.

pub mod store;

pub use store::{
    AccountStore, DocumentStore, InMemoryAccountStore, InMemoryDocumentStore,
    InMemoryReferenceStore, ReferenceStore,
};

#[cfg(feature = "postgres")]
pub use store::{ensure_schema, PostgresAccountStore, PostgresDocumentStore, PostgresReferenceStore};
