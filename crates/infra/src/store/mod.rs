//! Persistence behind the account, document and reference-data traits.

mod r#trait;
pub mod in_memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use in_memory::{InMemoryAccountStore, InMemoryDocumentStore, InMemoryReferenceStore};
pub use r#trait::{AccountStore, DocumentStore, ReferenceStore};

#[cfg(feature = "postgres")]
pub use postgres::{ensure_schema, PostgresAccountStore, PostgresDocumentStore, PostgresReferenceStore};
