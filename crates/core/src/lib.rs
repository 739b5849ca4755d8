//! `findoc-core`: domain foundation shared by the auth core, stores and API.
//!
//! This crate contains **pure domain** types (no infrastructure concerns).

pub mod document;
pub mod entity;
pub mod error;
pub mod id;
pub mod reference;

pub use document::{Document, DocumentFilter, DocumentInput, MAX_AMOUNT};
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{DocumentId, ReferenceId, UserId};
pub use reference::{ReferenceInput, ReferenceKind, ReferenceRecord};
