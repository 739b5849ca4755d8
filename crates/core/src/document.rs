//! Financial document record and its list filter.
//!
//! The auth core only reasons over `created_by`; the remaining fields exist so
//! the API can store and filter real records.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{DocumentId, DomainError, DomainResult, Entity, ReferenceId, ReferenceKind, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub number: String,
    pub date: Option<NaiveDate>,
    pub unit_id: ReferenceId,
    pub official_id: ReferenceId,
    pub document_type_id: ReferenceId,
    pub funding_source_id: ReferenceId,
    /// Amount in the smallest currency unit.
    pub amount: i64,
    pub description: String,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Largest accepted amount: fifteen digits in the smallest currency unit.
pub const MAX_AMOUNT: i64 = 999_999_999_999_999;

/// Client-supplied document fields (create and full update).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInput {
    #[serde(default)]
    pub number: String,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    pub unit_id: ReferenceId,
    pub official_id: ReferenceId,
    pub document_type_id: ReferenceId,
    pub funding_source_id: ReferenceId,
    pub amount: i64,
    pub description: String,
}

impl DocumentInput {
    pub fn validate(&self) -> DomainResult<()> {
        if self.amount <= 0 {
            return Err(DomainError::validation("amount must be greater than 0"));
        }
        if self.amount > MAX_AMOUNT {
            return Err(DomainError::validation(format!(
                "amount must not exceed {MAX_AMOUNT}"
            )));
        }
        if self.description.trim().is_empty() {
            return Err(DomainError::validation("description is required"));
        }
        Ok(())
    }
}

impl Document {
    pub fn create(input: DocumentInput, created_by: UserId, now: DateTime<Utc>) -> DomainResult<Self> {
        input.validate()?;
        Ok(Self {
            id: DocumentId::new(),
            number: input.number.trim().to_string(),
            date: input.date,
            unit_id: input.unit_id,
            official_id: input.official_id,
            document_type_id: input.document_type_id,
            funding_source_id: input.funding_source_id,
            amount: input.amount,
            description: input.description.trim().to_string(),
            created_by,
            created_at: now,
            updated_at: now,
        })
    }

    /// Replace the mutable fields. Ownership (`created_by`) never changes.
    pub fn update(&mut self, input: DocumentInput, now: DateTime<Utc>) -> DomainResult<()> {
        input.validate()?;
        self.number = input.number.trim().to_string();
        self.date = input.date;
        self.unit_id = input.unit_id;
        self.official_id = input.official_id;
        self.document_type_id = input.document_type_id;
        self.funding_source_id = input.funding_source_id;
        self.amount = input.amount;
        self.description = input.description.trim().to_string();
        self.updated_at = now;
        Ok(())
    }

    /// The reference record of `kind` this document points at.
    pub fn reference(&self, kind: ReferenceKind) -> ReferenceId {
        match kind {
            ReferenceKind::OrganizationalUnit => self.unit_id,
            ReferenceKind::Official => self.official_id,
            ReferenceKind::DocumentType => self.document_type_id,
            ReferenceKind::FundingSource => self.funding_source_id,
        }
    }
}

impl Entity for Document {
    type Id = DocumentId;

    fn id(&self) -> DocumentId {
        self.id
    }
}

/// Conjunctive list filter. Every `Some` field must match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentFilter {
    pub unit_id: Option<ReferenceId>,
    pub official_id: Option<ReferenceId>,
    pub created_by: Option<UserId>,
    /// Inclusive lower bound on the document date.
    pub start_date: Option<NaiveDate>,
    /// Inclusive upper bound on the document date.
    pub end_date: Option<NaiveDate>,
    pub year: Option<i32>,
}

impl DocumentFilter {
    pub fn matches(&self, doc: &Document) -> bool {
        if self.unit_id.is_some_and(|id| id != doc.unit_id) {
            return false;
        }
        if self.official_id.is_some_and(|id| id != doc.official_id) {
            return false;
        }
        if self.created_by.is_some_and(|id| id != doc.created_by) {
            return false;
        }
        // Date bounds exclude undated documents.
        if let Some(start) = self.start_date {
            if doc.date.is_none_or(|d| d < start) {
                return false;
            }
        }
        if let Some(end) = self.end_date {
            if doc.date.is_none_or(|d| d > end) {
                return false;
            }
        }
        if let Some(year) = self.year {
            if doc.date.is_none_or(|d| d.year() != year) {
                return false;
            }
        }
        true
    }
}
