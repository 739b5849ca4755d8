//! Reference-data records referenced by documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{DomainError, DomainResult, Entity, ReferenceId};

/// The four reference tables a document points into.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    OrganizationalUnit,
    Official,
    FundingSource,
    DocumentType,
}

impl ReferenceKind {
    pub const ALL: [ReferenceKind; 4] = [
        ReferenceKind::OrganizationalUnit,
        ReferenceKind::Official,
        ReferenceKind::FundingSource,
        ReferenceKind::DocumentType,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceKind::OrganizationalUnit => "organizational_unit",
            ReferenceKind::Official => "official",
            ReferenceKind::FundingSource => "funding_source",
            ReferenceKind::DocumentType => "document_type",
        }
    }
}

impl core::str::FromStr for ReferenceKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReferenceKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown reference kind '{s}'")))
    }
}

impl core::fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceRecord {
    pub id: ReferenceId,
    pub kind: ReferenceKind,
    pub code: String,
    pub name: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceInput {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub active: Option<bool>,
}

impl ReferenceRecord {
    pub fn create(kind: ReferenceKind, input: ReferenceInput, now: DateTime<Utc>) -> DomainResult<Self> {
        let (code, name) = input.validated()?;
        Ok(Self {
            id: ReferenceId::new(),
            kind,
            code,
            name,
            active: input.active.unwrap_or(true),
            created_at: now,
        })
    }

    /// Replace code, name and (when given) the active flag. Id and kind stay.
    pub fn update(&mut self, input: ReferenceInput) -> DomainResult<()> {
        let (code, name) = input.validated()?;
        self.code = code;
        self.name = name;
        if let Some(active) = input.active {
            self.active = active;
        }
        Ok(())
    }
}

impl ReferenceInput {
    fn validated(&self) -> DomainResult<(String, String)> {
        let code = self.code.trim();
        let name = self.name.trim();
        if code.is_empty() {
            return Err(DomainError::validation("code is required"));
        }
        if name.is_empty() {
            return Err(DomainError::validation("name is required"));
        }
        Ok((code.to_string(), name.to_string()))
    }
}

impl Entity for ReferenceRecord {
    type Id = ReferenceId;

    fn id(&self) -> ReferenceId {
        self.id
    }
}
