//! Which documents a principal may see or touch.
//!
//! Operators are confined to records they created. Admin and above see
//! everything. The scope is derived purely from the role and is applied both
//! to list queries (as a forced filter) and to single-record access.

use findoc_core::{Document, DocumentFilter, UserId};

use crate::{AuthError, Denial, Principal, Role};

/// Anything with a recorded creator.
pub trait Owned {
    fn owner(&self) -> UserId;
}

impl Owned for Document {
    fn owner(&self) -> UserId {
        self.created_by
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum VisibilityScope {
    All,
    OwnedBy(UserId),
}

impl VisibilityScope {
    pub fn for_principal(principal: &Principal) -> Self {
        match principal.role {
            Role::Operator => VisibilityScope::OwnedBy(principal.id),
            Role::Admin | Role::SuperAdmin => VisibilityScope::All,
        }
    }

    pub fn permits<R: Owned + ?Sized>(&self, record: &R) -> bool {
        match self {
            VisibilityScope::All => true,
            VisibilityScope::OwnedBy(owner) => record.owner() == *owner,
        }
    }

    /// Apply the scope to a caller-built filter.
    ///
    /// For `OwnedBy` the creator condition is overwritten, so a client-supplied
    /// `created_by` can never widen an operator's view.
    pub fn narrow(&self, mut filter: DocumentFilter) -> DocumentFilter {
        if let VisibilityScope::OwnedBy(owner) = self {
            filter.created_by = Some(*owner);
        }
        filter
    }
}

pub fn can_access<R: Owned + ?Sized>(principal: &Principal, record: &R) -> bool {
    VisibilityScope::for_principal(principal).permits(record)
}

/// `can_access` as a gate: refusal is `AccessDenied(NotOwner)`.
pub fn check_access<R: Owned + ?Sized>(principal: &Principal, record: &R) -> Result<(), AuthError> {
    if can_access(principal, record) {
        Ok(())
    } else {
        tracing::warn!(user_id = %principal.id, owner = %record.owner(), "record owned by another user");
        Err(AuthError::AccessDenied(Denial::NotOwner))
    }
}
