use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use findoc_auth::{Account, CredentialPair, Role};
use findoc_core::{Document, DocumentFilter, DomainError, ReferenceId, UserId};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub name: String,
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub new_password: String,
}

/// Query string for `GET /api/dokumen`.
#[derive(Debug, Default, Deserialize)]
pub struct DocumentQuery {
    pub unit_id: Option<Uuid>,
    pub official_id: Option<Uuid>,
    pub created_by: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub year: Option<i32>,
}

impl DocumentQuery {
    pub fn into_filter(self) -> DocumentFilter {
        DocumentFilter {
            unit_id: self.unit_id.map(ReferenceId::from_uuid),
            official_id: self.official_id.map(ReferenceId::from_uuid),
            created_by: self.created_by.map(UserId::from_uuid),
            start_date: self.start_date,
            end_date: self.end_date,
            year: self.year,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct StatsQuery {
    pub year: Option<i32>,
}

// -------------------------
// Response DTOs
// -------------------------

/// Account as exposed over HTTP. Never carries the password hash.
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub id: UserId,
    pub username: String,
    pub name: String,
    pub role: Role,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&Account> for UserView {
    fn from(a: &Account) -> Self {
        Self {
            id: a.id,
            username: a.username.clone(),
            name: a.name.clone(),
            role: a.role,
            active: a.active,
            created_at: a.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionData {
    pub user: UserView,
    pub token: CredentialPair,
}

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub year: Option<i32>,
    pub total_documents: usize,
    pub total_amount: i64,
}

impl DashboardStats {
    /// Totals over `documents`; a sum past `i64::MAX` is an error, not a wrap.
    pub fn from_documents(year: Option<i32>, documents: &[Document]) -> Result<Self, DomainError> {
        let total_amount = documents
            .iter()
            .try_fold(0i64, |acc, d| acc.checked_add(d.amount))
            .ok_or_else(|| DomainError::validation("total amount is out of range"))?;

        Ok(Self {
            year,
            total_documents: documents.len(),
            total_amount,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_maps_into_filter() {
        let unit = Uuid::now_v7();
        let q = DocumentQuery {
            unit_id: Some(unit),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            ..DocumentQuery::default()
        };
        let f = q.into_filter();
        assert_eq!(f.unit_id, Some(ReferenceId::from_uuid(unit)));
        assert_eq!(f.created_by, None);
        assert_eq!(f.year, None);

        let f = DocumentQuery {
            year: Some(2024),
            ..DocumentQuery::default()
        }
        .into_filter();
        assert_eq!(f.year, Some(2024));
    }

    fn document_with_amount(amount: i64) -> Document {
        let mut doc = Document::create(
            findoc_core::DocumentInput {
                number: String::new(),
                date: None,
                unit_id: ReferenceId::new(),
                official_id: ReferenceId::new(),
                document_type_id: ReferenceId::new(),
                funding_source_id: ReferenceId::new(),
                amount: 1,
                description: "x".to_string(),
            },
            UserId::new(),
            Utc::now(),
        )
        .unwrap();
        // Stored rows are not re-validated on read.
        doc.amount = amount;
        doc
    }

    #[test]
    fn stats_total_reports_overflow_instead_of_wrapping() {
        let docs = [document_with_amount(i64::MAX), document_with_amount(1)];
        let err = DashboardStats::from_documents(None, &docs).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let docs = [document_with_amount(250), document_with_amount(50)];
        let stats = DashboardStats::from_documents(Some(2024), &docs).unwrap();
        assert_eq!(stats.total_documents, 2);
        assert_eq!(stats.total_amount, 300);
        assert_eq!(stats.year, Some(2024));
    }

    #[test]
    fn user_view_omits_hash() {
        let account = Account {
            id: UserId::new(),
            username: "op".to_string(),
            password_hash: "$2b$04$abc".to_string(),
            name: "Operator".to_string(),
            role: Role::Operator,
            active: true,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(UserView::from(&account)).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["role"], "operator");
    }
}
