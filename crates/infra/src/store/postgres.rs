//! Postgres-backed stores.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `Conflict` |
//! | Database (other) | Any other | `Backend` |
//! | PoolClosed / other | N/A | `Backend` |
//!
//! Every store is `Send + Sync` and shares the SQLx connection pool.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use tracing::instrument;

use findoc_auth::{Account, AccountDirectory, Role, StoreError};
use findoc_core::{
    Document, DocumentFilter, DocumentId, ReferenceId, ReferenceKind, ReferenceRecord, UserId,
};

use super::r#trait::{AccountStore, DocumentStore, ReferenceStore};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS accounts (
    id            UUID PRIMARY KEY,
    username      TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    name          TEXT NOT NULL,
    role          TEXT NOT NULL,
    active        BOOLEAN NOT NULL DEFAULT TRUE,
    created_at    TIMESTAMPTZ NOT NULL
);

CREATE TABLE IF NOT EXISTS reference_records (
    id         UUID PRIMARY KEY,
    kind       TEXT NOT NULL,
    code       TEXT NOT NULL,
    name       TEXT NOT NULL,
    active     BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL,
    UNIQUE (kind, code)
);

CREATE TABLE IF NOT EXISTS documents (
    id                UUID PRIMARY KEY,
    number            TEXT NOT NULL DEFAULT '',
    doc_date          DATE,
    unit_id           UUID NOT NULL REFERENCES reference_records (id),
    official_id       UUID NOT NULL REFERENCES reference_records (id),
    document_type_id  UUID NOT NULL REFERENCES reference_records (id),
    funding_source_id UUID NOT NULL REFERENCES reference_records (id),
    amount            BIGINT NOT NULL CHECK (amount > 0),
    description       TEXT NOT NULL,
    created_by        UUID NOT NULL REFERENCES accounts (id),
    created_at        TIMESTAMPTZ NOT NULL,
    updated_at        TIMESTAMPTZ NOT NULL
);

CREATE INDEX IF NOT EXISTS documents_created_by_idx ON documents (created_by);
"#;

/// Create the tables if they do not exist yet.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::raw_sql(SCHEMA)
        .execute(pool)
        .await
        .map_err(|e| map_sqlx_error("ensure_schema", e))?;
    Ok(())
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        // 23505 unique_violation, 23503 foreign_key_violation
        if matches!(db_err.code().as_deref(), Some("23505") | Some("23503")) {
            return StoreError::Conflict(format!("{operation}: {}", db_err.message()));
        }
    }
    tracing::error!(operation, error = %err, "postgres store error");
    StoreError::backend(format!("{operation} failed"))
}

fn row_error(err: sqlx::Error) -> StoreError {
    StoreError::backend(format!("failed to decode row: {err}"))
}

const ACCOUNT_COLUMNS: &str = "id, username, password_hash, name, role, active, created_at";

fn account_from_row(row: &PgRow) -> Result<Account, StoreError> {
    let role: String = row.try_get("role").map_err(row_error)?;
    let role = role
        .parse::<Role>()
        .map_err(|e| StoreError::backend(format!("stored account has {e}")))?;

    Ok(Account {
        id: UserId::from_uuid(row.try_get("id").map_err(row_error)?),
        username: row.try_get("username").map_err(row_error)?,
        password_hash: row.try_get("password_hash").map_err(row_error)?,
        name: row.try_get("name").map_err(row_error)?,
        role,
        active: row.try_get("active").map_err(row_error)?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at").map_err(row_error)?,
    })
}

#[derive(Debug, Clone)]
pub struct PostgresAccountStore {
    pool: Arc<PgPool>,
}

impl PostgresAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait]
impl AccountDirectory for PostgresAccountStore {
    #[instrument(skip(self))]
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, StoreError> {
        let row = sqlx::query(&format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE username = $1"))
            .bind(username)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_by_username", e))?;
        row.as_ref().map(account_from_row).transpose()
    }

    #[instrument(skip(self), fields(user_id = %id))]
    async fn find_by_id(&self, id: UserId) -> Result<Option<Account>, StoreError> {
        let row = sqlx::query(&format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1"))
            .bind(*id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_by_id", e))?;
        row.as_ref().map(account_from_row).transpose()
    }
}

#[async_trait]
impl AccountStore for PostgresAccountStore {
    async fn create(&self, account: Account) -> Result<Account, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, username, password_hash, name, role, active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(*account.id.as_uuid())
        .bind(&account.username)
        .bind(&account.password_hash)
        .bind(&account.name)
        .bind(account.role.as_str())
        .bind(account.active)
        .bind(account.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_account", e))?;
        Ok(account)
    }

    async fn set_active(&self, id: UserId, active: bool) -> Result<Account, StoreError> {
        let row = sqlx::query(&format!(
            "UPDATE accounts SET active = $2 WHERE id = $1 RETURNING {ACCOUNT_COLUMNS}"
        ))
        .bind(*id.as_uuid())
        .bind(active)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("set_active", e))?
        .ok_or(StoreError::NotFound)?;
        account_from_row(&row)
    }

    async fn set_password_hash(&self, id: UserId, password_hash: String) -> Result<Account, StoreError> {
        let row = sqlx::query(&format!(
            "UPDATE accounts SET password_hash = $2 WHERE id = $1 RETURNING {ACCOUNT_COLUMNS}"
        ))
        .bind(*id.as_uuid())
        .bind(password_hash)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("set_password_hash", e))?
        .ok_or(StoreError::NotFound)?;
        account_from_row(&row)
    }

    async fn list(&self) -> Result<Vec<Account>, StoreError> {
        let rows = sqlx::query(&format!("SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY username"))
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_accounts", e))?;
        rows.iter().map(account_from_row).collect()
    }
}

const DOCUMENT_COLUMNS: &str = "id, number, doc_date, unit_id, official_id, document_type_id, \
     funding_source_id, amount, description, created_by, created_at, updated_at";

fn document_from_row(row: &PgRow) -> Result<Document, StoreError> {
    Ok(Document {
        id: DocumentId::from_uuid(row.try_get("id").map_err(row_error)?),
        number: row.try_get("number").map_err(row_error)?,
        date: row.try_get::<Option<NaiveDate>, _>("doc_date").map_err(row_error)?,
        unit_id: ReferenceId::from_uuid(row.try_get("unit_id").map_err(row_error)?),
        official_id: ReferenceId::from_uuid(row.try_get("official_id").map_err(row_error)?),
        document_type_id: ReferenceId::from_uuid(row.try_get("document_type_id").map_err(row_error)?),
        funding_source_id: ReferenceId::from_uuid(
            row.try_get("funding_source_id").map_err(row_error)?,
        ),
        amount: row.try_get("amount").map_err(row_error)?,
        description: row.try_get("description").map_err(row_error)?,
        created_by: UserId::from_uuid(row.try_get("created_by").map_err(row_error)?),
        created_at: row.try_get("created_at").map_err(row_error)?,
        updated_at: row.try_get("updated_at").map_err(row_error)?,
    })
}

fn reference_column(kind: ReferenceKind) -> &'static str {
    match kind {
        ReferenceKind::OrganizationalUnit => "unit_id",
        ReferenceKind::Official => "official_id",
        ReferenceKind::DocumentType => "document_type_id",
        ReferenceKind::FundingSource => "funding_source_id",
    }
}

#[derive(Debug, Clone)]
pub struct PostgresDocumentStore {
    pool: Arc<PgPool>,
}

impl PostgresDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    #[instrument(skip(self, document), fields(document_id = %document.id))]
    async fn insert(&self, document: Document) -> Result<Document, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO documents (id, number, doc_date, unit_id, official_id, document_type_id,
                                   funding_source_id, amount, description, created_by,
                                   created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(*document.id.as_uuid())
        .bind(&document.number)
        .bind(document.date)
        .bind(*document.unit_id.as_uuid())
        .bind(*document.official_id.as_uuid())
        .bind(*document.document_type_id.as_uuid())
        .bind(*document.funding_source_id.as_uuid())
        .bind(document.amount)
        .bind(&document.description)
        .bind(*document.created_by.as_uuid())
        .bind(document.created_at)
        .bind(document.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_document", e))?;
        Ok(document)
    }

    #[instrument(skip(self, document), fields(document_id = %document.id))]
    async fn update(&self, document: Document) -> Result<Document, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE documents
            SET number = $2, doc_date = $3, unit_id = $4, official_id = $5,
                document_type_id = $6, funding_source_id = $7, amount = $8,
                description = $9, updated_at = $10
            WHERE id = $1
            "#,
        )
        .bind(*document.id.as_uuid())
        .bind(&document.number)
        .bind(document.date)
        .bind(*document.unit_id.as_uuid())
        .bind(*document.official_id.as_uuid())
        .bind(*document.document_type_id.as_uuid())
        .bind(*document.funding_source_id.as_uuid())
        .bind(document.amount)
        .bind(&document.description)
        .bind(document.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_document", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(document)
    }

    async fn get(&self, id: DocumentId) -> Result<Option<Document>, StoreError> {
        let row = sqlx::query(&format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = $1"))
            .bind(*id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_document", e))?;
        row.as_ref().map(document_from_row).transpose()
    }

    #[instrument(skip(self))]
    async fn list(&self, filter: &DocumentFilter) -> Result<Vec<Document>, StoreError> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE TRUE"));

        if let Some(id) = filter.unit_id {
            qb.push(" AND unit_id = ").push_bind(*id.as_uuid());
        }
        if let Some(id) = filter.official_id {
            qb.push(" AND official_id = ").push_bind(*id.as_uuid());
        }
        if let Some(id) = filter.created_by {
            qb.push(" AND created_by = ").push_bind(*id.as_uuid());
        }
        if let Some(start) = filter.start_date {
            qb.push(" AND doc_date >= ").push_bind(start);
        }
        if let Some(end) = filter.end_date {
            qb.push(" AND doc_date <= ").push_bind(end);
        }
        if let Some(year) = filter.year {
            qb.push(" AND EXTRACT(YEAR FROM doc_date)::int = ").push_bind(year);
        }
        qb.push(" ORDER BY created_at DESC, id DESC");

        let rows = qb
            .build()
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_documents", e))?;
        rows.iter().map(document_from_row).collect()
    }

    async fn delete(&self, id: DocumentId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM documents WHERE id = $1")
            .bind(*id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_document", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn count_referencing(&self, kind: ReferenceKind, id: ReferenceId) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM documents WHERE {} = $1",
            reference_column(kind)
        ))
        .bind(*id.as_uuid())
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("count_referencing", e))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}

const REFERENCE_COLUMNS: &str = "id, kind, code, name, active, created_at";

fn reference_from_row(row: &PgRow) -> Result<ReferenceRecord, StoreError> {
    let kind: String = row.try_get("kind").map_err(row_error)?;
    let kind = kind
        .parse::<ReferenceKind>()
        .map_err(|e| StoreError::backend(e.to_string()))?;

    Ok(ReferenceRecord {
        id: ReferenceId::from_uuid(row.try_get("id").map_err(row_error)?),
        kind,
        code: row.try_get("code").map_err(row_error)?,
        name: row.try_get("name").map_err(row_error)?,
        active: row.try_get("active").map_err(row_error)?,
        created_at: row.try_get("created_at").map_err(row_error)?,
    })
}

#[derive(Debug, Clone)]
pub struct PostgresReferenceStore {
    pool: Arc<PgPool>,
}

impl PostgresReferenceStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    async fn select(&self, kind: ReferenceKind, active_only: bool) -> Result<Vec<ReferenceRecord>, StoreError> {
        let sql = if active_only {
            format!("SELECT {REFERENCE_COLUMNS} FROM reference_records WHERE kind = $1 AND active ORDER BY code")
        } else {
            format!("SELECT {REFERENCE_COLUMNS} FROM reference_records WHERE kind = $1 ORDER BY code")
        };
        let rows = sqlx::query(&sql)
            .bind(kind.as_str())
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_references", e))?;
        rows.iter().map(reference_from_row).collect()
    }
}

#[async_trait]
impl ReferenceStore for PostgresReferenceStore {
    async fn insert(&self, record: ReferenceRecord) -> Result<ReferenceRecord, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO reference_records (id, kind, code, name, active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(*record.id.as_uuid())
        .bind(record.kind.as_str())
        .bind(&record.code)
        .bind(&record.name)
        .bind(record.active)
        .bind(record.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_reference", e))?;
        Ok(record)
    }

    async fn get(&self, kind: ReferenceKind, id: ReferenceId) -> Result<Option<ReferenceRecord>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {REFERENCE_COLUMNS} FROM reference_records WHERE kind = $1 AND id = $2"
        ))
        .bind(kind.as_str())
        .bind(*id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_reference", e))?;
        row.as_ref().map(reference_from_row).transpose()
    }

    #[instrument(skip(self, record), fields(kind = %record.kind, record_id = %record.id))]
    async fn update(&self, record: ReferenceRecord) -> Result<ReferenceRecord, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE reference_records SET code = $3, name = $4, active = $5
            WHERE kind = $1 AND id = $2
            "#,
        )
        .bind(record.kind.as_str())
        .bind(*record.id.as_uuid())
        .bind(&record.code)
        .bind(&record.name)
        .bind(record.active)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_reference", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(record)
    }

    async fn list(&self, kind: ReferenceKind) -> Result<Vec<ReferenceRecord>, StoreError> {
        self.select(kind, false).await
    }

    async fn list_active(&self, kind: ReferenceKind) -> Result<Vec<ReferenceRecord>, StoreError> {
        self.select(kind, true).await
    }

    async fn delete(&self, kind: ReferenceKind, id: ReferenceId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM reference_records WHERE kind = $1 AND id = $2")
            .bind(kind.as_str())
            .bind(*id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_reference", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
