//! Postgres-backed credential store.
//!
//! Email uniqueness is enforced by the `identities_email_lower_idx` unique
//! index; a `23505` on insert or update surfaces as `DuplicateEmail`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use taskgate_auth::identity::email_key;
use taskgate_auth::{CredentialStore, Identity, Role, StoreError};
use taskgate_core::UserId;

use crate::schema::is_unique_violation;

const COLUMNS: &str =
    "id, email, password_hash, role, active, first_name, last_name, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct PostgresCredentialStore {
    pool: Arc<PgPool>,
}

impl PostgresCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool: Arc::new(pool) }
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    if is_unique_violation(&err) {
        return StoreError::DuplicateEmail;
    }
    StoreError::Backend(format!("sqlx error in {operation}: {err}"))
}

fn identity_from_row(row: &PgRow) -> Result<Identity, StoreError> {
    let decode = |e: sqlx::Error| StoreError::Backend(format!("failed to decode identity row: {e}"));

    let role: String = row.try_get("role").map_err(decode)?;
    let role: Role = role
        .parse()
        .map_err(|e| StoreError::Backend(format!("stored role is invalid: {e}")))?;

    Ok(Identity {
        id: UserId::from_uuid(row.try_get::<Uuid, _>("id").map_err(decode)?),
        email: row.try_get("email").map_err(decode)?,
        password_hash: row.try_get("password_hash").map_err(decode)?,
        role,
        active: row.try_get("active").map_err(decode)?,
        first_name: row.try_get("first_name").map_err(decode)?,
        last_name: row.try_get("last_name").map_err(decode)?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at").map_err(decode)?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at").map_err(decode)?,
    })
}

#[async_trait]
impl CredentialStore for PostgresCredentialStore {
    #[instrument(skip(self, identity), fields(user_id = %identity.id), err)]
    async fn create_identity(&self, identity: Identity) -> Result<Identity, StoreError> {
        let sql = format!(
            "INSERT INTO identities ({COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(identity.id.as_uuid())
            .bind(&identity.email)
            .bind(&identity.password_hash)
            .bind(identity.role.as_str())
            .bind(identity.active)
            .bind(&identity.first_name)
            .bind(&identity.last_name)
            .bind(identity.created_at)
            .bind(identity.updated_at)
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("create_identity", e))?;

        identity_from_row(&row)
    }

    #[instrument(skip(self, email), err)]
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, StoreError> {
        let sql = format!("SELECT {COLUMNS} FROM identities WHERE lower(email) = $1");
        let row = sqlx::query(&sql)
            .bind(email_key(email))
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_by_email", e))?;

        row.as_ref().map(identity_from_row).transpose()
    }

    #[instrument(skip(self), fields(user_id = %id), err)]
    async fn find_by_id(&self, id: UserId) -> Result<Option<Identity>, StoreError> {
        let sql = format!("SELECT {COLUMNS} FROM identities WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_by_id", e))?;

        row.as_ref().map(identity_from_row).transpose()
    }

    #[instrument(skip(self, identity), fields(user_id = %identity.id), err)]
    async fn update(&self, identity: Identity) -> Result<Identity, StoreError> {
        let sql = format!(
            r#"
            UPDATE identities
            SET email = $2, password_hash = $3, role = $4, active = $5,
                first_name = $6, last_name = $7, updated_at = $8
            WHERE id = $1
            RETURNING {COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(identity.id.as_uuid())
            .bind(&identity.email)
            .bind(&identity.password_hash)
            .bind(identity.role.as_str())
            .bind(identity.active)
            .bind(&identity.first_name)
            .bind(&identity.last_name)
            .bind(identity.updated_at)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("update", e))?;

        match row {
            Some(row) => identity_from_row(&row),
            None => Err(StoreError::NotFound),
        }
    }

    #[instrument(skip(self), err)]
    async fn list(&self) -> Result<Vec<Identity>, StoreError> {
        let sql = format!("SELECT {COLUMNS} FROM identities ORDER BY created_at DESC, id DESC");
        let rows = sqlx::query(&sql)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list", e))?;

        rows.iter().map(identity_from_row).collect()
    }
}
