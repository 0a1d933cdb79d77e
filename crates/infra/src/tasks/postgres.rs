//! Postgres-backed task store.
//!
//! Listing is keyset-paginated over `(created_at, id)` descending, matching
//! `tasks_listing_idx`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use taskgate_core::{DomainError, DomainResult, TaskId};
use taskgate_tasks::{KeysetCursor, Task, TaskFilter, TaskStore};

use crate::schema::is_unique_violation;

const COLUMNS: &str = "id, slug, title, description, completed, created_at, updated_at";

/// Shared `WHERE` fragment: `$1` completed, `$2` ILIKE pattern.
const FILTER: &str = "($1::boolean IS NULL OR completed = $1) \
     AND ($2::text IS NULL OR title ILIKE $2 OR description ILIKE $2)";

#[derive(Debug, Clone)]
pub struct PostgresTaskStore {
    pool: Arc<PgPool>,
}

impl PostgresTaskStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool: Arc::new(pool) }
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> DomainError {
    if is_unique_violation(&err) {
        return DomainError::conflict(format!("unique violation in {operation}"));
    }
    DomainError::storage(format!("sqlx error in {operation}: {err}"))
}

fn task_from_row(row: &PgRow) -> DomainResult<Task> {
    let decode = |e: sqlx::Error| DomainError::storage(format!("failed to decode task row: {e}"));
    Ok(Task {
        id: TaskId::from_uuid(row.try_get::<Uuid, _>("id").map_err(decode)?),
        slug: row.try_get("slug").map_err(decode)?,
        title: row.try_get("title").map_err(decode)?,
        description: row.try_get("description").map_err(decode)?,
        completed: row.try_get("completed").map_err(decode)?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at").map_err(decode)?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at").map_err(decode)?,
    })
}

/// `%needle%` with LIKE metacharacters escaped.
fn like_pattern(needle: &str) -> String {
    let mut out = String::with_capacity(needle.len() + 2);
    out.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}

#[async_trait]
impl TaskStore for PostgresTaskStore {
    #[instrument(skip(self, task), fields(task_id = %task.id), err)]
    async fn insert(&self, task: Task) -> DomainResult<Task> {
        let sql = format!("INSERT INTO tasks ({COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {COLUMNS}");
        let row = sqlx::query(&sql)
            .bind(task.id.as_uuid())
            .bind(&task.slug)
            .bind(&task.title)
            .bind(&task.description)
            .bind(task.completed)
            .bind(task.created_at)
            .bind(task.updated_at)
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert", e))?;

        task_from_row(&row)
    }

    #[instrument(skip(self), fields(task_id = %id), err)]
    async fn get(&self, id: TaskId) -> DomainResult<Option<Task>> {
        let sql = format!("SELECT {COLUMNS} FROM tasks WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get", e))?;

        row.as_ref().map(task_from_row).transpose()
    }

    #[instrument(skip(self, task), fields(task_id = %task.id), err)]
    async fn update(&self, task: Task) -> DomainResult<Task> {
        let sql = format!(
            "UPDATE tasks SET title = $2, description = $3, completed = $4, updated_at = $5 \
             WHERE id = $1 RETURNING {COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(task.id.as_uuid())
            .bind(&task.title)
            .bind(&task.description)
            .bind(task.completed)
            .bind(task.updated_at)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("update", e))?;

        match row {
            Some(row) => task_from_row(&row),
            None => Err(DomainError::NotFound),
        }
    }

    #[instrument(skip(self), fields(task_id = %id), err)]
    async fn delete(&self, id: TaskId) -> DomainResult<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete", e))?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, filter), err)]
    async fn page(&self, filter: &TaskFilter, after: Option<KeysetCursor>, limit: usize) -> DomainResult<Vec<Task>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM tasks \
             WHERE {FILTER} \
             AND ($3::timestamptz IS NULL OR (created_at, id) < ($3, $4::uuid)) \
             ORDER BY created_at DESC, id DESC \
             LIMIT $5"
        );
        let rows = sqlx::query(&sql)
            .bind(filter.completed)
            .bind(filter.search.as_deref().map(like_pattern))
            .bind(after.map(|c| c.created_at))
            .bind(after.map(|c| *c.id.as_uuid()))
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("page", e))?;

        rows.iter().map(task_from_row).collect()
    }

    #[instrument(skip(self, filter), err)]
    async fn count(&self, filter: &TaskFilter) -> DomainResult<u64> {
        let sql = format!("SELECT COUNT(*) AS n FROM tasks WHERE {FILTER}");
        let row = sqlx::query(&sql)
            .bind(filter.completed)
            .bind(filter.search.as_deref().map(like_pattern))
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("count", e))?;

        let n: i64 = row
            .try_get("n")
            .map_err(|e| DomainError::storage(format!("failed to decode count: {e}")))?;
        Ok(u64::try_from(n).unwrap_or(0))
    }
}
