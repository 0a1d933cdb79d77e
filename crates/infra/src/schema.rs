//! Postgres connection and schema bootstrap.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS identities (
        id            UUID PRIMARY KEY,
        email         TEXT NOT NULL,
        password_hash TEXT NOT NULL,
        role          TEXT NOT NULL,
        active        BOOLEAN NOT NULL DEFAULT TRUE,
        first_name    TEXT NULL,
        last_name     TEXT NULL,
        created_at    TIMESTAMPTZ NOT NULL,
        updated_at    TIMESTAMPTZ NOT NULL
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS identities_email_lower_idx ON identities (lower(email))",
    r#"
    CREATE TABLE IF NOT EXISTS tasks (
        id          UUID PRIMARY KEY,
        slug        TEXT NOT NULL UNIQUE,
        title       VARCHAR(200) NOT NULL,
        description TEXT NULL,
        completed   BOOLEAN NOT NULL DEFAULT FALSE,
        created_at  TIMESTAMPTZ NOT NULL,
        updated_at  TIMESTAMPTZ NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS tasks_listing_idx ON tasks (created_at DESC, id DESC)",
];

/// Open a connection pool.
pub async fn connect(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new().max_connections(10).connect(database_url).await
}

/// Create tables and indexes if they are missing. Safe to run on every start.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    tracing::info!("database schema ensured");
    Ok(())
}

/// `true` if the error is a unique-constraint violation (`23505`).
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}
