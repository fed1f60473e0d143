//! Postgres connection and schema.

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id          BIGSERIAL PRIMARY KEY,
        email       TEXT NOT NULL UNIQUE,
        name        TEXT NOT NULL,
        role        TEXT NOT NULL CHECK (role IN ('admin', 'contributor', 'reader')),
        status      TEXT NOT NULL DEFAULT 'active' CHECK (status IN ('active', 'suspended')),
        created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS access_rules (
        id           BIGSERIAL PRIMARY KEY,
        user_id      BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        target_type  TEXT NOT NULL CHECK (target_type IN ('document', 'folder', 'tag', 'category')),
        target_id    TEXT NOT NULL,
        target_name  TEXT NOT NULL,
        start_date   TIMESTAMPTZ NOT NULL,
        end_date     TIMESTAMPTZ NOT NULL,
        is_active    BOOLEAN NOT NULL DEFAULT TRUE,
        created_at   TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at   TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        CONSTRAINT access_rules_valid_range CHECK (end_date > start_date)
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS access_rules_lookup_idx
        ON access_rules (user_id, target_type, target_id)
    "#,
];

pub async fn connect(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new().max_connections(10).connect(database_url).await
}

/// Idempotent: every statement is `IF NOT EXISTS`.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    tracing::info!("database schema ready");
    Ok(())
}
