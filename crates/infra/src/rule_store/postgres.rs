//! Postgres-backed rule store.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | RuleStoreError |
//! |------------|----------------------|----------------|
//! | Database (foreign key violation) | `23503` | `UnknownUser` |
//! | Database (check constraint violation) | `23514` | `Invalid` |
//! | anything else | any | `Backend` |

use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use docgate_access::{AccessRule, NewAccessRule, RuleFilter, RulePatch, RuleRecord, RuleStore, RuleStoreError, TargetType};
use docgate_core::{DomainError, RuleId, UserId};

const SELECT_RECORD: &str = r#"
    SELECT
        ar.id,
        ar.user_id,
        ar.target_type,
        ar.target_id,
        ar.target_name,
        ar.start_date,
        ar.end_date,
        ar.is_active,
        ar.created_at,
        ar.updated_at,
        u.name AS user_name,
        u.email AS user_email
    FROM access_rules ar
    JOIN users u ON ar.user_id = u.id
"#;

#[derive(Debug, Clone)]
pub struct PostgresRuleStore {
    pool: PgPool,
}

impl PostgresRuleStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the `users`/`access_rules` schema if missing.
    pub async fn migrate(&self) -> Result<(), RuleStoreError> {
        crate::db::migrate(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e, None))
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error, user_id: Option<UserId>) -> RuleStoreError {
    if let sqlx::Error::Database(db_err) = &err {
        match (db_err.code().as_deref(), user_id) {
            (Some("23503"), Some(user_id)) => return RuleStoreError::UnknownUser(user_id),
            (Some("23514"), _) => {
                return RuleStoreError::Invalid(DomainError::validation(db_err.message().to_string()));
            }
            _ => {}
        }
    }
    RuleStoreError::Backend(format!("{operation}: {err}"))
}

fn decode(err: sqlx::Error) -> RuleStoreError {
    RuleStoreError::Backend(format!("failed to decode access rule row: {err}"))
}

fn record_from_row(row: &PgRow) -> Result<RuleRecord, RuleStoreError> {
    let target_type: String = row.try_get("target_type").map_err(decode)?;

    Ok(RuleRecord {
        rule: AccessRule {
            id: RuleId::new(row.try_get("id").map_err(decode)?),
            user_id: UserId::new(row.try_get("user_id").map_err(decode)?),
            target_type: target_type.parse::<TargetType>()?,
            target_id: row.try_get("target_id").map_err(decode)?,
            target_name: row.try_get("target_name").map_err(decode)?,
            start_date: row.try_get("start_date").map_err(decode)?,
            end_date: row.try_get("end_date").map_err(decode)?,
            is_active: row.try_get("is_active").map_err(decode)?,
            created_at: row.try_get("created_at").map_err(decode)?,
            updated_at: row.try_get("updated_at").map_err(decode)?,
        },
        user_name: row.try_get("user_name").map_err(decode)?,
        user_email: row.try_get("user_email").map_err(decode)?,
    })
}

#[async_trait::async_trait]
impl RuleStore for PostgresRuleStore {
    #[tracing::instrument(skip(self), err)]
    async fn find_rules(&self, filter: &RuleFilter) -> Result<Vec<RuleRecord>, RuleStoreError> {
        let sql = format!(
            r#"{SELECT_RECORD}
            WHERE ($1::BIGINT IS NULL OR ar.user_id = $1)
              AND ($2::TEXT IS NULL OR ar.target_type = $2)
              AND ($3::TEXT IS NULL OR ar.target_id = $3)
              AND ($4::TIMESTAMPTZ IS NULL
                   OR (ar.is_active AND ar.start_date <= $4 AND ar.end_date >= $4))
            ORDER BY ar.created_at DESC, ar.id DESC
            "#
        );

        let rows = sqlx::query(&sql)
            .bind(filter.user_id.map(|u| u.get()))
            .bind(filter.target_type.map(|t| t.as_str()))
            .bind(filter.target_id.as_deref())
            .bind(filter.valid_at)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_rules", e, None))?;

        rows.iter().map(record_from_row).collect()
    }

    async fn get_rule(&self, id: RuleId) -> Result<RuleRecord, RuleStoreError> {
        let sql = format!("{SELECT_RECORD} WHERE ar.id = $1");
        let row = sqlx::query(&sql)
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_rule", e, None))?
            .ok_or(RuleStoreError::NotFound)?;

        record_from_row(&row)
    }

    #[tracing::instrument(skip(self, rule), fields(user_id = %rule.user_id), err)]
    async fn insert_rule(&self, rule: NewAccessRule, now: DateTime<Utc>) -> Result<RuleRecord, RuleStoreError> {
        // Validated with a placeholder id; the database assigns the real one.
        let rule = rule.into_rule(RuleId::new(0), now)?;

        let row = sqlx::query(
            r#"
            INSERT INTO access_rules
                (user_id, target_type, target_id, target_name, start_date, end_date, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            RETURNING id
            "#,
        )
        .bind(rule.user_id.get())
        .bind(rule.target_type.as_str())
        .bind(&rule.target_id)
        .bind(&rule.target_name)
        .bind(rule.start_date)
        .bind(rule.end_date)
        .bind(rule.is_active)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_rule", e, Some(rule.user_id)))?;

        let id: i64 = row.try_get("id").map_err(decode)?;
        self.get_rule(RuleId::new(id)).await
    }

    #[tracing::instrument(skip(self, patch), err)]
    async fn update_rule(&self, id: RuleId, patch: RulePatch, now: DateTime<Utc>) -> Result<RuleRecord, RuleStoreError> {
        let current = self.get_rule(id).await?;
        let next = patch.apply_to(&current.rule, now)?;

        let result = sqlx::query(
            r#"
            UPDATE access_rules
            SET user_id = $2,
                target_type = $3,
                target_id = $4,
                target_name = $5,
                start_date = $6,
                end_date = $7,
                is_active = $8,
                updated_at = $9
            WHERE id = $1
            "#,
        )
        .bind(id.get())
        .bind(next.user_id.get())
        .bind(next.target_type.as_str())
        .bind(&next.target_id)
        .bind(&next.target_name)
        .bind(next.start_date)
        .bind(next.end_date)
        .bind(next.is_active)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_rule", e, Some(next.user_id)))?;

        if result.rows_affected() == 0 {
            return Err(RuleStoreError::NotFound);
        }
        self.get_rule(id).await
    }

    #[tracing::instrument(skip(self), err)]
    async fn set_active(&self, id: RuleId, is_active: bool, now: DateTime<Utc>) -> Result<RuleRecord, RuleStoreError> {
        let result = sqlx::query("UPDATE access_rules SET is_active = $2, updated_at = $3 WHERE id = $1")
            .bind(id.get())
            .bind(is_active)
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("set_active", e, None))?;

        if result.rows_affected() == 0 {
            return Err(RuleStoreError::NotFound);
        }
        self.get_rule(id).await
    }

    #[tracing::instrument(skip(self), err)]
    async fn delete_rule(&self, id: RuleId) -> Result<RuleRecord, RuleStoreError> {
        let record = self.get_rule(id).await?;

        let result = sqlx::query("DELETE FROM access_rules WHERE id = $1")
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_rule", e, None))?;

        if result.rows_affected() == 0 {
            return Err(RuleStoreError::NotFound);
        }
        Ok(record)
    }
}
