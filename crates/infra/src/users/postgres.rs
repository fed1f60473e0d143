use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use docgate_auth::{DirectoryError, Role, UserDirectory, UserRecord, UserStatus};
use docgate_core::UserId;

/// Postgres-backed user directory over the `users` table.
#[derive(Debug, Clone)]
pub struct PostgresUserDirectory {
    pool: PgPool,
}

impl PostgresUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn backend(operation: &str, err: impl core::fmt::Display) -> DirectoryError {
    DirectoryError::Backend(format!("{operation}: {err}"))
}

fn user_from_row(row: &PgRow) -> Result<UserRecord, DirectoryError> {
    let role: String = row.try_get("role").map_err(|e| backend("decode role", e))?;
    let status: String = row.try_get("status").map_err(|e| backend("decode status", e))?;

    Ok(UserRecord {
        id: UserId::new(row.try_get("id").map_err(|e| backend("decode id", e))?),
        email: row.try_get("email").map_err(|e| backend("decode email", e))?,
        name: row.try_get("name").map_err(|e| backend("decode name", e))?,
        role: role.parse::<Role>().map_err(|e| backend("decode role", e))?,
        status: status.parse::<UserStatus>()?,
        created_at: row.try_get("created_at").map_err(|e| backend("decode created_at", e))?,
    })
}

#[async_trait::async_trait]
impl UserDirectory for PostgresUserDirectory {
    #[tracing::instrument(skip(self), err)]
    async fn find_user(&self, id: UserId) -> Result<Option<UserRecord>, DirectoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, email, name, role, status, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| backend("find_user", e))?;

        row.as_ref().map(user_from_row).transpose()
    }
}
