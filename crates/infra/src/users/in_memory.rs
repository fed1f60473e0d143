use std::collections::BTreeMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use docgate_auth::{DirectoryError, NewUser, UserDirectory, UserRecord, UserStatus};
use docgate_core::{DomainError, UserId};

#[derive(Debug, Default)]
struct UserTable {
    last_id: i64,
    users: BTreeMap<UserId, UserRecord>,
}

/// In-memory user directory for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    inner: RwLock<UserTable>,
}

fn poisoned() -> DirectoryError {
    DirectoryError::Backend("user table lock poisoned".to_string())
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emails are unique after lower-casing.
    pub fn insert(&self, user: NewUser, now: DateTime<Utc>) -> Result<UserRecord, DirectoryError> {
        let user = user.normalized()?;
        let mut table = self.inner.write().map_err(|_| poisoned())?;

        if table.users.values().any(|u| u.email == user.email) {
            return Err(DomainError::conflict(format!("email '{}' is already registered", user.email)).into());
        }

        table.last_id += 1;
        let record = UserRecord {
            id: UserId::new(table.last_id),
            email: user.email,
            name: user.name,
            role: user.role,
            status: UserStatus::Active,
            created_at: now,
        };
        table.users.insert(record.id, record.clone());
        Ok(record)
    }

    pub fn set_status(&self, id: UserId, status: UserStatus) -> Result<UserRecord, DirectoryError> {
        let mut table = self.inner.write().map_err(|_| poisoned())?;
        let user = table.users.get_mut(&id).ok_or(DomainError::NotFound)?;
        user.status = status;
        Ok(user.clone())
    }

    pub fn get(&self, id: UserId) -> Result<Option<UserRecord>, DirectoryError> {
        let table = self.inner.read().map_err(|_| poisoned())?;
        Ok(table.users.get(&id).cloned())
    }
}

#[async_trait::async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_user(&self, id: UserId) -> Result<Option<UserRecord>, DirectoryError> {
        self.get(id)
    }
}
