use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};

use docgate_access::rule::sort_newest_first;
use docgate_access::{AccessRule, NewAccessRule, RuleFilter, RulePatch, RuleRecord, RuleStore, RuleStoreError};
use docgate_core::{RuleId, UserId};

use crate::users::InMemoryUserDirectory;

#[derive(Debug, Default)]
struct RuleTable {
    last_id: i64,
    rules: BTreeMap<RuleId, AccessRule>,
}

/// In-memory rule store for tests/dev.
///
/// Joins against an [`InMemoryUserDirectory`]; rules whose owner is gone are
/// invisible, as with an inner join.
#[derive(Debug)]
pub struct InMemoryRuleStore {
    users: Arc<InMemoryUserDirectory>,
    inner: RwLock<RuleTable>,
}

fn poisoned() -> RuleStoreError {
    RuleStoreError::Backend("rule table lock poisoned".to_string())
}

impl InMemoryRuleStore {
    pub fn new(users: Arc<InMemoryUserDirectory>) -> Self {
        Self {
            users,
            inner: RwLock::new(RuleTable::default()),
        }
    }

    fn join(&self, rule: &AccessRule) -> Result<Option<RuleRecord>, RuleStoreError> {
        let owner = self
            .users
            .get(rule.user_id)
            .map_err(|e| RuleStoreError::Backend(e.to_string()))?;

        Ok(owner.map(|user| RuleRecord {
            rule: rule.clone(),
            user_name: user.name,
            user_email: user.email,
        }))
    }

    fn require_user(&self, user_id: UserId) -> Result<(), RuleStoreError> {
        match self.users.get(user_id) {
            Ok(Some(_)) => Ok(()),
            Ok(None) => Err(RuleStoreError::UnknownUser(user_id)),
            Err(e) => Err(RuleStoreError::Backend(e.to_string())),
        }
    }

    fn replace(&self, rule: AccessRule) -> Result<RuleRecord, RuleStoreError> {
        {
            let mut table = self.inner.write().map_err(|_| poisoned())?;
            table.rules.insert(rule.id, rule.clone());
        }
        self.join(&rule)?.ok_or(RuleStoreError::NotFound)
    }

    fn existing(&self, id: RuleId) -> Result<AccessRule, RuleStoreError> {
        let table = self.inner.read().map_err(|_| poisoned())?;
        table.rules.get(&id).cloned().ok_or(RuleStoreError::NotFound)
    }
}

#[async_trait::async_trait]
impl RuleStore for InMemoryRuleStore {
    async fn find_rules(&self, filter: &RuleFilter) -> Result<Vec<RuleRecord>, RuleStoreError> {
        let matching: Vec<AccessRule> = {
            let table = self.inner.read().map_err(|_| poisoned())?;
            table.rules.values().filter(|r| filter.matches(r)).cloned().collect()
        };

        let mut records = Vec::with_capacity(matching.len());
        for rule in &matching {
            if let Some(record) = self.join(rule)? {
                records.push(record);
            }
        }
        sort_newest_first(&mut records);
        Ok(records)
    }

    async fn get_rule(&self, id: RuleId) -> Result<RuleRecord, RuleStoreError> {
        let rule = self.existing(id)?;
        self.join(&rule)?.ok_or(RuleStoreError::NotFound)
    }

    async fn insert_rule(&self, rule: NewAccessRule, now: DateTime<Utc>) -> Result<RuleRecord, RuleStoreError> {
        self.require_user(rule.user_id)?;

        let rule = {
            let mut table = self.inner.write().map_err(|_| poisoned())?;
            let rule = rule.into_rule(RuleId::new(table.last_id + 1), now)?;
            table.last_id += 1;
            table.rules.insert(rule.id, rule.clone());
            rule
        };

        tracing::debug!(rule_id = %rule.id, user_id = %rule.user_id, "access rule created");
        self.join(&rule)?.ok_or(RuleStoreError::NotFound)
    }

    async fn update_rule(&self, id: RuleId, patch: RulePatch, now: DateTime<Utc>) -> Result<RuleRecord, RuleStoreError> {
        let current = self.existing(id)?;
        let next = patch.apply_to(&current, now)?;
        if next.user_id != current.user_id {
            self.require_user(next.user_id)?;
        }
        self.replace(next)
    }

    async fn set_active(&self, id: RuleId, is_active: bool, now: DateTime<Utc>) -> Result<RuleRecord, RuleStoreError> {
        let mut rule = self.existing(id)?;
        rule.is_active = is_active;
        rule.updated_at = now;
        self.replace(rule)
    }

    async fn delete_rule(&self, id: RuleId) -> Result<RuleRecord, RuleStoreError> {
        let record = self.get_rule(id).await?;
        let mut table = self.inner.write().map_err(|_| poisoned())?;
        table.rules.remove(&id);
        Ok(record)
    }
}
