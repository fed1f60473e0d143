//! In-crate test doubles.

use std::sync::Mutex;

use chrono::{DateTime, TimeZone, Utc};

use docgate_core::{RuleId, UserId};

use crate::rule::sort_newest_first;
use crate::{AccessRule, NewAccessRule, RuleFilter, RulePatch, RuleRecord, RuleStore, RuleStoreError, TargetType};

pub fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime")
        .block_on(future)
}

pub fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
}

pub fn rule(
    id: i64,
    user_id: i64,
    target_type: TargetType,
    target_id: &str,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    is_active: bool,
) -> AccessRule {
    AccessRule {
        id: RuleId::new(id),
        user_id: UserId::new(user_id),
        target_type,
        target_id: target_id.to_string(),
        target_name: target_id.to_string(),
        start_date,
        end_date,
        is_active,
        created_at: start_date,
        updated_at: start_date,
    }
}

/// Read-mostly store over a fixed rule list.
pub struct VecStore {
    rules: Mutex<Vec<AccessRule>>,
    lookups: Mutex<usize>,
}

impl VecStore {
    pub fn new(rules: Vec<AccessRule>) -> Self {
        Self {
            rules: Mutex::new(rules),
            lookups: Mutex::new(0),
        }
    }

    pub fn lookups(&self) -> usize {
        *self.lookups.lock().unwrap()
    }

    fn record(rule: &AccessRule) -> RuleRecord {
        RuleRecord {
            rule: rule.clone(),
            user_name: format!("user {}", rule.user_id),
            user_email: format!("user{}@example.com", rule.user_id),
        }
    }
}

#[async_trait::async_trait]
impl RuleStore for VecStore {
    async fn find_rules(&self, filter: &RuleFilter) -> Result<Vec<RuleRecord>, RuleStoreError> {
        *self.lookups.lock().unwrap() += 1;
        let mut out: Vec<_> = self
            .rules
            .lock()
            .unwrap()
            .iter()
            .filter(|r| filter.matches(r))
            .map(Self::record)
            .collect();
        sort_newest_first(&mut out);
        Ok(out)
    }

    async fn get_rule(&self, id: RuleId) -> Result<RuleRecord, RuleStoreError> {
        self.rules
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .map(Self::record)
            .ok_or(RuleStoreError::NotFound)
    }

    async fn insert_rule(&self, _rule: NewAccessRule, _now: DateTime<Utc>) -> Result<RuleRecord, RuleStoreError> {
        Err(RuleStoreError::Backend("read-only".to_string()))
    }

    async fn update_rule(&self, _id: RuleId, _patch: RulePatch, _now: DateTime<Utc>) -> Result<RuleRecord, RuleStoreError> {
        Err(RuleStoreError::Backend("read-only".to_string()))
    }

    async fn set_active(&self, _id: RuleId, _is_active: bool, _now: DateTime<Utc>) -> Result<RuleRecord, RuleStoreError> {
        Err(RuleStoreError::Backend("read-only".to_string()))
    }

    async fn delete_rule(&self, _id: RuleId) -> Result<RuleRecord, RuleStoreError> {
        Err(RuleStoreError::Backend("read-only".to_string()))
    }
}

/// Every call fails as if the database were down.
pub struct FailingStore;

fn down() -> RuleStoreError {
    RuleStoreError::Backend("connection refused".to_string())
}

#[async_trait::async_trait]
impl RuleStore for FailingStore {
    async fn find_rules(&self, _filter: &RuleFilter) -> Result<Vec<RuleRecord>, RuleStoreError> {
        Err(down())
    }

    async fn get_rule(&self, _id: RuleId) -> Result<RuleRecord, RuleStoreError> {
        Err(down())
    }

    async fn insert_rule(&self, _rule: NewAccessRule, _now: DateTime<Utc>) -> Result<RuleRecord, RuleStoreError> {
        Err(down())
    }

    async fn update_rule(&self, _id: RuleId, _patch: RulePatch, _now: DateTime<Utc>) -> Result<RuleRecord, RuleStoreError> {
        Err(down())
    }

    async fn set_active(&self, _id: RuleId, _is_active: bool, _now: DateTime<Utc>) -> Result<RuleRecord, RuleStoreError> {
        Err(down())
    }

    async fn delete_rule(&self, _id: RuleId) -> Result<RuleRecord, RuleStoreError> {
        Err(down())
    }
}
