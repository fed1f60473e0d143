use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use docgate_core::{DomainError, RuleId, UserId};

use crate::{AccessRule, NewAccessRule, RulePatch, RuleRecord, TargetType};

#[derive(Debug, Error)]
pub enum RuleStoreError {
    #[error("access rule not found")]
    NotFound,

    #[error("unknown user {0}")]
    UnknownUser(UserId),

    #[error(transparent)]
    Invalid(#[from] DomainError),

    #[error("rule store unavailable: {0}")]
    Backend(String),
}

/// Selection criteria for [`RuleStore::find_rules`]. Empty selects everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleFilter {
    pub user_id: Option<UserId>,
    pub target_type: Option<TargetType>,
    pub target_id: Option<String>,
    /// Only rules granting at this instant.
    pub valid_at: Option<DateTime<Utc>>,
}

impl RuleFilter {
    pub fn for_user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::default()
        }
    }

    pub fn target(mut self, target_type: TargetType, target_id: impl Into<String>) -> Self {
        self.target_type = Some(target_type);
        self.target_id = Some(target_id.into());
        self
    }

    pub fn target_type(mut self, target_type: TargetType) -> Self {
        self.target_type = Some(target_type);
        self
    }

    pub fn valid_at(mut self, now: DateTime<Utc>) -> Self {
        self.valid_at = Some(now);
        self
    }

    pub fn matches(&self, rule: &AccessRule) -> bool {
        self.user_id.is_none_or(|u| rule.user_id == u)
            && self.target_type.is_none_or(|t| rule.target_type == t)
            && self.target_id.as_deref().is_none_or(|id| rule.target_id == id)
            && self.valid_at.is_none_or(|now| rule.grants_at(now))
    }
}

/// Persistence boundary for access rules. No decision logic lives behind it.
///
/// `find_rules` returns records newest first (`created_at DESC, id DESC`).
#[async_trait::async_trait]
pub trait RuleStore: Send + Sync {
    async fn find_rules(&self, filter: &RuleFilter) -> Result<Vec<RuleRecord>, RuleStoreError>;

    async fn get_rule(&self, id: RuleId) -> Result<RuleRecord, RuleStoreError>;

    async fn insert_rule(&self, rule: NewAccessRule, now: DateTime<Utc>) -> Result<RuleRecord, RuleStoreError>;

    async fn update_rule(&self, id: RuleId, patch: RulePatch, now: DateTime<Utc>) -> Result<RuleRecord, RuleStoreError>;

    async fn set_active(&self, id: RuleId, is_active: bool, now: DateTime<Utc>) -> Result<RuleRecord, RuleStoreError>;

    /// Returns the record as it was before deletion.
    async fn delete_rule(&self, id: RuleId) -> Result<RuleRecord, RuleStoreError>;
}

#[async_trait::async_trait]
impl<S> RuleStore for Arc<S>
where
    S: RuleStore + ?Sized,
{
    async fn find_rules(&self, filter: &RuleFilter) -> Result<Vec<RuleRecord>, RuleStoreError> {
        (**self).find_rules(filter).await
    }

    async fn get_rule(&self, id: RuleId) -> Result<RuleRecord, RuleStoreError> {
        (**self).get_rule(id).await
    }

    async fn insert_rule(&self, rule: NewAccessRule, now: DateTime<Utc>) -> Result<RuleRecord, RuleStoreError> {
        (**self).insert_rule(rule, now).await
    }

    async fn update_rule(&self, id: RuleId, patch: RulePatch, now: DateTime<Utc>) -> Result<RuleRecord, RuleStoreError> {
        (**self).update_rule(id, patch, now).await
    }

    async fn set_active(&self, id: RuleId, is_active: bool, now: DateTime<Utc>) -> Result<RuleRecord, RuleStoreError> {
        (**self).set_active(id, is_active, now).await
    }

    async fn delete_rule(&self, id: RuleId) -> Result<RuleRecord, RuleStoreError> {
        (**self).delete_rule(id).await
    }
}
