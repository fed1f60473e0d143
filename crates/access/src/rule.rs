use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use docgate_core::{DomainError, RuleId, UserId};

use crate::{RuleStatus, TargetType, classify};

/// A time-boxed grant from one user to one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRule {
    pub id: RuleId,
    pub user_id: UserId,
    pub target_type: TargetType,
    pub target_id: String,
    pub target_name: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AccessRule {
    pub fn status(&self, now: DateTime<Utc>) -> RuleStatus {
        classify(self.is_active, self.start_date, self.end_date, now)
    }

    /// `is_active AND start_date <= now <= end_date`.
    pub fn grants_at(&self, now: DateTime<Utc>) -> bool {
        self.status(now) == RuleStatus::Active
    }

    pub fn targets(&self, target_type: TargetType, target_id: &str) -> bool {
        self.target_type == target_type && self.target_id == target_id
    }

    /// Sort key for "newest rule wins"; the id breaks `created_at` ties.
    pub fn recency(&self) -> (DateTime<Utc>, RuleId) {
        (self.created_at, self.id)
    }

    pub fn summary(&self) -> RuleSummary {
        RuleSummary {
            id: self.id,
            target_type: self.target_type,
            target_id: self.target_id.clone(),
            target_name: self.target_name.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }
}

/// The part of a rule that explains a grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSummary {
    pub id: RuleId,
    pub target_type: TargetType,
    pub target_id: String,
    pub target_name: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

/// A rule joined with its owner's display fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleRecord {
    #[serde(flatten)]
    pub rule: AccessRule,
    pub user_name: String,
    pub user_email: String,
}

/// Newest first: `created_at DESC, id DESC`.
pub fn sort_newest_first(records: &mut [RuleRecord]) {
    records.sort_by(|a, b| b.rule.recency().cmp(&a.rule.recency()));
}

fn check_range(start_date: DateTime<Utc>, end_date: DateTime<Utc>) -> Result<(), DomainError> {
    if end_date <= start_date {
        return Err(DomainError::validation("end_date must be after start_date"));
    }
    Ok(())
}

fn normalize_target_id(target_id: &str) -> Result<String, DomainError> {
    let target_id = target_id.trim();
    if target_id.is_empty() {
        return Err(DomainError::validation("target_id cannot be empty"));
    }
    Ok(target_id.to_string())
}

/// Input for creating a rule.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewAccessRule {
    pub user_id: UserId,
    pub target_type: TargetType,
    pub target_id: String,
    #[serde(default)]
    pub target_name: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl NewAccessRule {
    /// Validate and materialize. `target_name` falls back to `target_id`,
    /// `is_active` to `true`.
    pub fn into_rule(self, id: RuleId, now: DateTime<Utc>) -> Result<AccessRule, DomainError> {
        let target_id = normalize_target_id(&self.target_id)?;
        check_range(self.start_date, self.end_date)?;

        let target_name = match self.target_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => target_id.clone(),
        };

        Ok(AccessRule {
            id,
            user_id: self.user_id,
            target_type: self.target_type,
            target_id,
            target_name,
            start_date: self.start_date,
            end_date: self.end_date,
            is_active: self.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        })
    }
}

/// Partial edit of a rule. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RulePatch {
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub target_type: Option<TargetType>,
    #[serde(default)]
    pub target_id: Option<String>,
    #[serde(default)]
    pub target_name: Option<String>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl RulePatch {
    pub fn is_empty(&self) -> bool {
        self.user_id.is_none()
            && self.target_type.is_none()
            && self.target_id.is_none()
            && self.target_name.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
            && self.is_active.is_none()
    }

    /// Merge onto `rule` and re-validate the result as a whole.
    pub fn apply_to(&self, rule: &AccessRule, now: DateTime<Utc>) -> Result<AccessRule, DomainError> {
        if self.is_empty() {
            return Err(DomainError::validation("no changes supplied"));
        }

        let mut next = rule.clone();
        if let Some(user_id) = self.user_id {
            next.user_id = user_id;
        }
        if let Some(target_type) = self.target_type {
            next.target_type = target_type;
        }
        if let Some(target_id) = &self.target_id {
            next.target_id = normalize_target_id(target_id)?;
        }
        if let Some(target_name) = &self.target_name {
            let target_name = target_name.trim();
            next.target_name = if target_name.is_empty() {
                next.target_id.clone()
            } else {
                target_name.to_string()
            };
        }
        if let Some(start_date) = self.start_date {
            next.start_date = start_date;
        }
        if let Some(end_date) = self.end_date {
            next.end_date = end_date;
        }
        if let Some(is_active) = self.is_active {
            next.is_active = is_active;
        }

        check_range(next.start_date, next.end_date)?;
        next.updated_at = now;
        Ok(next)
    }
}
