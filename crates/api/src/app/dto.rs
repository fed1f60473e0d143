//! Request/response bodies. Field names are snake_case on the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use docgate_access::{AccessSnapshot, DocumentMetadata, NewAccessRule, RuleRecord, RuleStatus, RuleSummary, TargetType};
use docgate_core::{RuleId, UserId};

#[derive(Debug, Deserialize)]
pub struct AccessCheckRequest {
    #[serde(default)]
    pub target_type: Option<String>,
    #[serde(default)]
    pub target_id: Option<String>,
    #[serde(default)]
    pub document_metadata: Option<DocumentMetadata>,
}

#[derive(Debug, Serialize)]
pub struct MyAccessResponse {
    pub rules: Vec<RuleSummary>,
    #[serde(flatten)]
    pub snapshot: AccessSnapshot,
}

#[derive(Debug, Default, Deserialize)]
pub struct RuleListQuery {
    pub user_id: Option<String>,
    pub status: Option<String>,
    pub target_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateRuleRequest {
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub target_type: Option<String>,
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

impl CreateRuleRequest {
    /// Required fields present and the target type known; range and blank-id
    /// checks happen when the rule is materialized.
    pub fn into_new_rule(self) -> Result<NewAccessRule, String> {
        let (Some(user_id), Some(target_type), Some(target_id), Some(start_date), Some(end_date)) =
            (self.user_id, self.target_type, self.target_id, self.start_date, self.end_date)
        else {
            return Err("user_id, target_type, target_id, start_date and end_date are required".to_string());
        };

        let target_type: TargetType = target_type.parse().map_err(|_| invalid_target_type())?;

        Ok(NewAccessRule {
            user_id,
            target_type,
            target_id,
            target_name: self.target_name,
            start_date,
            end_date,
            is_active: self.is_active,
        })
    }
}

pub fn invalid_target_type() -> String {
    let allowed: Vec<&str> = TargetType::ALL.iter().map(TargetType::as_str).collect();
    format!("target_type must be one of: {}", allowed.join(", "))
}

#[derive(Debug, Deserialize)]
pub struct ToggleRuleRequest {
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// A rule record with its status derived at response time.
#[derive(Debug, Serialize)]
pub struct RuleView {
    #[serde(flatten)]
    pub record: RuleRecord,
    pub status: RuleStatus,
}

impl RuleView {
    pub fn at(record: RuleRecord, now: DateTime<Utc>) -> Self {
        let status = record.rule.status(now);
        Self { record, status }
    }
}

#[derive(Debug, Serialize)]
pub struct ToggleRuleResponse {
    pub message: String,
    pub id: RuleId,
    pub is_active: bool,
}

#[derive(Debug, Serialize)]
pub struct DeletedRule {
    pub id: RuleId,
    pub target_name: String,
    pub user_name: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteRuleResponse {
    pub message: String,
    pub deleted_rule: DeletedRule,
}
