//! Access evaluation: "may user U act on target T at instant `now`?"
//!
//! Storage failures never escape as errors from the check operations; they
//! fail closed with [`DenialCode::LookupFailed`] and are logged.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use docgate_core::UserId;

use crate::{AccessRule, RuleFilter, RuleStore, RuleStoreError, RuleSummary, TargetType};

/// Why a check did not grant access. The message is safe to show to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialCode {
    NoValidRule,
    NoAccessViaContainers,
    LookupFailed,
}

impl DenialCode {
    pub fn message(&self) -> &'static str {
        match self {
            DenialCode::NoValidRule => "no valid access rule found",
            DenialCode::NoAccessViaContainers => "no access via document or containers",
            DenialCode::LookupFailed => "lookup failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessCheckResult {
    pub has_access: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_rule: Option<RuleSummary>,
    #[serde(skip)]
    pub denial: Option<DenialCode>,
}

impl AccessCheckResult {
    pub fn granted(rule: &AccessRule) -> Self {
        Self {
            has_access: true,
            reason: None,
            matched_rule: Some(rule.summary()),
            denial: None,
        }
    }

    pub fn denied(code: DenialCode) -> Self {
        Self {
            has_access: false,
            reason: Some(code.message().to_string()),
            matched_rule: None,
            denial: Some(code),
        }
    }
}

/// Container memberships of a document, as far as the backend knows them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,
    #[serde(default)]
    pub tag_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
}

impl DocumentMetadata {
    /// Containers in evaluation order: folder, tags (in order), category.
    pub fn containers(&self) -> impl Iterator<Item = (TargetType, &str)> {
        self.folder_id
            .as_deref()
            .map(|id| (TargetType::Folder, id))
            .into_iter()
            .chain(self.tag_ids.iter().map(|id| (TargetType::Tag, id.as_str())))
            .chain(self.category_id.as_deref().map(|id| (TargetType::Category, id)))
    }
}

/// Target ids reachable by one user at one instant, bucketed by type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessibleTargetSet {
    pub documents: BTreeSet<String>,
    pub folders: BTreeSet<String>,
    pub tags: BTreeSet<String>,
    pub categories: BTreeSet<String>,
}

impl AccessibleTargetSet {
    pub fn bucket(&self, target_type: TargetType) -> &BTreeSet<String> {
        match target_type {
            TargetType::Document => &self.documents,
            TargetType::Folder => &self.folders,
            TargetType::Tag => &self.tags,
            TargetType::Category => &self.categories,
        }
    }

    fn bucket_mut(&mut self, target_type: TargetType) -> &mut BTreeSet<String> {
        match target_type {
            TargetType::Document => &mut self.documents,
            TargetType::Folder => &mut self.folders,
            TargetType::Tag => &mut self.tags,
            TargetType::Category => &mut self.categories,
        }
    }

    pub fn insert(&mut self, target_type: TargetType, target_id: impl Into<String>) {
        self.bucket_mut(target_type).insert(target_id.into());
    }

    pub fn contains(&self, target_type: TargetType, target_id: &str) -> bool {
        self.bucket(target_type).contains(target_id)
    }

    pub fn is_empty(&self) -> bool {
        TargetType::ALL.iter().all(|t| self.bucket(*t).is_empty())
    }
}

impl<'a> FromIterator<&'a AccessRule> for AccessibleTargetSet {
    fn from_iter<I: IntoIterator<Item = &'a AccessRule>>(iter: I) -> Self {
        let mut set = Self::default();
        for rule in iter {
            set.insert(rule.target_type, rule.target_id.clone());
        }
        set
    }
}

#[derive(Debug, Clone)]
pub struct AccessEvaluator<S> {
    store: S,
}

impl<S> AccessEvaluator<S>
where
    S: RuleStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Newest granting rule for `(user, type, id)` at `now`, if any.
    async fn granting_rule(
        &self,
        user_id: UserId,
        target_type: TargetType,
        target_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<AccessRule>, RuleStoreError> {
        let filter = RuleFilter::for_user(user_id).target(target_type, target_id).valid_at(now);
        let records = self.store.find_rules(&filter).await?;

        // Re-check the window here; a store is not trusted to have filtered it.
        Ok(records
            .into_iter()
            .map(|r| r.rule)
            .filter(|r| r.targets(target_type, target_id) && r.user_id == user_id && r.grants_at(now))
            .max_by_key(AccessRule::recency))
    }

    pub async fn check_user_access(
        &self,
        user_id: UserId,
        target_type: TargetType,
        target_id: &str,
        now: DateTime<Utc>,
    ) -> AccessCheckResult {
        match self.granting_rule(user_id, target_type, target_id, now).await {
            Ok(Some(rule)) => AccessCheckResult::granted(&rule),
            Ok(None) => AccessCheckResult::denied(DenialCode::NoValidRule),
            Err(err) => {
                tracing::warn!(
                    %user_id,
                    target_type = target_type.as_str(),
                    target_id,
                    error = %err,
                    "access lookup failed; denying"
                );
                AccessCheckResult::denied(DenialCode::LookupFailed)
            }
        }
    }

    /// Direct document grant, then exactly one hop through the document's
    /// containers. A container's own container is never consulted.
    pub async fn check_document_access(
        &self,
        user_id: UserId,
        document_id: &str,
        metadata: Option<&DocumentMetadata>,
        now: DateTime<Utc>,
    ) -> AccessCheckResult {
        let direct = self.check_user_access(user_id, TargetType::Document, document_id, now).await;
        if direct.has_access || direct.denial == Some(DenialCode::LookupFailed) {
            return direct;
        }

        if let Some(metadata) = metadata {
            for (target_type, target_id) in metadata.containers() {
                let via = self.check_user_access(user_id, target_type, target_id, now).await;
                if via.has_access {
                    tracing::debug!(%user_id, document_id, via = target_type.as_str(), target_id, "document access inherited");
                    return via;
                }
                if via.denial == Some(DenialCode::LookupFailed) {
                    return via;
                }
            }
        }

        AccessCheckResult::denied(DenialCode::NoAccessViaContainers)
    }

    /// Every rule granting at `now`, newest first.
    pub async fn active_rules(&self, user_id: UserId, now: DateTime<Utc>) -> Result<Vec<AccessRule>, RuleStoreError> {
        let filter = RuleFilter::for_user(user_id).valid_at(now);
        let records = self.store.find_rules(&filter).await?;

        Ok(records
            .into_iter()
            .map(|r| r.rule)
            .filter(|r| r.user_id == user_id && r.grants_at(now))
            .collect())
    }

    pub async fn accessible_targets(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<AccessibleTargetSet, RuleStoreError> {
        let rules = self.active_rules(user_id, now).await?;
        Ok(rules.iter().collect())
    }
}
