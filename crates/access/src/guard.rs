//! Access-Control Middleware decision, independent of any HTTP framework.
//!
//! Per request: unauthenticated → reject; admin → allow without evaluation;
//! anyone else → extract target, evaluate, allow or deny. Single pass, no retry.

use chrono::{DateTime, Utc};
use thiserror::Error;

use docgate_auth::Caller;

use crate::{AccessEvaluator, DenialCode, DocumentMetadata, RuleStore, RuleSummary, TargetType};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("metadata lookup failed: {0}")]
pub struct MetadataError(pub String);

/// Pulls the target id (and, for documents, container metadata) out of a
/// request context `C`.
#[async_trait::async_trait]
pub trait TargetExtractor<C>: Send + Sync
where
    C: Sync + ?Sized,
{
    fn target_id(&self, ctx: &C) -> Option<String>;

    async fn document_metadata(&self, _ctx: &C, _document_id: &str) -> Result<Option<DocumentMetadata>, MetadataError> {
        Ok(None)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedBy {
    AdminBypass,
    Rule(RuleSummary),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allowed(AllowedBy),
    Denied { reason: String, code: DenialCode },
    Unauthenticated,
    BadRequest(String),
}

impl GuardDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GuardDecision::Allowed(_))
    }
}

/// Wraps one protected operation: a target type plus the extractor for it.
#[derive(Debug, Clone)]
pub struct AccessGuard<X> {
    target_type: TargetType,
    extractor: X,
}

impl<X> AccessGuard<X> {
    pub fn new(target_type: TargetType, extractor: X) -> Self {
        Self { target_type, extractor }
    }

    pub fn target_type(&self) -> TargetType {
        self.target_type
    }

    pub async fn decide<S, C>(
        &self,
        evaluator: &AccessEvaluator<S>,
        caller: Option<&Caller>,
        ctx: &C,
        now: DateTime<Utc>,
    ) -> GuardDecision
    where
        S: RuleStore,
        C: Sync + ?Sized,
        X: TargetExtractor<C>,
    {
        let Some(caller) = caller else {
            return GuardDecision::Unauthenticated;
        };

        if caller.is_admin() {
            return GuardDecision::Allowed(AllowedBy::AdminBypass);
        }

        let target_id = match self.extractor.target_id(ctx) {
            Some(id) if !id.trim().is_empty() => id,
            _ => return GuardDecision::BadRequest(format!("missing {} id", self.target_type)),
        };

        let result = if self.target_type == TargetType::Document {
            let metadata = match self.extractor.document_metadata(ctx, &target_id).await {
                Ok(metadata) => metadata,
                Err(err) => {
                    tracing::warn!(user_id = %caller.user_id, document_id = %target_id, error = %err, "document metadata lookup failed; denying");
                    return denied(DenialCode::LookupFailed);
                }
            };
            evaluator
                .check_document_access(caller.user_id, &target_id, metadata.as_ref(), now)
                .await
        } else {
            evaluator
                .check_user_access(caller.user_id, self.target_type, &target_id, now)
                .await
        };

        match (result.has_access, result.matched_rule) {
            (true, Some(rule)) => GuardDecision::Allowed(AllowedBy::Rule(rule)),
            _ => {
                let code = result.denial.unwrap_or(DenialCode::NoValidRule);
                tracing::info!(
                    user_id = %caller.user_id,
                    target_type = self.target_type.as_str(),
                    target_id = %target_id,
                    reason = code.message(),
                    "access denied"
                );
                denied(code)
            }
        }
    }
}

fn denied(code: DenialCode) -> GuardDecision {
    GuardDecision::Denied {
        reason: code.message().to_string(),
        code,
    }
}
