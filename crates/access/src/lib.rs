//! `docgate-access`: the temporal access-control engine.
//!
//! Rules grant one user access to one target for a bounded period. Everything
//! here is evaluated against an explicit `now`; nothing reads the clock.

pub mod evaluator;
pub mod guard;
pub mod rule;
pub mod snapshot;
pub mod status;
pub mod store;
pub mod target;

#[cfg(test)]
pub(crate) mod testing;

pub use evaluator::{AccessCheckResult, AccessEvaluator, AccessibleTargetSet, DenialCode, DocumentMetadata};
pub use guard::{AccessGuard, AllowedBy, GuardDecision, MetadataError, TargetExtractor};
pub use rule::{AccessRule, NewAccessRule, RulePatch, RuleRecord, RuleSummary};
pub use snapshot::AccessSnapshot;
pub use status::{RuleStatus, classify};
pub use store::{RuleFilter, RuleStore, RuleStoreError};
pub use target::TargetType;
