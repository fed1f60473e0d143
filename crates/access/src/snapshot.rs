use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use docgate_core::UserId;

use crate::{AccessibleTargetSet, DocumentMetadata, TargetType};

/// A user's accessible targets, computed once, with an explicit staleness bound.
///
/// Consumers may answer membership questions from a snapshot until
/// `fresh_until`; after that they must fetch a new one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessSnapshot {
    pub user_id: UserId,
    pub computed_at: DateTime<Utc>,
    pub fresh_until: DateTime<Utc>,
    pub accessible: AccessibleTargetSet,
}

impl AccessSnapshot {
    pub fn new(user_id: UserId, accessible: AccessibleTargetSet, computed_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            user_id,
            computed_at,
            fresh_until: computed_at + ttl,
            accessible,
        }
    }

    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.fresh_until
    }

    pub fn has_access_to(&self, target_type: TargetType, target_id: &str) -> bool {
        self.accessible.contains(target_type, target_id)
    }

    /// Same single-hop rule as the evaluator: the document itself, or one of
    /// its direct containers.
    pub fn has_document_access(&self, document_id: &str, metadata: Option<&DocumentMetadata>) -> bool {
        if self.has_access_to(TargetType::Document, document_id) {
            return true;
        }
        metadata.is_some_and(|m| m.containers().any(|(ty, id)| self.has_access_to(ty, id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn snapshot() -> AccessSnapshot {
        let mut accessible = AccessibleTargetSet::default();
        accessible.insert(TargetType::Document, "D1");
        accessible.insert(TargetType::Category, "contracts");

        AccessSnapshot::new(
            UserId::new(3),
            accessible,
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            Duration::seconds(60),
        )
    }

    #[test]
    fn freshness_is_bounded_by_ttl() {
        let snap = snapshot();
        assert!(snap.is_fresh(snap.computed_at));
        assert!(snap.is_fresh(snap.computed_at + Duration::seconds(59)));
        assert!(!snap.is_fresh(snap.computed_at + Duration::seconds(60)));
    }

    #[test]
    fn document_access_through_category() {
        let snap = snapshot();
        let metadata = DocumentMetadata {
            category_id: Some("contracts".to_string()),
            ..DocumentMetadata::default()
        };

        assert!(snap.has_document_access("D1", None));
        assert!(snap.has_document_access("D2", Some(&metadata)));
        assert!(!snap.has_document_access("D2", None));
        assert!(!snap.has_access_to(TargetType::Folder, "D1"));
    }
}
