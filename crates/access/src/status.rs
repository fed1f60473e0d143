use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use docgate_core::DomainError;

/// Lifecycle state of a rule at a given instant.
///
/// Always derived, never stored: the same rule reads differently at
/// different instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleStatus {
    Upcoming,
    Active,
    Expired,
    Disabled,
}

impl RuleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleStatus::Upcoming => "upcoming",
            RuleStatus::Active => "active",
            RuleStatus::Expired => "expired",
            RuleStatus::Disabled => "disabled",
        }
    }
}

impl core::fmt::Display for RuleStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for RuleStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upcoming" => Ok(RuleStatus::Upcoming),
            "active" => Ok(RuleStatus::Active),
            "expired" => Ok(RuleStatus::Expired),
            "disabled" => Ok(RuleStatus::Disabled),
            other => Err(DomainError::validation(format!("invalid rule status '{other}'"))),
        }
    }
}

/// Classify a rule. First match wins: disabled, upcoming, expired, active.
///
/// Both bounds are inclusive for `Active`.
pub fn classify(
    is_active: bool,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    now: DateTime<Utc>,
) -> RuleStatus {
    if !is_active {
        RuleStatus::Disabled
    } else if now < start_date {
        RuleStatus::Upcoming
    } else if now > end_date {
        RuleStatus::Expired
    } else {
        RuleStatus::Active
    }
}
