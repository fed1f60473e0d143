use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Role;

/// Session bearer-token claims (transport-agnostic).
///
/// This is the minimal set of claims expected once a session token has been
/// decoded/verified. Timestamps are JWT NumericDates (seconds since epoch).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject: the local user id, as a string.
    pub sub: String,

    pub email: String,

    pub role: Role,

    /// Issued-at.
    pub iat: i64,

    /// Expiration.
    pub exp: i64,
}

impl SessionClaims {
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.iat, 0)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,

    #[error("invalid token: {0}")]
    Invalid(String),
}

/// Deterministically validate session claims against an explicit `now`.
///
/// Note: this validates the *claims* only. Signature verification happens in
/// [`crate::jwt`].
pub fn validate_claims(claims: &SessionClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if claims.exp <= claims.iat {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    let now = now.timestamp();
    if now < claims.iat {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.exp {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn claims(iat: i64, exp: i64) -> SessionClaims {
        SessionClaims {
            sub: "7".to_string(),
            email: "reader@example.com".to_string(),
            role: Role::Reader,
            iat,
            exp,
        }
    }

    #[test]
    fn accepts_claims_inside_window() {
        let now = Utc.timestamp_opt(1_000, 0).unwrap();
        assert_eq!(validate_claims(&claims(900, 1_100), now), Ok(()));
    }

    #[test]
    fn rejects_expired_and_future_tokens() {
        let now = Utc.timestamp_opt(1_000, 0).unwrap();
        assert_eq!(validate_claims(&claims(100, 1_000), now), Err(TokenValidationError::Expired));
        assert_eq!(validate_claims(&claims(1_001, 2_000), now), Err(TokenValidationError::NotYetValid));
        assert_eq!(
            validate_claims(&claims(500, 500), now),
            Err(TokenValidationError::InvalidTimeWindow)
        );
    }
}
