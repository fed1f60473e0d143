use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use docgate_auth::Caller;

use crate::{SsoSettings, VerifyError};

pub const CODE_USE: &str = "code";

/// Payload of an authorization code.
///
/// Deliberately minimal: it names the user and binds the redirect, but
/// carries no access lists. Those are computed at exchange time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeClaims {
    pub sub: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    pub iat: i64,
    pub exp: i64,
    pub aud: String,
    pub redirect_uri: String,
    pub jti: String,
    pub token_use: String,
}

impl CodeClaims {
    pub fn mint(
        caller: &Caller,
        settings: &SsoSettings,
        redirect_uri: &str,
        nonce: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            sub: caller.user_id.to_string(),
            email: caller.email.clone(),
            nonce,
            iat: now.timestamp(),
            exp: (now + settings.code_ttl).timestamp(),
            aud: settings.client_id.clone(),
            redirect_uri: redirect_uri.to_string(),
            jti: Uuid::now_v7().to_string(),
            token_use: CODE_USE.to_string(),
        }
    }

    /// Purpose, audience and expiry, in that order.
    pub fn check(&self, settings: &SsoSettings, now: DateTime<Utc>) -> Result<(), VerifyError> {
        if self.token_use != CODE_USE {
            return Err(VerifyError::WrongUse { expected: CODE_USE });
        }
        if self.aud != settings.client_id {
            return Err(VerifyError::Audience);
        }
        if now.timestamp() >= self.exp {
            return Err(VerifyError::Expired);
        }
        Ok(())
    }
}
