use chrono::Duration;

use crate::GroupMapping;

pub const AUTHORIZE_PATH: &str = "/oidc/authorize";
pub const TOKEN_PATH: &str = "/oidc/token";
pub const USERINFO_PATH: &str = "/oidc/userinfo";

/// Static configuration of the single registered relying party.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SsoSettings {
    /// `iss` claim and base URL of the endpoints; no trailing slash.
    pub issuer: String,
    /// Also used as the `aud` claim.
    pub client_id: String,
    /// Empty means any absolute `redirect_uri` is accepted.
    pub redirect_uris: Vec<String>,
    pub token_ttl: Duration,
    pub code_ttl: Duration,
    pub group_mapping: GroupMapping,
}

impl SsoSettings {
    pub fn new(issuer: impl Into<String>, client_id: impl Into<String>) -> Self {
        let issuer: String = issuer.into();
        Self {
            issuer: issuer.trim_end_matches('/').to_string(),
            client_id: client_id.into(),
            redirect_uris: Vec::new(),
            token_ttl: Duration::hours(1),
            code_ttl: Duration::minutes(5),
            group_mapping: GroupMapping::default(),
        }
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.issuer, path)
    }

    pub fn redirect_allowed(&self, redirect_uri: &str) -> bool {
        self.redirect_uris.is_empty() || self.redirect_uris.iter().any(|u| u == redirect_uri)
    }
}
