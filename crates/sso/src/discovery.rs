use serde::Serialize;

use crate::SsoSettings;
use crate::settings::{AUTHORIZE_PATH, TOKEN_PATH, USERINFO_PATH};

/// `/.well-known/openid-configuration`. Built once from settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveryDocument {
    pub issuer: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub userinfo_endpoint: String,
    pub response_types_supported: Vec<&'static str>,
    pub grant_types_supported: Vec<&'static str>,
    pub subject_types_supported: Vec<&'static str>,
    pub id_token_signing_alg_values_supported: Vec<&'static str>,
    pub scopes_supported: Vec<&'static str>,
    pub token_endpoint_auth_methods_supported: Vec<&'static str>,
    pub claims_supported: Vec<&'static str>,
}

impl DiscoveryDocument {
    pub fn for_settings(settings: &SsoSettings, signing_alg: &'static str) -> Self {
        Self {
            issuer: settings.issuer.clone(),
            authorization_endpoint: settings.endpoint(AUTHORIZE_PATH),
            token_endpoint: settings.endpoint(TOKEN_PATH),
            userinfo_endpoint: settings.endpoint(USERINFO_PATH),
            response_types_supported: vec!["code"],
            grant_types_supported: vec!["authorization_code"],
            subject_types_supported: vec!["public"],
            id_token_signing_alg_values_supported: vec![signing_alg],
            scopes_supported: vec!["openid", "profile", "email"],
            token_endpoint_auth_methods_supported: vec!["client_secret_post", "none"],
            claims_supported: vec![
                "sub",
                "iss",
                "aud",
                "exp",
                "iat",
                "nonce",
                "email",
                "name",
                "preferred_username",
                "groups",
                "group_mapping_version",
                "access_scope",
                "document_access_list",
                "folder_access_list",
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_hang_off_the_issuer() {
        let doc = DiscoveryDocument::for_settings(&SsoSettings::new("https://edms.example.com/", "edms"), "HS256");

        assert_eq!(doc.issuer, "https://edms.example.com");
        assert_eq!(doc.token_endpoint, "https://edms.example.com/oidc/token");
        assert!(doc.claims_supported.contains(&"document_access_list"));
    }
}
