//! Token Issuance Pipeline: authorize → code, code → tokens, token → userinfo.
//!
//! Every exchange recomputes access lists from the rule store at the moment
//! of exchange; nothing is cached between requests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;
use uuid::Uuid;

use docgate_access::{AccessEvaluator, RuleStore, RuleStoreError};
use docgate_auth::{Caller, UserDirectory, UserRecord};
use docgate_core::UserId;

use crate::claims::ACCESS_USE;
use crate::{
    AccessLists, AccessTokenClaims, CodeClaims, IdTokenClaims, SignError, SsoSettings, TokenSigner, UserInfo,
    VerifyError,
};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthorizeRequest {
    pub client_id: Option<String>,
    pub redirect_uri: Option<String>,
    pub state: Option<String>,
    pub nonce: Option<String>,
    pub response_type: Option<String>,
    pub scope: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenRequest {
    pub grant_type: Option<String>,
    pub code: Option<String>,
    pub redirect_uri: Option<String>,
    pub client_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub id_token: String,
}

#[derive(Debug, Error)]
pub enum AuthorizeError {
    #[error("unknown client")]
    InvalidClient,

    #[error("{0}")]
    InvalidRequest(String),

    #[error("unsupported response_type '{0}'")]
    UnsupportedResponseType(String),

    #[error(transparent)]
    Sign(#[from] SignError),
}

impl AuthorizeError {
    pub fn oauth_error_code(&self) -> &'static str {
        match self {
            AuthorizeError::InvalidClient => "invalid_client",
            AuthorizeError::InvalidRequest(_) => "invalid_request",
            AuthorizeError::UnsupportedResponseType(_) => "unsupported_response_type",
            AuthorizeError::Sign(_) => "server_error",
        }
    }
}

#[derive(Debug, Error)]
pub enum TokenExchangeError {
    #[error("unsupported grant_type '{0}'")]
    UnsupportedGrantType(String),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    InvalidGrant(String),

    #[error("unknown client")]
    InvalidClient,

    #[error("lookup failed: {0}")]
    LookupFailed(String),

    #[error(transparent)]
    Sign(#[from] SignError),
}

impl TokenExchangeError {
    pub fn oauth_error_code(&self) -> &'static str {
        match self {
            TokenExchangeError::UnsupportedGrantType(_) => "unsupported_grant_type",
            TokenExchangeError::InvalidRequest(_) => "invalid_request",
            TokenExchangeError::InvalidGrant(_) => "invalid_grant",
            TokenExchangeError::InvalidClient => "invalid_client",
            TokenExchangeError::LookupFailed(_) | TokenExchangeError::Sign(_) => "server_error",
        }
    }
}

#[derive(Debug, Error)]
pub enum UserInfoError {
    #[error("{0}")]
    InvalidToken(String),

    #[error("lookup failed: {0}")]
    LookupFailed(String),
}

impl UserInfoError {
    pub fn oauth_error_code(&self) -> &'static str {
        match self {
            UserInfoError::InvalidToken(_) => "invalid_token",
            UserInfoError::LookupFailed(_) => "server_error",
        }
    }
}

pub struct TokenIssuer<R, U> {
    settings: SsoSettings,
    signer: TokenSigner,
    evaluator: AccessEvaluator<R>,
    users: U,
}

impl<R, U> TokenIssuer<R, U>
where
    R: RuleStore,
    U: UserDirectory,
{
    pub fn new(settings: SsoSettings, signer: TokenSigner, evaluator: AccessEvaluator<R>, users: U) -> Self {
        Self {
            settings,
            signer,
            evaluator,
            users,
        }
    }

    pub fn settings(&self) -> &SsoSettings {
        &self.settings
    }

    pub fn signer(&self) -> &TokenSigner {
        &self.signer
    }

    /// Validate the authorize request and return the redirect location
    /// carrying a freshly signed code (and `state`, when given).
    #[tracing::instrument(skip(self, caller, request), fields(user_id = %caller.user_id))]
    pub fn authorize(
        &self,
        caller: &Caller,
        request: &AuthorizeRequest,
        now: DateTime<Utc>,
    ) -> Result<String, AuthorizeError> {
        if request.client_id.as_deref() != Some(self.settings.client_id.as_str()) {
            return Err(AuthorizeError::InvalidClient);
        }

        let redirect_uri = request
            .redirect_uri
            .as_deref()
            .filter(|u| !u.is_empty())
            .ok_or_else(|| AuthorizeError::InvalidRequest("redirect_uri is required".to_string()))?;
        if !self.settings.redirect_allowed(redirect_uri) {
            return Err(AuthorizeError::InvalidRequest("redirect_uri is not registered".to_string()));
        }
        let mut location = Url::parse(redirect_uri)
            .map_err(|e| AuthorizeError::InvalidRequest(format!("invalid redirect_uri: {e}")))?;

        if let Some(response_type) = request.response_type.as_deref() {
            if response_type != "code" {
                return Err(AuthorizeError::UnsupportedResponseType(response_type.to_string()));
            }
        }

        let claims = CodeClaims::mint(caller, &self.settings, redirect_uri, request.nonce.clone(), now);
        let code = self.signer.sign(&claims)?;

        {
            let mut query = location.query_pairs_mut();
            query.append_pair("code", &code);
            if let Some(state) = request.state.as_deref() {
                query.append_pair("state", state);
            }
        }

        tracing::info!("authorization code issued");
        Ok(location.into())
    }

    #[tracing::instrument(skip(self, request))]
    pub async fn exchange(&self, request: &TokenRequest, now: DateTime<Utc>) -> Result<TokenResponse, TokenExchangeError> {
        match request.grant_type.as_deref() {
            Some("authorization_code") => {}
            Some(other) => return Err(TokenExchangeError::UnsupportedGrantType(other.to_string())),
            None => return Err(TokenExchangeError::InvalidRequest("grant_type is required".to_string())),
        }

        let code = request
            .code
            .as_deref()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| TokenExchangeError::InvalidRequest("code is required".to_string()))?;

        let claims: CodeClaims = self.signer.verify(code).map_err(invalid_grant)?;
        claims.check(&self.settings, now).map_err(invalid_grant)?;

        if let Some(redirect_uri) = request.redirect_uri.as_deref() {
            if redirect_uri != claims.redirect_uri {
                return Err(TokenExchangeError::InvalidGrant("redirect_uri does not match the code".to_string()));
            }
        }
        if let Some(client_id) = request.client_id.as_deref() {
            if client_id != self.settings.client_id {
                return Err(TokenExchangeError::InvalidClient);
            }
        }

        let user_id = claims
            .sub
            .parse::<UserId>()
            .map_err(|_| TokenExchangeError::InvalidGrant("code subject is not a user".to_string()))?;
        let user = self
            .users
            .find_user(user_id)
            .await
            .map_err(|e| TokenExchangeError::LookupFailed(e.to_string()))?
            .ok_or_else(|| TokenExchangeError::InvalidGrant("user no longer exists".to_string()))?;
        if !user.is_active() {
            return Err(TokenExchangeError::InvalidGrant("user is suspended".to_string()));
        }

        let lists = self.access_lists(&user, now).await.map_err(|e| {
            tracing::warn!(user_id = %user.id, error = %e, "target lookup failed during exchange");
            TokenExchangeError::LookupFailed(e.to_string())
        })?;

        let id_token = self.signer.sign(&self.id_token_claims(&user, &lists, claims.nonce, now))?;
        let access_token = self.signer.sign(&AccessTokenClaims {
            iss: self.settings.issuer.clone(),
            sub: user.id.to_string(),
            aud: self.settings.client_id.clone(),
            exp: (now + self.settings.token_ttl).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::now_v7().to_string(),
            scope: "openid profile email".to_string(),
            token_use: ACCESS_USE.to_string(),
        })?;

        tracing::info!(
            user_id = %user.id,
            access_scope = ?lists.scope,
            documents = lists.documents.len(),
            folders = lists.folders.len(),
            "tokens issued"
        );

        Ok(TokenResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.settings.token_ttl.num_seconds(),
            id_token,
        })
    }

    /// Identity plus access lists recomputed now, for a valid access token.
    #[tracing::instrument(skip(self, access_token))]
    pub async fn userinfo(&self, access_token: &str, now: DateTime<Utc>) -> Result<UserInfo, UserInfoError> {
        let claims: AccessTokenClaims = self
            .signer
            .verify(access_token)
            .map_err(|e| UserInfoError::InvalidToken(e.to_string()))?;
        if claims.token_use != ACCESS_USE {
            return Err(UserInfoError::InvalidToken(
                VerifyError::WrongUse { expected: ACCESS_USE }.to_string(),
            ));
        }
        if claims.aud != self.settings.client_id {
            return Err(UserInfoError::InvalidToken(VerifyError::Audience.to_string()));
        }
        if now.timestamp() >= claims.exp {
            return Err(UserInfoError::InvalidToken(VerifyError::Expired.to_string()));
        }

        let user_id = claims
            .sub
            .parse::<UserId>()
            .map_err(|_| UserInfoError::InvalidToken("token subject is not a user".to_string()))?;
        let user = self
            .users
            .find_user(user_id)
            .await
            .map_err(|e| UserInfoError::LookupFailed(e.to_string()))?
            .filter(UserRecord::is_active)
            .ok_or_else(|| UserInfoError::InvalidToken("user is unknown or suspended".to_string()))?;

        let lists = self
            .access_lists(&user, now)
            .await
            .map_err(|e| UserInfoError::LookupFailed(e.to_string()))?;
        let mapping = &self.settings.group_mapping;

        Ok(UserInfo {
            sub: user.id.to_string(),
            preferred_username: user.email.clone(),
            email: user.email,
            name: user.name,
            groups: mapping.groups_for(user.role),
            access_scope: lists.scope,
            document_access_list: lists.documents,
            folder_access_list: lists.folders,
        })
    }

    /// Admins get a global scope without consulting the rule store.
    async fn access_lists(&self, user: &UserRecord, now: DateTime<Utc>) -> Result<AccessLists, RuleStoreError> {
        if user.role.is_admin() {
            return Ok(AccessLists::global());
        }
        let accessible = self.evaluator.accessible_targets(user.id, now).await?;
        Ok(AccessLists::restricted(&accessible))
    }

    fn id_token_claims(
        &self,
        user: &UserRecord,
        lists: &AccessLists,
        nonce: Option<String>,
        now: DateTime<Utc>,
    ) -> IdTokenClaims {
        let mapping = &self.settings.group_mapping;
        IdTokenClaims {
            iss: self.settings.issuer.clone(),
            sub: user.id.to_string(),
            aud: self.settings.client_id.clone(),
            exp: (now + self.settings.token_ttl).timestamp(),
            iat: now.timestamp(),
            nonce,
            email: user.email.clone(),
            name: user.name.clone(),
            preferred_username: user.email.clone(),
            groups: mapping.groups_for(user.role),
            group_mapping_version: mapping.version,
            access_scope: lists.scope,
            document_access_list: lists.documents.clone(),
            folder_access_list: lists.folders.clone(),
        }
    }
}

fn invalid_grant(err: VerifyError) -> TokenExchangeError {
    TokenExchangeError::InvalidGrant(format!("invalid code: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::{Duration, TimeZone};
    use docgate_access::{NewAccessRule, TargetType};
    use docgate_auth::{NewUser, Role, UserStatus};
    use docgate_infra::rule_store::InMemoryRuleStore;
    use docgate_infra::users::InMemoryUserDirectory;

    use crate::AccessScope;

    type Issuer = TokenIssuer<Arc<InMemoryRuleStore>, Arc<InMemoryUserDirectory>>;

    struct Fixture {
        issuer: Issuer,
        users: Arc<InMemoryUserDirectory>,
        rules: Arc<InMemoryRuleStore>,
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap()
    }

    fn fixture() -> Fixture {
        let users = Arc::new(InMemoryUserDirectory::new());
        let rules = Arc::new(InMemoryRuleStore::new(users.clone()));
        let mut settings = SsoSettings::new("http://idp.local", "edms");
        settings.redirect_uris = vec!["http://edms.local/oidc/callback".to_string()];

        let issuer = TokenIssuer::new(
            settings,
            TokenSigner::hs256("sso-secret"),
            AccessEvaluator::new(rules.clone()),
            users.clone(),
        );
        Fixture { issuer, users, rules }
    }

    fn user(fx: &Fixture, email: &str, role: Role) -> UserRecord {
        fx.users
            .insert(
                NewUser {
                    email: email.to_string(),
                    name: email.split('@').next().unwrap().to_string(),
                    role,
                },
                now(),
            )
            .unwrap()
    }

    async fn grant(fx: &Fixture, user: &UserRecord, target_type: TargetType, target_id: &str) {
        fx.rules
            .insert_rule(
                NewAccessRule {
                    user_id: user.id,
                    target_type,
                    target_id: target_id.to_string(),
                    target_name: None,
                    start_date: now() - Duration::days(1),
                    end_date: now() + Duration::days(1),
                    is_active: None,
                },
                now() - Duration::days(2),
            )
            .await
            .unwrap();
    }

    fn caller(user: &UserRecord) -> Caller {
        Caller::new(user.id, user.email.clone(), user.role)
    }

    fn authorize_request() -> AuthorizeRequest {
        AuthorizeRequest {
            client_id: Some("edms".to_string()),
            redirect_uri: Some("http://edms.local/oidc/callback".to_string()),
            state: Some("xyz".to_string()),
            nonce: Some("n-1".to_string()),
            response_type: Some("code".to_string()),
            scope: None,
        }
    }

    fn code_from(location: &str) -> String {
        Url::parse(location)
            .unwrap()
            .query_pairs()
            .find(|(k, _)| k == "code")
            .map(|(_, v)| v.into_owned())
            .unwrap()
    }

    fn token_request(code: String) -> TokenRequest {
        TokenRequest {
            grant_type: Some("authorization_code".to_string()),
            code: Some(code),
            redirect_uri: None,
            client_id: None,
        }
    }

    async fn id_token_for(fx: &Fixture, user: &UserRecord) -> IdTokenClaims {
        let location = fx.issuer.authorize(&caller(user), &authorize_request(), now()).unwrap();
        let tokens = fx.issuer.exchange(&token_request(code_from(&location)), now()).await.unwrap();
        fx.issuer.signer().verify(&tokens.id_token).unwrap()
    }

    #[tokio::test]
    async fn authorize_redirects_with_code_and_state() {
        let fx = fixture();
        let alice = user(&fx, "alice@example.com", Role::Reader);

        let location = fx.issuer.authorize(&caller(&alice), &authorize_request(), now()).unwrap();
        assert!(location.starts_with("http://edms.local/oidc/callback?code="));
        assert!(location.ends_with("&state=xyz"));

        let code: CodeClaims = fx.issuer.signer().verify(&code_from(&location)).unwrap();
        assert_eq!(code.sub, alice.id.to_string());
        assert_eq!(code.nonce.as_deref(), Some("n-1"));
    }

    #[tokio::test]
    async fn authorize_rejects_bad_client_redirect_and_response_type() {
        let fx = fixture();
        let alice = user(&fx, "alice@example.com", Role::Reader);

        let mut req = authorize_request();
        req.client_id = Some("intruder".to_string());
        let err = fx.issuer.authorize(&caller(&alice), &req, now()).unwrap_err();
        assert_eq!(err.oauth_error_code(), "invalid_client");

        let mut req = authorize_request();
        req.redirect_uri = Some("http://evil.local/cb".to_string());
        let err = fx.issuer.authorize(&caller(&alice), &req, now()).unwrap_err();
        assert_eq!(err.oauth_error_code(), "invalid_request");

        let mut req = authorize_request();
        req.response_type = Some("token".to_string());
        let err = fx.issuer.authorize(&caller(&alice), &req, now()).unwrap_err();
        assert_eq!(err.oauth_error_code(), "unsupported_response_type");
    }

    #[tokio::test]
    async fn admin_token_is_global_with_empty_lists() {
        let fx = fixture();
        let admin = user(&fx, "root@example.com", Role::Admin);
        grant(&fx, &admin, TargetType::Document, "D-ignored").await;

        let claims = id_token_for(&fx, &admin).await;
        assert_eq!(claims.access_scope, AccessScope::Global);
        assert!(claims.document_access_list.is_empty());
        assert!(claims.folder_access_list.is_empty());
        assert_eq!(claims.groups, ["Administrators"]);
    }

    #[tokio::test]
    async fn restricted_token_lists_exactly_documents_and_folders() {
        let fx = fixture();
        let bob = user(&fx, "bob@example.com", Role::Contributor);
        grant(&fx, &bob, TargetType::Document, "D1").await;
        grant(&fx, &bob, TargetType::Document, "D2").await;
        grant(&fx, &bob, TargetType::Folder, "F1").await;
        grant(&fx, &bob, TargetType::Tag, "T1").await;

        let claims = id_token_for(&fx, &bob).await;
        assert_eq!(claims.access_scope, AccessScope::Restricted);
        assert_eq!(claims.document_access_list, ["D1", "D2"]);
        assert_eq!(claims.folder_access_list, ["F1"]);
        assert_eq!(claims.aud, "edms");
        assert_eq!(claims.iss, "http://idp.local");
        assert_eq!(claims.nonce.as_deref(), Some("n-1"));
        assert_eq!(claims.exp - claims.iat, 3600);
        assert_eq!(claims.groups, ["SSO_Restricted_Access"]);
        assert_eq!(claims.group_mapping_version, 1);
    }

    #[tokio::test]
    async fn rule_change_between_authorize_and_exchange_is_honored() {
        let fx = fixture();
        let bob = user(&fx, "bob@example.com", Role::Reader);
        let location = fx.issuer.authorize(&caller(&bob), &authorize_request(), now()).unwrap();

        grant(&fx, &bob, TargetType::Document, "LATE").await;

        let tokens = fx.issuer.exchange(&token_request(code_from(&location)), now()).await.unwrap();
        let claims: IdTokenClaims = fx.issuer.signer().verify(&tokens.id_token).unwrap();
        assert_eq!(claims.document_access_list, ["LATE"]);
    }

    #[tokio::test]
    async fn exchange_rejects_expired_tampered_and_mismatched_codes() {
        let fx = fixture();
        let bob = user(&fx, "bob@example.com", Role::Reader);
        let location = fx.issuer.authorize(&caller(&bob), &authorize_request(), now()).unwrap();
        let code = code_from(&location);

        let later = now() + Duration::minutes(6);
        let err = fx.issuer.exchange(&token_request(code.clone()), later).await.unwrap_err();
        assert_eq!(err.oauth_error_code(), "invalid_grant");

        let err = fx.issuer.exchange(&token_request(format!("{code}x")), now()).await.unwrap_err();
        assert_eq!(err.oauth_error_code(), "invalid_grant");

        let mut req = token_request(code.clone());
        req.redirect_uri = Some("http://edms.local/elsewhere".to_string());
        let err = fx.issuer.exchange(&req, now()).await.unwrap_err();
        assert_eq!(err.oauth_error_code(), "invalid_grant");

        let mut req = token_request(code);
        req.grant_type = Some("password".to_string());
        let err = fx.issuer.exchange(&req, now()).await.unwrap_err();
        assert_eq!(err.oauth_error_code(), "unsupported_grant_type");
    }

    #[tokio::test]
    async fn suspended_or_missing_user_gets_no_token() {
        let fx = fixture();
        let bob = user(&fx, "bob@example.com", Role::Reader);
        let location = fx.issuer.authorize(&caller(&bob), &authorize_request(), now()).unwrap();

        fx.users.set_status(bob.id, UserStatus::Suspended).unwrap();
        let err = fx.issuer.exchange(&token_request(code_from(&location)), now()).await.unwrap_err();
        assert_eq!(err.oauth_error_code(), "invalid_grant");

        let ghost = Caller::new(UserId::new(999), "ghost@example.com", Role::Reader);
        let location = fx.issuer.authorize(&ghost, &authorize_request(), now()).unwrap();
        let err = fx.issuer.exchange(&token_request(code_from(&location)), now()).await.unwrap_err();
        assert_eq!(err.oauth_error_code(), "invalid_grant");
    }

    #[tokio::test]
    async fn userinfo_recomputes_lists_from_access_token() {
        let fx = fixture();
        let bob = user(&fx, "bob@example.com", Role::Reader);
        grant(&fx, &bob, TargetType::Folder, "F9").await;

        let location = fx.issuer.authorize(&caller(&bob), &authorize_request(), now()).unwrap();
        let tokens = fx.issuer.exchange(&token_request(code_from(&location)), now()).await.unwrap();

        let info = fx.issuer.userinfo(&tokens.access_token, now()).await.unwrap();
        assert_eq!(info.email, "bob@example.com");
        assert_eq!(info.folder_access_list, ["F9"]);

        let err = fx.issuer.userinfo(&tokens.id_token, now()).await.unwrap_err();
        assert_eq!(err.oauth_error_code(), "invalid_token");

        let err = fx
            .issuer
            .userinfo(&tokens.access_token, now() + Duration::hours(2))
            .await
            .unwrap_err();
        assert_eq!(err.oauth_error_code(), "invalid_token");
    }
}
