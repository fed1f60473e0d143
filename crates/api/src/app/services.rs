use std::sync::Arc;

use anyhow::Context;
use chrono::Duration;

use docgate_access::{AccessEvaluator, RuleStore};
use docgate_auth::{Hs256JwtValidator, JwtValidator, UserDirectory};
use docgate_infra::{
    config::{AppConfig, OidcConfig},
    db,
    documents::{DocumentBackend, HttpDocumentBackend, InMemoryDocumentBackend},
    rule_store::{InMemoryRuleStore, PostgresRuleStore},
    users::{InMemoryUserDirectory, PostgresUserDirectory},
};
use docgate_sso::{DiscoveryDocument, SsoSettings, TokenIssuer, TokenSigner};

pub type SharedRuleStore = Arc<dyn RuleStore>;
pub type SharedUserDirectory = Arc<dyn UserDirectory>;
pub type SharedDocumentBackend = Arc<dyn DocumentBackend>;

/// Everything a handler needs, shared behind one `Arc`.
///
/// Nothing in here caches access decisions; every request re-reads the store.
pub struct AppServices {
    pub rules: SharedRuleStore,
    pub documents: SharedDocumentBackend,
    pub evaluator: AccessEvaluator<SharedRuleStore>,
    pub issuer: TokenIssuer<SharedRuleStore, SharedUserDirectory>,
    pub discovery: DiscoveryDocument,
    pub jwt: Arc<dyn JwtValidator>,
    pub snapshot_ttl: Duration,
}

impl AppServices {
    pub fn new(
        config: &AppConfig,
        rules: SharedRuleStore,
        users: SharedUserDirectory,
        documents: SharedDocumentBackend,
    ) -> Self {
        let settings = sso_settings(&config.oidc);
        let signer = TokenSigner::hs256(config.oidc.signing_secret.as_bytes());
        let discovery = DiscoveryDocument::for_settings(&settings, signer.algorithm());
        let evaluator = AccessEvaluator::new(rules.clone());

        Self {
            issuer: TokenIssuer::new(settings, signer, evaluator.clone(), users),
            evaluator,
            rules,
            documents,
            discovery,
            jwt: Arc::new(Hs256JwtValidator::new(config.jwt_secret.as_bytes())),
            snapshot_ttl: config.access_snapshot_ttl,
        }
    }
}

pub fn sso_settings(oidc: &OidcConfig) -> SsoSettings {
    let mut settings = SsoSettings::new(oidc.issuer.clone(), oidc.client_id.clone());
    settings.redirect_uris = oidc.redirect_uris.clone();
    settings.token_ttl = oidc.token_ttl;
    settings.code_ttl = oidc.code_ttl;
    settings
}

/// Wire stores and the document backend from configuration.
///
/// With `DATABASE_URL` set, rules and users live in Postgres (schema is
/// migrated on startup); otherwise both are in-memory and empty.
pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    let (rules, users): (SharedRuleStore, SharedUserDirectory) = match config.database_url.as_deref() {
        Some(url) => {
            let pool = db::connect(url).await.context("connecting to postgres")?;
            db::migrate(&pool).await.context("applying database schema")?;
            (
                Arc::new(PostgresRuleStore::new(pool.clone())),
                Arc::new(PostgresUserDirectory::new(pool)),
            )
        }
        None => {
            let users = Arc::new(InMemoryUserDirectory::new());
            (Arc::new(InMemoryRuleStore::new(users.clone())), users)
        }
    };

    let documents: SharedDocumentBackend = match &config.document_backend {
        Some(backend) => Arc::new(
            HttpDocumentBackend::new(backend.base_url.clone(), backend.token.clone())
                .context("building document backend client")?,
        ),
        None => {
            tracing::warn!("DOCUMENT_BACKEND_URL not set; using in-memory document backend");
            Arc::new(InMemoryDocumentBackend::new())
        }
    };

    Ok(AppServices::new(config, rules, users, documents))
}
