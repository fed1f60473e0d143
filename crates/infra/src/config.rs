//! Configuration loading from environment variables.
//!
//! `from_lookup` takes the variable source as a function so tests never touch
//! the process environment.

use std::net::SocketAddr;

use chrono::Duration;
use thiserror::Error;
use url::Url;

pub const DEV_JWT_SECRET: &str = "dev-secret";

/// Upper bound for every `*_TTL_SECS` value: ten years.
pub const MAX_TTL_SECS: i64 = 10 * 365 * 24 * 60 * 60;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

fn invalid(key: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        key,
        reason: reason.into(),
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct DocumentBackendConfig {
    pub base_url: Url,
    pub token: Option<String>,
}

#[derive(Clone, PartialEq, Eq)]
pub struct OidcConfig {
    pub issuer: String,
    pub client_id: String,
    pub redirect_uris: Vec<String>,
    pub signing_secret: String,
    pub token_ttl: Duration,
    pub code_ttl: Duration,
}

#[derive(Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    /// `None` selects the in-memory stores.
    pub database_url: Option<String>,
    /// `None` selects the in-memory document backend.
    pub document_backend: Option<DocumentBackendConfig>,
    pub oidc: OidcConfig,
    pub access_snapshot_ttl: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_addr = match get("BIND_ADDR") {
            Some(raw) => raw.parse().map_err(|e| invalid("BIND_ADDR", format!("{e}")))?,
            None => SocketAddr::from(([0, 0, 0, 0], 8080)),
        };

        let jwt_secret = get("JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("JWT_SECRET not set; using development secret");
            DEV_JWT_SECRET.to_string()
        });

        let database_url = get("DATABASE_URL");
        if database_url.is_none() {
            tracing::warn!("DATABASE_URL not set; using in-memory stores");
        }

        let document_backend = match get("DOCUMENT_BACKEND_URL") {
            Some(raw) => Some(DocumentBackendConfig {
                base_url: Url::parse(&raw).map_err(|e| invalid("DOCUMENT_BACKEND_URL", e.to_string()))?,
                token: get("DOCUMENT_BACKEND_TOKEN"),
            }),
            None => None,
        };

        let signing_secret = get("OIDC_SIGNING_SECRET").unwrap_or_else(|| {
            tracing::warn!("OIDC_SIGNING_SECRET not set; signing SSO tokens with JWT_SECRET");
            jwt_secret.clone()
        });

        let oidc = OidcConfig {
            issuer: get("OIDC_ISSUER")
                .unwrap_or_else(|| "http://localhost:8080".to_string())
                .trim_end_matches('/')
                .to_string(),
            client_id: get("OIDC_CLIENT_ID").unwrap_or_else(|| "edms".to_string()),
            redirect_uris: get("OIDC_REDIRECT_URIS")
                .map(|raw| {
                    raw.split(',')
                        .map(str::trim)
                        .filter(|u| !u.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            signing_secret,
            token_ttl: ttl(get("OIDC_TOKEN_TTL_SECS"), "OIDC_TOKEN_TTL_SECS", 3600)?,
            code_ttl: ttl(get("OIDC_CODE_TTL_SECS"), "OIDC_CODE_TTL_SECS", 300)?,
        };

        Ok(Self {
            bind_addr,
            jwt_secret,
            database_url,
            document_backend,
            oidc,
            access_snapshot_ttl: ttl(get("ACCESS_SNAPSHOT_TTL_SECS"), "ACCESS_SNAPSHOT_TTL_SECS", 60)?,
        })
    }
}

fn ttl(raw: Option<String>, key: &'static str, default_secs: i64) -> Result<Duration, ConfigError> {
    let Some(raw) = raw else {
        return Ok(Duration::seconds(default_secs));
    };
    let secs: i64 = raw.parse().map_err(|_| invalid(key, format!("'{raw}' is not a number of seconds")))?;
    if secs <= 0 {
        return Err(invalid(key, "must be greater than zero"));
    }
    if secs > MAX_TTL_SECS {
        return Err(invalid(key, format!("out of range (at most {MAX_TTL_SECS} seconds)")));
    }
    Ok(Duration::seconds(secs))
}

impl core::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("jwt_secret", &"<redacted>")
            .field("database_url", &self.database_url.as_ref().map(|_| "<redacted>"))
            .field("document_backend", &self.document_backend.as_ref().map(|b| b.base_url.as_str()))
            .field("oidc_issuer", &self.oidc.issuer)
            .field("oidc_client_id", &self.oidc.client_id)
            .field("access_snapshot_ttl", &self.access_snapshot_ttl)
            .finish()
    }
}
