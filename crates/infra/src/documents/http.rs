use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use docgate_access::DocumentMetadata;

use super::{BackendError, DocumentBackend, id_string};

/// Listings are paginated; `next` is the absolute URL of the following page.
#[derive(Debug, Deserialize)]
struct Page {
    #[serde(default)]
    results: Vec<Value>,
    #[serde(default)]
    next: Option<String>,
}

const MAX_PAGES: usize = 100;

/// REST client for the backend's `api/v4` surface, authenticated with
/// `Authorization: Token <token>`.
#[derive(Debug, Clone)]
pub struct HttpDocumentBackend {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpDocumentBackend {
    pub fn new(base_url: Url, token: Option<String>) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    /// `{base}/api/v4/<segments>/` with each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, BackendError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| BackendError::Transport(format!("base url '{}' cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .extend(["api", "v4"])
            .extend(segments)
            .push("");
        Ok(url)
    }

    async fn get_json(&self, segments: &[&str]) -> Result<Value, BackendError> {
        self.fetch(self.endpoint(segments)?).await
    }

    async fn fetch(&self, url: Url) -> Result<Value, BackendError> {
        let mut request = self.client.get(url.clone()).header("Accept", "application/json");
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Token {token}"));
        }

        let response = request.send().await.map_err(|e| BackendError::Transport(e.to_string()))?;
        match response.status() {
            StatusCode::NOT_FOUND => Err(BackendError::NotFound),
            status if !status.is_success() => {
                tracing::warn!(%url, status = status.as_u16(), "document backend error");
                Err(BackendError::Status(status.as_u16()))
            }
            _ => response.json::<Value>().await.map_err(|e| BackendError::Decode(e.to_string())),
        }
    }

    /// Ids across every page of a listing.
    async fn result_ids(&self, segments: &[&str]) -> Result<Vec<String>, BackendError> {
        let mut url = self.endpoint(segments)?;
        let mut ids = Vec::new();

        for _ in 0..MAX_PAGES {
            let page: Page =
                serde_json::from_value(self.fetch(url.clone()).await?).map_err(|e| BackendError::Decode(e.to_string()))?;
            ids.extend(page.results.iter().filter_map(|item| item.get("id").and_then(id_string)));

            match page.next.as_deref().filter(|next| !next.is_empty()) {
                Some(next) => url = self.follow(next)?,
                None => return Ok(ids),
            }
        }

        tracing::warn!(%url, pages = MAX_PAGES, "document backend listing truncated");
        Ok(ids)
    }

    /// The bearer token is only ever sent to the configured backend origin.
    fn follow(&self, next: &str) -> Result<Url, BackendError> {
        let url = self
            .base_url
            .join(next)
            .map_err(|e| BackendError::Decode(format!("invalid next link '{next}': {e}")))?;
        if url.origin() != self.base_url.origin() {
            return Err(BackendError::Decode(format!("next link '{url}' leaves the backend origin")));
        }
        Ok(url)
    }
}

#[async_trait::async_trait]
impl DocumentBackend for HttpDocumentBackend {
    async fn document(&self, id: &str) -> Result<Value, BackendError> {
        self.get_json(&["documents", id]).await
    }

    async fn folder(&self, id: &str) -> Result<Value, BackendError> {
        self.get_json(&["cabinets", id]).await
    }

    async fn document_metadata(&self, id: &str) -> Result<DocumentMetadata, BackendError> {
        let document = self.document(id).await?;
        let cabinets = self.result_ids(&["documents", id, "cabinets"]).await?;
        let tag_ids = self.result_ids(&["documents", id, "tags"]).await?;

        Ok(DocumentMetadata {
            folder_id: cabinets.into_iter().next(),
            tag_ids,
            category_id: document
                .get("document_type")
                .and_then(|t| t.get("id"))
                .and_then(id_string),
        })
    }
}
