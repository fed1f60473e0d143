//! Clients for the external document-management backend.
//!
//! The backend is opaque: documents and folders are returned as raw JSON and
//! only the container memberships needed for access checks are interpreted.

mod http;
mod in_memory;

use std::sync::Arc;

use thiserror::Error;

use docgate_access::DocumentMetadata;

pub use http::HttpDocumentBackend;
pub use in_memory::InMemoryDocumentBackend;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("not found in document backend")]
    NotFound,

    #[error("document backend request failed: {0}")]
    Transport(String),

    #[error("document backend returned status {0}")]
    Status(u16),

    #[error("malformed document backend response: {0}")]
    Decode(String),
}

#[async_trait::async_trait]
pub trait DocumentBackend: Send + Sync {
    async fn document(&self, id: &str) -> Result<serde_json::Value, BackendError>;

    async fn folder(&self, id: &str) -> Result<serde_json::Value, BackendError>;

    /// Folder (first cabinet), tags and category (document type) of a document.
    async fn document_metadata(&self, id: &str) -> Result<DocumentMetadata, BackendError>;
}

#[async_trait::async_trait]
impl<B> DocumentBackend for Arc<B>
where
    B: DocumentBackend + ?Sized,
{
    async fn document(&self, id: &str) -> Result<serde_json::Value, BackendError> {
        (**self).document(id).await
    }

    async fn folder(&self, id: &str) -> Result<serde_json::Value, BackendError> {
        (**self).folder(id).await
    }

    async fn document_metadata(&self, id: &str) -> Result<DocumentMetadata, BackendError> {
        (**self).document_metadata(id).await
    }
}

/// Backend ids come back as numbers or strings; rules store them as strings.
pub(crate) fn id_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
