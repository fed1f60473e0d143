use std::collections::HashMap;
use std::sync::RwLock;

use serde_json::Value;

use docgate_access::DocumentMetadata;

use super::{BackendError, DocumentBackend};

#[derive(Debug, Clone)]
struct StoredDocument {
    body: Value,
    metadata: DocumentMetadata,
}

/// In-memory document backend for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryDocumentBackend {
    documents: RwLock<HashMap<String, StoredDocument>>,
    folders: RwLock<HashMap<String, Value>>,
}

fn poisoned() -> BackendError {
    BackendError::Transport("in-memory backend lock poisoned".to_string())
}

impl InMemoryDocumentBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_document(&self, id: impl Into<String>, body: Value, metadata: DocumentMetadata) {
        if let Ok(mut docs) = self.documents.write() {
            docs.insert(id.into(), StoredDocument { body, metadata });
        }
    }

    pub fn insert_folder(&self, id: impl Into<String>, body: Value) {
        if let Ok(mut folders) = self.folders.write() {
            folders.insert(id.into(), body);
        }
    }

    fn stored(&self, id: &str) -> Result<StoredDocument, BackendError> {
        let docs = self.documents.read().map_err(|_| poisoned())?;
        docs.get(id).cloned().ok_or(BackendError::NotFound)
    }
}

#[async_trait::async_trait]
impl DocumentBackend for InMemoryDocumentBackend {
    async fn document(&self, id: &str) -> Result<Value, BackendError> {
        Ok(self.stored(id)?.body)
    }

    async fn folder(&self, id: &str) -> Result<Value, BackendError> {
        let folders = self.folders.read().map_err(|_| poisoned())?;
        folders.get(id).cloned().ok_or(BackendError::NotFound)
    }

    async fn document_metadata(&self, id: &str) -> Result<DocumentMetadata, BackendError> {
        Ok(self.stored(id)?.metadata)
    }
}
