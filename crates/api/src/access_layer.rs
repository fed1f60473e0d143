//! Axum adapter for the access-control guard.
//!
//! Routes wrapped here are decided by [`AccessGuard`] before the handler
//! runs. The target id comes from a named path segment; document routes also
//! ask the document backend for the document's containers.

use std::sync::Arc;

use axum::{
    extract::{RawPathParams, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde_json::json;

use docgate_access::{AccessGuard, DocumentMetadata, GuardDecision, MetadataError, TargetExtractor, TargetType};
use docgate_infra::documents::BackendError;

use crate::app::errors::json_error;
use crate::app::services::{AppServices, SharedDocumentBackend};
use crate::context::CallerContext;

/// Path parameters captured for one request.
#[derive(Debug, Clone, Default)]
pub struct PathParams(Vec<(String, String)>);

impl PathParams {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }
}

impl From<&RawPathParams> for PathParams {
    fn from(raw: &RawPathParams) -> Self {
        Self(raw.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect())
    }
}

/// Reads the target id from `param`; with a backend, also resolves document
/// containers. A document the backend does not know has no containers.
pub struct PathTarget {
    param: &'static str,
    documents: Option<SharedDocumentBackend>,
}

impl PathTarget {
    pub fn new(param: &'static str) -> Self {
        Self { param, documents: None }
    }

    pub fn with_document_metadata(mut self, documents: SharedDocumentBackend) -> Self {
        self.documents = Some(documents);
        self
    }
}

#[async_trait::async_trait]
impl TargetExtractor<PathParams> for PathTarget {
    fn target_id(&self, ctx: &PathParams) -> Option<String> {
        ctx.get(self.param).map(str::to_string)
    }

    async fn document_metadata(
        &self,
        _ctx: &PathParams,
        document_id: &str,
    ) -> Result<Option<DocumentMetadata>, MetadataError> {
        let Some(documents) = &self.documents else {
            return Ok(None);
        };
        match documents.document_metadata(document_id).await {
            Ok(metadata) => Ok(Some(metadata)),
            Err(BackendError::NotFound) => Ok(None),
            Err(e) => Err(MetadataError(e.to_string())),
        }
    }
}

#[derive(Clone)]
pub struct GuardState {
    services: Arc<AppServices>,
    guard: Arc<AccessGuard<PathTarget>>,
}

impl GuardState {
    pub fn new(services: Arc<AppServices>, target_type: TargetType, extractor: PathTarget) -> Self {
        Self {
            services,
            guard: Arc::new(AccessGuard::new(target_type, extractor)),
        }
    }
}

/// Must be installed with `route_layer` so path parameters are resolved.
pub async fn access_control(
    State(state): State<GuardState>,
    params: RawPathParams,
    req: Request,
    next: Next,
) -> Response {
    let params = PathParams::from(&params);
    let caller = req.extensions().get::<CallerContext>().map(|c| c.caller().clone());

    let decision = state
        .guard
        .decide(&state.services.evaluator, caller.as_ref(), &params, Utc::now())
        .await;

    match decision {
        GuardDecision::Allowed(_) => next.run(req).await,
        GuardDecision::Unauthenticated => {
            json_error(StatusCode::UNAUTHORIZED, "unauthenticated", "authentication required")
        }
        GuardDecision::BadRequest(msg) => json_error(StatusCode::BAD_REQUEST, "bad_request", msg),
        GuardDecision::Denied { reason, .. } => (
            StatusCode::FORBIDDEN,
            axum::Json(json!({
                "error": "access_denied",
                "message": "access refused",
                "reason": reason,
            })),
        )
            .into_response(),
    }
}
