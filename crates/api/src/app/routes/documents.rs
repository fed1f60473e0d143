//! Guarded reads proxied from the document backend.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    routing::get,
};

use docgate_access::TargetType;
use docgate_infra::documents::DocumentBackend;

use crate::access_layer::{GuardState, PathTarget, access_control};
use crate::app::errors::backend_error_to_response;
use crate::app::services::AppServices;

pub fn router(services: Arc<AppServices>) -> Router {
    let document_guard = GuardState::new(
        services.clone(),
        TargetType::Document,
        PathTarget::new("id").with_document_metadata(services.documents.clone()),
    );
    let folder_guard = GuardState::new(services, TargetType::Folder, PathTarget::new("id"));

    let documents = Router::new()
        .route("/documents/:id", get(get_document))
        .route_layer(from_fn_with_state(document_guard, access_control));
    let folders = Router::new()
        .route("/folders/:id", get(get_folder))
        .route_layer(from_fn_with_state(folder_guard, access_control));

    documents.merge(folders)
}

async fn get_document(Extension(services): Extension<Arc<AppServices>>, Path(id): Path<String>) -> Response {
    match services.documents.document(&id).await {
        Ok(body) => Json(body).into_response(),
        Err(e) => backend_error_to_response(e),
    }
}

async fn get_folder(Extension(services): Extension<Arc<AppServices>>, Path(id): Path<String>) -> Response {
    match services.documents.folder(&id).await {
        Ok(body) => Json(body).into_response(),
        Err(e) => backend_error_to_response(e),
    }
}
