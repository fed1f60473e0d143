use std::sync::Arc;

use axum::{Router, routing::get};

use crate::app::services::AppServices;

pub mod access;
pub mod admin;
pub mod documents;
pub mod oidc;
pub mod system;

/// Router for all session-authenticated endpoints.
pub fn router(services: Arc<AppServices>) -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/access", access::router())
        .nest("/admin", admin::router())
        .merge(documents::router(services))
}
