//! API-side role checks for administrative endpoints.
//!
//! Time-boxed resource access is the access layer's job; this only consults
//! the role → permission matrix.

use axum::http::StatusCode;
use axum::response::Response;

use docgate_auth::{Permission, authorize};

use crate::app::errors::json_error;
use crate::context::CallerContext;

pub fn require_permission(caller: &CallerContext, permission: &Permission) -> Result<(), Response> {
    authorize(caller.caller(), permission).map_err(|e| {
        tracing::info!(user_id = %caller.user_id(), permission = permission.as_str(), "permission denied");
        json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string())
    })
}
