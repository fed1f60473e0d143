use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};

use crate::context::CallerContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(Extension(caller): Extension<CallerContext>) -> impl IntoResponse {
    let caller = caller.caller();
    Json(serde_json::json!({
        "id": caller.user_id,
        "email": caller.email,
        "role": caller.role.as_str(),
    }))
}
