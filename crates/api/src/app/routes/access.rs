//! Non-blocking checks for the current caller.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;

use docgate_access::{AccessCheckResult, AccessRule, AccessSnapshot, AccessibleTargetSet, TargetType};

use crate::app::dto::{AccessCheckRequest, MyAccessResponse, invalid_target_type};
use crate::app::errors::{json_error, json_rejection};
use crate::app::services::AppServices;
use crate::context::CallerContext;

pub fn router() -> Router {
    Router::new().route("/check", post(check)).route("/me", get(me))
}

async fn check(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    body: Result<Json<AccessCheckRequest>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return json_rejection(rejection),
    };

    let target_id = body.target_id.as_deref().map(str::trim).filter(|id| !id.is_empty());
    let (Some(target_type), Some(target_id)) = (body.target_type.as_deref(), target_id) else {
        return json_error(StatusCode::BAD_REQUEST, "bad_request", "target_type and target_id are required");
    };
    let Ok(target_type) = target_type.parse::<TargetType>() else {
        return json_error(StatusCode::BAD_REQUEST, "invalid_target_type", invalid_target_type());
    };

    if caller.caller().is_admin() {
        return Json(AccessCheckResult {
            has_access: true,
            reason: None,
            matched_rule: None,
            denial: None,
        })
        .into_response();
    }

    let now = Utc::now();
    let result = match (target_type, body.document_metadata.as_ref()) {
        (TargetType::Document, Some(metadata)) => {
            services
                .evaluator
                .check_document_access(caller.user_id(), target_id, Some(metadata), now)
                .await
        }
        _ => {
            services
                .evaluator
                .check_user_access(caller.user_id(), target_type, target_id, now)
                .await
        }
    };

    Json(result).into_response()
}

async fn me(Extension(services): Extension<Arc<AppServices>>, Extension(caller): Extension<CallerContext>) -> Response {
    let now = Utc::now();
    let rules = match services.evaluator.active_rules(caller.user_id(), now).await {
        Ok(rules) => rules,
        Err(e) => {
            tracing::warn!(user_id = %caller.user_id(), error = %e, "access snapshot lookup failed");
            return json_error(StatusCode::SERVICE_UNAVAILABLE, "lookup_failed", "access lookup failed");
        }
    };

    let accessible: AccessibleTargetSet = rules.iter().collect();
    Json(MyAccessResponse {
        rules: rules.iter().map(AccessRule::summary).collect(),
        snapshot: AccessSnapshot::new(caller.user_id(), accessible, now, services.snapshot_ttl),
    })
    .into_response()
}
