//! `/admin/access-rules`: rule CRUD for callers holding `permissions.manage`.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        Extension, Path, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::Utc;
use serde_json::json;

use docgate_access::{RuleFilter, RulePatch, RuleStatus, RuleStore, TargetType};
use docgate_auth::catalog;
use docgate_core::{RuleId, UserId};

use crate::app::dto::{
    CreateRuleRequest, DeleteRuleResponse, DeletedRule, RuleListQuery, RuleView, ToggleRuleRequest,
    ToggleRuleResponse, invalid_target_type,
};
use crate::app::errors::{json_error, json_rejection, query_rejection, rule_store_error_to_response};
use crate::app::services::AppServices;
use crate::authz::require_permission;
use crate::context::CallerContext;

pub fn router() -> Router {
    Router::new()
        .route("/access-rules", get(list_rules).post(create_rule))
        .route(
            "/access-rules/:id",
            get(get_rule).put(update_rule).patch(toggle_rule).delete(delete_rule),
        )
}

fn parse_rule_id(raw: &str) -> Result<RuleId, Response> {
    raw.parse::<RuleId>()
        .map_err(|e| json_error(StatusCode::BAD_REQUEST, "invalid_id", e.to_string()))
}

async fn list_rules(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    query: Result<Query<RuleListQuery>, QueryRejection>,
) -> Response {
    if let Err(resp) = require_permission(&caller, &catalog::PERMISSIONS_MANAGE) {
        return resp;
    }
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return query_rejection(rejection),
    };

    let mut filter = RuleFilter::default();
    if let Some(raw) = query.user_id.as_deref().filter(|s| !s.is_empty()) {
        match raw.parse::<UserId>() {
            Ok(user_id) => filter.user_id = Some(user_id),
            Err(e) => return json_error(StatusCode::BAD_REQUEST, "invalid_id", e.to_string()),
        }
    }
    if let Some(raw) = query.target_type.as_deref().filter(|s| !s.is_empty()) {
        match raw.parse::<TargetType>() {
            Ok(target_type) => filter = filter.target_type(target_type),
            Err(_) => return json_error(StatusCode::BAD_REQUEST, "invalid_target_type", invalid_target_type()),
        }
    }
    let status = match query.status.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => match raw.parse::<RuleStatus>() {
            Ok(status) => Some(status),
            Err(e) => return json_error(StatusCode::BAD_REQUEST, "invalid_status", e.to_string()),
        },
        None => None,
    };

    let records = match services.rules.find_rules(&filter).await {
        Ok(records) => records,
        Err(e) => return rule_store_error_to_response(e),
    };

    let now = Utc::now();
    let items: Vec<RuleView> = records
        .into_iter()
        .map(|record| RuleView::at(record, now))
        .filter(|view| status.is_none_or(|s| view.status == s))
        .collect();

    Json(json!({ "items": items })).into_response()
}

async fn create_rule(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    body: Result<Json<CreateRuleRequest>, JsonRejection>,
) -> Response {
    if let Err(resp) = require_permission(&caller, &catalog::PERMISSIONS_MANAGE) {
        return resp;
    }
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return json_rejection(rejection),
    };
    let new_rule = match body.into_new_rule() {
        Ok(rule) => rule,
        Err(msg) => return json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
    };

    let now = Utc::now();
    match services.rules.insert_rule(new_rule, now).await {
        Ok(record) => {
            tracing::info!(
                rule_id = %record.rule.id,
                user_id = %record.rule.user_id,
                granted_by = %caller.user_id(),
                target_type = record.rule.target_type.as_str(),
                target_id = %record.rule.target_id,
                "access rule created"
            );
            (StatusCode::CREATED, Json(RuleView::at(record, now))).into_response()
        }
        Err(e) => rule_store_error_to_response(e),
    }
}

async fn get_rule(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(resp) = require_permission(&caller, &catalog::PERMISSIONS_MANAGE) {
        return resp;
    }
    let id = match parse_rule_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.rules.get_rule(id).await {
        Ok(record) => Json(RuleView::at(record, Utc::now())).into_response(),
        Err(e) => rule_store_error_to_response(e),
    }
}

async fn update_rule(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
    body: Result<Json<RulePatch>, JsonRejection>,
) -> Response {
    if let Err(resp) = require_permission(&caller, &catalog::PERMISSIONS_MANAGE) {
        return resp;
    }
    let id = match parse_rule_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let Json(patch) = match body {
        Ok(body) => body,
        Err(rejection) => return json_rejection(rejection),
    };
    if patch.is_empty() {
        return json_error(StatusCode::BAD_REQUEST, "validation_error", "no changes supplied");
    }

    let now = Utc::now();
    match services.rules.update_rule(id, patch, now).await {
        Ok(record) => {
            tracing::info!(rule_id = %id, updated_by = %caller.user_id(), "access rule updated");
            Json(RuleView::at(record, now)).into_response()
        }
        Err(e) => rule_store_error_to_response(e),
    }
}

async fn toggle_rule(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
    body: Result<Json<ToggleRuleRequest>, JsonRejection>,
) -> Response {
    if let Err(resp) = require_permission(&caller, &catalog::PERMISSIONS_MANAGE) {
        return resp;
    }
    let id = match parse_rule_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let is_active = match body {
        Ok(Json(ToggleRuleRequest { is_active: Some(is_active) })) => is_active,
        Ok(_) => return json_error(StatusCode::BAD_REQUEST, "validation_error", "is_active is required"),
        Err(rejection) => return json_rejection(rejection),
    };

    match services.rules.set_active(id, is_active, Utc::now()).await {
        Ok(record) => {
            tracing::info!(rule_id = %id, is_active, updated_by = %caller.user_id(), "access rule toggled");
            let verb = if record.rule.is_active { "enabled" } else { "disabled" };
            Json(ToggleRuleResponse {
                message: format!("access rule {verb}"),
                id: record.rule.id,
                is_active: record.rule.is_active,
            })
            .into_response()
        }
        Err(e) => rule_store_error_to_response(e),
    }
}

async fn delete_rule(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(resp) = require_permission(&caller, &catalog::PERMISSIONS_MANAGE) {
        return resp;
    }
    let id = match parse_rule_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.rules.delete_rule(id).await {
        Ok(record) => {
            tracing::info!(rule_id = %id, deleted_by = %caller.user_id(), "access rule deleted");
            Json(DeleteRuleResponse {
                message: "access rule deleted".to_string(),
                deleted_rule: DeletedRule {
                    id: record.rule.id,
                    target_name: record.rule.target_name,
                    user_name: record.user_name,
                },
            })
            .into_response()
        }
        Err(e) => rule_store_error_to_response(e),
    }
}
