use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::json;

use docgate_access::RuleStoreError;
use docgate_infra::documents::BackendError;
use docgate_sso::{AuthorizeError, TokenExchangeError, UserInfoError};

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn rule_store_error_to_response(err: RuleStoreError) -> Response {
    match err {
        RuleStoreError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "access rule not found"),
        RuleStoreError::UnknownUser(user_id) => {
            json_error(StatusCode::NOT_FOUND, "unknown_user", format!("user {user_id} not found"))
        }
        RuleStoreError::Invalid(e) => json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string()),
        RuleStoreError::Backend(msg) => {
            tracing::error!(error = %msg, "rule store failure");
            json_error(StatusCode::SERVICE_UNAVAILABLE, "storage_unavailable", "rule store unavailable")
        }
    }
}

pub fn backend_error_to_response(err: BackendError) -> Response {
    match err {
        BackendError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        other => {
            tracing::warn!(error = %other, "document backend failure");
            json_error(StatusCode::BAD_GATEWAY, "backend_error", "document backend unavailable")
        }
    }
}

pub fn json_rejection(rejection: JsonRejection) -> Response {
    json_error(StatusCode::BAD_REQUEST, "bad_request", rejection.body_text())
}

pub fn query_rejection(rejection: QueryRejection) -> Response {
    json_error(StatusCode::BAD_REQUEST, "bad_request", rejection.body_text())
}

pub fn authorize_error_to_response(err: AuthorizeError) -> Response {
    let status = match &err {
        AuthorizeError::InvalidClient => StatusCode::UNAUTHORIZED,
        AuthorizeError::Sign(_) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_REQUEST,
    };
    json_error(status, err.oauth_error_code(), err.to_string())
}

pub fn token_error_to_response(err: TokenExchangeError) -> Response {
    let status = match &err {
        TokenExchangeError::InvalidClient => StatusCode::UNAUTHORIZED,
        TokenExchangeError::LookupFailed(_) | TokenExchangeError::Sign(_) => {
            tracing::error!(error = %err, "token exchange failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
        _ => StatusCode::BAD_REQUEST,
    };
    let message = match status {
        StatusCode::INTERNAL_SERVER_ERROR => "token issuance failed".to_string(),
        _ => err.to_string(),
    };
    json_error(status, err.oauth_error_code(), message)
}

pub fn userinfo_error_to_response(err: UserInfoError) -> Response {
    match err {
        UserInfoError::InvalidToken(msg) => {
            let mut response = json_error(StatusCode::UNAUTHORIZED, "invalid_token", msg);
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                header::HeaderValue::from_static("Bearer error=\"invalid_token\""),
            );
            response
        }
        UserInfoError::LookupFailed(msg) => {
            tracing::error!(error = %msg, "userinfo lookup failed");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "server_error", "access lookup failed")
        }
    }
}
