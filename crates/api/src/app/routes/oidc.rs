//! OIDC bridge endpoints. Public at the router level; `/oidc/authorize`
//! resolves the session itself so it can answer `login_required`.

use std::sync::Arc;

use axum::{
    Form, Json, Router,
    extract::{Extension, FromRequest, Query, Request, rejection::QueryRejection},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;

use docgate_sso::{AuthorizeRequest, TokenRequest};

use crate::app::errors::{
    authorize_error_to_response, json_error, query_rejection, token_error_to_response, userinfo_error_to_response,
};
use crate::app::services::AppServices;
use crate::middleware::{authenticate, extract_bearer};

pub fn router() -> Router {
    Router::new()
        .route("/.well-known/openid-configuration", get(discovery))
        .route("/oidc/authorize", get(authorize))
        .route("/oidc/token", post(token))
        .route("/oidc/userinfo", get(userinfo).post(userinfo))
}

async fn discovery(Extension(services): Extension<Arc<AppServices>>) -> impl IntoResponse {
    Json(services.discovery.clone())
}

async fn authorize(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
    query: Result<Query<AuthorizeRequest>, QueryRejection>,
) -> Response {
    let Query(request) = match query {
        Ok(query) => query,
        Err(rejection) => return query_rejection(rejection),
    };

    let now = Utc::now();
    let Some(caller) = authenticate(services.jwt.as_ref(), &headers, now) else {
        return json_error(StatusCode::UNAUTHORIZED, "login_required", "an authenticated session is required");
    };

    match services.issuer.authorize(&caller, &request, now) {
        Ok(location) => match HeaderValue::from_str(&location) {
            Ok(location) => (StatusCode::FOUND, [(header::LOCATION, location)]).into_response(),
            Err(_) => json_error(StatusCode::BAD_REQUEST, "invalid_request", "redirect_uri is not a valid header value"),
        },
        Err(e) => authorize_error_to_response(e),
    }
}

/// Accepts `application/json` or form-encoded bodies.
async fn token(Extension(services): Extension<Arc<AppServices>>, req: Request) -> Response {
    let is_json = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"));

    let request = if is_json {
        Json::<TokenRequest>::from_request(req, &()).await.map(|Json(r)| r).map_err(|e| e.body_text())
    } else {
        Form::<TokenRequest>::from_request(req, &()).await.map(|Form(r)| r).map_err(|e| e.body_text())
    };
    let request = match request {
        Ok(request) => request,
        Err(msg) => return json_error(StatusCode::BAD_REQUEST, "invalid_request", msg),
    };

    match services.issuer.exchange(&request, Utc::now()).await {
        Ok(tokens) => (
            [
                (header::CACHE_CONTROL, HeaderValue::from_static("no-store")),
                (header::PRAGMA, HeaderValue::from_static("no-cache")),
            ],
            Json(tokens),
        )
            .into_response(),
        Err(e) => token_error_to_response(e),
    }
}

async fn userinfo(Extension(services): Extension<Arc<AppServices>>, headers: HeaderMap) -> Response {
    let Some(token) = extract_bearer(&headers) else {
        let mut response = json_error(StatusCode::UNAUTHORIZED, "invalid_token", "bearer access token required");
        response
            .headers_mut()
            .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        return response;
    };

    match services.issuer.userinfo(token, Utc::now()).await {
        Ok(info) => Json(info).into_response(),
        Err(e) => userinfo_error_to_response(e),
    }
}
