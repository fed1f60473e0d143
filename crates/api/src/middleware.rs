use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Utc};

use docgate_auth::{Caller, JwtValidator};

use crate::app::errors::json_error;
use crate::context::CallerContext;

#[derive(Clone)]
pub struct AuthState {
    pub jwt: Arc<dyn JwtValidator>,
}

/// Require a valid session bearer token; attach the [`CallerContext`].
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let caller = match authenticate(state.jwt.as_ref(), req.headers(), Utc::now()) {
        Some(caller) => caller,
        None => return json_error(StatusCode::UNAUTHORIZED, "unauthenticated", "authentication required"),
    };

    req.extensions_mut().insert(CallerContext::new(caller));
    next.run(req).await
}

/// Resolve the caller from the `Authorization` header, if it holds a valid session.
pub fn authenticate(jwt: &dyn JwtValidator, headers: &HeaderMap, now: DateTime<Utc>) -> Option<Caller> {
    let token = extract_bearer(headers)?;

    match jwt.validate(token, now).and_then(|claims| Caller::try_from(&claims)) {
        Ok(caller) => Some(caller),
        Err(e) => {
            tracing::debug!(error = %e, "session token rejected");
            None
        }
    }
}

pub fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(axum::http::header::AUTHORIZATION)?;
    let header = header.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();

    if token.is_empty() {
        return None;
    }
    Some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_prefix_is_required() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_bearer(&headers), None);

        headers.insert(axum::http::header::AUTHORIZATION, HeaderValue::from_static("Token abc"));
        assert_eq!(extract_bearer(&headers), None);

        headers.insert(axum::http::header::AUTHORIZATION, HeaderValue::from_static("Bearer   "));
        assert_eq!(extract_bearer(&headers), None);

        headers.insert(axum::http::header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(extract_bearer(&headers), Some("abc.def"));
    }
}
