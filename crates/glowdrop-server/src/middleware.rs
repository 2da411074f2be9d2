use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::api::ApiError;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest caller-supplied request id that is reused instead of replaced.
const MAX_REQUEST_ID_LEN: usize = 128;

/// Correlation id for one request; every response envelope carries it in `meta`.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Bearer tokens allowed to replace catalog data through the admin import routes.
///
/// An empty set leaves those routes open. Configuration only allows that in
/// the development environment.
#[derive(Debug, Clone)]
pub struct AdminTokens(Arc<[String]>);

impl AdminTokens {
    #[must_use]
    pub fn new(tokens: &[String]) -> Self {
        Self(tokens.iter().cloned().collect())
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.0.is_empty()
    }

    /// Constant-time comparison against every configured token.
    fn accepts(&self, presented: &str) -> bool {
        self.0.iter().fold(false, |found, token| {
            found | bool::from(token.as_bytes().ct_eq(presented.as_bytes()))
        })
    }
}

/// Tags each request with a [`RequestId`] and echoes it as `x-request-id`.
///
/// A caller-supplied id is reused when it is short printable ASCII; anything
/// else is replaced with a fresh `UUIDv4`.
pub async fn tag_request(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| is_reusable_request_id(v))
        .map_or_else(|| Uuid::new_v4().to_string(), ToOwned::to_owned);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert(REQUEST_ID_HEADER, val);
    }

    res
}

/// Rejects catalog imports that lack a configured admin bearer token.
///
/// Must run inside [`tag_request`] so the rejection carries the request id.
pub async fn guard_admin(
    State(tokens): State<AdminTokens>,
    req: Request,
    next: Next,
) -> Response {
    if tokens.is_open() {
        return next.run(req).await;
    }

    let presented = bearer_token(req.headers().get(AUTHORIZATION));
    if presented.is_some_and(|t| tokens.accepts(t)) {
        return next.run(req).await;
    }

    let request_id = req
        .extensions()
        .get::<RequestId>()
        .map_or_else(String::new, |id| id.0.clone());
    tracing::warn!(
        path = %req.uri().path(),
        request_id = %request_id,
        "catalog import rejected: missing or unknown admin token"
    );
    ApiError::new(
        request_id,
        "unauthorized",
        "a valid admin bearer token is required",
    )
    .into_response()
}

fn is_reusable_request_id(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= MAX_REQUEST_ID_LEN
        && value.bytes().all(|b| b.is_ascii_graphic())
}

fn bearer_token(value: Option<&HeaderValue>) -> Option<&str> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(raw: &[&str]) -> AdminTokens {
        let owned: Vec<String> = raw.iter().map(|t| (*t).to_string()).collect();
        AdminTokens::new(&owned)
    }

    #[test]
    fn bearer_token_reads_bearer_scheme_only() {
        let header = HeaderValue::from_static("Bearer ops-token");
        assert_eq!(bearer_token(Some(&header)), Some("ops-token"));

        let basic = HeaderValue::from_static("Basic abc123");
        assert_eq!(bearer_token(Some(&basic)), None);

        let blank = HeaderValue::from_static("Bearer   ");
        assert_eq!(bearer_token(Some(&blank)), None);
        assert_eq!(bearer_token(None), None);
    }

    #[test]
    fn admin_tokens_accept_only_configured_values() {
        let admin = tokens(&["ops-a", "ops-b"]);
        assert!(!admin.is_open());
        assert!(admin.accepts("ops-a"));
        assert!(admin.accepts("ops-b"));
        assert!(!admin.accepts("ops-"));
        assert!(!admin.accepts("ops-c"));
    }

    #[test]
    fn empty_admin_tokens_leave_imports_open() {
        let admin = tokens(&[]);
        assert!(admin.is_open());
        assert!(!admin.accepts(""));
    }

    #[test]
    fn request_id_reuse_rules() {
        assert!(is_reusable_request_id("abc-123"));
        assert!(!is_reusable_request_id(""));
        assert!(!is_reusable_request_id("has space"));
        assert!(!is_reusable_request_id(&"x".repeat(MAX_REQUEST_ID_LEN + 1)));
    }
}
