// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Identity filter middleware for Axum.
//!
//! Every inbound request passes through [`identity_filter`] before the
//! router picks a handler or upstream. Per request the filter:
//!
//! 1. rejects paths with `.`/`..` segments, then classifies the path
//!    against the [`PathPolicy`]
//! 2. forwards public and unclassified paths untouched
//! 3. extracts the bearer credential from `Authorization`
//! 4. verifies it and derives a [`VerifiedIdentity`]
//! 5. overwrites `X-Username` / `X-Role` with the verified values
//!
//! Any failure in steps 1 or 3–5 ends the request with a bare 401.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderName},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::claims::{ROLE_HEADER, USERNAME_HEADER};
use super::extractor::extract_bearer;
use super::policy::{has_dot_segment, PathPolicy};
use super::verifier::{SigningKey, TokenVerifier};
use super::{AuthError, VerifiedIdentity};

/// Immutable per-process filter built once at startup.
#[derive(Debug, Clone)]
pub struct IdentityFilter {
    policy: PathPolicy,
    verifier: TokenVerifier,
    strip_on_passthrough: bool,
}

impl IdentityFilter {
    pub fn new(policy: PathPolicy, verifier: TokenVerifier) -> Self {
        Self {
            policy,
            verifier,
            strip_on_passthrough: false,
        }
    }

    /// Build from the signing key, with `leeway_secs` of clock-skew tolerance.
    pub fn from_key(policy: PathPolicy, key: &SigningKey, leeway_secs: u64) -> Self {
        Self::new(policy, TokenVerifier::new(key, leeway_secs))
    }

    /// Remove client-supplied identity headers on paths that skip
    /// authentication instead of forwarding them untouched.
    pub fn with_passthrough_stripping(mut self, strip: bool) -> Self {
        self.strip_on_passthrough = strip;
        self
    }

    pub fn policy(&self) -> &PathPolicy {
        &self.policy
    }

    /// Run the filter over a request.
    ///
    /// Returns `Ok(None)` when the path needs no credential, and
    /// `Ok(Some(identity))` after the identity headers were written. On
    /// `Err` the request must not be forwarded.
    pub fn apply<B>(
        &self,
        request: &mut axum::http::Request<B>,
    ) -> Result<Option<VerifiedIdentity>, AuthError> {
        let path = request.uri().path();

        // Checked on every path, public ones included: upstream URL
        // normalisation could turn `/auth/../users` into a secured path.
        if has_dot_segment(path) {
            return Err(AuthError::AmbiguousPath);
        }

        if !self.policy.classify(path).requires_credential() {
            if self.strip_on_passthrough {
                strip_identity(request.headers_mut());
            }
            return Ok(None);
        }

        let identity = self.authenticate(request.headers())?;
        propagate_identity(request.headers_mut(), &identity);
        Ok(Some(identity))
    }

    fn authenticate(&self, headers: &HeaderMap) -> Result<VerifiedIdentity, AuthError> {
        let token = extract_bearer(headers)?;
        self.verifier.verify(token)
    }
}

/// Overwrite the trusted identity headers with verified values.
///
/// `insert` drops every existing value under the same name, so a client can
/// never smuggle an extra `X-Username` past the gateway.
pub fn propagate_identity(headers: &mut HeaderMap, identity: &VerifiedIdentity) {
    headers.insert(
        HeaderName::from_static(USERNAME_HEADER),
        identity.username_value().clone(),
    );
    headers.insert(
        HeaderName::from_static(ROLE_HEADER),
        identity.role_value().clone(),
    );
}

fn strip_identity(headers: &mut HeaderMap) {
    headers.remove(USERNAME_HEADER);
    headers.remove(ROLE_HEADER);
}

/// Identity filter middleware function.
///
/// Register with `axum::middleware::from_fn_with_state` as the outermost
/// application layer so it sees every request before routing.
pub async fn identity_filter(
    State(filter): State<Arc<IdentityFilter>>,
    mut request: Request,
    next: Next,
) -> Response {
    tracing::debug!(path = %request.uri().path(), "Incoming request");

    match filter.apply(&mut request) {
        Ok(Some(identity)) => {
            tracing::debug!(
                username = %identity.username(),
                role = %identity.role(),
                "Authenticated request"
            );
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Ok(None) => next.run(request).await,
        Err(err) => {
            tracing::warn!(
                path = %request.uri().path(),
                error_code = err.error_code(),
                reason = %err,
                "Rejected request"
            );
            err.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::verifier::tests::{in_one_hour, sign, test_verifier, valid_token};
    use axum::{
        body::{to_bytes, Body},
        http::{header::AUTHORIZATION, StatusCode},
        middleware::from_fn_with_state,
        Json, Router,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn filter() -> IdentityFilter {
        IdentityFilter::new(
            PathPolicy::new(["/auth"], ["/users", "/orders"]),
            test_verifier(),
        )
    }

    fn request(path: &str) -> axum::http::Request<()> {
        axum::http::Request::builder().uri(path).body(()).unwrap()
    }

    fn request_with_auth(path: &str, auth: &str) -> axum::http::Request<()> {
        axum::http::Request::builder()
            .uri(path)
            .header(AUTHORIZATION, auth)
            .body(())
            .unwrap()
    }

    /// Echoes the identity headers a downstream service would receive.
    async fn echo(headers: HeaderMap) -> Json<Value> {
        let all = |name: &str| -> Vec<String> {
            headers
                .get_all(name)
                .iter()
                .filter_map(|v| v.to_str().ok().map(str::to_string))
                .collect()
        };
        Json(json!({
            "username": all(USERNAME_HEADER),
            "role": all(ROLE_HEADER),
            "authorization": all("authorization"),
        }))
    }

    fn app(filter: IdentityFilter) -> Router {
        Router::new()
            .fallback(echo)
            .layer(from_fn_with_state(Arc::new(filter), identity_filter))
    }

    async fn send(app: Router, request: axum::http::Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    fn http(path: &str, headers: &[(&str, &str)]) -> axum::http::Request<Body> {
        let mut builder = axum::http::Request::builder().uri(path);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn public_path_is_untouched_even_with_bad_credential() {
        let mut req = request_with_auth("/auth/login", "Basic abc123");
        req.headers_mut().insert(USERNAME_HEADER, "spoofed".parse().unwrap());
        let before = req.headers().clone();

        assert_eq!(filter().apply(&mut req), Ok(None));
        assert_eq!(req.headers(), &before);
    }

    #[test]
    fn unspecified_path_behaves_like_public() {
        let mut req = request("/health/live");
        assert_eq!(filter().apply(&mut req), Ok(None));
        assert!(req.headers().get(USERNAME_HEADER).is_none());
    }

    #[test]
    fn passthrough_stripping_removes_client_identity() {
        let mut req = request("/auth/login");
        req.headers_mut().insert(USERNAME_HEADER, "spoofed".parse().unwrap());
        req.headers_mut().insert(ROLE_HEADER, "ADMIN".parse().unwrap());

        let filter = filter().with_passthrough_stripping(true);
        assert_eq!(filter.apply(&mut req), Ok(None));
        assert!(req.headers().get(USERNAME_HEADER).is_none());
        assert!(req.headers().get(ROLE_HEADER).is_none());
    }

    #[test]
    fn secured_path_failures_are_classified() {
        let cases = [
            (request("/users/me"), "missing_credential"),
            (request_with_auth("/users/me", "Basic abc123"), "malformed_credential"),
            (request_with_auth("/users/me", "Bearer "), "invalid_credential"),
            (request_with_auth("/users/me", "Bearer not.a.jwt"), "invalid_credential"),
        ];
        for (mut req, code) in cases {
            let err = filter().apply(&mut req).unwrap_err();
            assert_eq!(err.error_code(), code);
            assert!(req.headers().get(USERNAME_HEADER).is_none());
        }
    }

    #[test]
    fn dot_segment_paths_are_rejected_before_classification() {
        for path in ["/auth/../users/me", "/auth/%2e%2e/users/me", "/users/./me"] {
            let mut req = request(path);
            req.headers_mut().insert(USERNAME_HEADER, "admin".parse().unwrap());
            assert_eq!(filter().apply(&mut req), Err(AuthError::AmbiguousPath));
        }
    }

    #[tokio::test]
    async fn dot_segment_paths_get_a_bare_401() {
        for path in ["/auth/../users/me", "/auth/%2e%2e/users/me"] {
            let (status, body) = send(
                app(filter()),
                http(path, &[("x-username", "admin"), ("x-role", "ADMIN")]),
            )
            .await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{path}");
            assert!(body.is_empty());
        }
    }

    #[test]
    fn secured_path_sets_identity_headers() {
        let token = valid_token("alice", &["COURIER"]);
        let mut req = request_with_auth("/users/me", &format!("Bearer {token}"));

        let identity = filter().apply(&mut req).unwrap().unwrap();
        assert_eq!(identity.username(), "alice");
        assert_eq!(req.headers()[USERNAME_HEADER], "alice");
        assert_eq!(req.headers()[ROLE_HEADER], "COURIER");
    }

    #[test]
    fn rerunning_filter_is_deterministic() {
        let token = valid_token("alice", &["ADMIN", "COURIER"]);
        let mut req = request_with_auth("/orders/7", &format!("Bearer {token}"));

        filter().apply(&mut req).unwrap();
        let first = req.headers().clone();
        filter().apply(&mut req).unwrap();

        assert_eq!(req.headers(), &first);
        assert_eq!(req.headers()[ROLE_HEADER], "ADMIN");
    }

    #[tokio::test]
    async fn secured_request_is_forwarded_with_identity() {
        let token = valid_token("alice", &["COURIER"]);
        let (status, body) = send(
            app(filter()),
            http("/users/me", &[("authorization", format!("Bearer {token}").as_str())]),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["username"], json!(["alice"]));
        assert_eq!(body["role"], json!(["COURIER"]));
    }

    #[tokio::test]
    async fn client_identity_headers_are_overwritten() {
        let token = valid_token("alice", &["COURIER"]);
        let auth = format!("Bearer {token}");
        let (status, body) = send(
            app(filter()),
            http(
                "/users/me",
                &[
                    ("authorization", auth.as_str()),
                    ("x-username", "mallory"),
                    ("x-username", "root"),
                    ("x-role", "ADMIN"),
                ],
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["username"], json!(["alice"]));
        assert_eq!(body["role"], json!(["COURIER"]));
        assert_eq!(body["authorization"], json!([auth]));
    }

    #[tokio::test]
    async fn first_role_is_propagated() {
        let token = valid_token("bob", &["ADMIN", "COURIER"]);
        let (_, body) = send(
            app(filter()),
            http("/users/me", &[("authorization", format!("Bearer {token}").as_str())]),
        )
        .await;

        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["role"], json!(["ADMIN"]));
    }

    #[tokio::test]
    async fn missing_credential_is_rejected_without_forwarding() {
        let (status, body) = send(app(filter()), http("/users/me", &[])).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn public_path_is_forwarded_without_credential() {
        let (status, body) = send(app(filter()), http("/auth/login", &[])).await;
        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["username"], json!([]));
    }

    #[tokio::test]
    async fn wrong_scheme_is_rejected() {
        let (status, body) =
            send(app(filter()), http("/users/me", &[("authorization", "Basic abc123")])).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let token = sign(json!({
            "sub": "alice",
            "roles": ["COURIER"],
            "exp": chrono::Utc::now().timestamp() - 3600,
        }));
        let (status, body) = send(
            app(filter()),
            http("/users/me", &[("authorization", format!("Bearer {token}").as_str())]),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn empty_role_list_is_rejected() {
        let token = sign(json!({ "sub": "alice", "roles": [], "exp": in_one_hour() }));
        let (status, body) = send(
            app(filter()),
            http("/users/me", &[("authorization", format!("Bearer {token}").as_str())]),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.is_empty());
    }
}
