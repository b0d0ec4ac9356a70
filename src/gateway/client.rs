// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HTTP client forwarding requests to upstream services.
//!
//! The request method, path, query, end-to-end headers and body are relayed
//! unchanged; so are the upstream status, headers and body. There is no
//! retry: an upstream failure surfaces as a single 502.

use std::error::Error as _;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, HeaderName, Request, Response},
};
use http_body_util::LengthLimitError;

use super::routes::Route;

/// Largest request body buffered for forwarding (16 MiB).
pub const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Headers scoped to a single connection, never forwarded.
const HOP_BY_HOP: [HeaderName; 9] = [
    header::CONNECTION,
    header::HOST,
    header::CONTENT_LENGTH,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Errors raised while forwarding a request.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    #[error("request body exceeds the 16 MiB limit")]
    BodyTooLarge,
    #[error("failed to read request body: {0}")]
    RequestBody(#[source] axum::Error),
    #[error("upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),
    #[error("failed to build response: {0}")]
    Response(#[from] axum::http::Error),
}

/// HTTP client for forwarding requests to upstream services.
#[derive(Debug, Clone)]
pub struct ServiceClient {
    client: reqwest::Client,
}

impl ServiceClient {
    pub fn new(timeout_secs: u64) -> Result<Self, ProxyError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .tcp_keepalive(Duration::from_secs(30))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(ProxyError::ClientBuild)?;

        Ok(Self { client })
    }

    /// Forward `request` to the upstream of `route`.
    pub async fn forward(
        &self,
        route: &Route,
        request: Request<Body>,
    ) -> Result<Response<Body>, ProxyError> {
        let (parts, body) = request.into_parts();
        let path_and_query = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        let target = route.target(path_and_query);

        let body = to_bytes(body, MAX_BODY_BYTES)
            .await
            .map_err(body_error)?;

        let mut upstream_request = self
            .client
            .request(parts.method, &target)
            .headers(end_to_end(&parts.headers));
        if !body.is_empty() {
            upstream_request = upstream_request.body(body);
        }

        let upstream_response = upstream_request.send().await?;

        let mut response = Response::builder().status(upstream_response.status());
        if let Some(headers) = response.headers_mut() {
            *headers = end_to_end(upstream_response.headers());
        }
        let bytes = upstream_response.bytes().await?;

        Ok(response.body(Body::from(bytes))?)
    }
}

fn body_error(err: axum::Error) -> ProxyError {
    let mut source = err.source();
    while let Some(inner) = source {
        if inner.is::<LengthLimitError>() {
            return ProxyError::BodyTooLarge;
        }
        source = inner.source();
    }
    ProxyError::RequestBody(err)
}

/// Copy `headers`, dropping hop-by-hop headers and anything the
/// `Connection` header names.
fn end_to_end(headers: &HeaderMap) -> HeaderMap {
    let listed: Vec<String> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(|name| name.trim().to_ascii_lowercase())
        .collect();

    let mut out = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let name_str = name.as_str();
        if HOP_BY_HOP.contains(name)
            || name_str == "keep-alive"
            || listed.iter().any(|l| l == name_str)
        {
            continue;
        }
        out.append(name.clone(), value.clone());
    }
    out
}
