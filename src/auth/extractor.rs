// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer credential extraction from request headers.

use axum::http::{header::AUTHORIZATION, HeaderMap};

use super::AuthError;

/// Scheme prefix expected on the `Authorization` header (case-sensitive).
pub const BEARER_PREFIX: &str = "Bearer ";

/// Pull the raw bearer credential out of the `Authorization` header.
///
/// The returned slice is everything after `"Bearer "`, untouched. An empty
/// remainder is returned as-is and left for the verifier to reject.
/// Only the first `Authorization` header is considered.
pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingCredential)?
        .to_str()
        .map_err(|_| AuthError::MalformedCredential)?;

    value
        .strip_prefix(BEARER_PREFIX)
        .ok_or(AuthError::MalformedCredential)
}
