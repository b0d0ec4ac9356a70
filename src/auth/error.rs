// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Reasons a request is refused by the identity filter.
///
/// The variants are distinguishable in logs only. Every one of them renders
/// as the same bare `401 Unauthorized` so a caller cannot probe which check
/// failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// No `Authorization` header on a secured path
    #[error("Authorization header is required")]
    MissingCredential,
    /// Header present but not `Bearer <token>`
    #[error("Invalid authorization header format (expected 'Bearer <token>')")]
    MalformedCredential,
    /// Signature, structure or expiry check failed
    #[error("Token is invalid: {0}")]
    InvalidCredential(&'static str),
    /// Token verified but lacks a usable subject or role
    #[error("Token claims are incomplete: {0}")]
    IncompleteClaims(&'static str),
    /// Path contains dot segments and cannot be classified unambiguously
    #[error("Request path contains dot segments")]
    AmbiguousPath,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingCredential => "missing_credential",
            AuthError::MalformedCredential => "malformed_credential",
            AuthError::InvalidCredential(_) => "invalid_credential",
            AuthError::IncompleteClaims(_) => "incomplete_claims",
            AuthError::AmbiguousPath => "ambiguous_path",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.status_code().into_response()
    }
}
