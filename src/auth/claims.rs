// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWT claims and the verified identity derived from them.

use axum::http::HeaderValue;
use serde::Deserialize;

use super::AuthError;

/// Header carrying the verified subject to downstream services.
pub const USERNAME_HEADER: &str = "x-username";

/// Header carrying the effective role to downstream services.
pub const ROLE_HEADER: &str = "x-role";

/// Claims carried by tokens issued by the auth service.
///
/// Only `sub` and `roles` are read. Time claims (`exp`, `nbf`, including
/// fractional NumericDates) are enforced by `jsonwebtoken` during decoding.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenClaims {
    /// Subject (username)
    #[serde(default)]
    pub sub: Option<String>,

    /// Granted roles, most significant first
    #[serde(default)]
    pub roles: Option<Vec<String>>,
}

/// Identity established from a verified token.
///
/// Construction validates that both header values are representable, so
/// attaching them to a request cannot fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    username: String,
    role: String,
    username_value: HeaderValue,
    role_value: HeaderValue,
}

impl VerifiedIdentity {
    /// Build the identity from decoded claims.
    ///
    /// The effective role is always the first entry of `roles`. Tokens may
    /// carry several roles but downstream services see exactly one.
    pub fn from_claims(claims: TokenClaims) -> Result<Self, AuthError> {
        let username = claims
            .sub
            .filter(|s| !s.is_empty())
            .ok_or(AuthError::IncompleteClaims("missing subject"))?;

        let role = claims
            .roles
            .and_then(|roles| roles.into_iter().next())
            .filter(|r| !r.is_empty())
            .ok_or(AuthError::IncompleteClaims("missing roles"))?;

        let username_value = HeaderValue::from_str(&username)
            .map_err(|_| AuthError::IncompleteClaims("subject is not a valid header value"))?;
        let role_value = HeaderValue::from_str(&role)
            .map_err(|_| AuthError::IncompleteClaims("role is not a valid header value"))?;

        Ok(Self {
            username,
            role,
            username_value,
            role_value,
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// The single role propagated downstream.
    pub fn role(&self) -> &str {
        &self.role
    }

    pub(crate) fn username_value(&self) -> &HeaderValue {
        &self.username_value
    }

    pub(crate) fn role_value(&self) -> &HeaderValue {
        &self.role_value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(sub: Option<&str>, roles: Option<&[&str]>) -> TokenClaims {
        TokenClaims {
            sub: sub.map(str::to_string),
            roles: roles.map(|r| r.iter().map(|s| s.to_string()).collect()),
        }
    }

    #[test]
    fn from_claims_extracts_username_and_role() {
        let identity =
            VerifiedIdentity::from_claims(claims(Some("alice"), Some(&["COURIER"]))).unwrap();
        assert_eq!(identity.username(), "alice");
        assert_eq!(identity.role(), "COURIER");
        assert_eq!(identity.username_value(), "alice");
        assert_eq!(identity.role_value(), "COURIER");
    }

    #[test]
    fn first_role_is_effective() {
        let identity =
            VerifiedIdentity::from_claims(claims(Some("bob"), Some(&["ADMIN", "COURIER"]))).unwrap();
        assert_eq!(identity.role(), "ADMIN");
    }

    #[test]
    fn missing_subject_is_incomplete() {
        let err = VerifiedIdentity::from_claims(claims(None, Some(&["ADMIN"]))).unwrap_err();
        assert_eq!(err, AuthError::IncompleteClaims("missing subject"));
    }

    #[test]
    fn empty_subject_is_incomplete() {
        let err = VerifiedIdentity::from_claims(claims(Some(""), Some(&["ADMIN"]))).unwrap_err();
        assert_eq!(err.error_code(), "incomplete_claims");
    }

    #[test]
    fn missing_or_empty_roles_are_incomplete() {
        for roles in [None, Some(&[][..]), Some(&[""][..])] {
            let err = VerifiedIdentity::from_claims(claims(Some("alice"), roles)).unwrap_err();
            assert_eq!(err, AuthError::IncompleteClaims("missing roles"));
        }
    }

    #[test]
    fn subject_with_control_characters_is_rejected() {
        let err =
            VerifiedIdentity::from_claims(claims(Some("alice\r\nX-Role: ADMIN"), Some(&["USER"])))
                .unwrap_err();
        assert_eq!(err.error_code(), "incomplete_claims");
    }

    #[test]
    fn claims_deserialize_without_optional_fields() {
        let claims: TokenClaims = serde_json::from_str(r#"{"exp": 1700000000.5}"#).unwrap();
        assert!(claims.sub.is_none());
        assert!(claims.roles.is_none());
    }
}
