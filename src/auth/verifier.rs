// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signing key handling and JWT verification.
//!
//! ## Security
//!
//! - Only the HMAC-SHA family (HS256/HS384/HS512) is accepted; tokens
//!   declaring any other algorithm are rejected before the signature check
//! - `exp` is mandatory, `nbf` is honoured when present
//! - The key is loaded once at startup and never changes afterwards

use std::fmt;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

use super::claims::{TokenClaims, VerifiedIdentity};
use super::AuthError;
use crate::config::ConfigError;

/// Shortest secret accepted for HMAC-SHA signing (256 bits).
pub const MIN_SIGNING_KEY_BYTES: usize = 32;

/// HMAC algorithms accepted on incoming tokens.
const ACCEPTED_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// Process-wide secret used to verify token signatures.
#[derive(Clone)]
pub struct SigningKey {
    secret: Vec<u8>,
}

impl SigningKey {
    /// Build the key from the configured secret string.
    ///
    /// Fails when the secret is blank or too short for HMAC-SHA256.
    pub fn from_secret(secret: &str) -> Result<Self, ConfigError> {
        if secret.trim().is_empty() {
            return Err(ConfigError::MissingSigningKey);
        }
        if secret.len() < MIN_SIGNING_KEY_BYTES {
            return Err(ConfigError::WeakSigningKey {
                len: secret.len(),
                min: MIN_SIGNING_KEY_BYTES,
            });
        }
        Ok(Self {
            secret: secret.as_bytes().to_vec(),
        })
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.secret
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Verifies bearer tokens against the signing key.
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    /// Create a verifier for `key`, tolerating `leeway_secs` of clock skew.
    pub fn new(key: &SigningKey, leeway_secs: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = ACCEPTED_ALGORITHMS.to_vec();
        validation.leeway = leeway_secs;
        validation.validate_nbf = true;
        validation.validate_aud = false;

        Self {
            decoding_key: DecodingKey::from_secret(key.as_bytes()),
            validation,
        }
    }

    /// Verify a raw token and return the identity it carries.
    pub fn verify(&self, token: &str) -> Result<VerifiedIdentity, AuthError> {
        let token_data = decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| AuthError::InvalidCredential(describe(e.kind())))?;

        VerifiedIdentity::from_claims(token_data.claims)
    }
}

impl fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("algorithms", &self.validation.algorithms)
            .field("leeway", &self.validation.leeway)
            .finish_non_exhaustive()
    }
}

fn describe(kind: &ErrorKind) -> &'static str {
    match kind {
        ErrorKind::ExpiredSignature => "expired",
        ErrorKind::ImmatureSignature => "not yet valid",
        ErrorKind::InvalidSignature => "bad signature",
        ErrorKind::InvalidAlgorithm => "algorithm not accepted",
        ErrorKind::MissingRequiredClaim(_) => "missing required claim",
        ErrorKind::Json(_) => "unreadable claims",
        _ => "malformed",
    }
}
