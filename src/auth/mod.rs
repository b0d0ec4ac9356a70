// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! The gateway's identity filter. It is the single choke point every inbound
//! request crosses before reaching a backend service.
//!
//! ## Auth Flow
//!
//! 1. The auth service issues an HMAC-signed JWT on login/registration
//! 2. Clients send `Authorization: Bearer <JWT>`
//! 3. The gateway:
//!    - Classifies the path (public / secured / unspecified)
//!    - On secured paths, verifies signature and expiry
//!    - Extracts:
//!      - `sub` → `X-Username`
//!      - first entry of `roles` → `X-Role`
//!    - Forwards with those headers overwritten
//!
//! ## Security
//!
//! - Fails closed: any missing, malformed, invalid or incomplete credential
//!   on a secured path yields a bare 401
//! - The reason for rejection is logged, never returned
//! - Client-supplied `X-Username` / `X-Role` never survive authentication

pub mod claims;
pub mod error;
pub mod extractor;
pub mod middleware;
pub mod policy;
pub mod verifier;

pub use claims::VerifiedIdentity;
pub use error::AuthError;
pub use middleware::{identity_filter, IdentityFilter};
pub use policy::{PathClass, PathPolicy};
pub use verifier::{SigningKey, TokenVerifier};
