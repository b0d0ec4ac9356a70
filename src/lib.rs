// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Smart Delivery Gateway - Authenticating API Gateway
//!
//! Single entry point in front of the auth, user, order and notification
//! services. Every inbound request crosses the identity filter before it is
//! routed; secured paths are forwarded only with a verified identity.
//!
//! ## Modules
//!
//! - `api` - Router assembly, health probes and the proxy fallback
//! - `auth` - Identity filter (path policy, bearer extraction, JWT verification)
//! - `config` - Environment-driven startup configuration
//! - `gateway` - Upstream route table and forwarding client
//! - `telemetry` - Tracing subscriber setup

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod gateway;
pub mod state;
pub mod telemetry;
