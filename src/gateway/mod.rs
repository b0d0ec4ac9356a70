// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Downstream routing: picks the upstream service for a path and forwards
//! the (already authenticated) request to it.

pub mod client;
pub mod routes;

pub use client::{ProxyError, ServiceClient};
pub use routes::{Route, RouteTable};
