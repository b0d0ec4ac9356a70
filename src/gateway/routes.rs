// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Upstream route table.
//!
//! Routing rules (defaults):
//! - /auth/*          → auth-service
//! - /users/*         → user-service
//! - /orders/*        → order-service
//! - /notifications/* → notification-service

use url::Url;

/// A path prefix served by one upstream service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    prefix: String,
    upstream: Url,
}

impl Route {
    pub fn new(prefix: impl Into<String>, upstream: Url) -> Self {
        Self {
            prefix: prefix.into(),
            upstream,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn upstream(&self) -> &Url {
        &self.upstream
    }

    /// Absolute upstream URL for `path_and_query`.
    ///
    /// The full inbound path is kept; prefixes are not stripped.
    pub fn target(&self, path_and_query: &str) -> String {
        format!(
            "{}{}",
            self.upstream.as_str().trim_end_matches('/'),
            path_and_query
        )
    }
}

/// Ordered routes; the first prefix match wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    pub fn resolve(&self, path: &str) -> Option<&Route> {
        self.routes
            .iter()
            .find(|route| path.starts_with(route.prefix.as_str()))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }
}
