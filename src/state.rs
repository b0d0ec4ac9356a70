// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::IdentityFilter;
use crate::config::GatewayConfig;
use crate::gateway::{ProxyError, RouteTable, ServiceClient};

/// Read-only state shared by every request.
///
/// Built once at startup; nothing in it is mutated afterwards, so it is
/// shared across tasks without locks.
#[derive(Clone)]
pub struct GatewayState {
    pub filter: Arc<IdentityFilter>,
    pub routes: Arc<RouteTable>,
    pub client: ServiceClient,
}

impl GatewayState {
    pub fn new(filter: IdentityFilter, routes: RouteTable, client: ServiceClient) -> Self {
        Self {
            filter: Arc::new(filter),
            routes: Arc::new(routes),
            client,
        }
    }

    pub fn from_config(config: &GatewayConfig) -> Result<Self, ProxyError> {
        let filter = IdentityFilter::from_key(
            config.path_policy.clone(),
            &config.signing_key,
            config.leeway_secs,
        )
        .with_passthrough_stripping(config.strip_identity_headers);
        let client = ServiceClient::new(config.upstream_timeout_secs)?;

        Ok(Self::new(filter, config.routes.clone(), client))
    }
}
