// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Request, State},
    response::Response,
};

use crate::{error::ApiError, state::GatewayState};

/// Fallback handler: forward to the upstream owning the request path.
///
/// Runs after the identity filter, so secured requests reaching this point
/// already carry verified identity headers.
pub async fn forward(
    State(state): State<GatewayState>,
    request: Request,
) -> Result<Response, ApiError> {
    let path = request.uri().path().to_string();

    let route = state.routes.resolve(&path).ok_or_else(|| {
        tracing::debug!(path = %path, "No upstream route");
        ApiError::not_found("no route for path")
    })?;

    state.client.forward(route, request).await.map_err(|e| {
        tracing::error!(
            error = %e,
            path = %path,
            upstream = %route.upstream(),
            "Failed to forward request to upstream"
        );
        ApiError::from(e)
    })
}
