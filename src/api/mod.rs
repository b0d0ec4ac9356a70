// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{middleware::from_fn_with_state, routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::{auth::identity_filter, state::GatewayState};

pub mod health;
pub mod proxy;

/// Build the gateway router.
///
/// Layer order, outermost first:
/// 1. request id + tracing
/// 2. identity filter
/// 3. routing (local health routes, then the upstream proxy fallback)
///
/// The identity filter wraps the fallback too, so no request reaches an
/// upstream without passing it.
pub fn router(state: GatewayState) -> Router {
    let filter = state.filter.clone();

    Router::new()
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .fallback(proxy::forward)
        .with_state(state)
        .layer(from_fn_with_state(filter, identity_filter))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
}
