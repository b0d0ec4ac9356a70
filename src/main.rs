// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{process, time::Duration};

use axum_server::{tls_rustls::RustlsConfig, Handle};
use smart_delivery_gateway::{api::router, config::GatewayConfig, state::GatewayState, telemetry};

/// Time allowed for in-flight requests to finish on shutdown.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() {
    // Configuration errors are fatal: never serve with a missing signing key.
    let config = match GatewayConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid gateway configuration: {e}");
            process::exit(1);
        }
    };

    telemetry::init(config.log_format);

    let state = match GatewayState::from_config(&config) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!(error = %e, "Failed to initialise gateway state");
            process::exit(1);
        }
    };

    tracing::info!(
        public = ?config.path_policy.public_prefixes(),
        secured = ?config.path_policy.secured_prefixes(),
        routes = config.routes.len(),
        "Identity filter configured"
    );
    for route in config.routes.iter() {
        tracing::info!(prefix = route.prefix(), upstream = %route.upstream(), "Upstream route");
    }

    let app = router(state);
    let addr = config.bind_addr;

    let handle = Handle::new();
    tokio::spawn(shutdown_signal(handle.clone()));

    match &config.tls {
        Some(tls) => {
            // Install the ring crypto provider for rustls (must be done before any TLS operations)
            rustls::crypto::ring::default_provider()
                .install_default()
                .expect("Failed to install rustls crypto provider");

            let tls_config = match RustlsConfig::from_pem_file(&tls.cert, &tls.key).await {
                Ok(tls_config) => tls_config,
                Err(e) => {
                    tracing::error!(error = %e, cert = %tls.cert.display(), "Failed to load TLS credentials");
                    process::exit(1);
                }
            };

            tracing::info!("Gateway listening on https://{addr}");
            axum_server::bind_rustls(addr, tls_config)
                .handle(handle)
                .serve(app.into_make_service())
                .await
                .expect("HTTPS server failed");
        }
        None => {
            tracing::info!("Gateway listening on http://{addr}");
            axum_server::bind(addr)
                .handle(handle)
                .serve(app.into_make_service())
                .await
                .expect("HTTP server failed");
        }
    }

    tracing::info!("Gateway stopped");
}

async fn shutdown_signal(handle: Handle<std::net::SocketAddr>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections");
    handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
}
