//! HTTP server facade for Book Manager with Axum, error handling, and OpenAPI support.

use anyhow::Context;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use bookman_kernel::{settings::Settings, ModuleRegistry};

pub mod error;
pub mod router;

use router::RouterBuilder;

/// Version reported by the root endpoint
pub const API_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Start the HTTP server and serve until Ctrl-C or SIGTERM
pub async fn start_server(registry: &ModuleRegistry, settings: &Settings) -> anyhow::Result<()> {
    let address = format!("{}:{}", settings.server.host, settings.server.port);
    tracing::info!("starting HTTP server on {}", address);

    let app = build_router(registry, settings);

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind to address {}", address))?;

    tracing::info!("HTTP server listening on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

/// Build the main HTTP router with all module routes mounted
pub fn build_router(registry: &ModuleRegistry, settings: &Settings) -> Router {
    let mut router_builder = RouterBuilder::new()
        .route("/", get(root_info))
        .route("/healthz", get(health_check));

    for module in registry.modules() {
        let module_name = module.name();
        tracing::info!(
            module = module_name,
            "mounting module routes under /{}",
            module_name
        );
        router_builder = router_builder.mount_module(module_name, module.routes());
    }

    // Layers only wrap routes registered before them.
    router_builder
        .with_openapi(registry)
        .with_fallback()
        .with_timeout(settings.server.request_timeout_ms)
        .with_cors()
        .with_tracing()
        .with_request_id()
        .build()
}

#[derive(Debug, Serialize)]
struct RootInfo {
    message: &'static str,
    version: &'static str,
}

/// Root endpoint identifying the service
async fn root_info() -> Json<RootInfo> {
    Json(RootInfo {
        message: "Book Manager API is running!",
        version: API_VERSION,
    })
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "ok"
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("shutdown signal received");
}
