/// HTTP API for the bucket admin panel.
///
/// Browsing is public. Every mutation resolves the caller's principal
/// from the session token and hands it to the file operations, which
/// consult the access gate before touching the store.
pub mod routes;
pub mod session;

use std::sync::Arc;

use axum::http::{header, Method};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::Result;
use crate::files::FileManager;

/// Prefix shared by every bucket endpoint.
pub const API_PREFIX: &str = "/api";

/// Handler state: the file operations and the key that signs sessions.
pub struct AppState {
    pub files: FileManager,
    /// HMAC secret for session tokens.
    pub session_secret: String,
}

/// The admin panel is served from another origin and authenticates with
/// a bearer header, never cookies.
fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

/// Assemble the router: `/health` plus the browse and mutation groups
/// under [`API_PREFIX`].
pub fn build_app(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::browse_routes())
        .merge(routes::mutation_routes());

    Router::new()
        .merge(routes::health_route())
        .nest(API_PREFIX, api)
        .with_state(Arc::new(state))
        .layer(CompressionLayer::new())
        .layer(cors())
        .layer(TraceLayer::new_for_http())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Cannot listen for Ctrl-C, running until killed");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested, draining connections");
}

/// Bind `addr` and serve until Ctrl-C, letting in-flight uploads finish.
pub async fn serve(state: AppState, addr: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr, "cdn-admin API listening");

    axum::serve(listener, build_app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
