//! HTTP endpoints exposing the gateway's southbound trust material

pub mod handlers;
pub mod models;

use axum::{routing::get, Router};
use gateway_trust::SouthboundTrust;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Application state shared across handlers
pub struct AppState {
    pub trust: SouthboundTrust,
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// Address to bind the API server
    pub bind_addr: SocketAddr,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 10010)),
        }
    }
}

/// API Server
pub struct ApiServer {
    config: ApiServerConfig,
    state: Arc<AppState>,
}

impl ApiServer {
    /// Create a new API server over already initialized trust material
    pub fn new(config: ApiServerConfig, trust: SouthboundTrust) -> Self {
        Self {
            config,
            state: Arc::new(AppState { trust }),
        }
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Router {
        router(self.state.clone())
    }

    /// Serve until `shutdown` resolves
    pub async fn start<F>(self, shutdown: F) -> Result<(), anyhow::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let router = self.build_router();

        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;
        info!(
            "Serving southbound certificates on http://{}/api/certificates",
            listener.local_addr()?
        );

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

        Ok(())
    }
}

/// Routes for the certificate endpoints
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health_check))
        .route("/api/certificates", get(handlers::get_certificates))
        .route("/api/certificates/info", get(handlers::get_certificate_info))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
