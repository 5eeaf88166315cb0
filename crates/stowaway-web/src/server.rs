//! Server configuration and the layered service stack

use axum::Router;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;
use stowaway_core::{Error, Result};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Static file server configuration
#[derive(Debug, Clone)]
pub struct ServeConfig {
    /// Address to bind
    pub bind: IpAddr,
    /// HTTP server port
    pub port: u16,
    /// Sub-path of the embedded tree to serve (empty = everything)
    pub base_path: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Maximum concurrent requests
    pub max_concurrent: usize,
    /// Allow cross-origin `GET`s
    pub cors: bool,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8080,
            base_path: String::new(),
            timeout_secs: 30,
            max_concurrent: 64,
            cors: false,
        }
    }
}

impl ServeConfig {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}

/// Wrap a file router with tracing, timeout and concurrency limits
pub fn layered(router: Router, config: &ServeConfig) -> Router {
    let router = if config.cors {
        router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([axum::http::Method::GET, axum::http::Method::HEAD]),
        )
    } else {
        router
    };

    router.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeout_secs)))
            .layer(tower::limit::ConcurrencyLimitLayer::new(config.max_concurrent)),
    )
}

/// Bind and serve until the process is stopped
pub async fn serve(router: Router, config: &ServeConfig) -> Result<()> {
    let app = layered(router, config);
    let addr = config.addr();

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Stowaway web server listening on http://{}", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| Error::Io(e.into()))?;

    Ok(())
}
