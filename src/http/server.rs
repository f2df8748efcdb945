//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with one nested sub-router per forwarded namespace
//! - Wire up middleware (tracing, request ID, optional timeout)
//! - Share a single upstream HTTP client across namespaces
//! - Bind server to listener and serve with graceful shutdown
//!
//! # Design Decisions
//! - Namespaces mount `/{*path}` for GET and POST only; other verbs are
//!   405 by omission, and a bare prefix with no trailing path 404s
//! - Request IDs are UUID v4, set on entry and propagated to the response
//! - The request timeout layer is only installed when configured, keeping
//!   the default behavior of waiting as long as the client allows

use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ProxyConfig;
use crate::http::forward::{self, ForwardState, HttpClient, UpstreamTarget};

/// HTTP server for the forwarding gateway.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given (already validated)
    /// configuration.
    pub fn new(config: ProxyConfig) -> Self {
        let client: HttpClient = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        let router = Self::build_router(&config, client);
        Self { router, config }
    }

    /// Build the Axum router with all namespaces and middleware layers.
    fn build_router(config: &ProxyConfig, client: HttpClient) -> Router {
        let mut router = Router::new();

        for upstream in &config.upstreams {
            let state = ForwardState {
                client: client.clone(),
                upstream: Arc::new(UpstreamTarget {
                    name: upstream.name.clone(),
                    base_url: upstream.base_url.clone(),
                    path_prefix: upstream.path_prefix.clone(),
                }),
            };
            let namespace = Router::new()
                .route("/{*path}", get(forward::handle).post(forward::handle))
                .with_state(state);

            tracing::info!(
                upstream = %upstream.name,
                path_prefix = %upstream.path_prefix,
                base_url = %upstream.base_url,
                "Namespace mounted"
            );
            router = router.nest(&upstream.path_prefix, namespace);
        }

        // Later layers wrap earlier ones: request IDs are assigned outermost,
        // traced, and copied onto the response on the way out.
        let mut router = router
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

        if config.timeouts.request_secs > 0 {
            router = router.layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )));
        }

        router
    }

    /// Run the server, accepting connections on the given listener until
    /// Ctrl+C or the shutdown channel fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            namespaces = self.config.upstreams.len(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = shutdown.recv() => {}
                }
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}
