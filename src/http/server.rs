//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, timeout, request ID, header inspection)
//! - Forward requests to the configured upstream
//! - Apply configuration reloads to the live config
//! - Graceful shutdown

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode, Uri},
    middleware,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{request_id::PropagateRequestIdLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::watcher::ConfigReload;
use crate::config::{LargeHeadersConfig, SharedConfig};
use crate::http::middleware::inspect_response_headers;
use crate::inspect::{LogRotator, ResponseInspector};
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: SharedConfig,
    pub client: Client<HttpConnector, Body>,
}

/// HTTP server whose responses are inspected for large headers.
pub struct HttpServer {
    router: Router,
    config: SharedConfig,
}

impl HttpServer {
    /// Create a new HTTP server backed by the live configuration.
    pub fn new(config: SharedConfig) -> Self {
        let inspector = Arc::new(inspector_for(&config));
        Self::with_inspector(config, inspector)
    }

    /// Create a server using an already built inspector.
    pub fn with_inspector(config: SharedConfig, inspector: Arc<ResponseInspector>) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        let state = AppState {
            config: config.clone(),
            client,
        };

        let router = Self::build_router(&config.load(), state, inspector);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &LargeHeadersConfig, state: AppState, inspector: Arc<ResponseInspector>) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(middleware::from_fn_with_state(inspector, inspect_response_headers))
            .layer(TraceLayer::new_for_http())
    }

    /// The router, for serving in-process (tests, embedding).
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires.
    ///
    /// Reloads arriving on `config_updates` are merged into the live config
    /// (see [`SharedConfig::apply_reload`]).
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<ConfigReload>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let live = self.config.clone();
        tokio::spawn(async move {
            while let Some(reload) = config_updates.recv().await {
                live.apply_reload(&reload);
                let thresholds = live.load().thresholds;
                tracing::info!(
                    thresholds_from_file = reload.thresholds.is_some(),
                    length_threshold = thresholds.length_threshold,
                    total_data_threshold = thresholds.total_data_threshold,
                    num_headers_threshold = thresholds.num_headers_threshold,
                    aliases = reload.aliases.len(),
                    "Applied reloaded configuration"
                );
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a handle to the live config.
    pub fn config(&self) -> &SharedConfig {
        &self.config
    }
}

/// Build an inspector reading thresholds, aliases and the log directory from
/// the live config.
pub fn inspector_for(config: &SharedConfig) -> ResponseInspector {
    let shared = Arc::new(config.clone());
    ResponseInspector::new(shared.clone(), shared.clone(), LogRotator::new(shared))
}

/// Forward the request to the upstream, or echo it when none is configured.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let method = request.method().to_string();

    let Some(upstream) = state.config.load().upstream.clone() else {
        let body = format!("{} {}\n", method, request.uri().path());
        metrics::record_request(&method, 200, start_time);
        return (StatusCode::OK, body).into_response();
    };

    let (mut parts, body) = request.into_parts();
    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    parts.uri = match format!("http://{}{}", upstream.address, path_and_query).parse::<Uri>() {
        Ok(uri) => uri,
        Err(e) => {
            tracing::error!(upstream = %upstream.address, error = %e, "Invalid upstream URI");
            metrics::record_request(&method, 502, start_time);
            return (StatusCode::BAD_GATEWAY, "Invalid upstream").into_response();
        }
    };

    match state.client.request(Request::from_parts(parts, body)).await {
        Ok(response) => {
            metrics::record_request(&method, response.status().as_u16(), start_time);
            let (parts, body) = response.into_parts();
            Response::from_parts(parts, Body::new(body))
        }
        Err(e) => {
            tracing::error!(upstream = %upstream.address, error = %e, "Upstream error");
            metrics::record_request(&method, 502, start_time);
            (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
        }
    }
}
