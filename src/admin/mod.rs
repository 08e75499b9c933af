//! Admin endpoint for viewing and changing detection thresholds.
//!
//! All routes require `Authorization: Bearer <admin.api_key>`.

pub mod auth;
pub mod handlers;

use axum::{middleware, routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::config::SharedConfig;
use self::auth::admin_auth_middleware;
use self::handlers::{get_status, get_thresholds, put_thresholds};

pub fn setup_admin_router(config: SharedConfig) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/thresholds", get(get_thresholds).put(put_thresholds))
        .layer(middleware::from_fn_with_state(config.clone(), admin_auth_middleware))
        .with_state(config)
}

/// Serve the admin router until `shutdown` fires.
pub async fn run_admin(
    listener: TcpListener,
    config: SharedConfig,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<(), std::io::Error> {
    tracing::info!(address = %listener.local_addr()?, "Admin endpoint starting");
    axum::serve(listener, setup_admin_router(config))
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await
}
