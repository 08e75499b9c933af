use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::config::{SharedConfig, ThresholdConfig};
use crate::inspect::LogRotator;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub log_file: Option<String>,
}

pub async fn get_status(State(config): State<SharedConfig>) -> Json<SystemStatus> {
    let log_file = LogRotator::new(Arc::new(config))
        .resolve_log_file_location()
        .map(|p| p.display().to_string());

    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        log_file,
    })
}

pub async fn get_thresholds(State(config): State<SharedConfig>) -> Json<ThresholdConfig> {
    Json(config.load().thresholds)
}

/// Replace all three thresholds. Values may be numbers or strings; anything
/// non-numeric becomes 0, missing fields take their defaults.
pub async fn put_thresholds(
    State(config): State<SharedConfig>,
    Json(thresholds): Json<ThresholdConfig>,
) -> Json<ThresholdConfig> {
    config.set_thresholds(thresholds);
    tracing::info!(
        length_threshold = thresholds.length_threshold,
        total_data_threshold = thresholds.total_data_threshold,
        num_headers_threshold = thresholds.num_headers_threshold,
        "Thresholds updated via admin endpoint"
    );
    Json(thresholds)
}
