//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! inspector. All types derive Serde traits for deserialization from config
//! files.

use std::collections::HashMap;

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

/// Root configuration for the large header inspector.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct LargeHeadersConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Upstream the server forwards to. `None` serves the echo handler.
    pub upstream: Option<UpstreamConfig>,

    /// Detection thresholds.
    pub thresholds: ThresholdConfig,

    /// Diagnostic log file settings.
    pub log: LogConfig,

    /// Physical path → logical path aliases.
    pub aliases: HashMap<String, String>,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin endpoint settings.
    pub admin: AdminConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Upstream server the inspected responses come from.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    /// Upstream address (e.g., "127.0.0.1:3000").
    pub address: String,
}

/// Thresholds used to classify response headers as anomalous.
///
/// Any value type is accepted and coerced the way an integer cast would:
/// strings by their leading digits, booleans to 0 or 1, anything else to 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ThresholdConfig {
    /// Maximum length of a single (joined) header value, in bytes.
    #[serde(deserialize_with = "deserialize_threshold")]
    pub length_threshold: u64,

    /// Maximum size of the serialized header block, in bytes.
    #[serde(deserialize_with = "deserialize_threshold")]
    pub total_data_threshold: u64,

    /// Maximum number of distinct headers.
    #[serde(deserialize_with = "deserialize_threshold")]
    pub num_headers_threshold: u64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            length_threshold: 5000,
            total_data_threshold: 10_000,
            num_headers_threshold: 30,
        }
    }
}

/// Diagnostic log file configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct LogConfig {
    /// Directory holding `largeheaders.log`. Defaults to the system temp dir.
    pub directory: Option<String>,
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable the admin endpoint.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin endpoint bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}

/// Raw threshold as it may appear in a config file or admin request.
///
/// Every value type is accepted; `Other` catches null, arrays and tables.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawThreshold {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    Other(IgnoredAny),
}

impl RawThreshold {
    /// Coerce to a non-negative integer. Never fails.
    pub fn coerce(&self) -> u64 {
        match self {
            RawThreshold::Int(v) => (*v).max(0) as u64,
            RawThreshold::Float(v) if v.is_finite() && *v > 0.0 => v.trunc() as u64,
            RawThreshold::Float(_) => 0,
            RawThreshold::Bool(b) => u64::from(*b),
            RawThreshold::Text(s) => coerce_threshold(s),
            RawThreshold::Other(_) => 0,
        }
    }
}

/// Integer-cast semantics for a textual threshold.
///
/// Leading whitespace is skipped, an optional sign is honoured and the
/// leading run of digits is used. Anything non-numeric yields 0, as does a
/// negative value.
pub fn coerce_threshold(raw: &str) -> u64 {
    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let mut value: u64 = 0;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        value = value.saturating_mul(10).saturating_add(u64::from(b - b'0'));
    }

    if negative {
        0
    } else {
        value
    }
}

fn deserialize_threshold<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    RawThreshold::deserialize(deserializer).map(|raw| raw.coerce())
}
