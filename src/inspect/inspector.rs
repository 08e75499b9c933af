//! Per-response orchestration.
//!
//! # State Machine
//! ```text
//! Unobserved ──analyze──▶ no reasons ─────────────────────▶ Clean
//!                    │
//!                    └──▶ reasons ──guard set?──yes──────▶ AlreadyLogged
//!                                       │
//!                                       no
//!                                       ▼
//!                      resolve identity, set guard, write both sinks ──▶ Logged
//! ```
//!
//! The guard lives on the [`ResponseEvent`], so concurrent events on other
//! tasks never share it.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::inspect::analyzer::{analyze, AnalysisResult, HeaderSet};
use crate::inspect::identity::{RequestIdentity, RequestInfo};
use crate::inspect::rotator::LogRotator;
use crate::inspect::{AliasResolver, ThresholdProvider};
use crate::observability::metrics;

/// Tracing target for detection events.
pub const LOG_TARGET: &str = "largeheaders";

/// Separator line closing every log record.
pub const RECORD_SEPARATOR: &str = "----------------------------";

/// A finalized response about to be sent, plus its originating request.
#[derive(Debug, Clone)]
pub struct ResponseEvent {
    pub request: RequestInfo,
    pub response_headers: HeaderSet,
    identity: Option<RequestIdentity>,
}

impl ResponseEvent {
    pub fn new(request: RequestInfo, response_headers: HeaderSet) -> Self {
        Self {
            request,
            response_headers,
            identity: None,
        }
    }

    /// Identity resolved while reporting this event, if it was flagged.
    pub fn identity(&self) -> Option<&RequestIdentity> {
        self.identity.as_ref()
    }
}

/// What [`ResponseInspector::handle`] did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inspection {
    /// Headers within every threshold.
    Clean,
    /// Flagged and reported.
    Logged,
    /// Flagged, but this event was already reported.
    AlreadyLogged,
}

/// Inspects response headers and reports anomalies.
pub struct ResponseInspector {
    thresholds: Arc<dyn ThresholdProvider>,
    aliases: Arc<dyn AliasResolver>,
    rotator: LogRotator,
}

impl ResponseInspector {
    pub fn new(
        thresholds: Arc<dyn ThresholdProvider>,
        aliases: Arc<dyn AliasResolver>,
        rotator: LogRotator,
    ) -> Self {
        Self {
            thresholds,
            aliases,
            rotator,
        }
    }

    /// Inspect one response event. Never fails and never touches the response.
    pub fn handle(&self, event: &mut ResponseEvent) -> Inspection {
        let thresholds = self.thresholds.thresholds();
        let result = analyze(&event.response_headers, &thresholds);
        metrics::record_inspected();

        if !result.is_flagged() {
            return Inspection::Clean;
        }

        // Do not log the same event twice.
        if event.identity.is_some() {
            return Inspection::AlreadyLogged;
        }

        let identity = RequestIdentity::resolve(&event.request, self.aliases.as_ref());
        let record = format_record(Utc::now(), &identity, &result);

        self.rotator.append_to_log(&record);

        tracing::error!(
            target: LOG_TARGET,
            request = %identity.request_line(),
            uuid = %identity.uuid,
            reasons = %result.reason_keys(","),
            "Found large header(s)"
        );
        for reason in result.reasons() {
            metrics::record_flagged(reason.key());
        }

        event.identity = Some(identity);
        Inspection::Logged
    }
}

/// Render the plain-text log record for a flagged response.
pub fn format_record(timestamp: DateTime<Utc>, identity: &RequestIdentity, result: &AnalysisResult) -> String {
    format!(
        "{}\n Request UUID: {}\n Request: {}\n Reasons: {}\n Headers:\n\n{}\n\n{}\n",
        timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
        identity.uuid,
        identity.request_line(),
        result.reason_keys(" "),
        result.serialized_headers(),
        RECORD_SEPARATOR,
    )
}
