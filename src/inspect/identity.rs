//! Request identity for flagged responses.
//!
//! The UUID comes from the client's correlation header when present so log
//! lines can be tied to upstream traces. Otherwise it is derived from the
//! current timestamp at nanosecond resolution.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::inspect::analyzer::HeaderSet;
use crate::inspect::AliasResolver;

/// Correlation header consulted before synthesizing an identifier.
pub const CORRELATION_HEADER: &str = "x-request-id";

/// The inbound side of a response event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestInfo {
    pub method: String,
    /// Physical request path, before alias resolution.
    pub path: String,
    pub headers: HeaderSet,
}

/// Who the flagged response was for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestIdentity {
    pub uuid: String,
    pub method: String,
    /// Alias-resolved logical path.
    pub path: String,
}

impl RequestIdentity {
    /// Resolve the identity of `request` at the current time.
    pub fn resolve(request: &RequestInfo, aliases: &dyn AliasResolver) -> Self {
        Self::resolve_at(request, aliases, Utc::now())
    }

    /// Resolve the identity of `request`, synthesizing from `now` if needed.
    pub fn resolve_at(request: &RequestInfo, aliases: &dyn AliasResolver, now: DateTime<Utc>) -> Self {
        let uuid = match request.headers.first(CORRELATION_HEADER) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => uuid_from_timestamp(now),
        };

        Self {
            uuid,
            method: request.method.clone(),
            path: aliases.resolve_alias(&request.path),
        }
    }

    /// `"METHOD PATH"`.
    pub fn request_line(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

/// UUID-shaped hash of a timestamp.
pub fn uuid_from_timestamp(ts: DateTime<Utc>) -> String {
    let stamp = format!("{}.{:09}", ts.timestamp(), ts.timestamp_subsec_nanos());
    Uuid::new_v5(&Uuid::NAMESPACE_OID, stamp.as_bytes()).to_string()
}
