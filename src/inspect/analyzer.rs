//! Threshold evaluation over a response's header set.
//!
//! # Responsibilities
//! - Join multi-valued headers and measure each one
//! - Count distinct headers
//! - Serialize the whole header block for the diagnostic log
//!
//! # Design Decisions
//! - Pure function of headers + thresholds, no I/O
//! - Reasons are independent flags, each recorded at most once
//! - Values are kept as raw bytes and measured as sent on the wire; only the
//!   text dump is converted lossily

use std::fmt;

use axum::http::HeaderMap;

use crate::config::ThresholdConfig;

/// Why a response was flagged. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reason {
    /// At least one joined header value is longer than `length_threshold`.
    OneOrMoreLargeHeaders,
    /// More distinct headers than `num_headers_threshold`.
    TooManyHeaders,
    /// Serialized header block longer than `total_data_threshold`.
    LargeCombinedHeaderSize,
}

impl Reason {
    /// Key written to the log and used as a metrics label.
    pub fn key(&self) -> &'static str {
        match self {
            Reason::OneOrMoreLargeHeaders => "one_or_more_large_headers",
            Reason::TooManyHeaders => "too_many_headers",
            Reason::LargeCombinedHeaderSize => "large_combined_header_size",
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Ordered mapping of header name to one or more values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSet {
    entries: Vec<(String, Vec<Vec<u8>>)>,
}

impl HeaderSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value. Values for a name already present are appended to that
    /// entry, keeping its original position.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<Vec<u8>>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(&name)) {
            Some((_, values)) => values.push(value),
            None => self.entries.push((name, vec![value])),
        }
    }

    /// Builder-style [`push`](Self::push).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.push(name, value);
        self
    }

    /// Convert an HTTP header map. Names come out lowercase, as `http` stores them.
    pub fn from_header_map(map: &HeaderMap) -> Self {
        let mut set = Self::new();
        for name in map.keys() {
            let values = map
                .get_all(name)
                .iter()
                .map(|v| v.as_bytes().to_vec())
                .collect();
            set.entries.push((name.as_str().to_string(), values));
        }
        set
    }

    /// First value of a header, case-insensitive on the name. `None` when
    /// absent or not valid UTF-8.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .and_then(|(_, values)| values.first())
            .and_then(|v| std::str::from_utf8(v).ok())
    }

    /// Number of distinct header names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Vec<u8>])> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_slice()))
    }
}

/// Outcome of [`analyze`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisResult {
    reasons: Vec<Reason>,
    serialized_headers: String,
}

impl AnalysisResult {
    /// Reasons in the order they first triggered.
    pub fn reasons(&self) -> &[Reason] {
        &self.reasons
    }

    pub fn is_flagged(&self) -> bool {
        !self.reasons.is_empty()
    }

    pub fn contains(&self, reason: Reason) -> bool {
        self.reasons.contains(&reason)
    }

    /// `"name: value\n"` for every header, in header-set order.
    pub fn serialized_headers(&self) -> &str {
        &self.serialized_headers
    }

    /// Reason keys joined with `separator`.
    pub fn reason_keys(&self, separator: &str) -> String {
        self.reasons
            .iter()
            .map(Reason::key)
            .collect::<Vec<_>>()
            .join(separator)
    }

    fn flag(&mut self, reason: Reason) {
        if !self.reasons.contains(&reason) {
            self.reasons.push(reason);
        }
    }
}

/// Evaluate a header set against the three thresholds.
pub fn analyze(headers: &HeaderSet, thresholds: &ThresholdConfig) -> AnalysisResult {
    let mut result = AnalysisResult {
        reasons: Vec::new(),
        serialized_headers: String::new(),
    };
    let mut serialized: Vec<u8> = Vec::new();

    for (name, values) in headers.iter() {
        let value = values.join(&b' ');
        if value.len() as u64 > thresholds.length_threshold {
            result.flag(Reason::OneOrMoreLargeHeaders);
        }
        serialized.extend_from_slice(name.as_bytes());
        serialized.extend_from_slice(b": ");
        serialized.extend_from_slice(&value);
        serialized.push(b'\n');
    }

    if headers.len() as u64 > thresholds.num_headers_threshold {
        result.flag(Reason::TooManyHeaders);
    }
    if serialized.len() as u64 > thresholds.total_data_threshold {
        result.flag(Reason::LargeCombinedHeaderSize);
    }

    result.serialized_headers = String::from_utf8_lossy(&serialized).into_owned();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn thresholds(length: u64, total: u64, count: u64) -> ThresholdConfig {
        ThresholdConfig {
            length_threshold: length,
            total_data_threshold: total,
            num_headers_threshold: count,
        }
    }

    fn small_headers() -> HeaderSet {
        HeaderSet::new()
            .with("content-type", "text/html; charset=UTF-8")
            .with("cache-control", "no-cache, private")
            .with("date", "Mon, 19 Oct 2026 10:00:00 GMT")
            .with("x-frame-options", "SAMEORIGIN")
    }

    #[test]
    fn test_within_thresholds_is_clean() {
        let result = analyze(&small_headers(), &thresholds(100, 10_000, 30));
        assert!(!result.is_flagged());
        assert_eq!(result.reason_keys(" "), "");
    }

    #[test]
    fn test_serialization_format_and_order() {
        let headers = HeaderSet::new().with("b", "2").with("a", "1").with("b", "3");
        let result = analyze(&headers, &thresholds(100, 10_000, 30));
        assert_eq!(result.serialized_headers(), "b: 2 3\na: 1\n");
    }

    #[test]
    fn test_large_header_flagged_once() {
        let headers = small_headers()
            .with("set-cookie", "a".repeat(150))
            .with("x-debug", "b".repeat(200));
        let result = analyze(&headers, &thresholds(100, 10_000, 30));
        assert_eq!(result.reasons(), &[Reason::OneOrMoreLargeHeaders]);
    }

    #[test]
    fn test_length_is_measured_after_join() {
        // Two 60-byte cookies join into 121 bytes.
        let headers = HeaderSet::new()
            .with("set-cookie", "c".repeat(60))
            .with("set-cookie", "d".repeat(60));
        let result = analyze(&headers, &thresholds(120, 10_000, 30));
        assert!(result.contains(Reason::OneOrMoreLargeHeaders));

        let result = analyze(&headers, &thresholds(121, 10_000, 30));
        assert!(!result.is_flagged());
    }

    #[test]
    fn test_length_threshold_is_strict() {
        let headers = HeaderSet::new().with("x-exact", "e".repeat(100));
        assert!(!analyze(&headers, &thresholds(100, 10_000, 30)).is_flagged());
        assert!(analyze(&headers, &thresholds(99, 10_000, 30)).is_flagged());
    }

    #[test]
    fn test_too_many_headers() {
        let mut headers = HeaderSet::new();
        for i in 0..31 {
            headers.push(format!("x-h{}", i), "v");
        }
        let result = analyze(&headers, &thresholds(100, 10_000, 30));
        assert_eq!(result.reasons(), &[Reason::TooManyHeaders]);

        let result = analyze(&headers, &thresholds(100, 10_000, 31));
        assert!(!result.is_flagged());
    }

    #[test]
    fn test_multi_valued_header_counts_once() {
        let headers = HeaderSet::new()
            .with("set-cookie", "a=1")
            .with("set-cookie", "b=2")
            .with("set-cookie", "c=3");
        let result = analyze(&headers, &thresholds(100, 10_000, 1));
        assert!(!result.contains(Reason::TooManyHeaders));
    }

    #[test]
    fn test_combined_size() {
        let headers = small_headers();
        let total = analyze(&headers, &thresholds(100, 10_000, 30))
            .serialized_headers()
            .len() as u64;

        assert!(!analyze(&headers, &thresholds(100, total, 30)).is_flagged());
        let result = analyze(&headers, &thresholds(100, total - 1, 30));
        assert_eq!(result.reasons(), &[Reason::LargeCombinedHeaderSize]);
    }

    #[test]
    fn test_all_reasons_combine() {
        let mut headers = HeaderSet::new().with("set-cookie", "z".repeat(500));
        for i in 0..5 {
            headers.push(format!("x-h{}", i), "v");
        }
        let result = analyze(&headers, &thresholds(100, 200, 3));
        assert_eq!(
            result.reasons(),
            &[
                Reason::OneOrMoreLargeHeaders,
                Reason::TooManyHeaders,
                Reason::LargeCombinedHeaderSize
            ]
        );
        assert_eq!(
            result.reason_keys(","),
            "one_or_more_large_headers,too_many_headers,large_combined_header_size"
        );
    }

    #[test]
    fn test_set_cookie_example() {
        let headers = HeaderSet::new()
            .with("content-type", "text/html")
            .with("cache-control", "no-cache")
            .with("date", "Mon, 19 Oct 2026 10:00:00 GMT")
            .with("x-frame-options", "DENY")
            .with("set-cookie", "s".repeat(150));
        let result = analyze(&headers, &thresholds(100, 10_000, 30));
        assert_eq!(result.reason_keys(" "), "one_or_more_large_headers");
    }

    #[test]
    fn test_from_header_map_groups_values() {
        let mut map = HeaderMap::new();
        map.append("set-cookie", HeaderValue::from_static("a=1"));
        map.insert("content-type", HeaderValue::from_static("text/plain"));
        map.append("set-cookie", HeaderValue::from_static("b=2"));

        let set = HeaderSet::from_header_map(&map);
        assert_eq!(set.len(), 2);
        assert_eq!(set.first("Set-Cookie"), Some("a=1"));

        let result = analyze(&set, &thresholds(100, 10_000, 30));
        assert!(result.serialized_headers().contains("set-cookie: a=1 b=2\n"));
    }

    #[test]
    fn test_non_utf8_values_measured_by_wire_bytes() {
        let mut map = HeaderMap::new();
        map.insert("x-legacy", HeaderValue::from_bytes(&[0xE9; 100]).unwrap());
        let set = HeaderSet::from_header_map(&map);
        assert_eq!(set.first("x-legacy"), None);

        // "x-legacy: " + 100 bytes + "\n" is 111 bytes on the wire.
        let result = analyze(&set, &thresholds(100, 111, 30));
        assert!(!result.is_flagged());

        let result = analyze(&set, &thresholds(99, 110, 30));
        assert_eq!(
            result.reasons(),
            &[Reason::OneOrMoreLargeHeaders, Reason::LargeCombinedHeaderSize]
        );
        assert!(result.serialized_headers().starts_with("x-legacy: \u{FFFD}"));
    }
}
