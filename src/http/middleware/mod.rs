//! Axum middleware.

pub mod large_headers;

pub use large_headers::inspect_response_headers;
