//! Response header inspection middleware.
//!
//! Captures what the inspector needs from the request before it is consumed,
//! runs the inner service, then hands the finalized response headers to the
//! [`ResponseInspector`]. The response is returned untouched.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::inspect::{HeaderSet, RequestInfo, ResponseEvent, ResponseInspector};

pub async fn inspect_response_headers(
    State(inspector): State<Arc<ResponseInspector>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let request_info = RequestInfo {
        method: request.method().to_string(),
        path: request.uri().path().to_string(),
        headers: HeaderSet::from_header_map(request.headers()),
    };

    let response = next.run(request).await;

    let mut event = ResponseEvent::new(request_info, HeaderSet::from_header_map(response.headers()));
    let outcome = inspector.handle(&mut event);
    tracing::trace!(outcome = ?outcome, "Response headers inspected");

    response
}
