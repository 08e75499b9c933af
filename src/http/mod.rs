//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, tracing, timeout)
//!     → middleware/large_headers.rs (capture request method/path/headers)
//!     → proxy handler (forward to upstream, or echo)
//!     → middleware/large_headers.rs (inspect response headers)
//!     → Send to client
//! ```

pub mod middleware;
pub mod server;

pub use server::HttpServer;
