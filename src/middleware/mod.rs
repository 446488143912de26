//! Middleware for HTTP request processing.

pub mod response_headers;

pub use response_headers::response_headers_middleware;
