//! Headers applied to every response.
//!
//! API JSON is never cached. Model and image artifacts are revalidated on
//! every use: a finished reconstruction replaces what `/api/model` returns.

use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE, PRAGMA};
use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};

pub async fn response_headers_middleware(req: Request, next: Next) -> Response {
    let mut res = next.run(req).await;
    let headers = res.headers_mut();

    headers.insert(HeaderName::from_static("x-content-type-options"), HeaderValue::from_static("nosniff"));
    headers.insert(HeaderName::from_static("referrer-policy"), HeaderValue::from_static("no-referrer"));

    let ct_val: Option<String> = headers.get(CONTENT_TYPE).and_then(|ct| {
        ct.to_str()
            .map_err(|e| {
                tracing::warn!("Invalid UTF-8 in Content-Type header: {}", e);
                e
            })
            .ok()
            .map(|s| s.to_string())
    });
    if let Some(s) = ct_val.as_deref() {
        if s.starts_with("application/json") {
            headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
            headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
        } else if s.starts_with("model/") || s.starts_with("image/") {
            headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        }
    }

    res
}
