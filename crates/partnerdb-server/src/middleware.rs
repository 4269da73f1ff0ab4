//! Request correlation for the partner API.
//!
//! Every request carries an id: the caller's `x-request-id` when it is usable,
//! otherwise a fresh `UUIDv4`. The id is recorded on the request's trace span,
//! handed to handlers as [`RequestId`] for the response `meta`, and echoed back
//! on the response header.

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Caller-supplied ids longer than this are replaced.
const MAX_REQUEST_ID_LEN: usize = 128;

/// Request id stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Accept a caller-supplied id only if it is short, non-blank visible ASCII.
fn usable_request_id(value: &HeaderValue) -> Option<String> {
    let raw = value.to_str().ok()?.trim();
    let valid = !raw.is_empty()
        && raw.len() <= MAX_REQUEST_ID_LEN
        && raw.bytes().all(|b| b.is_ascii_graphic());
    valid.then(|| raw.to_owned())
}

fn resolve_request_id(value: Option<&HeaderValue>) -> String {
    value
        .and_then(usable_request_id)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// Assigns the request id. Runs inside the `http_request` span opened by the
/// trace layer, which declares an empty `request_id` field for it.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = resolve_request_id(req.headers().get(&REQUEST_ID_HEADER));
    tracing::Span::current().record("request_id", id.as_str());

    req.extensions_mut().insert(RequestId(id.clone()));
    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert(REQUEST_ID_HEADER, val);
    }
    res
}
