//! Axum router and the forwarding handler.
//!
//! `build_router` returns the bare router; `main.rs` attaches the CORS and
//! tracing layers so the scenario tests can compose them explicitly.

use std::error::Error as _;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{header, HeaderMap, HeaderName, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, warn};

use crate::state::RelayState;

/// Forwarded request bodies are capped; the intranet payloads are small.
const BODY_LIMIT: usize = 10 * 1024 * 1024;

/// Hop-by-hop headers are meaningful per connection only and must not be
/// forwarded in either direction (RFC 9110 §7.6.1).
const HOP_BY_HOP: &[HeaderName] = &[
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the relay router wired to the given shared state.
pub fn build_router(state: Arc<RelayState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .fallback(forward)
        .with_state(state)
}

/// Permissive CORS for the web build; preflight is answered locally.
pub fn cors_permissive() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

// ---------------------------------------------------------------------------
// GET /healthz
// ---------------------------------------------------------------------------

async fn healthz() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "ok": true,
            "service": "epicheck-relay",
            "version": env!("CARGO_PKG_VERSION"),
        })),
    )
}

// ---------------------------------------------------------------------------
// Fallback: forward everything else
// ---------------------------------------------------------------------------

/// Forward the request verbatim to the upstream and relay the answer.
///
/// Upstream failures map to `502 Bad Gateway`; the relay never retries.
async fn forward(State(st): State<Arc<RelayState>>, req: Request) -> Response {
    let (parts, body) = req.into_parts();

    let bytes = match to_bytes(body, BODY_LIMIT).await {
        Ok(b) => b,
        Err(e) if is_length_limit(&e) => {
            return (StatusCode::PAYLOAD_TOO_LARGE, "request body too large").into_response()
        }
        Err(e) => {
            warn!(error = %e, "request body read failed");
            return (StatusCode::BAD_REQUEST, "request body read failed").into_response();
        }
    };

    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let url = format!("{}{}", st.upstream, path_and_query);
    debug!(method = %parts.method, %url, "forwarding");

    let upstream = st
        .http
        .request(parts.method, url)
        .headers(strip_request_headers(&parts.headers))
        .body(bytes.to_vec())
        .send()
        .await;

    let upstream = match upstream {
        Ok(r) => r,
        Err(e) => {
            warn!(error = %e, "upstream unreachable");
            return (StatusCode::BAD_GATEWAY, format!("upstream unreachable: {e}"))
                .into_response();
        }
    };

    let status = upstream.status();
    let resp_headers = strip_response_headers(upstream.headers());
    let resp_body = upstream.bytes().await.unwrap_or_default();

    let mut response = Response::new(Body::from(resp_body));
    *response.status_mut() = status;
    *response.headers_mut() = resp_headers;
    response
}

/// `to_bytes` reports an over-limit body and a connection dropped mid-read
/// through the same error type; only the former is the client's fault for
/// sending too much.
fn is_length_limit(err: &axum::Error) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = source {
        if e.is::<http_body_util::LengthLimitError>() {
            return true;
        }
        source = e.source();
    }
    false
}

/// Drop hop-by-hop headers plus `host` and `content-length` (both are set
/// by the upstream client itself).
fn strip_request_headers(headers: &HeaderMap) -> HeaderMap {
    let mut out = HeaderMap::new();
    for (name, value) in headers {
        if HOP_BY_HOP.contains(name) || name == &header::HOST || name == &header::CONTENT_LENGTH {
            continue;
        }
        out.append(name.clone(), value.clone());
    }
    out
}

/// Drop hop-by-hop headers, `content-length` (the relay re-frames the
/// body), and any upstream CORS headers — the relay's own CORS layer is
/// authoritative and duplicates break browsers.
fn strip_response_headers(headers: &HeaderMap) -> HeaderMap {
    let mut out = HeaderMap::new();
    for (name, value) in headers {
        if HOP_BY_HOP.contains(name) || name == &header::CONTENT_LENGTH {
            continue;
        }
        if name.as_str().starts_with("access-control-") {
            continue;
        }
        out.append(name.clone(), value.clone());
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
