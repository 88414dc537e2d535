//! In-process relay scenarios: the Axum router is driven via
//! `tower::ServiceExt::oneshot` against an httpmock upstream — no relay
//! socket is bound.

use std::sync::Arc;

use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use httpmock::prelude::*;
use serde_json::json;
use tower::ServiceExt; // oneshot

use epicheck_relay::{routes, state::RelayState};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn make_router(upstream: &str) -> axum::Router {
    let st = Arc::new(RelayState::new(upstream).expect("state builds"));
    routes::build_router(st)
}

async fn call(router: axum::Router, req: Request<axum::body::Body>) -> (StatusCode, bytes::Bytes) {
    let resp = router.oneshot(req).await.expect("oneshot failed");
    let status = resp.status();
    let body = resp
        .into_body()
        .collect()
        .await
        .expect("body collect failed")
        .to_bytes();
    (status, body)
}

// ---------------------------------------------------------------------------
// GET /healthz
// ---------------------------------------------------------------------------

#[tokio::test]
async fn healthz_answers_locally_without_upstream() {
    let router = make_router("http://127.0.0.1:9");
    let req = Request::builder()
        .method("GET")
        .uri("/healthz")
        .body(axum::body::Body::empty())
        .unwrap();

    let (status, body) = call(router, req).await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["ok"], true);
    assert_eq!(json["service"], "epicheck-relay");
}

// ---------------------------------------------------------------------------
// Forwarding
// ---------------------------------------------------------------------------

#[tokio::test]
async fn get_is_forwarded_with_path_and_query() {
    let upstream = MockServer::start_async().await;
    let mock = upstream
        .mock_async(|when, then| {
            when.method(GET)
                .path("/auth-tok123/planning/load")
                .query_param("format", "json");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!([{"codeacti": "acti-1"}]));
        })
        .await;

    let router = make_router(&upstream.base_url());
    let req = Request::builder()
        .method("GET")
        .uri("/auth-tok123/planning/load?format=json")
        .body(axum::body::Body::empty())
        .unwrap();

    let (status, body) = call(router, req).await;
    mock.assert_async().await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json[0]["codeacti"], "acti-1");
}

#[tokio::test]
async fn post_body_and_content_type_are_forwarded_verbatim() {
    let upstream = MockServer::start_async().await;
    let mock = upstream
        .mock_async(|when, then| {
            when.method(POST)
                .path("/module/2025/B-INN-000/PAR-0-1/acti-1/event-1/updateregistered")
                .header("content-type", "application/x-www-form-urlencoded")
                .body("items%5B0%5D%5Blogin%5D=marie.curie&items%5B0%5D%5Bpresent%5D=present");
            then.status(200).json_body(json!({"ok": true}));
        })
        .await;

    let router = make_router(&upstream.base_url());
    let req = Request::builder()
        .method("POST")
        .uri("/module/2025/B-INN-000/PAR-0-1/acti-1/event-1/updateregistered")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(axum::body::Body::from(
            "items%5B0%5D%5Blogin%5D=marie.curie&items%5B0%5D%5Bpresent%5D=present",
        ))
        .unwrap();

    let (status, _) = call(router, req).await;
    mock.assert_async().await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn upstream_error_status_is_relayed_verbatim() {
    let upstream = MockServer::start_async().await;
    upstream
        .mock_async(|when, then| {
            when.method(GET).path("/user/");
            then.status(403).body("forbidden");
        })
        .await;

    let router = make_router(&upstream.base_url());
    let req = Request::builder()
        .method("GET")
        .uri("/user/")
        .body(axum::body::Body::empty())
        .unwrap();

    let (status, body) = call(router, req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(&body[..], b"forbidden");
}

#[tokio::test]
async fn unreachable_upstream_is_bad_gateway() {
    // Nothing listens on this port.
    let router = make_router("http://127.0.0.1:9");
    let req = Request::builder()
        .method("GET")
        .uri("/user/")
        .body(axum::body::Body::empty())
        .unwrap();

    let (status, _) = call(router, req).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn oversized_body_is_payload_too_large() {
    // Fails before any upstream contact; nothing listens on this port.
    let router = make_router("http://127.0.0.1:9");
    let req = Request::builder()
        .method("POST")
        .uri("/module/2025/B-INN-000/PAR-0-1/acti-1/event-1/updateregistered")
        .body(axum::body::Body::from(vec![0u8; 10 * 1024 * 1024 + 1]))
        .unwrap();

    let (status, _) = call(router, req).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn interrupted_body_read_is_a_client_error_not_too_large() {
    let router = make_router("http://127.0.0.1:9");
    let chunks: Vec<Result<&'static [u8], std::io::Error>> = vec![
        Ok(b"items%5B0%5D".as_slice()),
        Err(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "client went away",
        )),
    ];
    let req = Request::builder()
        .method("POST")
        .uri("/module/2025/B-INN-000/PAR-0-1/acti-1/event-1/updateregistered")
        .body(axum::body::Body::from_stream(futures_util::stream::iter(
            chunks,
        )))
        .unwrap();

    let (status, _) = call(router, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn upstream_cors_headers_are_replaced_not_duplicated() {
    let upstream = MockServer::start_async().await;
    upstream
        .mock_async(|when, then| {
            when.method(GET).path("/user/");
            then.status(200)
                .header("access-control-allow-origin", "https://upstream.example")
                .header("x-request-id", "abc")
                .body("{}");
        })
        .await;

    let router = make_router(&upstream.base_url());
    let req = Request::builder()
        .method("GET")
        .uri("/user/")
        .body(axum::body::Body::empty())
        .unwrap();

    let resp = router.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().get("access-control-allow-origin").is_none());
    assert_eq!(resp.headers().get("x-request-id").unwrap(), "abc");
}

// ---------------------------------------------------------------------------
// CORS preflight (layer applied as in main.rs)
// ---------------------------------------------------------------------------

#[tokio::test]
async fn preflight_is_answered_locally_by_the_cors_layer() {
    let upstream = MockServer::start_async().await;
    let passthrough = upstream
        .mock_async(|when, then| {
            when.path_contains("/");
            then.status(200);
        })
        .await;

    let router = make_router(&upstream.base_url()).layer(routes::cors_permissive());
    let req = Request::builder()
        .method("OPTIONS")
        .uri("/module/2025/B-INN-000/PAR-0-1/acti-1/event-1/updateregistered")
        .header("origin", "http://localhost:5173")
        .header("access-control-request-method", "POST")
        .body(axum::body::Body::empty())
        .unwrap();

    let resp = router.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get("access-control-allow-origin").unwrap(),
        "*"
    );
    // The preflight never reached the upstream.
    passthrough.assert_hits_async(0).await;
}
