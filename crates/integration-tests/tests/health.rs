//! Health checks and the outer middleware stack.

#![allow(clippy::unwrap_used)]

use axum::http::{StatusCode, header};
use tower::ServiceExt;

use shopx_integration_tests::{request, test_app, test_state};

#[tokio::test]
async fn test_liveness() {
    let response = test_app(test_state())
        .oneshot(request("GET", "/health", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), 64).await.unwrap();
    assert_eq!(&body[..], b"ok");
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let response = test_app(test_state())
        .oneshot(request("GET", "/api/does-not-exist", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_request_id_is_generated_and_echoed() {
    let generated = test_app(test_state())
        .oneshot(request("GET", "/health", None))
        .await
        .unwrap();
    assert!(generated.headers().contains_key("x-request-id"));

    let mut req = request("GET", "/health", None);
    req.headers_mut()
        .insert("x-request-id", "edge-1234".parse().unwrap());
    let echoed = test_app(test_state()).oneshot(req).await.unwrap();
    assert_eq!(echoed.headers().get("x-request-id").unwrap(), "edge-1234");
}

#[tokio::test]
async fn test_security_headers_on_errors_too() {
    let response = test_app(test_state())
        .oneshot(request("GET", "/api/cart", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let headers = response.headers();
    assert_eq!(headers.get(header::X_CONTENT_TYPE_OPTIONS).unwrap(), "nosniff");
    assert_eq!(headers.get(header::X_FRAME_OPTIONS).unwrap(), "DENY");
}

#[tokio::test]
async fn test_cors_allows_configured_origin() {
    let mut req = request("GET", "/health", None);
    req.headers_mut()
        .insert(header::ORIGIN, "https://shop.example.com".parse().unwrap());
    let response = test_app(test_state()).oneshot(req).await.unwrap();
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "https://shop.example.com"
    );
}
