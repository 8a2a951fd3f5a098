//! Authentication and role checks on the API router.
//!
//! None of these requests reach the database: extractors reject them first.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use tower::ServiceExt;

use serde_json::json;
use shopx_core::Role;

use shopx_integration_tests::{body_json, json_request, request, test_app, test_state, token_for};

#[tokio::test]
async fn test_protected_routes_require_a_token() {
    for (method, uri) in [
        ("GET", "/api/cart"),
        ("GET", "/api/auth/me"),
        ("GET", "/api/orders/mine"),
        ("GET", "/api/inbox"),
        ("GET", "/api/inbox/unread-count"),
        ("POST", "/api/sellers/convert"),
        ("GET", "/api/users"),
        ("GET", "/api/statistics/dashboard"),
    ] {
        let response = test_app(test_state())
            .oneshot(request(method, uri, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{method} {uri}");
    }
}

#[tokio::test]
async fn test_unauthorized_body_is_json_error() {
    let response = test_app(test_state())
        .oneshot(request("GET", "/api/cart", None))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_garbage_token_is_rejected() {
    let response = test_app(test_state())
        .oneshot(request("GET", "/api/cart", Some("not.a.jwt")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_from_another_key_is_rejected() {
    let other = shopx_server::services::auth::JwtService::new(
        "a-completely-different-signing-key-987654",
        "shopx",
        chrono::Duration::minutes(5),
    );
    let (token, _) = other
        .create_token(&shopx_integration_tests::user_with_role(Role::Admin))
        .unwrap();

    let response = test_app(test_state())
        .oneshot(request("GET", "/api/users", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_routes_forbid_other_roles() {
    let state = test_state();
    for role in [Role::Customer, Role::Seller] {
        let token = token_for(&state, role);
        for (method, uri) in [
            ("GET", "/api/users"),
            ("GET", "/api/orders"),
            ("GET", "/api/discounts"),
            ("GET", "/api/contacts"),
            ("GET", "/api/notifications"),
            ("GET", "/api/reports/monthly?year=2026"),
            ("DELETE", "/api/categories/3"),
        ] {
            let response = test_app(state.clone())
                .oneshot(request(method, uri, Some(&token)))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::FORBIDDEN, "{role} {method} {uri}");
        }
    }
}

#[tokio::test]
async fn test_seller_routes_forbid_customers() {
    let state = test_state();
    let token = token_for(&state, Role::Customer);
    for (method, uri) in [
        ("GET", "/api/statistics/dashboard"),
        ("GET", "/api/statistics/order-status"),
        ("GET", "/api/products/mine"),
        ("GET", "/api/seller-categories"),
        ("GET", "/api/orders/seller"),
        ("DELETE", "/api/products/1"),
    ] {
        let response = test_app(state.clone())
            .oneshot(request(method, uri, Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{method} {uri}");
    }
}

#[tokio::test]
async fn test_auth_check_reports_token_state() {
    let state = test_state();

    let anonymous = test_app(state.clone())
        .oneshot(request("GET", "/api/auth/check", None))
        .await
        .unwrap();
    assert_eq!(anonymous.status(), StatusCode::OK);
    assert_eq!(body_json(anonymous).await["authenticated"], false);

    let token = token_for(&state, Role::Seller);
    let signed_in = test_app(state)
        .oneshot(request("GET", "/api/auth/check", Some(&token)))
        .await
        .unwrap();
    assert_eq!(signed_in.status(), StatusCode::OK);
    let body = body_json(signed_in).await;
    assert_eq!(body["authenticated"], true);
    assert_eq!(body["role"], "seller");
    assert_eq!(body["seller_id"], 7);
}

#[tokio::test]
async fn test_role_is_checked_before_the_body() {
    let state = test_state();
    let token = token_for(&state, Role::Customer);
    let body = json!({ "name": "Lamps", "price": "10.00", "stock_quantity": 1, "category_id": 1 });

    for uri in ["/api/products", "/api/categories"] {
        let response = test_app(state.clone())
            .oneshot(json_request("POST", uri, Some(&token), &body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{uri}");
    }
}

#[tokio::test]
async fn test_malformed_body_is_rejected_before_the_database() {
    let response = test_app(test_state())
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            None,
            &json!({ "email": "someone@example.com" }),
        ))
        .await
        .unwrap();
    assert!(response.status().is_client_error());
}
