//! Router-level HTTP tests that never reach the database.
//!
//! Every request here is rejected (or answered) before a handler queries
//! the pool, so the app is built over a lazy pool.

mod helpers;

use axum::body::Body;
use axum::http::{header, Method, StatusCode};
use folio_server::auth::AUTH_COOKIE;
use folio_server::config::Config;
use helpers::{body_to_json, multipart_body, multipart_content_type, Part, TestApp};

fn assert_envelope(body: &serde_json::Value, status: StatusCode, path: &str) {
    assert_eq!(body["statusCode"], status.as_u16());
    assert_eq!(body["path"], path);
    assert!(body["timestamp"].as_str().is_some_and(|t| t.ends_with('Z')));
    assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()));
}

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::lazy();
    let req = TestApp::request(Method::GET, "/health")
        .body(Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_to_json(resp).await["status"], "ok");
}

#[tokio::test]
async fn test_unknown_route_uses_error_envelope() {
    let app = TestApp::lazy();
    let req = TestApp::request(Method::GET, "/nowhere")
        .body(Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        resp.headers()[header::CONTENT_TYPE].to_str().unwrap(),
        "application/json"
    );

    let body = body_to_json(resp).await;
    assert_envelope(&body, StatusCode::NOT_FOUND, "/nowhere");
    assert_eq!(body["message"], "Cannot GET /nowhere");
}

#[tokio::test]
async fn test_wrong_method_is_405_envelope() {
    let app = TestApp::lazy();
    let req = TestApp::request(Method::GET, "/auth/login")
        .body(Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await;
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);

    let body = body_to_json(resp).await;
    assert_envelope(&body, StatusCode::METHOD_NOT_ALLOWED, "/auth/login");
}

#[tokio::test]
async fn test_protected_route_without_cookie_is_401() {
    let app = TestApp::lazy();
    let req = TestApp::request(Method::GET, "/api/users/all")
        .body(Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let body = body_to_json(resp).await;
    assert_envelope(&body, StatusCode::UNAUTHORIZED, "/api/users/all");
}

#[tokio::test]
async fn test_invalid_token_is_401() {
    let app = TestApp::lazy();
    let req = TestApp::request(Method::GET, "/auth/authenticated")
        .header(header::COOKIE, format!("{AUTH_COOKIE}=not-a-token"))
        .body(Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_to_json(resp).await["message"], "Invalid Token");
}

#[tokio::test]
async fn test_token_signed_with_other_secret_is_401() {
    let app = TestApp::lazy();
    let token = folio_server::auth::jwt::generate_token(1, "Mallory", "some-other-secret", 3600)
        .unwrap();
    let req = TestApp::request(Method::GET, "/auth/authenticated")
        .header(header::COOKIE, format!("{AUTH_COOKIE}={token}"))
        .body(Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_valid_session_reaches_session_route() {
    let app = TestApp::lazy();
    let resp = app.send_as(7, Method::GET, "/auth/authenticated").await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_to_json(resp).await["message"], "Authenticated");
}

#[tokio::test]
async fn test_logout_clears_cookie() {
    let app = TestApp::lazy();
    let resp = app.send_as(7, Method::POST, "/auth/logout").await;

    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = resp.headers()[header::SET_COOKIE].to_str().unwrap().to_string();
    assert!(cookie.starts_with(&format!("{AUTH_COOKIE}=")));
    assert!(cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn test_invalid_pagination_is_400() {
    let app = TestApp::lazy();
    let req = TestApp::request(Method::GET, "/api/posts/all?limit=7")
        .body(Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body = body_to_json(resp).await;
    assert_envelope(&body, StatusCode::BAD_REQUEST, "/api/posts/all");
    assert!(body["message"].as_str().unwrap().starts_with("Invalid pagination"));
}

#[tokio::test]
async fn test_overflowing_page_is_400() {
    let app = TestApp::lazy();
    let req = TestApp::request(Method::GET, "/api/posts/all?page=9223372036854775807&limit=100")
        .body(Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_to_json(resp).await;
    assert!(body["message"].as_str().unwrap().starts_with("Invalid pagination"));
}

#[tokio::test]
async fn test_invalid_search_status_is_400() {
    let app = TestApp::lazy();
    let req = TestApp::request(Method::GET, "/api/posts/all?status=deleted")
        .body(Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_non_numeric_post_id_is_400() {
    let app = TestApp::lazy();
    let req = TestApp::request(Method::GET, "/api/posts/post/abc")
        .body(Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_to_json(resp).await["message"],
        "Invalid id: expected a positive integer"
    );
}

#[tokio::test]
async fn test_upload_without_cookie_is_401() {
    let app = TestApp::lazy();
    let body = multipart_body(&[
        Part::Text("title", "Hello"),
        Part::File {
            name: "files",
            file_name: "hello.md",
            content_type: "text/markdown",
            data: "# Hello",
        },
    ]);
    let req = TestApp::request(Method::POST, "/api/posts/upload")
        .header(header::CONTENT_TYPE, multipart_content_type())
        .body(Body::from(body))
        .unwrap();

    let resp = app.oneshot(req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_ip_allow_list_rejects_unknown_peer() {
    let mut config = Config::default_for_test();
    config.allowed_ips = vec!["10.1.2.3".parse().unwrap()];
    let app = TestApp::lazy_with_config(config);

    // oneshot carries no ConnectInfo, so the peer is unknown.
    let resp = app.send_as(7, Method::GET, "/auth/authenticated").await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        body_to_json(resp).await["message"],
        "Access from this IP is not allowed"
    );
}

#[tokio::test]
async fn test_ip_allow_list_leaves_public_routes_open() {
    let mut config = Config::default_for_test();
    config.allowed_ips = vec!["10.1.2.3".parse().unwrap()];
    let app = TestApp::lazy_with_config(config);

    let req = TestApp::request(Method::GET, "/health")
        .body(Body::empty())
        .unwrap();
    assert_eq!(app.oneshot(req).await.status(), StatusCode::OK);
}
