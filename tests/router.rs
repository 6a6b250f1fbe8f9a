// Router-level behavior that is decided before any storage access.

mod common;

use axum::{body::Body, http::Request, http::StatusCode};
use common::{bearer, json_request, multipart_request, offline_state, send};
use forum_api::app;

#[tokio::test]
async fn root_describes_service() {
    let app = app(offline_state());
    let (status, body) = send(&app, Request::get("/").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["name"], "Forum API");
}

#[tokio::test]
async fn protected_route_requires_token() {
    let app = app(offline_state());
    let (status, body) = send(&app, json_request("POST", "/qa/ask", None, "{}")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "UNAUTHORIZED");
    assert_eq!(body["error"], "Missing authentication token");
}

#[tokio::test]
async fn forged_token_is_rejected() {
    let app = app(offline_state());
    let (status, body) = send(
        &app,
        json_request("POST", "/api/answers/1/like", Some("Bearer not.a.jwt"), ""),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid or expired token");
}

#[tokio::test]
async fn malformed_json_is_reported_in_envelope() {
    let state = offline_state();
    let auth = bearer(&state, 1, "alice");
    let app = app(state);

    let (status, body) = send(&app, json_request("POST", "/qa/ask", Some(&auth), "{not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "INVALID_JSON");
}

#[tokio::test]
async fn negative_reward_is_rejected() {
    let state = offline_state();
    let auth = bearer(&state, 1, "alice");
    let app = app(state);

    let payload = r#"{"title":"Lifetimes?","content":"Why 'a?","category_id":1,"reward":-5}"#;
    let (status, body) = send(&app, json_request("POST", "/qa/ask", Some(&auth), payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["field_errors"]["reward"], "Reward cannot be negative");
}

#[tokio::test]
async fn session_cookie_authenticates() {
    let state = offline_state();
    let token = bearer(&state, 1, "alice").trim_start_matches("Bearer ").to_string();
    let app = app(state);

    let request = Request::post("/qa/1/answer")
        .header("content-type", "application/json")
        .header("cookie", format!("theme=dark; token={}", token))
        .body(Body::from(r#"{"content":"   "}"#))
        .unwrap();
    let (status, body) = send(&app, request).await;

    // Past authentication, stopped by content validation
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field_errors"]["content"], "Content is required");
}

#[tokio::test]
async fn non_numeric_id_is_bad_request() {
    let state = offline_state();
    let auth = bearer(&state, 1, "alice");
    let app = app(state);

    let (status, body) =
        send(&app, json_request("POST", "/qa/answer/abc/accept", Some(&auth), "")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn self_follow_is_rejected() {
    let state = offline_state();
    let auth = bearer(&state, 7, "grace");
    let app = app(state);

    let (status, body) = send(&app, json_request("POST", "/api/user/7/follow", Some(&auth), "")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field_errors"]["user_id"], "You cannot follow yourself");
}

#[tokio::test]
async fn registration_is_validated() {
    let app = app(offline_state());
    let payload = r#"{"username":"x","email":"x@example.com","password":"secret1"}"#;
    let (status, body) = send(&app, json_request("POST", "/api/auth/register", None, payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["username"].is_string());
}

#[tokio::test]
async fn logout_expires_cookie() {
    let app = app(offline_state());
    let response = tower::ServiceExt::oneshot(
        app,
        Request::post("/api/auth/logout").body(Body::empty()).unwrap(),
    )
    .await
    .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(cookie.starts_with("token=;"));
    assert!(cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn overlong_email_is_a_field_error() {
    let app = app(offline_state());
    let email = format!("{}@example.com", "a".repeat(100));
    let payload = format!(r#"{{"username":"ferris","email":"{email}","password":"secret1"}}"#);
    let (status, body) = send(&app, json_request("POST", "/api/auth/register", None, &payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field_errors"]["email"], "Email must be at most 100 characters");
}

#[tokio::test]
async fn overlong_article_category_is_a_field_error() {
    let state = offline_state();
    let auth = bearer(&state, 1, "alice");
    let app = app(state);

    let payload = format!(
        r#"{{"title":"Arena allocation","content":"Bump it.","category":"{}"}}"#,
        "c".repeat(60)
    );
    let (status, body) =
        send(&app, json_request("POST", "/api/tech-share/publish", Some(&auth), &payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field_errors"]["category"], "category must be at most 50 characters");
}

#[tokio::test]
async fn profile_changes_are_validated() {
    let state = offline_state();
    let auth = bearer(&state, 1, "alice");
    let app = app(state);

    let payload = r#"{"username":"alice","email":"not-an-email"}"#;
    let (status, body) = send(&app, json_request("PUT", "/api/user/profile", Some(&auth), payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["email"].is_string());

    let payload = r#"{"current_password":"secret1","new_password":"abc"}"#;
    let (status, body) = send(&app, json_request("PUT", "/api/user/password", Some(&auth), payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["new_password"].is_string());
}

#[tokio::test]
async fn avatar_must_be_an_image() {
    let state = offline_state();
    let auth = bearer(&state, 1, "alice");
    let app = app(state);

    let request = multipart_request("/api/user/avatar", Some(&auth), &[("avatar", Some("setup.exe"), &b"MZ"[..])]);
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["avatar"].is_string());

    let request = multipart_request("/api/user/avatar", Some(&auth), &[("note", None, &b"hi"[..])]);
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field_errors"]["avatar"], "Choose an image to upload");
}
