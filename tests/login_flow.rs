mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::Duration;
use common::{PASSWORD, TestApp, bearer, get, read_json};
use token_gate::services::auth::credentials::CredentialStore;
use token_gate::services::auth::principal::Role;

#[tokio::test]
async fn login_returns_tokens_in_body_and_headers() {
    let app = TestApp::new();
    let response = app.login("alice", PASSWORD).await;
    assert_eq!(response.status(), StatusCode::OK);

    let access_header = response.headers()["access-token"].to_str().unwrap().to_string();
    let refresh_header = response.headers()["refresh-token"].to_str().unwrap().to_string();
    let body = read_json(response).await;
    assert_eq!(body["accessToken"], access_header);
    assert_eq!(body["refreshToken"], refresh_header);
    assert_ne!(access_header, refresh_header);
}

#[tokio::test]
async fn wrong_password_is_a_bad_request() {
    let app = TestApp::new();
    let response = app.login("alice", "nope").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(
        body["message"],
        "USERNAME OR PASSWORD INCORRECT. PLEASE TRY AGAIN."
    );
    assert_eq!(app.state.throttle.attempts("alice"), 1);
}

#[tokio::test]
async fn blank_username_is_rejected_before_lookup() {
    let app = TestApp::new();
    let response = app.login("  ", PASSWORD).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(app.state.throttle.is_empty());
}

fn raw_login(content_type: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/v1/user/login")
        .header(header::CONTENT_TYPE, content_type)
        .body(body.into())
        .unwrap()
}

#[tokio::test]
async fn malformed_login_body_gets_the_fixed_body() {
    let app = TestApp::new();
    let cases = [
        raw_login("application/json", r#"{"username":"alice"}"#),
        raw_login("application/json", "{not json"),
        raw_login("text/plain", r#"{"username":"alice","password":"x"}"#),
    ];

    for request in cases {
        let response = app.send(request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = read_json(response).await;
        assert_eq!(body["httpStatus"], "BAD_REQUEST");
        assert_eq!(body["message"], "REQUEST BODY IS MISSING OR MALFORMED.");
        assert!(!body.to_string().contains("deserialize"));
    }
    assert!(app.state.throttle.is_empty());
}

#[tokio::test]
async fn oversized_login_body_is_rejected_with_the_fixed_body() {
    let app = TestApp::new();
    let password = "x".repeat(128 * 1024);
    let body = serde_json::json!({ "username": "alice", "password": password }).to_string();

    let response = app.send(raw_login("application/json", body)).await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body = read_json(response).await;
    assert_eq!(body["httpStatusCode"], 413);
    assert_eq!(body["message"], "REQUEST BODY IS TOO LARGE.");
}

#[tokio::test]
async fn five_failures_lock_the_account() {
    let app = TestApp::new();
    for _ in 0..5 {
        let response = app.login("alice", "wrong").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    let response = app.login("alice", PASSWORD).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = read_json(response).await;
    assert_eq!(body["message"], "YOUR ACCOUNT HAS BEEN LOCKED.");

    let alice = app.store.find_by_username("alice").await.unwrap().unwrap();
    assert!(!alice.not_locked);
}

#[tokio::test]
async fn failures_age_out_with_the_window() {
    let app = TestApp::new();
    for _ in 0..4 {
        let _ = app.login("alice", "wrong").await;
    }
    app.clock.advance(Duration::minutes(16));

    let _ = app.login("alice", "wrong").await;
    assert_eq!(app.state.throttle.attempts("alice"), 1);
    assert_eq!(app.login("alice", PASSWORD).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn refresh_keeps_the_refresh_token_and_picks_up_new_authorities() {
    let app = TestApp::new();
    let (_, refresh) = app.tokens("alice").await;
    app.store.set_role("alice", Role::RoleManager);

    let response = app
        .send(bearer("/api/v1/user/token/refresh", &refresh))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["refresh-token"], refresh.as_str());
    let body = read_json(response).await;
    assert_eq!(body["refreshToken"], refresh.as_str());

    let access = body["accessToken"].as_str().unwrap();
    let response = app
        .send(bearer("/api/v1/user/attempts/alice", access))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn refresh_without_a_bearer_header_cannot_be_verified() {
    let app = TestApp::new();
    let response = app.send(get("/api/v1/user/token/refresh")).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        read_json(response).await,
        serde_json::json!({ "Error": "Token cannot be verified" })
    );
}

#[tokio::test]
async fn refresh_rejects_access_tokens_and_garbage() {
    let app = TestApp::new();
    let (access, _) = app.tokens("alice").await;

    for token in [access.as_str(), "garbage"] {
        let response = app
            .send(bearer("/api/v1/user/token/refresh", token))
            .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            read_json(response).await["Error"],
            "Token cannot be verified"
        );
    }
}

#[tokio::test]
async fn expired_refresh_token_reports_expiry() {
    let app = TestApp::new();
    let (_, refresh) = app.tokens("alice").await;
    app.clock.advance(Duration::days(15) + Duration::seconds(1));

    let response = app
        .send(bearer("/api/v1/user/token/refresh", &refresh))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let message = read_json(response).await["message"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(message.starts_with("THE TOKEN HAS EXPIRED ON"), "{message}");
}
