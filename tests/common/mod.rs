#![allow(dead_code)]

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, Response, header};
use std::sync::Arc;
use tower::ServiceExt;

use token_gate::app::{build_router, build_state};
use token_gate::config::Config;
use token_gate::services::auth::credentials::InMemoryCredentialStore;
use token_gate::services::auth::principal::{Role, UserPrincipal};
use token_gate::services::clock::ManualClock;
use token_gate::state::AppState;

pub const SECRET: &str = "integration-test-secret-integration-test-secret";
pub const PASSWORD: &str = "correct horse battery staple";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub clock: Arc<ManualClock>,
    pub store: InMemoryCredentialStore,
}

impl TestApp {
    pub fn new() -> Self {
        let store = InMemoryCredentialStore::new();
        store
            .insert(UserPrincipal::new("alice", Role::RoleUser), PASSWORD)
            .expect("seed alice");
        store
            .insert(UserPrincipal::new("root", Role::RoleSuperAdmin), PASSWORD)
            .expect("seed root");

        let config = Config::with_secret(SECRET);
        let clock = Arc::new(ManualClock::default());
        let state = build_state(&config, Arc::new(store.clone()), clock.clone());
        let router = build_router(state.clone(), &config);

        Self {
            router,
            state,
            clock,
            store,
        }
    }

    pub async fn send(&self, req: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(req).await.expect("response")
    }

    pub async fn login(&self, username: &str, password: &str) -> Response<Body> {
        self.send(login_request(username, password)).await
    }

    /// Log in and return `(access_token, refresh_token)`.
    pub async fn tokens(&self, username: &str) -> (String, String) {
        let response = self.login(username, PASSWORD).await;
        assert_eq!(response.status(), 200, "login for {username}");
        let body = read_json(response).await;
        (
            body["accessToken"].as_str().expect("accessToken").to_string(),
            body["refreshToken"].as_str().expect("refreshToken").to_string(),
        )
    }
}

pub fn login_request(username: &str, password: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/v1/user/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            serde_json::json!({ "username": username, "password": password }).to_string(),
        ))
        .expect("request")
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

pub fn get_with_auth(uri: &str, authorization: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, authorization)
        .body(Body::empty())
        .expect("request")
}

pub fn bearer(uri: &str, token: &str) -> Request<Body> {
    get_with_auth(uri, &format!("Bearer {token}"))
}

pub async fn read_json(response: Response<Body>) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}
