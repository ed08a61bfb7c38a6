/*
 * Responsibility
 * - URL layout of v1
 * - Which of these are public is decided by Config::public_urls, enforced by the route guard
 */
use axum::{
    Router,
    routing::{get, post},
};

use crate::api::v1::handlers::{
    auth::{login, refresh},
    health::health,
    user::{attempts, me},
};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/user/login", post(login))
        .route("/user/token/refresh", get(refresh))
        .route("/user/me", get(me))
        .route("/user/attempts/{username}", get(attempts))
}
