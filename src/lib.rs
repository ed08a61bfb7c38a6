//! Bearer-token authentication for axum: HS512 token issuance, a per-request
//! access gate, and a failed-login throttle.
pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod services;
pub mod state;
