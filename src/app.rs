/*
 * Responsibility
 * - Config → services (codec, throttle, credential store, login) → AppState
 * - Router assembly: routes, then route guard, then access gate, then HTTP-wide layers
 * - axum::serve() with graceful shutdown
 */
use anyhow::Result;
use axum::{Router, routing::get};
use std::{panic, process, sync::Arc, time::Duration};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::config::Config;
use crate::error::AppError;
use crate::middleware::auth::{access, guard, guard::PublicRoutes};
use crate::middleware::{cors, http, security_headers};
use crate::services::auth::{
    AttemptThrottle, JwtCodec, LoginService,
    credentials::{CredentialStore, InMemoryCredentialStore},
    throttle::{ThrottlePolicy, spawn_sweeper},
};
use crate::services::clock::{SharedClock, SystemClock};
use crate::state::AppState;

const SWEEP_EVERY: Duration = Duration::from_secs(60);

fn init_tracing() {
    // RUST_LOG wins, e.g. RUST_LOG=info,token_gate=debug,tower_http=debug
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        tracing::error!(?info, "panic");

        // Development fails fast; production keeps serving.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;
    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting token gate in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let credentials = InMemoryCredentialStore::from_seed(&config.seed_users)?;
    if config.seed_users.is_empty() {
        tracing::warn!("no SEED_USERS configured; every login will fail");
    }

    let state = build_state(&config, Arc::new(credentials), Arc::new(SystemClock));
    let sweeper = spawn_sweeper(state.throttle.clone(), SWEEP_EVERY);

    let app = build_router(state, &config);
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    tracing::info!("token gate stopped");
    Ok(())
}

/// Wire the process-level services. The clock is injected so tests can move time.
pub fn build_state(
    config: &Config,
    credentials: Arc<dyn CredentialStore>,
    clock: SharedClock,
) -> AppState {
    let jwt = Arc::new(JwtCodec::new(
        config.jwt_secret.as_bytes(),
        &config.issuer,
        &config.audience,
        config.access_token_ttl_seconds,
        config.refresh_token_ttl_seconds,
        clock.clone(),
    ));

    let policy = ThrottlePolicy {
        max_attempts: config.login_max_attempts,
        window: chrono::Duration::seconds(config.login_attempt_window_seconds as i64),
        capacity: config.login_attempt_capacity,
    };
    let throttle = Arc::new(AttemptThrottle::new(policy, clock));

    let login = Arc::new(LoginService::new(credentials, throttle.clone(), jwt.clone()));
    let public_routes = Arc::new(PublicRoutes::new(&config.public_urls));

    AppState::new(jwt, login, throttle, public_routes)
}

pub fn build_router(state: AppState, config: &Config) -> Router {
    let router = Router::new()
        .route("/health", get(api::v1::handlers::health::health))
        .nest("/api/v1", api::v1::routes())
        .method_not_allowed_fallback(method_not_allowed)
        .fallback(not_found);

    // Last applied runs first: the gate binds the principal, then the guard checks it.
    let router = guard::apply(router, state.clone());
    let router = access::apply(router, state.clone());
    let router = router.with_state(state);

    let router = security_headers::apply(router);
    let router = cors::apply(router, config);
    http::apply(router, config)
}

async fn not_found() -> AppError {
    AppError::NotFound
}

async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("shutdown signal received");
}
