/*
 * Responsibility
 * - Shared context bound to the Router (AppState)
 * - Cheap to clone: every service sits behind an Arc
 * - The throttle and the codec are built once in app::build_state and injected here, never global
 */
use std::sync::Arc;

use crate::middleware::auth::guard::PublicRoutes;
use crate::services::auth::{AttemptThrottle, JwtCodec, LoginService};

#[derive(Clone, Debug)]
pub struct AppState {
    pub jwt: Arc<JwtCodec>,
    pub login: Arc<LoginService>,
    pub throttle: Arc<AttemptThrottle>,
    pub public_routes: Arc<PublicRoutes>,
}

impl AppState {
    pub fn new(
        jwt: Arc<JwtCodec>,
        login: Arc<LoginService>,
        throttle: Arc<AttemptThrottle>,
        public_routes: Arc<PublicRoutes>,
    ) -> Self {
        Self {
            jwt,
            login,
            throttle,
            public_routes,
        }
    }
}
