//! Route guard: the downstream authorization check.
//!
//! Runs after the access gate. Public routes pass untouched; everything else
//! needs a bound AuthCtx or gets the fixed forbidden body. Per-operation
//! authority checks stay in the handlers (`AuthCtx::require`).

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{Method, Request},
    middleware::{self, Next},
    response::{IntoResponse, Response},
};

use crate::api::v1::extractors::AuthCtx;
use crate::error::AppError;
use crate::state::AppState;

/// Allow-list of routes reachable without a principal.
///
/// Entries match exactly, except:
/// - `/prefix/**` matches `/prefix` and anything below it
/// - `**` alone matches every path
#[derive(Debug, Clone, Default)]
pub struct PublicRoutes {
    exact: Vec<String>,
    prefixes: Vec<String>,
    everything: bool,
}

impl PublicRoutes {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut routes = Self::default();
        for pattern in patterns {
            let pattern = pattern.as_ref().trim();
            if pattern == "**" || pattern == "/**" {
                routes.everything = true;
            } else if let Some(prefix) = pattern.strip_suffix("/**") {
                routes.prefixes.push(prefix.to_string());
            } else if !pattern.is_empty() {
                routes.exact.push(pattern.to_string());
            }
        }
        routes
    }

    pub fn is_public(&self, path: &str) -> bool {
        if self.everything || self.exact.iter().any(|p| p == path) {
            return true;
        }
        self.prefixes.iter().any(|prefix| {
            path.strip_prefix(prefix.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        })
    }
}

pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    router.layer(middleware::from_fn_with_state(state, guard_middleware))
}

async fn guard_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if req.method() == Method::OPTIONS || state.public_routes.is_public(req.uri().path()) {
        return next.run(req).await;
    }

    if req.extensions().get::<AuthCtx>().is_none() {
        tracing::debug!(path = %req.uri().path(), "protected route reached without principal");
        return AppError::Forbidden.into_response();
    }

    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_and_prefix_patterns() {
        let routes = PublicRoutes::new(["/api/v1/user/login", "/api/v1/user/image/**"]);
        assert!(routes.is_public("/api/v1/user/login"));
        assert!(!routes.is_public("/api/v1/user/login/extra"));
        assert!(routes.is_public("/api/v1/user/image"));
        assert!(routes.is_public("/api/v1/user/image/alice/profile.png"));
        assert!(!routes.is_public("/api/v1/user/imagex"));
        assert!(!routes.is_public("/api/v1/user/me"));
    }

    #[test]
    fn double_star_opens_everything() {
        let routes = PublicRoutes::new(["**"]);
        assert!(routes.is_public("/anything/at/all"));
    }

    #[test]
    fn empty_list_protects_everything() {
        let routes = PublicRoutes::new(Vec::<String>::new());
        assert!(!routes.is_public("/health"));
    }
}
