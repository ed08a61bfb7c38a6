//! Access gate: bearer access token → AuthCtx in request extensions.
//!
//! The gate never rejects. A missing header, a foreign scheme or a token that
//! fails verification all leave the request unauthenticated, and the route
//! guard further down decides whether that is acceptable.
//!
//! - `OPTIONS` short-circuits with 200 and touches nothing.
//! - A principal already bound to the request is never replaced.
//! - A token that fails verification clears any bound principal (fail closed).

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderMap, Method, Request, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
};

use crate::api::v1::extractors::AuthCtx;
use crate::services::auth::JwtCodec;
use crate::services::auth::jwt::{TokenError, TokenKind};
use crate::state::AppState;

/// Prefix is matched exactly, trailing space included.
pub const TOKEN_PREFIX: &str = "Bearer ";

/// Attach the access gate to `router`.
///
/// Apply it outside the route guard so the guard sees the bound principal:
/// ```ignore
/// let app = guard::apply(app, state.clone());
/// let app = access::apply(app, state.clone());
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8's from_fn cannot take a State extractor, so pass state explicitly with from_fn_with_state
    router.layer(middleware::from_fn_with_state(state, access_middleware))
}

pub async fn access_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if req.method() == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }

    let Some(token) = bearer_token(req.headers()).map(str::to_owned) else {
        return next.run(req).await;
    };

    match authenticate(&state.jwt, &token) {
        Some(auth_ctx) => {
            if req.extensions().get::<AuthCtx>().is_none() {
                tracing::debug!(
                    username = %auth_ctx.username,
                    jti = %auth_ctx.token_id,
                    "principal bound to request"
                );
                // middleware → extractor hand-off
                req.extensions_mut().insert(auth_ctx);
            }
        }
        None => {
            req.extensions_mut().remove::<AuthCtx>();
        }
    }

    next.run(req).await
}

/// Token after an exact `"Bearer "` prefix, if any.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix(TOKEN_PREFIX))
}

/// Verify `token` and build the request principal. `None` on any failure.
pub fn authenticate(jwt: &JwtCodec, token: &str) -> Option<AuthCtx> {
    let verified = match jwt.verify_usable(token) {
        Ok(v) => v,
        Err(TokenError::Expired(expired_at)) => {
            tracing::debug!(%expired_at, "access token expired");
            return None;
        }
        Err(err) => {
            // Full diagnostic stays server-side.
            tracing::warn!(error = %err, "access token verification failed");
            return None;
        }
    };

    // Routine on the refresh endpoint.
    if verified.kind() != TokenKind::Access {
        tracing::debug!(subject = %verified.subject, "refresh token is not bound as a principal");
        return None;
    }

    Some(AuthCtx {
        username: verified.subject,
        authorities: verified.authorities.unwrap_or_default(),
        token_id: verified.token_id,
        expires_at: verified.expires_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::HeaderValue;
    use axum::routing::get;
    use std::sync::Arc;
    use tower::ServiceExt;

    use crate::app::build_state;
    use crate::config::Config;
    use crate::services::auth::credentials::InMemoryCredentialStore;
    use crate::services::auth::principal::{Role, UserPrincipal};
    use crate::services::clock::SystemClock;

    fn state() -> AppState {
        build_state(
            &Config::with_secret("access-gate-secret-access-gate-secret"),
            Arc::new(InMemoryCredentialStore::new()),
            Arc::new(SystemClock),
        )
    }

    async fn bind_bob(mut req: Request<Body>, next: Next) -> Response {
        req.extensions_mut().insert(AuthCtx {
            username: "bob".into(),
            authorities: vec!["user:read".into()],
            token_id: "earlier".into(),
            expires_at: chrono::Utc::now(),
        });
        next.run(req).await
    }

    async fn bound_user(req: Request<Body>) -> String {
        req.extensions()
            .get::<AuthCtx>()
            .map(|ctx| ctx.username.clone())
            .unwrap_or_else(|| "anonymous".to_string())
    }

    /// Gate behind a layer that has already bound "bob".
    async fn call_with_bob_bound(state: &AppState, authorization: Option<&str>) -> String {
        let router = apply(Router::new().route("/", get(bound_user)), state.clone())
            .layer(middleware::from_fn(bind_bob))
            .with_state(state.clone());

        let mut req = Request::builder().uri("/");
        if let Some(value) = authorization {
            req = req.header(header::AUTHORIZATION, value);
        }
        let response = router
            .oneshot(req.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn already_bound_principal_is_not_replaced() {
        let state = state();
        let alice = state
            .jwt
            .issue_access_token(&UserPrincipal::new("alice", Role::RoleUser))
            .unwrap();

        let bound = call_with_bob_bound(&state, Some(&format!("Bearer {alice}"))).await;
        assert_eq!(bound, "bob");
    }

    #[tokio::test]
    async fn invalid_token_clears_a_bound_principal() {
        let state = state();
        assert_eq!(call_with_bob_bound(&state, Some("Bearer garbage")).await, "anonymous");
    }

    #[tokio::test]
    async fn no_bearer_header_leaves_the_request_alone() {
        let state = state();
        assert_eq!(call_with_bob_bound(&state, None).await, "bob");
        assert_eq!(call_with_bob_bound(&state, Some("Basic Ym9iOnB3")).await, "bob");
    }

    #[test]
    fn refresh_tokens_are_never_bound() {
        let state = state();
        let alice = UserPrincipal::new("alice", Role::RoleUser);
        let refresh = state.jwt.issue_refresh_token(&alice).unwrap();
        assert!(authenticate(&state.jwt, &refresh).is_none());

        let access = state.jwt.issue_access_token(&alice).unwrap();
        let ctx = authenticate(&state.jwt, &access).unwrap();
        assert_eq!(ctx.username, "alice");
        assert_eq!(ctx.authorities, vec!["user:read".to_string()]);
    }

    fn headers(value: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        h
    }

    #[test]
    fn prefix_must_match_exactly() {
        assert_eq!(bearer_token(&headers("Bearer abc")), Some("abc"));
        assert_eq!(bearer_token(&headers("Bearer ")), Some(""));
        assert_eq!(bearer_token(&headers("bearer abc")), None);
        assert_eq!(bearer_token(&headers("Bearerabc")), None);
        assert_eq!(bearer_token(&headers("Basic dXNlcjpwdw==")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}
