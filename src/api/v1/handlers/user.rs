/*
 * Responsibility
 * - GET /user/me: the principal bound by the access gate
 * - GET /user/attempts/{username}: throttle view, needs `user:update`
 */
use axum::{
    Json,
    extract::{Path, State},
};

use crate::api::v1::dto::user::{AttemptsResponse, MeResponse};
use crate::api::v1::extractors::AuthCtxExtractor;
use crate::error::AppError;
use crate::services::auth::principal::USER_UPDATE;
use crate::state::AppState;

pub async fn me(AuthCtxExtractor(ctx): AuthCtxExtractor) -> Json<MeResponse> {
    Json(MeResponse {
        username: ctx.username,
        authorities: ctx.authorities,
        expires_at: ctx.expires_at,
    })
}

pub async fn attempts(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    Path(username): Path<String>,
) -> Result<Json<AttemptsResponse>, AppError> {
    ctx.require(USER_UPDATE)?;

    Ok(Json(AttemptsResponse {
        failed_attempts: state.throttle.attempts(&username),
        max_attempts: state.throttle.policy().max_attempts,
        limit_exceeded: state.throttle.has_exceeded_limit(&username),
        username,
    }))
}
