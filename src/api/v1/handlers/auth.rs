/*
 * Responsibility
 * - POST /user/login: credentials → token pair (body + headers)
 * - GET /user/token/refresh: bearer refresh token → fresh access token, same refresh token
 * - Handlers stay thin: LoginService does the work
 */
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

use crate::api::v1::dto::{
    login::LoginRequest,
    token::{TokenErrorBody, TokenResponse},
};
use crate::error::AppError;
use crate::middleware::auth::access::bearer_token;
use crate::services::auth::login::IssuedTokenPair;
use crate::state::AppState;

pub const ACCESS_TOKEN_HEADER: &str = "access-token";
pub const REFRESH_TOKEN_HEADER: &str = "refresh-token";

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(req) = payload?;
    req.validate().map_err(AppError::BadRequest)?;

    let pair = state.login.login(req.username.trim(), &req.password).await?;
    token_response(pair)
}

pub async fn refresh(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, AppError> {
    let Some(refresh_token) = bearer_token(&headers).filter(|t| !t.is_empty()) else {
        return Ok(not_verifiable());
    };

    match state.login.refresh(refresh_token).await {
        Ok(pair) => token_response(pair),
        Err(AppError::TokenInvalid) => Ok(not_verifiable()),
        Err(other) => Err(other),
    }
}

fn not_verifiable() -> Response {
    (StatusCode::FORBIDDEN, Json(TokenErrorBody::not_verifiable())).into_response()
}

fn token_response(pair: IssuedTokenPair) -> Result<Response, AppError> {
    let mut headers = HeaderMap::new();
    for (name, value) in [
        (ACCESS_TOKEN_HEADER, &pair.access_token),
        (REFRESH_TOKEN_HEADER, &pair.refresh_token),
    ] {
        let value = HeaderValue::from_str(value).map_err(|e| {
            tracing::error!(error = %e, "token is not a valid header value");
            AppError::Internal
        })?;
        headers.insert(name, value);
    }

    let body = TokenResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
    };
    Ok((StatusCode::OK, headers, Json(body)).into_response())
}
