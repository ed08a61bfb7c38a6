/*
 * Responsibility
 * - Application-wide AppError taxonomy
 * - IntoResponse: one fixed-shape JSON body (HttpResponse) for every denial
 * - Messages are fixed and uppercased; internal error text never reaches the client
 */
use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

pub const TOKEN_CANNOT_BE_VERIFIED: &str = "Token cannot be verified";
pub const FORBIDDEN_MESSAGE: &str = "You need to log in to access this page.";
pub const NOT_ENOUGH_PERMISSIONS: &str = "You do not have enough permissions.";
pub const ACCOUNT_LOCKED: &str = "Your account has been locked.";
pub const ACCOUNT_DISABLED: &str = "Your account has been disabled.";
pub const INCORRECT_CREDENTIALS: &str = "Username or password incorrect. Please try again.";
pub const INTERNAL_SERVER_ERROR_MSG: &str = "An error occurred while processing the request.";
pub const METHOD_IS_NOT_ALLOWED: &str = "This request method is not allowed on this endpoint.";
pub const MALFORMED_BODY: &str = "Request body is missing or malformed.";
pub const BODY_TOO_LARGE: &str = "Request body is too large.";
pub const REQUEST_TIMED_OUT: &str = "The request took too long to process.";

/// Denial body: `{httpStatusCode, httpStatus, reason, message}`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HttpResponse {
    pub http_status_code: u16,
    pub http_status: String,
    pub reason: String,
    pub message: String,
}

impl HttpResponse {
    pub fn new(status: StatusCode, message: &str) -> Self {
        let reason = status.canonical_reason().unwrap_or("Unknown").to_uppercase();
        Self {
            http_status_code: status.as_u16(),
            http_status: reason.replace([' ', '-'], "_"),
            reason,
            message: message.to_uppercase(),
        }
    }

    /// Body for a protected route reached without a bound principal.
    pub fn forbidden() -> Self {
        Self::new(StatusCode::FORBIDDEN, FORBIDDEN_MESSAGE)
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("token cannot be verified")]
    TokenInvalid,

    #[error("The Token has expired on {expired_at}.")]
    TokenExpired { expired_at: DateTime<Utc> },

    #[error("account locked")]
    AccountLocked,

    #[error("account disabled")]
    AccountDisabled,

    #[error("bad credentials")]
    BadCredentials,

    #[error("forbidden")]
    Forbidden,

    #[error("access denied")]
    AccessDenied,

    #[error("bad request: {0}")]
    BadRequest(&'static str),

    #[error("not found")]
    NotFound,

    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("payload too large")]
    PayloadTooLarge,

    #[error("request timed out")]
    RequestTimeout,

    #[error("internal server error")]
    Internal,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::TokenInvalid | AppError::Forbidden | AppError::AccessDenied => {
                StatusCode::FORBIDDEN
            }
            AppError::TokenExpired { .. } | AppError::AccountLocked => StatusCode::UNAUTHORIZED,
            AppError::AccountDisabled | AppError::BadCredentials | AppError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::RequestTimeout => StatusCode::REQUEST_TIMEOUT,
            AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn body(&self) -> HttpResponse {
        let message = match self {
            AppError::TokenInvalid => TOKEN_CANNOT_BE_VERIFIED.to_string(),
            AppError::TokenExpired { .. } => self.to_string(),
            AppError::AccountLocked => ACCOUNT_LOCKED.to_string(),
            AppError::AccountDisabled => ACCOUNT_DISABLED.to_string(),
            AppError::BadCredentials => INCORRECT_CREDENTIALS.to_string(),
            AppError::Forbidden => return HttpResponse::forbidden(),
            AppError::AccessDenied => NOT_ENOUGH_PERMISSIONS.to_string(),
            AppError::BadRequest(message) => message.to_string(),
            AppError::NotFound => "Page not found.".to_string(),
            AppError::MethodNotAllowed => METHOD_IS_NOT_ALLOWED.to_string(),
            AppError::PayloadTooLarge => BODY_TOO_LARGE.to_string(),
            AppError::RequestTimeout => REQUEST_TIMED_OUT.to_string(),
            AppError::Internal => INTERNAL_SERVER_ERROR_MSG.to_string(),
        };
        HttpResponse::new(self.status(), &message)
    }
}

/// Extractor rejections carry serde / framework text; only the status class survives.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "request body rejected");
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge
        } else {
            AppError::BadRequest(MALFORMED_BODY)
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn forbidden_body_has_fixed_shape() {
        let body = HttpResponse::forbidden();
        assert_eq!(body.http_status_code, 403);
        assert_eq!(body.http_status, "FORBIDDEN");
        assert_eq!(body.reason, "FORBIDDEN");
        assert_eq!(body.message, "YOU NEED TO LOG IN TO ACCESS THIS PAGE.");
    }

    #[test]
    fn forbidden_variant_renders_the_login_prompt() {
        assert_eq!(AppError::Forbidden.body(), HttpResponse::forbidden());
        assert_eq!(AppError::Forbidden.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn transport_errors_keep_the_fixed_shape() {
        let body = AppError::MethodNotAllowed.body();
        assert_eq!(body.http_status_code, 405);
        assert_eq!(body.http_status, "METHOD_NOT_ALLOWED");
        assert_eq!(
            body.message,
            "THIS REQUEST METHOD IS NOT ALLOWED ON THIS ENDPOINT."
        );
        assert_eq!(AppError::PayloadTooLarge.body().http_status, "PAYLOAD_TOO_LARGE");
        assert_eq!(AppError::RequestTimeout.body().http_status, "REQUEST_TIMEOUT");
    }

    #[test]
    fn enum_name_uses_underscores() {
        let body = AppError::Internal.body();
        assert_eq!(body.http_status, "INTERNAL_SERVER_ERROR");
        assert_eq!(body.reason, "INTERNAL SERVER ERROR");
    }

    #[test]
    fn expired_message_is_uppercased_and_distinct() {
        let expired_at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let err = AppError::TokenExpired { expired_at };
        let body = err.body();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert!(body.message.starts_with("THE TOKEN HAS EXPIRED ON 2026-01-02"));
        assert_ne!(body.message, AppError::TokenInvalid.body().message);
    }

    #[test]
    fn serialized_keys_are_camel_case() {
        let json = serde_json::to_value(AppError::AccountLocked.body()).unwrap();
        assert_eq!(json["httpStatusCode"], 401);
        assert_eq!(json["httpStatus"], "UNAUTHORIZED");
        assert_eq!(json["message"], "YOUR ACCOUNT HAS BEEN LOCKED.");
    }
}
