/*
 * Responsibility
 * - The "authenticated context" type handlers see
 * - The access gate verifies the token and stores this in request extensions; handlers only receive this type
 *
 * Notes
 * - Token verification lives in middleware/services
 * - Authority checks for individual operations go through `require`
 */
use chrono::{DateTime, Utc};

use crate::error::AppError;

/// Principal bound to a single request.
///
/// - `username` is the token subject
/// - `authorities` come straight from the access token's authority claim
/// - `token_id` (jti) is for log correlation only
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthCtx {
    pub username: String,
    pub authorities: Vec<String>,
    pub token_id: String,
    pub expires_at: DateTime<Utc>,
}

impl AuthCtx {
    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities.iter().any(|a| a == authority)
    }

    pub fn require(&self, authority: &str) -> Result<(), AppError> {
        if self.has_authority(authority) {
            Ok(())
        } else {
            tracing::info!(
                username = %self.username,
                required = authority,
                "access denied: missing authority"
            );
            Err(AppError::AccessDenied)
        }
    }
}
