use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::error::AppError;
use crate::services::auth::{
    credentials::{CredentialError, CredentialStore},
    events::{AuthEventBridge, AuthSubject},
    jwt::{JwtCodec, TokenError, TokenKind},
    principal::UserPrincipal,
    throttle::AttemptThrottle,
};

/// Credential validation + token pair issuance.
///
/// - Re-evaluates the account lock from throttle state on every attempt.
/// - Reports outcomes to `AuthEventBridge` (never writes the throttle itself).
/// - Refresh re-reads the principal so authorities track the current role.
#[derive(Clone)]
pub struct LoginService {
    credentials: Arc<dyn CredentialStore>,
    throttle: Arc<AttemptThrottle>,
    events: AuthEventBridge,
    jwt: Arc<JwtCodec>,
}

impl std::fmt::Debug for LoginService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginService")
            .field("throttle", &self.throttle)
            .field("jwt", &self.jwt)
            .finish()
    }
}

/// Service-level return type to keep handlers thin.
#[derive(Clone, Debug)]
pub struct IssuedTokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl LoginService {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        throttle: Arc<AttemptThrottle>,
        jwt: Arc<JwtCodec>,
    ) -> Self {
        let events = AuthEventBridge::new(throttle.clone());
        Self {
            credentials,
            throttle,
            events,
            jwt,
        }
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<IssuedTokenPair, AppError> {
        let principal = self.authenticate(username, password).await?;

        Ok(IssuedTokenPair {
            access_token: self.jwt.issue_access_token(&principal)?,
            refresh_token: self.jwt.issue_refresh_token(&principal)?,
        })
    }

    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<UserPrincipal, AppError> {
        let found = self
            .credentials
            .find_by_username(username)
            .await
            .map_err(backend_error)?;

        let Some(principal) = found else {
            warn!(username = %username, "login for unknown user");
            self.events
                .on_failure(&AuthSubject::Identifier(username.to_string()));
            return Err(AppError::BadCredentials);
        };

        let principal = self.validate_login_attempt(principal).await?;
        if !principal.not_locked {
            info!(username = %principal.username, "login refused: account locked");
            return Err(AppError::AccountLocked);
        }
        if !principal.active {
            info!(username = %principal.username, "login refused: account disabled");
            return Err(AppError::AccountDisabled);
        }

        let matched = self
            .credentials
            .verify_password(&principal.username, password)
            .await
            .map_err(backend_error)?;

        if !matched {
            warn!(username = %principal.username, "login failed: bad credentials");
            self.events
                .on_failure(&AuthSubject::Identifier(principal.username.clone()));
            return Err(AppError::BadCredentials);
        }

        info!(username = %principal.username, "login succeeded");
        self.events.on_success(&AuthSubject::Resolved(principal.clone()));
        Ok(principal)
    }

    /// Lock state is derived from the throttle on every attempt, not kept sticky here.
    async fn validate_login_attempt(
        &self,
        mut principal: UserPrincipal,
    ) -> Result<UserPrincipal, AppError> {
        if principal.not_locked {
            if self.throttle.has_exceeded_limit(&principal.username) {
                principal.not_locked = false;
                self.credentials
                    .set_not_locked(&principal.username, false)
                    .await
                    .map_err(backend_error)?;
                warn!(username = %principal.username, "account locked after too many failed logins");
            }
        } else {
            self.events.on_locked_account(&principal);
        }
        Ok(principal)
    }

    /// Mint a new access token from a refresh token; the refresh token is returned unchanged.
    pub async fn refresh(&self, refresh_token: &str) -> Result<IssuedTokenPair, AppError> {
        let verified = self.jwt.verify_usable(refresh_token).map_err(|e| match e {
            TokenError::Expired(expired_at) => AppError::TokenExpired { expired_at },
            other => {
                warn!(error = %other, "refresh token cannot be verified");
                AppError::TokenInvalid
            }
        })?;

        if verified.kind() != TokenKind::Refresh {
            debug!(subject = %verified.subject, "access token presented for refresh");
            return Err(AppError::TokenInvalid);
        }

        let principal = self
            .credentials
            .find_by_username(&verified.subject)
            .await
            .map_err(backend_error)?
            .ok_or_else(|| {
                warn!(subject = %verified.subject, "refresh for unknown user");
                AppError::TokenInvalid
            })?;

        if !principal.active {
            return Err(AppError::AccountDisabled);
        }
        if !principal.not_locked {
            return Err(AppError::AccountLocked);
        }

        Ok(IssuedTokenPair {
            access_token: self.jwt.issue_access_token(&principal)?,
            refresh_token: refresh_token.to_string(),
        })
    }

    pub fn throttle(&self) -> &AttemptThrottle {
        self.throttle.as_ref()
    }
}

fn backend_error(e: CredentialError) -> AppError {
    error!(error = %e, "credential store failure");
    AppError::Internal
}
