//! Access / refresh token codec (HS512 JWT).
//!
//! Access tokens carry the principal's authorities; refresh tokens carry the
//! subject only, so a stolen refresh token cannot be replayed against protected
//! routes. It can only mint a new access token through the credential store.
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};
use uuid::Uuid;

use crate::error::AppError;
use crate::services::auth::principal::UserPrincipal;
use crate::services::clock::SharedClock;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("jwt verification failed: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),
    #[error("empty or malformed '{0}' claim")]
    BadClaim(&'static str),
    #[error("The Token has expired on {0}.")]
    Expired(DateTime<Utc>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize)]
struct TokenClaims {
    iss: String,
    aud: String,
    iat: i64,
    sub: String,
    exp: i64,
    jti: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    authorities: Option<Vec<String>>,
}

/// Claims that survived signature / issuer / audience / structure checks.
///
/// Expiry is NOT checked by `verify`; use `is_expired` (or `verify_usable`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    pub subject: String,
    pub authorities: Option<Vec<String>>,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub token_id: String,
}

impl VerifiedToken {
    pub fn kind(&self) -> TokenKind {
        if self.authorities.is_some() {
            TokenKind::Access
        } else {
            TokenKind::Refresh
        }
    }
}

#[derive(Clone)]
pub struct JwtCodec {
    issuer: String,
    audience: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    clock: SharedClock,
}

impl std::fmt::Debug for JwtCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("JwtCodec")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

impl JwtCodec {
    pub fn new(
        secret: &[u8],
        issuer: impl Into<String>,
        audience: impl Into<String>,
        access_ttl_seconds: u64,
        refresh_ttl_seconds: u64,
        clock: SharedClock,
    ) -> Self {
        let issuer = issuer.into();
        let audience = audience.into();

        let mut validation = Validation::new(Algorithm::HS512);
        validation.set_issuer(&[issuer.as_str()]);
        validation.set_audience(&[audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        // Expiry is judged against the injected clock in `is_expired`.
        validation.validate_exp = false;
        validation.leeway = 0;

        Self {
            issuer,
            audience,
            access_ttl: Duration::seconds(access_ttl_seconds as i64),
            refresh_ttl: Duration::seconds(refresh_ttl_seconds as i64),
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            clock,
        }
    }

    pub fn issue_access_token(&self, principal: &UserPrincipal) -> Result<String, AppError> {
        self.issue(
            &principal.username,
            Some(principal.authorities.clone()),
            self.access_ttl,
        )
    }

    /// Subject only: authorities are re-derived from the credential store on refresh.
    pub fn issue_refresh_token(&self, principal: &UserPrincipal) -> Result<String, AppError> {
        self.issue(&principal.username, None, self.refresh_ttl)
    }

    fn issue(
        &self,
        subject: &str,
        authorities: Option<Vec<String>>,
        ttl: Duration,
    ) -> Result<String, AppError> {
        let now = self.clock.now();
        let claims = TokenClaims {
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: now.timestamp(),
            sub: subject.to_string(),
            exp: (now + ttl).timestamp(),
            jti: Uuid::new_v4().to_string(),
            authorities,
        };

        let mut header = Header::new(Algorithm::HS512);
        header.typ = Some("JWT".to_string());
        jsonwebtoken::encode(&header, &claims, &self.encoding_key).map_err(|e| {
            error!(error = %e, "failed to sign JWT");
            AppError::Internal
        })
    }

    /// Signature, issuer, audience and structure. Not expiry.
    pub fn verify(&self, token: &str) -> Result<VerifiedToken, TokenError> {
        let data =
            jsonwebtoken::decode::<TokenClaims>(token, &self.decoding_key, &self.validation)?;
        let claims = data.claims;

        if claims.sub.trim().is_empty() {
            return Err(TokenError::BadClaim("sub"));
        }
        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .ok_or(TokenError::BadClaim("exp"))?;
        let issued_at = Utc
            .timestamp_opt(claims.iat, 0)
            .single()
            .ok_or(TokenError::BadClaim("iat"))?;

        Ok(VerifiedToken {
            subject: claims.sub,
            authorities: claims.authorities,
            issued_at,
            expires_at,
            token_id: claims.jti,
        })
    }

    /// Expiry strictly before the current time.
    pub fn is_expired(&self, expires_at: DateTime<Utc>) -> bool {
        expires_at < self.clock.now()
    }

    /// The single "can this token be used" predicate.
    pub fn is_token_valid(&self, subject: &str, token: &str) -> bool {
        if subject.trim().is_empty() {
            return false;
        }
        match self.verify(token) {
            Ok(verified) => self.is_live(&verified),
            Err(err) => {
                debug!(error = %err, "token rejected");
                false
            }
        }
    }

    /// `verify` plus expiry, reported separately from invalidity.
    /// Same outcome as `is_token_valid`, with a single signature check.
    pub fn verify_usable(&self, token: &str) -> Result<VerifiedToken, TokenError> {
        let verified = self.verify(token)?;
        if !self.is_live(&verified) {
            return Err(TokenError::Expired(verified.expires_at));
        }
        Ok(verified)
    }

    fn is_live(&self, verified: &VerifiedToken) -> bool {
        !verified.subject.trim().is_empty() && !self.is_expired(verified.expires_at)
    }
}
