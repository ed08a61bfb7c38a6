use serde::Serialize;

use crate::error::TOKEN_CANNOT_BE_VERIFIED;

/// Login / refresh response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
}

/// Refresh endpoint rejection: `{"Error": "Token cannot be verified"}`.
#[derive(Debug, Clone, Serialize)]
pub struct TokenErrorBody {
    #[serde(rename = "Error")]
    pub error: &'static str,
}

impl TokenErrorBody {
    pub fn not_verifiable() -> Self {
        Self {
            error: TOKEN_CANNOT_BE_VERIFIED,
        }
    }
}
