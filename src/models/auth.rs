//! Token exchange DTOs.

use serde::{Deserialize, Serialize};

/// Login credentials. Only held for the duration of one exchange.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub password: String,
}

/// Successful body of the upstream token endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    #[serde(alias = "accessToken", alias = "access_token")]
    pub token: String,
}

/// Response of `POST /api/auth/token`
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub ok: bool,
    pub user_name: String,
}

/// Response of endpoints that only acknowledge
#[derive(Debug, Serialize, Deserialize)]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    pub fn ok() -> Self {
        Self { ok: true }
    }
}
