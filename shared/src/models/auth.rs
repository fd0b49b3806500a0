//! Authentication payloads

use super::user::{Role, User};
use serde::{Deserialize, Serialize};

/// `POST /auth/login` payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// `POST /auth/signup` payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub phone: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Bearer token with the account it belongs to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub user: User,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// Generic `{ "message": ... }` acknowledgement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}
