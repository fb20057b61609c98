use serde::{Deserialize, Serialize};

use super::{claims::Role, repo::Account};

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Response returned after a successful login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64, // seconds
}

/// Request body for registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Public part of an account returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicAccount {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
}

impl From<Account> for PublicAccount {
    fn from(a: Account) -> Self {
        Self {
            id: a.id,
            username: a.username,
            email: a.email,
            role: a.role,
        }
    }
}
