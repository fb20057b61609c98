use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Role tag carried by an account and every token issued for it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }

    /// Whether a caller holding `self` may perform an operation requiring `required`.
    pub fn satisfies(self, required: Role) -> bool {
        match required {
            Role::Admin => self == Role::Admin,
            Role::User => true,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            other => anyhow::bail!("unknown role {other:?}"),
        }
    }
}

/// JWT payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,  // username
    pub uid: i64,     // account id
    pub role: Role,
    pub iat: i64,     // issued at (unix timestamp)
    pub exp: i64,     // expires at (unix timestamp)
    pub iss: String,  // issuer
    pub aud: String,  // audience
}

/// Who is calling. Published by the authentication middleware for each
/// request and handed explicitly to anything that needs it.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Identity {
    #[serde(rename = "id")]
    pub account_id: i64,
    pub username: String,
    pub role: Role,
}

impl From<Claims> for Identity {
    fn from(c: Claims) -> Self {
        Self {
            account_id: c.uid,
            username: c.sub,
            role: c.role,
        }
    }
}
