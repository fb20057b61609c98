use anyhow::Context;
use axum::extract::FromRef;
use jsonwebtoken::{
    decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tracing::debug;

use super::claims::{Claims, Identity};
use crate::{config::JwtConfig, state::AppState};

/// The only algorithm tokens may be signed with.
const ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("unexpected signing algorithm {0:?}")]
    Algorithm(Algorithm),
    #[error("invalid token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),
}

/// Signing and verification keys derived once from [`JwtConfig`].
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.keys.clone()
    }
}

impl JwtKeys {
    pub fn new(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: Duration::minutes(cfg.ttl_minutes),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issues a token for `identity` valid from `now` until `now + ttl`.
    pub fn issue(&self, identity: &Identity, now: OffsetDateTime) -> anyhow::Result<String> {
        let exp = now
            .checked_add(self.ttl)
            .context("token expiry out of range")?;
        let claims = Claims {
            sub: identity.username.clone(),
            uid: identity.account_id,
            role: identity.role,
            iat: now.unix_timestamp(),
            exp: exp.unix_timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::new(ALGORITHM), &claims, &self.encoding)?;
        debug!(username = %identity.username, role = %identity.role, "jwt issued");
        Ok(token)
    }

    /// Checks signature, algorithm, issuer, audience and expiry as of `now`.
    /// A token is expired once `now` reaches its `exp`.
    pub fn validate(&self, token: &str, now: OffsetDateTime) -> Result<Identity, TokenError> {
        let header = decode_header(token)?;
        if header.alg != ALGORITHM {
            return Err(TokenError::Algorithm(header.alg));
        }

        let data = decode::<Claims>(token, &self.decoding, &self.validation())?;
        if now.unix_timestamp() >= data.claims.exp {
            return Err(TokenError::Expired);
        }

        debug!(username = %data.claims.sub, role = %data.claims.role, "jwt verified");
        Ok(Identity::from(data.claims))
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(ALGORITHM);
        // Expiry is checked against the caller-supplied clock instead.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        validation
    }
}
