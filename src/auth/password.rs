use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use thiserror::Error;
use tracing::error;

// Argon2id, 19 MiB, 2 passes, 1 lane: tens of milliseconds per attempt.
const M_COST_KIB: u32 = 19 * 1024;
const T_COST: u32 = 2;
const P_COST: u32 = 1;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("argon2 hash error: {0}")]
    Hash(String),
    #[error("malformed stored hash: {0}")]
    Malformed(String),
}

lazy_static! {
    /// Verified against when the account does not exist, so that path costs
    /// the same as a wrong password.
    static ref DUMMY_HASH: Option<String> = hash_password("sportmanager-dummy-password").ok();
}

fn hasher() -> Result<Argon2<'static>, PasswordError> {
    let params = Params::new(M_COST_KIB, T_COST, P_COST, None)
        .map_err(|e| PasswordError::Hash(e.to_string()))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hashes `plain` with a fresh random salt. Output is a PHC string.
pub fn hash_password(plain: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = hasher()?
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            PasswordError::Hash(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

/// `Ok(false)` on mismatch; `Err` when the stored digest is not a usable
/// argon2 hash.
pub fn verify_password(plain: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        PasswordError::Malformed(e.to_string())
    })?;
    if Algorithm::new(parsed.algorithm.as_str()).is_err()
        || parsed.salt.is_none()
        || parsed.hash.is_none()
    {
        error!(algorithm = %parsed.algorithm, "stored hash is not a complete argon2 digest");
        return Err(PasswordError::Malformed(format!(
            "not an argon2 digest: {}",
            parsed.algorithm
        )));
    }
    match hasher()?.verify_password(plain.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => {
            error!(error = %e, "argon2 verify error");
            Err(PasswordError::Malformed(e.to_string()))
        }
    }
}

/// Burns one verification against a throwaway hash.
pub fn verify_dummy(plain: &str) {
    if let Some(hash) = DUMMY_HASH.as_deref() {
        let _ = verify_password(plain, hash);
    }
}

pub async fn hash_password_blocking(plain: String) -> anyhow::Result<String> {
    let hash = tokio::task::spawn_blocking(move || hash_password(&plain)).await??;
    Ok(hash)
}

pub async fn verify_password_blocking(
    plain: String,
    hash: String,
) -> anyhow::Result<Result<bool, PasswordError>> {
    Ok(tokio::task::spawn_blocking(move || verify_password(&plain, &hash)).await?)
}

pub async fn verify_dummy_blocking(plain: String) -> anyhow::Result<()> {
    tokio::task::spawn_blocking(move || verify_dummy(&plain)).await?;
    Ok(())
}
