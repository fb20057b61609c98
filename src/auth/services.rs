use lazy_static::lazy_static;
use regex::Regex;
use time::OffsetDateTime;
use tracing::{error, info, instrument, warn};

use super::{
    claims::{Identity, Role},
    password,
    repo::{Account, NewAccount, UsernameTaken},
};
use crate::{
    config::AdminSeed,
    error::{AppError, AppResult, AuthFailure},
    state::AppState,
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn is_valid_username(username: &str) -> bool {
    lazy_static! {
        static ref USERNAME_RE: Regex = Regex::new(r"^[A-Za-z0-9_.\-]{3,64}$").unwrap();
    }
    USERNAME_RE.is_match(username)
}

/// Verifies credentials and issues an access token. Unknown usernames and
/// wrong passwords fail identically and cost the same hashing work.
#[instrument(skip(state, password))]
pub async fn login(state: &AppState, username: &str, password: &str) -> AppResult<String> {
    let Some(account) = state.accounts.find_by_username(username).await? else {
        password::verify_dummy_blocking(password.to_owned()).await?;
        return Err(AuthFailure::UnknownAccount.into());
    };

    match password::verify_password_blocking(password.to_owned(), account.password_hash.clone())
        .await?
    {
        Ok(true) => {}
        Ok(false) => return Err(AuthFailure::WrongPassword.into()),
        Err(e) => {
            error!(error = %e, account_id = account.id, "stored password hash unusable");
            return Err(AuthFailure::CorruptHash.into());
        }
    }

    let identity = Identity {
        account_id: account.id,
        username: account.username,
        role: account.role,
    };
    let token = state.keys.issue(&identity, OffsetDateTime::now_utc())?;
    info!(account_id = identity.account_id, role = %identity.role, "user logged in");
    Ok(token)
}

/// Creates a regular (`user` role) account.
#[instrument(skip(state, password))]
pub async fn register(
    state: &AppState,
    username: &str,
    email: &str,
    password: &str,
) -> AppResult<Account> {
    let username = username.trim();
    let email = email.trim().to_lowercase();

    if !is_valid_username(username) {
        return Err(AppError::validation(
            "username must be 3-64 characters of letters, digits, '_', '.' or '-'",
        ));
    }
    if !is_valid_email(&email) {
        return Err(AppError::validation("invalid email"));
    }
    if password.len() < 8 {
        return Err(AppError::validation("password too short"));
    }

    if state.accounts.find_by_username(username).await?.is_some() {
        warn!(%username, "username already registered");
        return Err(AppError::Conflict("username already taken".into()));
    }

    let password_hash = password::hash_password_blocking(password.to_owned()).await?;
    let account = state
        .accounts
        .insert(NewAccount {
            username: username.to_owned(),
            email,
            password_hash,
            role: Role::User,
        })
        .await
        .map_err(|e| {
            // Lost a race with a concurrent registration of the same name.
            if e.is::<UsernameTaken>() {
                warn!(%username, "username already registered");
                AppError::Conflict("username already taken".into())
            } else {
                AppError::Storage(e)
            }
        })?;

    info!(account_id = account.id, username = %account.username, "user registered");
    Ok(account)
}

/// Makes sure the configured administrator exists. Existing accounts are left
/// untouched.
pub async fn bootstrap_admin(state: &AppState, seed: &AdminSeed) -> anyhow::Result<()> {
    if let Some(existing) = state.accounts.find_by_username(&seed.username).await? {
        if existing.role != Role::Admin {
            warn!(username = %seed.username, "bootstrap admin username belongs to a non-admin account");
        }
        return Ok(());
    }

    let password_hash = password::hash_password_blocking(seed.password.clone()).await?;
    let account = state
        .accounts
        .insert(NewAccount {
            username: seed.username.clone(),
            email: seed.email.trim().to_lowercase(),
            password_hash,
            role: Role::Admin,
        })
        .await?;
    info!(account_id = account.id, username = %account.username, "admin account created");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use std::sync::Arc;

    fn state_with(store: MemoryStore) -> AppState {
        AppState::with_store(AppState::test_config(), Arc::new(store))
    }

    #[test]
    fn email_and_username_rules() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.de"));
        assert!(is_valid_username("coach_01"));
        assert!(!is_valid_username("ab"));
        assert!(!is_valid_username("has space"));
    }

    #[tokio::test]
    async fn login_issues_token_with_account_role() {
        let state = state_with(MemoryStore::seeded().with_account("boss", "admin-pass-1", Role::Admin));
        let token = login(&state, "boss", "admin-pass-1").await.expect("login ok");
        let identity = state.keys.validate(&token, OffsetDateTime::now_utc()).unwrap();
        assert_eq!(identity.username, "boss");
        assert_eq!(identity.role, Role::Admin);
    }

    #[tokio::test]
    async fn login_failures() {
        let state = state_with(
            MemoryStore::seeded()
                .with_account("athlete", "user-pass-1", Role::User)
                .with_corrupt_account("broken"),
        );

        let err = login(&state, "athlete", "nope-nope").await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(AuthFailure::WrongPassword)));

        let err = login(&state, "ghost", "whatever1").await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(AuthFailure::UnknownAccount)));

        let err = login(&state, "broken", "whatever1").await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(AuthFailure::CorruptHash)));
    }

    #[tokio::test]
    async fn register_creates_user_role_and_rejects_duplicates() {
        let state = state_with(MemoryStore::seeded());
        let account = register(&state, "  newbie ", "New@Example.com", "longenough")
            .await
            .unwrap();
        assert_eq!(account.username, "newbie");
        assert_eq!(account.email, "new@example.com");
        assert_eq!(account.role, Role::User);
        assert!(password::verify_password("longenough", &account.password_hash).unwrap());

        let err = register(&state, "newbie", "other@example.com", "longenough")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let err = register(&state, "second", "other@example.com", "short").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn concurrent_registration_of_one_name_yields_conflict() {
        let state = state_with(MemoryStore::seeded());
        let (a, b) = tokio::join!(
            register(&state, "twin", "one@example.com", "longenough"),
            register(&state, "twin", "two@example.com", "longenough"),
        );

        let results = [a, b];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(AppError::Conflict(_)))));
    }

    #[tokio::test]
    async fn bootstrap_admin_is_idempotent() {
        let state = state_with(MemoryStore::seeded());
        let seed = AdminSeed {
            username: "root".into(),
            email: "root@example.com".into(),
            password: "rootpassword".into(),
        };
        bootstrap_admin(&state, &seed).await.unwrap();
        bootstrap_admin(&state, &seed).await.unwrap();

        let account = state.accounts.find_by_username("root").await.unwrap().unwrap();
        assert_eq!(account.role, Role::Admin);
    }
}
