use async_trait::async_trait;
use serde::Serialize;
use sqlx::FromRow;
use thiserror::Error;
use time::OffsetDateTime;

use super::claims::Role;
use crate::db::PgStore;

#[derive(Debug, Clone, FromRow)]
struct AccountRow {
    id: i64,
    username: String,
    email: String,
    password_hash: String,
    role: String,
    created_at: OffsetDateTime,
}

/// Account record in the database.
#[derive(Debug, Clone, Serialize)]
pub struct Account {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 PHC string, not exposed in JSON
    pub role: Role,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl TryFrom<AccountRow> for Account {
    type Error = anyhow::Error;

    fn try_from(r: AccountRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            role: r.role.parse()?,
            username: r.username,
            email: r.email,
            password_hash: r.password_hash,
            created_at: r.created_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// Returned by [`AccountStore::insert`] when the username is already stored.
#[derive(Debug, Error)]
#[error("username {0:?} is already taken")]
pub struct UsernameTaken(pub String);

#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<Account>>;
    /// Fails with [`UsernameTaken`] on a duplicate username.
    async fn insert(&self, account: NewAccount) -> anyhow::Result<Account>;
}

#[async_trait]
impl AccountStore for PgStore {
    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT id, username, email, password_hash, role, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await?;
        row.map(Account::try_from).transpose()
    }

    async fn insert(&self, account: NewAccount) -> anyhow::Result<Account> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            INSERT INTO users (username, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, email, password_hash, role, created_at
            "#,
        )
        .bind(&account.username)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(account.role.as_str())
        .fetch_one(&self.db)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                anyhow::Error::new(UsernameTaken(account.username.clone()))
            }
            other => other.into(),
        })?;
        Account::try_from(row)
    }
}
