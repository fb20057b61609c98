use async_trait::async_trait;
use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::db::PgStore;

#[derive(Debug, Clone, Serialize, FromRow, PartialEq, Eq)]
pub struct Athlete {
    pub id: i64,
    pub full_name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[async_trait]
pub trait AthleteStore: Send + Sync {
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<Athlete>>;
    async fn list(&self) -> anyhow::Result<Vec<Athlete>>;
    async fn insert(&self, full_name: &str) -> anyhow::Result<Athlete>;
    async fn update(&self, id: i64, full_name: &str) -> anyhow::Result<Option<Athlete>>;
    /// `false` when no row had that id.
    async fn delete(&self, id: i64) -> anyhow::Result<bool>;
}

#[async_trait]
impl AthleteStore for PgStore {
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<Athlete>> {
        let row = sqlx::query_as::<_, Athlete>(
            r#"SELECT id, full_name, created_at FROM athletes WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn list(&self) -> anyhow::Result<Vec<Athlete>> {
        let rows = sqlx::query_as::<_, Athlete>(
            r#"SELECT id, full_name, created_at FROM athletes ORDER BY full_name, id"#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn insert(&self, full_name: &str) -> anyhow::Result<Athlete> {
        let row = sqlx::query_as::<_, Athlete>(
            r#"
            INSERT INTO athletes (full_name)
            VALUES ($1)
            RETURNING id, full_name, created_at
            "#,
        )
        .bind(full_name)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    async fn update(&self, id: i64, full_name: &str) -> anyhow::Result<Option<Athlete>> {
        let row = sqlx::query_as::<_, Athlete>(
            r#"
            UPDATE athletes SET full_name = $1
            WHERE id = $2
            RETURNING id, full_name, created_at
            "#,
        )
        .bind(full_name)
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn delete(&self, id: i64) -> anyhow::Result<bool> {
        let res = sqlx::query(r#"DELETE FROM athletes WHERE id = $1"#)
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
