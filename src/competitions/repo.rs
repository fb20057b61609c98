use async_trait::async_trait;
use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::db::PgStore;

#[derive(Debug, Clone, Serialize, FromRow, PartialEq, Eq)]
pub struct Competition {
    pub id: i64,
    pub name: String,
    pub location: String,
    #[serde(with = "time::serde::rfc3339")]
    pub start_date: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct CompetitionInput {
    pub name: String,
    pub location: String,
    pub start_date: OffsetDateTime,
}

#[async_trait]
pub trait CompetitionStore: Send + Sync {
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<Competition>>;
    async fn list(&self) -> anyhow::Result<Vec<Competition>>;
    async fn insert(&self, input: CompetitionInput) -> anyhow::Result<Competition>;
    async fn update(&self, id: i64, input: CompetitionInput) -> anyhow::Result<Option<Competition>>;
    async fn delete(&self, id: i64) -> anyhow::Result<bool>;
}

#[async_trait]
impl CompetitionStore for PgStore {
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<Competition>> {
        let row = sqlx::query_as::<_, Competition>(
            r#"SELECT id, name, location, start_date FROM competitions WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    /// Newest first.
    async fn list(&self) -> anyhow::Result<Vec<Competition>> {
        let rows = sqlx::query_as::<_, Competition>(
            r#"
            SELECT id, name, location, start_date
            FROM competitions
            ORDER BY start_date DESC, id
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn insert(&self, input: CompetitionInput) -> anyhow::Result<Competition> {
        let row = sqlx::query_as::<_, Competition>(
            r#"
            INSERT INTO competitions (name, location, start_date)
            VALUES ($1, $2, $3)
            RETURNING id, name, location, start_date
            "#,
        )
        .bind(&input.name)
        .bind(&input.location)
        .bind(input.start_date)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    async fn update(&self, id: i64, input: CompetitionInput) -> anyhow::Result<Option<Competition>> {
        let row = sqlx::query_as::<_, Competition>(
            r#"
            UPDATE competitions
               SET name = $1, location = $2, start_date = $3
             WHERE id = $4
            RETURNING id, name, location, start_date
            "#,
        )
        .bind(&input.name)
        .bind(&input.location)
        .bind(input.start_date)
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn delete(&self, id: i64) -> anyhow::Result<bool> {
        let res = sqlx::query(r#"DELETE FROM competitions WHERE id = $1"#)
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
