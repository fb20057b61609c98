use async_trait::async_trait;
use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::db::PgStore;

/// Registration of an athlete for a competition. `place` stays `None` until a
/// result is recorded.
#[derive(Debug, Clone, Serialize, FromRow, PartialEq, Eq)]
pub struct Participation {
    pub id: i64,
    pub athlete_id: i64,
    pub competition_id: i64,
    pub place: Option<i32>,
    #[serde(with = "time::serde::rfc3339")]
    pub registered_at: OffsetDateTime,
}

/// A participation joined with the athlete's and competition's names.
#[derive(Debug, Clone, Serialize, FromRow, PartialEq, Eq)]
pub struct ParticipationDetails {
    pub id: i64,
    pub athlete_id: i64,
    pub athlete_full_name: String,
    pub competition_id: i64,
    pub competition_name: String,
    pub place: Option<i32>,
    #[serde(with = "time::serde::rfc3339")]
    pub registered_at: OffsetDateTime,
}

#[async_trait]
pub trait ParticipationStore: Send + Sync {
    async fn insert(&self, athlete_id: i64, competition_id: i64) -> anyhow::Result<Participation>;
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<ParticipationDetails>>;
    async fn list(&self) -> anyhow::Result<Vec<ParticipationDetails>>;
    /// `false` when no row had that id.
    async fn update_place(&self, id: i64, place: i32) -> anyhow::Result<bool>;
    async fn delete(&self, id: i64) -> anyhow::Result<bool>;
}

const DETAILS_SELECT: &str = r#"
    SELECT p.id, p.athlete_id, a.full_name AS athlete_full_name,
           p.competition_id, c.name AS competition_name,
           p.place, p.registered_at
      FROM participations p
      JOIN athletes a ON p.athlete_id = a.id
      JOIN competitions c ON p.competition_id = c.id
"#;

#[async_trait]
impl ParticipationStore for PgStore {
    async fn insert(&self, athlete_id: i64, competition_id: i64) -> anyhow::Result<Participation> {
        let row = sqlx::query_as::<_, Participation>(
            r#"
            INSERT INTO participations (athlete_id, competition_id)
            VALUES ($1, $2)
            RETURNING id, athlete_id, competition_id, place, registered_at
            "#,
        )
        .bind(athlete_id)
        .bind(competition_id)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<ParticipationDetails>> {
        let sql = format!("{DETAILS_SELECT} WHERE p.id = $1");
        let row = sqlx::query_as::<_, ParticipationDetails>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(row)
    }

    async fn list(&self) -> anyhow::Result<Vec<ParticipationDetails>> {
        let sql = format!("{DETAILS_SELECT} ORDER BY c.start_date DESC, a.full_name, p.id");
        let rows = sqlx::query_as::<_, ParticipationDetails>(&sql)
            .fetch_all(&self.db)
            .await?;
        Ok(rows)
    }

    async fn update_place(&self, id: i64, place: i32) -> anyhow::Result<bool> {
        let res = sqlx::query(r#"UPDATE participations SET place = $1 WHERE id = $2"#)
            .bind(place)
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn delete(&self, id: i64) -> anyhow::Result<bool> {
        let res = sqlx::query(r#"DELETE FROM participations WHERE id = $1"#)
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
