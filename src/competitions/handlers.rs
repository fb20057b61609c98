use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{info, instrument};

use super::repo::{Competition, CompetitionInput};
use crate::{
    auth::guard::{AdminUser, AuthUser},
    error::{AppError, AppResult},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct CompetitionRequest {
    pub name: Option<String>,
    pub location: Option<String>,
    /// RFC3339, e.g. `2025-12-14T00:00:00Z`.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub start_date: Option<OffsetDateTime>,
}

impl CompetitionRequest {
    fn into_input(self) -> AppResult<CompetitionInput> {
        let name = required(self.name, "name")?;
        let location = required(self.location, "location")?;
        let start_date = self
            .start_date
            .ok_or_else(|| AppError::validation("start_date is required"))?;
        Ok(CompetitionInput {
            name,
            location,
            start_date,
        })
    }
}

fn required(value: Option<String>, field: &str) -> AppResult<String> {
    match value.map(|v| v.trim().to_owned()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppError::validation(format!("{field} is required"))),
    }
}

#[derive(Debug, Serialize)]
pub struct CompetitionList {
    pub competitions: Vec<Competition>,
}

pub fn competition_routes() -> Router<AppState> {
    Router::new()
        .route("/competitions", get(list_competitions).post(create_competition))
        .route(
            "/competitions/:id",
            get(get_competition)
                .put(update_competition)
                .delete(delete_competition),
        )
}

#[instrument(skip_all)]
pub async fn list_competitions(
    State(state): State<AppState>,
    _caller: AuthUser,
) -> AppResult<Json<CompetitionList>> {
    let competitions = state.competitions.list().await?;
    Ok(Json(CompetitionList { competitions }))
}

#[instrument(skip_all)]
pub async fn get_competition(
    State(state): State<AppState>,
    _caller: AuthUser,
    path: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<Competition>> {
    let Path(id) = path?;
    state
        .competitions
        .find_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("competition not found"))
}

#[instrument(skip_all)]
pub async fn create_competition(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
    payload: Result<Json<CompetitionRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Competition>)> {
    let Json(payload) = payload?;
    let competition = state.competitions.insert(payload.into_input()?).await?;
    info!(actor = %actor.username, competition_id = competition.id, "competition created");
    Ok((StatusCode::CREATED, Json(competition)))
}

#[instrument(skip_all)]
pub async fn update_competition(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<CompetitionRequest>, JsonRejection>,
) -> AppResult<Json<Competition>> {
    let Path(id) = path?;
    let Json(payload) = payload?;
    let competition = state
        .competitions
        .update(id, payload.into_input()?)
        .await?
        .ok_or_else(|| AppError::not_found("competition not found"))?;
    info!(actor = %actor.username, competition_id = id, "competition updated");
    Ok(Json(competition))
}

#[instrument(skip_all)]
pub async fn delete_competition(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
    path: Result<Path<i64>, PathRejection>,
) -> AppResult<StatusCode> {
    let Path(id) = path?;
    if !state.competitions.delete(id).await? {
        return Err(AppError::not_found("competition not found"));
    }
    info!(actor = %actor.username, competition_id = id, "competition deleted");
    Ok(StatusCode::NO_CONTENT)
}
