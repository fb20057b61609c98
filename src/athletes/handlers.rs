use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::{info, instrument};

use super::repo::Athlete;
use crate::{
    auth::guard::{AdminUser, AuthUser},
    error::{AppError, AppResult},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct AthleteRequest {
    pub full_name: Option<String>,
}

impl AthleteRequest {
    fn full_name(&self) -> AppResult<&str> {
        match self.full_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => Ok(name),
            _ => Err(AppError::validation("full_name is required")),
        }
    }
}

pub fn athlete_routes() -> Router<AppState> {
    Router::new()
        .route("/athletes", get(list_athletes).post(create_athlete))
        .route(
            "/athletes/:id",
            get(get_athlete).put(update_athlete).delete(delete_athlete),
        )
}

#[instrument(skip_all)]
pub async fn list_athletes(
    State(state): State<AppState>,
    _caller: AuthUser,
) -> AppResult<Json<Vec<Athlete>>> {
    Ok(Json(state.athletes.list().await?))
}

#[instrument(skip_all)]
pub async fn get_athlete(
    State(state): State<AppState>,
    _caller: AuthUser,
    path: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<Athlete>> {
    let Path(id) = path?;
    state
        .athletes
        .find_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("athlete not found"))
}

#[instrument(skip_all)]
pub async fn create_athlete(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
    payload: Result<Json<AthleteRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Athlete>)> {
    let Json(payload) = payload?;
    let athlete = state.athletes.insert(payload.full_name()?).await?;
    info!(actor = %actor.username, athlete_id = athlete.id, "athlete created");
    Ok((StatusCode::CREATED, Json(athlete)))
}

#[instrument(skip_all)]
pub async fn update_athlete(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<AthleteRequest>, JsonRejection>,
) -> AppResult<Json<Athlete>> {
    let Path(id) = path?;
    let Json(payload) = payload?;
    let athlete = state
        .athletes
        .update(id, payload.full_name()?)
        .await?
        .ok_or_else(|| AppError::not_found("athlete not found"))?;
    info!(actor = %actor.username, athlete_id = id, "athlete updated");
    Ok(Json(athlete))
}

#[instrument(skip_all)]
pub async fn delete_athlete(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
    path: Result<Path<i64>, PathRejection>,
) -> AppResult<StatusCode> {
    let Path(id) = path?;
    if !state.athletes.delete(id).await? {
        return Err(AppError::not_found("athlete not found"));
    }
    info!(actor = %actor.username, athlete_id = id, "athlete deleted");
    Ok(StatusCode::NO_CONTENT)
}
