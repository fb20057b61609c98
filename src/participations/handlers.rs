use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::{header::LOCATION, HeaderMap, HeaderValue, StatusCode},
    routing::{get, put},
    Json, Router,
};

use super::{
    dto::{CreateParticipationRequest, UpdatePlaceRequest},
    repo::{Participation, ParticipationDetails},
    services,
};
use crate::{
    auth::guard::{AdminUser, AuthUser},
    error::AppResult,
    state::AppState,
};

// Reads are open to any authenticated caller; writes need admin.
pub fn participation_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/participations",
            get(list_participations).post(create_participation),
        )
        .route(
            "/participations/:id",
            get(get_participation).delete(delete_participation),
        )
        .route("/participations/:id/place", put(update_place))
}

pub async fn create_participation(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
    payload: Result<Json<CreateParticipationRequest>, JsonRejection>,
) -> AppResult<(StatusCode, HeaderMap, Json<Participation>)> {
    let Json(payload) = payload?;
    let participation = services::create(&state, &actor, payload).await?;

    let mut headers = HeaderMap::new();
    if let Ok(location) =
        HeaderValue::from_str(&format!("/api/v1/participations/{}", participation.id))
    {
        headers.insert(LOCATION, location);
    }
    Ok((StatusCode::CREATED, headers, Json(participation)))
}

pub async fn list_participations(
    State(state): State<AppState>,
    _caller: AuthUser,
) -> AppResult<Json<Vec<ParticipationDetails>>> {
    Ok(Json(services::list(&state).await?))
}

pub async fn get_participation(
    State(state): State<AppState>,
    _caller: AuthUser,
    path: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<ParticipationDetails>> {
    let Path(id) = path?;
    Ok(Json(services::get(&state, id).await?))
}

pub async fn update_place(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdatePlaceRequest>, JsonRejection>,
) -> AppResult<Json<ParticipationDetails>> {
    let Path(id) = path?;
    let Json(payload) = payload?;
    Ok(Json(services::update_place(&state, &actor, id, payload).await?))
}

pub async fn delete_participation(
    State(state): State<AppState>,
    AdminUser(actor): AdminUser,
    path: Result<Path<i64>, PathRejection>,
) -> AppResult<StatusCode> {
    let Path(id) = path?;
    services::delete(&state, &actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
