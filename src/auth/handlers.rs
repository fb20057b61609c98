use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        claims::Identity,
        dto::{LoginRequest, LoginResponse, PublicAccount, RegisterRequest},
        guard::AuthUser,
        services,
    },
    error::AppResult,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<Json<LoginResponse>> {
    let Json(payload) = payload?;
    let access_token = services::login(&state, &payload.username, &payload.password).await?;
    Ok(Json(LoginResponse {
        access_token,
        token_type: "Bearer",
        expires_in: state.keys.ttl().whole_seconds(),
    }))
}

#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<PublicAccount>)> {
    let Json(payload) = payload?;
    let account =
        services::register(&state, &payload.username, &payload.email, &payload.password).await?;
    Ok((StatusCode::CREATED, Json(account.into())))
}

pub async fn get_me(AuthUser(identity): AuthUser) -> Json<Identity> {
    Json(identity)
}
