use crate::state::AppState;
use axum::Router;

pub mod claims;
pub mod dto;
pub mod guard;
pub mod handlers;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod repo;
pub mod services;

/// Login and registration; mounted outside the authenticated group.
pub fn public_router() -> Router<AppState> {
    handlers::auth_routes()
}

pub fn router() -> Router<AppState> {
    handlers::me_routes()
}
