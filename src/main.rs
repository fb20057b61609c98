mod app;
mod athletes;
mod auth;
mod competitions;
mod config;
mod db;
mod error;
#[cfg(test)]
mod memory;
mod participations;
mod state;

use crate::{config::AppConfig, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "sportmanager=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = AppConfig::from_env()?;
    let admin = config.admin.clone();
    let (host, port) = (config.host.clone(), config.port);

    let app_state = AppState::init(config).await?;

    if let Some(seed) = admin {
        auth::services::bootstrap_admin(&app_state, &seed).await?;
    }

    app::serve(app::build_app(app_state), &host, port).await
}
