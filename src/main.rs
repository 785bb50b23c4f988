mod app;
mod articles;
mod auth;
mod config;
mod db;
mod error;
mod routes;
mod state;

use tracing::warn;

use crate::{app::build_app, db::schema, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "cmsgate=debug,axum=info,tower_http=info".to_string());
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

    let app_state = AppState::init()?;

    // Bootstrap the schema if the database is reachable now; otherwise the
    // pool is retried on the first request that needs it.
    match app_state.pools.acquire().await {
        Ok(pool) => {
            if let Err(e) = schema::bootstrap(&pool).await {
                warn!(error = %e, "schema bootstrap failed; continuing");
            }
        }
        Err(e) => warn!(error = %e, "database unavailable at startup; continuing"),
    }

    let app = build_app(app_state.clone());
    app::serve(app).await?;

    app_state.pools.close().await;
    Ok(())
}
