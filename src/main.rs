use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use dotenvy::dotenv;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use studioserver::api_router::configure_api_routes;
use studioserver::auth;
use studioserver::bootstrap;
use studioserver::shared::config::AppConfig;
use studioserver::shared::state::AppState;
use studioserver::shared::utils::create_conn;

async fn health() -> &'static str {
    "ok"
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load()?;
    let pool = create_conn(&config.database.url, config.database.max_connections)?;

    bootstrap::run_migrations(&pool)?;
    bootstrap::seed_admin_user(&pool)?;

    let state = Arc::new(AppState::new(pool, config));

    let protected = configure_api_routes().layer(middleware::from_fn_with_state(
        state.clone(),
        auth::require_bearer,
    ));

    let app = Router::new()
        .route("/health", get(health))
        .route("/api/auth/login", post(auth::login))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state.clone());

    let addr = state.config.bind_addr();
    info!(%addr, "studioserver listening");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
