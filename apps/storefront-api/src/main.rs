//! Storefront API - product catalogue REST server

use axum::{middleware::from_fn_with_state, Router};
use axum_helpers::{
    optional_jwt_auth_middleware,
    server::{create_production_app, create_router, health_router},
    JwtAuth,
};
use core_config::tracing::{init_tracing, install_color_eyre};
use tracing::info;

mod api;
mod config;
mod openapi;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);

    info!(url = %config.mongodb.redacted_url(), "Connecting to MongoDB");

    let mongo_client = database::mongodb::connect_from_config_with_retry(
        &config.mongodb,
        Some(config.mongodb_retry.clone()),
    )
    .await?;

    let db = mongo_client.database(config.mongodb.database());

    info!(
        database = config.mongodb.database(),
        "Successfully connected to MongoDB"
    );

    let state = AppState {
        config,
        mongo_client,
        db,
    };

    api::init_indexes(&state).await?;

    let router = create_router::<openapi::ApiDoc>(api::routes(&state)).await?;
    let app = with_app_layers(router, &state);

    info!(
        "Starting {} v{} on port {}",
        state.config.app.name, state.config.app.version, state.config.server.port
    );

    let client = state.mongo_client.clone();
    create_production_app(app, &state.config.server, async move {
        info!("Shutting down: closing MongoDB connections");
        client.shutdown().await;
        info!("MongoDB connection closed");
    })
    .await?;

    info!("Storefront API shutdown complete");
    Ok(())
}

/// Add liveness and readiness probes and the JWT middleware that feeds
/// [`AuthUser`](axum_helpers::AuthUser) on the write endpoints.
fn with_app_layers(router: Router, state: &AppState) -> Router {
    router
        .merge(health_router(state.config.app))
        .merge(api::health::router(state))
        .layer(from_fn_with_state(
            JwtAuth::new(&state.config.jwt),
            optional_jwt_auth_middleware,
        ))
}
