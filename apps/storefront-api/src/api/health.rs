//! Readiness endpoint

use axum::{extract::State, response::Response, routing::get, Router};
use axum_helpers::{run_health_checks, HealthCheckFuture};
use database::mongodb::check_health_detailed;
use mongodb::Client;

use crate::state::AppState;

async fn ready(State(client): State<Client>) -> Response {
    let probe: HealthCheckFuture = Box::pin(async move {
        let status = check_health_detailed(&client).await;
        if status.healthy {
            Ok(())
        } else {
            Err(status.message.unwrap_or_else(|| "ping failed".to_string()))
        }
    });

    run_health_checks(vec![("mongodb", probe)]).await
}

/// `GET /ready`: 200 once MongoDB answers a ping, 503 otherwise
pub fn router(state: &AppState) -> Router {
    Router::new()
        .route("/ready", get(ready))
        .with_state(state.mongo_client.clone())
}
