use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use shared::{
    error::RelayError,
    protocol::{relay_chat_route, RelayRequest, RelayResponse},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod config;
mod upstream;

use config::load_settings;
use upstream::Upstream;

#[derive(Clone)]
struct AppState {
    upstream: Upstream,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let settings = load_settings()?;
    let upstream = Upstream::new(&settings)?;
    info!(
        upstream = %upstream.query_url(),
        namespace = %settings.namespace,
        "relaying chat requests"
    );

    let app = build_router(Arc::new(AppState { upstream }), settings.max_body_bytes);

    let addr: SocketAddr = settings.bind_addr.parse()?;
    info!(%addr, "relay listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route(relay_chat_route(), post(chat))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn chat(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RelayRequest>, JsonRejection>,
) -> Result<Json<RelayResponse>, (StatusCode, Json<RelayError>)> {
    let Json(request) = payload.map_err(|rejection| {
        error!(error = %rejection.body_text(), "unreadable chat request");
        failure(rejection.body_text())
    })?;

    let messages = request.messages.len();
    let response = state.upstream.forward(request).await.map_err(|err| {
        error!(messages, error = %err, "chat relay failed");
        failure(err.to_string())
    })?;
    Ok(Json(response))
}

fn failure(details: String) -> (StatusCode, Json<RelayError>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(RelayError::failed_to_process(details)),
    )
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
