use crate::server::AppContext;
use crate::state::StateView;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;

pub fn api_routes() -> Router<AppContext> {
    Router::new()
        .route("/health", get(health))
        .route("/state", get(get_state))
        .route("/query", put(set_query))
        .route("/movies", get(get_movies))
        .route("/trending", get(get_trending))
        .route("/trending/refresh", post(refresh_trending))
}

async fn health(State(ctx): State<AppContext>) -> impl IntoResponse {
    let state = ctx.orchestrator.snapshot();
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "metadata_configured": !ctx.config.tmdb.api_key.trim().is_empty(),
        "tracker": ctx.config.tracker.backend,
        "phase": state.phase(),
    }))
}

async fn get_state(State(ctx): State<AppContext>) -> impl IntoResponse {
    Json(StateView::from(ctx.orchestrator.snapshot()))
}

#[derive(Deserialize)]
struct SetQueryRequest {
    query: String,
}

/// Equivalent of a keystroke: the search runs once typing pauses.
async fn set_query(
    State(ctx): State<AppContext>,
    Json(req): Json<SetQueryRequest>,
) -> impl IntoResponse {
    ctx.orchestrator.set_query(req.query);
    (
        StatusCode::ACCEPTED,
        Json(StateView::from(ctx.orchestrator.snapshot())),
    )
}

async fn get_movies(State(ctx): State<AppContext>) -> impl IntoResponse {
    let state = ctx.orchestrator.snapshot();
    Json(serde_json::json!({
        "query": state.debounced_query,
        "is_loading": state.is_loading,
        "error_message": state.error_message,
        "movies": state.movies,
    }))
}

async fn get_trending(State(ctx): State<AppContext>) -> impl IntoResponse {
    Json(ctx.orchestrator.snapshot().trending)
}

async fn refresh_trending(State(ctx): State<AppContext>) -> impl IntoResponse {
    ctx.orchestrator.refresh_trending();
    StatusCode::ACCEPTED
}
