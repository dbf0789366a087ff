use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub store: &'static str,
    pub cache: &'static str,
    pub background_tasks: usize,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        store: state.backends.store,
        cache: state.backends.cache,
        background_tasks: state.background.in_flight(),
    })
}
