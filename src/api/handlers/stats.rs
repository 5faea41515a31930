use axum::extract::State;
use axum::Json;

use super::helpers::{blocking, ApiResult};
use crate::aggregate::FleetStats;
use crate::api::ServerState;

pub async fn handle_stats(State(state): State<ServerState>) -> ApiResult<Json<FleetStats>> {
    let repo = state.repo.clone();
    let window = state.fleet_window;
    Ok(Json(blocking(move || repo.fleet_stats(window)).await?))
}
