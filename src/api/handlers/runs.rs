use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use super::helpers::{blocking, dashboard_error, ApiResult};
use crate::aggregate::RunOverview;
use crate::api::ServerState;
use crate::dashboard::{RunDetail, DEFAULT_RUN_LIMIT};

#[derive(Debug, Default, Deserialize)]
pub struct RunsQuery {
    pub limit: Option<usize>,
}

pub async fn handle_list_runs(
    State(state): State<ServerState>,
    Query(query): Query<RunsQuery>,
) -> ApiResult<Json<Vec<RunOverview>>> {
    let limit = query.limit.unwrap_or(DEFAULT_RUN_LIMIT);
    let repo = state.repo.clone();
    let runs = blocking(move || repo.recent_runs(limit)).await?;
    Ok(Json(runs))
}

pub async fn handle_run_detail(
    State(state): State<ServerState>,
    Path(run_id): Path<String>,
) -> ApiResult<Json<RunDetail>> {
    let repo = state.repo.clone();
    let detail = blocking(move || repo.run_detail(&run_id))
        .await?
        .map_err(dashboard_error)?;
    Ok(Json(detail))
}
