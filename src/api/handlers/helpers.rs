use axum::http::StatusCode;

use crate::error::DashboardError;

pub type ApiResult<T> = Result<T, (StatusCode, String)>;

pub fn bad_request(msg: impl Into<String>) -> (StatusCode, String) {
    (StatusCode::BAD_REQUEST, msg.into())
}

pub fn not_found(msg: impl Into<String>) -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, msg.into())
}

pub fn internal_error(msg: impl Into<String>) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, msg.into())
}

pub fn dashboard_error(err: DashboardError) -> (StatusCode, String) {
    match err {
        DashboardError::InvalidRunId(_) => bad_request(err.to_string()),
        DashboardError::NotFound(_) => not_found(err.to_string()),
        DashboardError::Persistence(_) => {
            log::error!("dashboard read failed: {err}");
            internal_error(err.to_string())
        }
    }
}

/// Runs filesystem reads off the async workers.
pub async fn blocking<T, F>(f: F) -> ApiResult<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| internal_error(e.to_string()))
}
