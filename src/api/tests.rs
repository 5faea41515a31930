use std::fs;
use std::path::Path as FsPath;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use tempfile::{tempdir, TempDir};

use super::*;
use crate::store::{META_FILE, RESULTS_FILE};

fn seed() -> TempDir {
    let root = tempdir().unwrap();
    for (id, blocked) in [("20240101-000000", true), ("20240102-000000", false)] {
        let dir = root.path().join(id);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join(META_FILE),
            r#"{"model":"ollama/llama3","total_prompts":1,"start_time":"2024-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        fs::write(
            dir.join(RESULTS_FILE),
            format!("{{\"prompt_id\":\"p1\",\"latency_ms\":42.0,\"blocked\":{blocked}}}\n"),
        )
        .unwrap();
    }
    root
}

fn state(root: &FsPath) -> ServerState {
    ServerState::new(RunRepository::new(root))
}

#[tokio::test]
async fn list_runs_defaults_and_limit() {
    let root = seed();
    let axum::Json(runs) = handle_list_runs(State(state(root.path())), Query(RunsQuery::default()))
        .await
        .unwrap();
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0].run_id, "20240102-000000");

    let axum::Json(runs) = handle_list_runs(
        State(state(root.path())),
        Query(RunsQuery { limit: Some(1) }),
    )
    .await
    .unwrap();
    assert_eq!(runs.len(), 1);
}

#[tokio::test]
async fn run_detail_statuses() {
    let root = seed();
    let axum::Json(detail) = handle_run_detail(
        State(state(root.path())),
        Path("20240101-000000".to_string()),
    )
    .await
    .unwrap();
    assert_eq!(detail.summary.blocked_count, 1);
    assert_eq!(detail.results[0].prompt_id, "p1");

    let (status, _) = handle_run_detail(State(state(root.path())), Path("nope".to_string()))
        .await
        .unwrap_err();
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = handle_run_detail(State(state(root.path())), Path("..".to_string()))
        .await
        .unwrap_err();
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn stats_cover_all_runs() {
    let root = seed();
    let axum::Json(stats) = handle_stats(State(state(root.path()))).await.unwrap();
    assert_eq!(stats.total_runs, 2);
    assert_eq!(stats.total_evaluations, 2);
    assert_eq!(stats.violation_rate, 0.5);
    assert_eq!(stats.avg_latency, Some(42.0));
}

#[tokio::test]
async fn router_serves_json_with_cors() {
    let root = seed();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(state(root.path()));
    tokio::spawn(async move { axum::serve(listener, app).await });

    let client = reqwest::Client::new();
    let resp = client
        .get(format!("http://{addr}/api/runs?limit=5"))
        .header("Origin", "http://localhost:3000")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body.as_array().unwrap().len(), 2);
    assert_eq!(body[0]["model"], "ollama/llama3");
    assert_eq!(body[0]["summary"]["total_prompts"], 1);

    let resp = client
        .get(format!("http://{addr}/api/run/20249999-000000"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = client
        .get(format!("http://{addr}/api/stats"))
        .send()
        .await
        .unwrap();
    let stats: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(stats["total_runs"], 2);
    assert_eq!(stats["recent_violations"][0]["run_id"], "20240101-000000");
}
