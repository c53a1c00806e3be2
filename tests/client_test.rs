//! Integration tests for the analyze API client against an in-process stub.
//!
//! Run with: cargo test --test client_test

mod common;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use pipe_monitor::analyze::SensorDataFilters;
use pipe_monitor::domain::SensorSelection;
use pipe_monitor::error::AppError;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

type Captured = Arc<Mutex<Option<(String, Value)>>>;

fn filters() -> SensorDataFilters {
    SensorDataFilters {
        pipe_id: "main".into(),
        start_time: "2025-03-04T00:00:00.000+00:00".into(),
        end_time: "2025-03-05T00:00:00.000+00:00".into(),
        sensors: vec![SensorSelection::new("Кольцевая деформация", Some(1))],
    }
}

#[tokio::test]
async fn lists_pipes() {
    let app = Router::new().route(
        "/api/v1/analyze/tables",
        get(|| async {
            Json(json!({
                "status": "success",
                "data": [
                    {"id": 1, "name": "main", "created_at": "2025-03-04T20:48:42.506465+00:00"},
                    {"id": 2, "name": "test", "created_at": "2025-03-04T20:49:32.106465+00:00"}
                ]
            }))
        }),
    );
    let client = common::client_for(&common::spawn_upstream(app).await);

    let pipes = client.get_pipes().await.unwrap();

    assert_eq!(pipes.len(), 2);
    assert_eq!(pipes[0].id, 1);
    assert_eq!(pipes[1].name, "test");
    assert!(pipes[0].created_at.is_some());
}

#[tokio::test]
async fn non_success_status_is_format_error() {
    let app = Router::new().route(
        "/api/v1/analyze/tables",
        get(|| async { Json(json!({"status": "error", "data": []})) }),
    );
    let client = common::client_for(&common::spawn_upstream(app).await);

    let err = client.get_pipes().await.unwrap_err();

    assert!(matches!(err, AppError::Format(_)), "got {err:?}");
}

#[tokio::test]
async fn non_json_body_is_format_error() {
    let app = Router::new().route(
        "/api/v1/analyze/tables",
        get(|| async { ([(header::CONTENT_TYPE, "text/html")], "<html></html>") }),
    );
    let client = common::client_for(&common::spawn_upstream(app).await);

    let err = client.get_pipes().await.unwrap_err();

    assert!(matches!(err, AppError::Format(_)), "got {err:?}");
}

#[tokio::test]
async fn http_error_carries_server_message() {
    let app = Router::new().route(
        "/api/v1/analyze/sensor_metadata/{table}",
        get(|| async {
            (
                StatusCode::NOT_FOUND,
                Json(json!({"status": "error", "message": "Table not found", "code": "RESOURCE_NOT_FOUND"})),
            )
        }),
    );
    let client = common::client_for(&common::spawn_upstream(app).await);

    let err = client.get_sensor_metadata("missing").await.unwrap_err();

    match err {
        AppError::Server { status, message } => {
            assert_eq!(status, 404);
            assert!(message.contains("Table not found"));
        }
        other => panic!("expected server error, got {other:?}"),
    }
}

#[tokio::test]
async fn http_error_without_json_uses_status_text() {
    let app = Router::new().route(
        "/api/v1/analyze/tables",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response() }),
    );
    let client = common::client_for(&common::spawn_upstream(app).await);

    let err = client.get_pipes().await.unwrap_err();

    assert!(
        matches!(&err, AppError::Server { status: 500, message } if message == "Internal Server Error"),
        "got {err:?}"
    );
}

#[tokio::test]
async fn unreachable_api_is_transport_error() {
    // Reserve a port, then free it so nothing is listening
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = common::client_for(&format!("http://{addr}/api/v1"));

    let err = client.get_pipes().await.unwrap_err();

    assert!(matches!(err, AppError::Transport(_)), "got {err:?}");
}

#[tokio::test]
async fn sensors_field_must_be_an_array() {
    let app = Router::new().route(
        "/api/v1/analyze/sensor_metadata/{table}",
        get(|| async { Json(json!({"status": "success", "table_name": "main", "sensors": {}})) }),
    );
    let client = common::client_for(&common::spawn_upstream(app).await);

    let err = client.get_sensor_metadata("main").await.unwrap_err();

    assert!(matches!(err, AppError::Format(_)), "got {err:?}");
}

#[tokio::test]
async fn metadata_path_is_percent_encoded() {
    let app = Router::new().route(
        "/api/v1/analyze/sensor_metadata/{table}",
        get(|Path(table): Path<String>| async move {
            Json(json!({
                "status": "success",
                "table_name": table,
                "sensors": [{"type": "Температура", "number": null, "code": "T", "description": table, "units": "°C"}]
            }))
        }),
    );
    let client = common::client_for(&common::spawn_upstream(app).await);

    let sensors = client.get_sensor_metadata("pipe #2/a").await.unwrap();

    assert_eq!(sensors.len(), 1);
    assert_eq!(sensors[0].description, "pipe #2/a");
    assert_eq!(sensors[0].number, None);
}

#[tokio::test]
async fn sensor_data_posts_filters_with_fixed_page_size() {
    let captured: Captured = Arc::new(Mutex::new(None));
    let app = Router::new()
        .route(
            "/api/v1/analyze/sensor/{table}",
            post(
                |State(captured): State<Captured>, Path(table): Path<String>, Json(body): Json<Value>| async move {
                    *captured.lock().unwrap() = Some((table, body));
                    Json(json!([
                        {"Time": "2025-03-04T10:00:00Z", "K_1": 1.2},
                        {"Time": "2025-03-04T11:00:00Z", "K_1": 1.3, "K_2": null}
                    ]))
                },
            ),
        )
        .with_state(captured.clone());
    let client = common::client_for(&common::spawn_upstream(app).await);

    let rows = client.get_sensor_data("main", &filters()).await.unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].time, "2025-03-04T10:00:00Z");
    assert_eq!(rows[1].get("K_1"), Some(&json!(1.3)));
    assert_eq!(rows[1].get("K_2"), Some(&Value::Null));

    let (table, body) = captured.lock().unwrap().take().expect("request captured");
    assert_eq!(table, "main");
    assert_eq!(body["page"], 1);
    assert_eq!(body["page_size"], 1000);
    assert_eq!(body["filters"]["pipe_id"], "main");
    assert_eq!(body["filters"]["start_time"], "2025-03-04T00:00:00.000+00:00");
    assert_eq!(
        body["filters"]["sensors"],
        json!([{"type": "Кольцевая деформация", "number": 1}])
    );
}

#[tokio::test]
async fn sensor_data_accepts_status_envelope() {
    let app = Router::new().route(
        "/api/v1/analyze/sensor/{table}",
        post(|| async {
            Json(json!({
                "status": "success",
                "data": [{"time": "2025-03-04T10:00:00Z", "T": 21.0}]
            }))
        }),
    );
    let client = common::client_for(&common::spawn_upstream(app).await);

    let rows = client.get_sensor_data("main", &filters()).await.unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].time, "2025-03-04T10:00:00Z");
    assert_eq!(rows[0].get("T"), Some(&json!(21.0)));
}

#[tokio::test]
async fn sensor_data_error_envelope_is_format_error() {
    let app = Router::new().route(
        "/api/v1/analyze/sensor/{table}",
        post(|| async { Json(json!({"status": "error", "message": "bad filters"})) }),
    );
    let client = common::client_for(&common::spawn_upstream(app).await);

    let err = client.get_sensor_data("main", &filters()).await.unwrap_err();

    assert!(matches!(err, AppError::Format(ref m) if m.contains("bad filters")), "got {err:?}");
}
