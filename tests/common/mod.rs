//! Shared helpers for integration tests: an in-process stand-in for the
//! analyze API and row fixtures.

#![allow(dead_code)]

use axum::Router;
use pipe_monitor::analyze::{AnalyzeClient, SensorDescriptor, SensorRow};
use pipe_monitor::config::Config;
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// Serve `app` on an ephemeral port and return the analyze base URL.
pub async fn spawn_upstream(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/api/v1")
}

pub fn config_for(base_url: &str) -> Config {
    Config {
        analyze_base_url: base_url.to_string(),
        ..Config::default()
    }
}

pub fn client_for(base_url: &str) -> AnalyzeClient {
    AnalyzeClient::new(&config_for(base_url)).unwrap()
}

pub fn row(value: Value) -> SensorRow {
    serde_json::from_value(value).unwrap()
}

pub fn ring_strain_metadata() -> Vec<SensorDescriptor> {
    serde_json::from_value(json!([
        {"type": "Кольцевая деформация", "number": 1, "code": "K_1",
         "description": "Кольцевая деформация датчик #1", "units": "мм"},
        {"type": "Кольцевая деформация", "number": 2, "code": "K_2",
         "description": "Кольцевая деформация датчик #2", "units": "мм"},
        {"type": "Левая образующая", "number": 1, "code": "L_1",
         "description": null, "units": null},
        {"type": "Температура", "number": null, "code": "T",
         "description": "Температура", "units": "°C"}
    ]))
    .unwrap()
}
