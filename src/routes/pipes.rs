use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::analyze::{Pipe, SensorDescriptor};
use crate::common::AppState;
use crate::error::AppResult;

#[derive(Debug, Serialize, ToSchema)]
pub struct SensorGroup {
    #[serde(rename = "type")]
    pub sensor_type: String,
    pub sensors: Vec<SensorDescriptor>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SensorsResponse {
    pub pipe: String,
    pub sensors: Vec<SensorDescriptor>,
    /// Same sensors grouped by type, in order of first appearance
    pub groups: Vec<SensorGroup>,
}

/// Group descriptors by sensor type, keeping the metadata order.
#[must_use]
pub fn group_by_type(sensors: &[SensorDescriptor]) -> Vec<SensorGroup> {
    let mut groups: Vec<SensorGroup> = Vec::new();
    for sensor in sensors {
        match groups.iter_mut().find(|g| g.sensor_type == sensor.sensor_type) {
            Some(group) => group.sensors.push(sensor.clone()),
            None => groups.push(SensorGroup {
                sensor_type: sensor.sensor_type.clone(),
                sensors: vec![sensor.clone()],
            }),
        }
    }
    groups
}

/// List pipes
#[utoipa::path(
    get,
    path = "/api/v1/pipes",
    responses(
        (status = 200, description = "Pipes retrieved successfully", body = Vec<Pipe>),
        (status = 502, description = "Analyze API unavailable or returned an error"),
    ),
    tag = "pipes"
)]
pub async fn list_pipes(State(state): State<AppState>) -> AppResult<Json<Vec<Pipe>>> {
    let pipes = state.analyze_client.get_pipes().await?;
    tracing::debug!(count = pipes.len(), "pipes_listed");
    Ok(Json(pipes))
}

/// List sensors of a pipe
#[utoipa::path(
    get,
    path = "/api/v1/pipes/{pipe}/sensors",
    params(
        ("pipe" = String, Path, description = "Pipe (table) name"),
    ),
    responses(
        (status = 200, description = "Sensor metadata retrieved successfully", body = SensorsResponse),
        (status = 502, description = "Analyze API unavailable or returned an error"),
    ),
    tag = "pipes"
)]
pub async fn list_pipe_sensors(
    State(state): State<AppState>,
    Path(pipe): Path<String>,
) -> AppResult<Json<SensorsResponse>> {
    let sensors = state.analyze_client.get_sensor_metadata(&pipe).await?;
    let groups = group_by_type(&sensors);

    Ok(Json(SensorsResponse {
        pipe,
        sensors,
        groups,
    }))
}
