use axum::{
    extract::{Path, Query, State},
    http::{
        header::{self, HeaderMap, HeaderValue},
        StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::analyze::{SensorDataFilters, SensorRow};
use crate::common::AppState;
use crate::domain::chart::AxisBounds;
use crate::domain::{
    build_chart, resolve, ChartData, ChartDataset, ChartOutcome, CustomRangeInput, NoDataReason,
    Period, SelectionAction, SelectionState, SensorSelection, TimeRange,
};
use crate::error::{AppError, AppResult};
use crate::render::chartjs_config;

fn default_format() -> String {
    "json".to_string()
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ChartQuery {
    /// Output format: json (default) or csv
    #[serde(default = "default_format")]
    pub format: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChartRequest {
    #[serde(default)]
    pub period: Period,
    /// Required when `period` is `custom`
    #[serde(default)]
    pub custom: Option<CustomRangeInput>,
    pub sensors: Vec<SensorSelection>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ChartStatus {
    Ready,
    NoData,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ChartResponse {
    pub status: ChartStatus,
    /// Advisory for the user (no data, large values)
    pub message: Option<String>,
    pub reason: Option<NoDataReason>,
    pub range: TimeRange,
    pub labels: Vec<String>,
    pub datasets: Vec<ChartDataset>,
    pub y_axis_bounds: Option<AxisBounds>,
    pub any_large_values: bool,
    /// Chart.js configuration, present when status is `ready`
    #[schema(value_type = Option<Object>)]
    pub chartjs: Option<serde_json::Value>,
}

impl ChartResponse {
    fn ready(range: TimeRange, chart: ChartData) -> Self {
        let chartjs = chartjs_config(&chart);
        Self {
            status: ChartStatus::Ready,
            message: chart.advisory().map(ToString::to_string),
            reason: None,
            range,
            any_large_values: chart.any_large_values,
            y_axis_bounds: chart.y_axis_bounds,
            labels: chart.labels,
            datasets: chart.datasets,
            chartjs: Some(chartjs),
        }
    }

    fn no_data(range: TimeRange, reason: NoDataReason) -> Self {
        Self {
            status: ChartStatus::NoData,
            message: Some(reason.message().to_string()),
            reason: Some(reason),
            range,
            labels: Vec::new(),
            datasets: Vec::new(),
            y_axis_bounds: None,
            any_large_values: false,
            chartjs: None,
        }
    }
}

fn determine_format(query_format: &str, headers: &HeaderMap) -> String {
    // Query parameter takes precedence
    if query_format != "json" {
        return query_format.to_lowercase();
    }

    if let Some(accept) = headers.get(header::ACCEPT)
        && let Ok(accept_str) = accept.to_str()
        && accept_str.contains("text/csv")
    {
        return "csv".to_string();
    }

    "json".to_string()
}

/// Fold the request into a selection state, rejecting bad input before any fetch.
fn selection_for(pipe: String, request: ChartRequest) -> AppResult<SelectionState> {
    let mut state = SelectionState::default()
        .apply(SelectionAction::SelectPipe(pipe))?
        .apply(SelectionAction::SelectSensors(request.sensors))?;

    if request.period == Period::Custom
        && let Some(custom) = request.custom
    {
        state = state.apply(SelectionAction::ApplyCustomRange(custom))?;
    }

    state.apply(SelectionAction::SetPeriod(request.period))
}

/// Build a chart for selected sensors of a pipe
#[utoipa::path(
    post,
    path = "/api/v1/pipes/{pipe}/chart",
    params(
        ("pipe" = String, Path, description = "Pipe (table) name"),
        ChartQuery,
    ),
    request_body = ChartRequest,
    responses(
        (status = 200, description = "Chart built (check `status` for no-data results)", body = ChartResponse),
        (status = 422, description = "Invalid sensor selection or time range"),
        (status = 502, description = "Analyze API unavailable or returned an error"),
    ),
    tag = "chart"
)]
pub async fn build_pipe_chart(
    State(state): State<AppState>,
    Path(pipe): Path<String>,
    Query(query): Query<ChartQuery>,
    headers: HeaderMap,
    Json(request): Json<ChartRequest>,
) -> AppResult<Response> {
    let format = determine_format(&query.format, &headers);
    if format != "json" && format != "csv" {
        return Err(AppError::Validation(format!(
            "Invalid format '{format}'. Use json or csv"
        )));
    }

    let selection = selection_for(pipe.clone(), request)?;
    let range = resolve(selection.period, selection.custom.as_ref(), &Local::now())?;

    let filters = SensorDataFilters {
        pipe_id: pipe.clone(),
        start_time: range.start.clone(),
        end_time: range.end.clone(),
        sensors: selection.sensors.clone(),
    };

    let client = &state.analyze_client;
    let (metadata, rows) = tokio::try_join!(
        client.get_sensor_metadata(&pipe),
        client.get_sensor_data(&pipe, &filters),
    )?;

    tracing::debug!(
        pipe = %pipe,
        rows = rows.len(),
        sensors = selection.sensors.len(),
        format = %format,
        "chart_data_fetched"
    );

    let outcome = build_chart(&rows, &selection.sensors, &metadata, &state.chart_style());

    if format == "csv" {
        return build_csv_response(&rows, &outcome);
    }

    let response = match outcome {
        ChartOutcome::Ready(chart) => ChartResponse::ready(range, chart),
        ChartOutcome::NoData(reason) => ChartResponse::no_data(range, reason),
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// One line per row: the raw timestamp, then one column per dataset.
///
/// Built in memory; the input is bounded by one page of sensor data.
fn build_csv_response(rows: &[SensorRow], outcome: &ChartOutcome) -> AppResult<Response> {
    let datasets: &[ChartDataset] = match outcome {
        ChartOutcome::Ready(chart) => &chart.datasets,
        ChartOutcome::NoData(_) => &[],
    };

    let mut writer = csv::Writer::from_writer(Vec::new());

    let header_row = std::iter::once("time").chain(datasets.iter().map(|d| d.label.as_str()));
    writer
        .write_record(header_row)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    if !datasets.is_empty() {
        for (i, row) in rows.iter().enumerate() {
            let mut record = vec![row.time.clone()];
            record.extend(
                datasets
                    .iter()
                    .map(|d| d.values.get(i).copied().flatten().map(|v| v.to_string()).unwrap_or_default()),
            );
            writer
                .write_record(&record)
                .map_err(|e| AppError::Internal(e.to_string()))?;
        }
    }

    let body = writer
        .into_inner()
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Response::builder()
        .header(header::CONTENT_TYPE, HeaderValue::from_static("text/csv"))
        .body(axum::body::Body::from(body))
        .map_err(|e| AppError::Internal(e.to_string()))
}
