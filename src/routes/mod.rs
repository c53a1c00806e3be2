pub mod chart;
pub mod health;
pub mod pipes;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::common::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthz,
        pipes::list_pipes,
        pipes::list_pipe_sensors,
        chart::build_pipe_chart,
    ),
    components(
        schemas(
            crate::analyze::Pipe,
            crate::analyze::SensorDescriptor,
            crate::domain::SensorSelection,
            crate::domain::Period,
            crate::domain::CustomRangeInput,
            crate::domain::TimeRange,
            crate::domain::ChartDataset,
            crate::domain::NoDataReason,
            crate::domain::chart::AxisBounds,
            pipes::SensorGroup,
            pipes::SensorsResponse,
            chart::ChartRequest,
            chart::ChartStatus,
            chart::ChartResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "pipes", description = "Pipes and their sensors"),
        (name = "chart", description = "Chart data for selected sensors"),
    ),
    info(
        title = "Pipe Monitor API",
        description = "Sensor charting for instrumented pipes",
        version = "0.1.0"
    )
)]
struct ApiDoc;

pub fn build_router(state: AppState) -> Router {
    tracing::info!(
        upstream = %state.config.analyze_base_url,
        page_size = state.config.sensor_data_page_size,
        "Building router"
    );

    let api_routes = Router::new()
        .route("/pipes", get(pipes::list_pipes))
        .route("/pipes/{pipe}/sensors", get(pipes::list_pipe_sensors))
        .route("/pipes/{pipe}/chart", post(chart::build_pipe_chart))
        .layer(RequestBodyLimitLayer::new(1024 * 1024)); // 1MB body limit

    let health_routes = Router::new().route("/healthz", get(health::healthz));

    let docs_routes = Router::new().merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    Router::new()
        .nest("/api/v1", api_routes)
        .merge(health_routes)
        .merge(docs_routes)
        .layer(CompressionLayer::new())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
