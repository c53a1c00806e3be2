use async_trait::async_trait;
use reqwest::{header, Client, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

use crate::analyze::models::{
    ErrorBody, Pipe, SensorDataFilters, SensorDataRequest, SensorDataResponse, SensorDescriptor,
    SensorRow, STATUS_SUCCESS,
};
use crate::config::Config;
use crate::error::{AppError, AppResult};

/// The three calls the dashboard makes against the analyze API.
#[async_trait]
pub trait SensorApi: Send + Sync {
    async fn list_pipes(&self) -> AppResult<Vec<Pipe>>;

    async fn sensor_metadata(&self, pipe_name: &str) -> AppResult<Vec<SensorDescriptor>>;

    async fn sensor_data(
        &self,
        pipe_name: &str,
        filters: &SensorDataFilters,
    ) -> AppResult<Vec<SensorRow>>;
}

pub struct AnalyzeClient {
    http_client: Client,
    base_url: String,
    page_size: u32,
}

impl AnalyzeClient {
    /// Build a client for the configured analyze API.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Internal` if the HTTP client cannot be constructed.
    pub fn new(config: &Config) -> AppResult<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = config.upstream_timeout_seconds {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http_client = builder
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            base_url: config.analyze_base_url.trim_end_matches('/').to_string(),
            page_size: config.sensor_data_page_size,
        })
    }

    /// List all pipes known to the analyze API.
    ///
    /// # Errors
    ///
    /// `AppError::Transport` if the API is unreachable, `AppError::Server` on a
    /// non-2xx status, `AppError::Format` if the body is not a success envelope
    /// with a `data` array.
    pub async fn get_pipes(&self) -> AppResult<Vec<Pipe>> {
        let url = format!("{}/analyze/tables", self.base_url);
        tracing::debug!(url = %url, "Fetching pipe list");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::Transport(format!("Request failed: {e}")))?;

        let body = read_json(response).await?;
        extract_array(body, "data")
    }

    /// Get sensor metadata for a pipe.
    ///
    /// # Errors
    ///
    /// Same as [`AnalyzeClient::get_pipes`]; additionally `AppError::Format` if
    /// `sensors` is not an array.
    pub async fn get_sensor_metadata(&self, pipe_name: &str) -> AppResult<Vec<SensorDescriptor>> {
        let url = format!(
            "{}/analyze/sensor_metadata/{}",
            self.base_url,
            urlencoding::encode(pipe_name)
        );
        tracing::debug!(url = %url, pipe = %pipe_name, "Fetching sensor metadata");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::Transport(format!("Request failed: {e}")))?;

        let body = read_json(response).await?;
        extract_array(body, "sensors")
    }

    /// Get time-series rows for the selected sensors of a pipe.
    ///
    /// Only the first page is requested; rows beyond the page size are not
    /// fetched.
    ///
    /// # Errors
    ///
    /// Same as [`AnalyzeClient::get_pipes`].
    pub async fn get_sensor_data(
        &self,
        pipe_name: &str,
        filters: &SensorDataFilters,
    ) -> AppResult<Vec<SensorRow>> {
        let url = format!(
            "{}/analyze/sensor/{}",
            self.base_url,
            urlencoding::encode(pipe_name)
        );
        tracing::debug!(
            url = %url,
            pipe = %pipe_name,
            start = %filters.start_time,
            end = %filters.end_time,
            sensors = filters.sensors.len(),
            "Fetching sensor data"
        );

        let request = SensorDataRequest {
            filters,
            page: 1,
            page_size: self.page_size,
        };

        let response = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Transport(format!("Request failed: {e}")))?;

        let body = read_json(response).await?;
        let rows = match serde_json::from_value::<SensorDataResponse>(body) {
            Ok(SensorDataResponse::Rows(rows)) => rows,
            Ok(SensorDataResponse::Envelope { status, data, message }) => {
                if status != STATUS_SUCCESS {
                    return Err(AppError::Format(format!(
                        "Unexpected status '{status}'{}",
                        message.map(|m| format!(": {m}")).unwrap_or_default()
                    )));
                }
                data
            }
            Err(e) => {
                return Err(AppError::Format(format!("Failed to parse sensor rows: {e}")));
            }
        };

        if rows.len() >= self.page_size as usize {
            tracing::warn!(
                pipe = %pipe_name,
                page_size = self.page_size,
                "Sensor data reached the page size, later rows are not fetched"
            );
        }

        Ok(rows)
    }
}

#[async_trait]
impl SensorApi for AnalyzeClient {
    async fn list_pipes(&self) -> AppResult<Vec<Pipe>> {
        self.get_pipes().await
    }

    async fn sensor_metadata(&self, pipe_name: &str) -> AppResult<Vec<SensorDescriptor>> {
        self.get_sensor_metadata(pipe_name).await
    }

    async fn sensor_data(
        &self,
        pipe_name: &str,
        filters: &SensorDataFilters,
    ) -> AppResult<Vec<SensorRow>> {
        self.get_sensor_data(pipe_name, filters).await
    }
}

/// Check the status code and content type, then parse the body as JSON.
async fn read_json(response: Response) -> AppResult<Value> {
    let status = response.status();
    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("application/json"));

    let text = response
        .text()
        .await
        .map_err(|e| AppError::Transport(format!("Failed to read response body: {e}")))?;

    if !status.is_success() {
        let message = serde_json::from_str::<ErrorBody>(&text)
            .ok()
            .and_then(|body| match (body.message, body.code) {
                (Some(message), Some(code)) => Some(format!("{message} [{code}]")),
                (Some(message), None) => Some(message),
                _ => None,
            })
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Unknown status")
                    .to_string()
            });
        return Err(AppError::Server {
            status: status.as_u16(),
            message,
        });
    }

    if !is_json {
        return Err(AppError::Format("Response is not JSON".to_string()));
    }

    serde_json::from_str(&text).map_err(|e| {
        tracing::error!(
            error = %e,
            body_preview = %text.chars().take(500).collect::<String>(),
            "Failed to parse analyze API response"
        );
        AppError::Format(format!("Failed to parse response: {e}"))
    })
}

/// Validate a `{status: "success", <field>: [...]}` envelope and decode the array.
fn extract_array<T: DeserializeOwned>(mut body: Value, field: &str) -> AppResult<Vec<T>> {
    let status = body.get("status").and_then(Value::as_str);
    if status != Some(STATUS_SUCCESS) {
        return Err(AppError::Format(format!(
            "Unexpected status: {}",
            status.unwrap_or("<missing>")
        )));
    }

    let items = body
        .get_mut(field)
        .map(Value::take)
        .filter(Value::is_array)
        .ok_or_else(|| AppError::Format(format!("Field '{field}' is not an array")))?;

    serde_json::from_value(items)
        .map_err(|e| AppError::Format(format!("Failed to parse '{field}': {e}")))
}
