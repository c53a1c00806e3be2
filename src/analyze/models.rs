use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use crate::domain::SensorSelection;

/// The only `status` value the analyze API uses for a successful call.
pub const STATUS_SUCCESS: &str = "success";

/// A pipe (one table in the analyze API)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Pipe {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Sensor metadata entry from `/analyze/sensor_metadata/{table}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SensorDescriptor {
    /// Sensor type name (e.g. "Кольцевая деформация")
    #[serde(rename = "type")]
    pub sensor_type: String,
    /// Sensor number, null for singleton sensors such as temperature
    #[serde(default)]
    pub number: Option<i64>,
    /// Field name used in time-series rows (e.g. "K_1", "T")
    #[serde(default, deserialize_with = "null_as_empty")]
    pub code: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub units: String,
}

/// One time-series sample. Sensor columns are sparse and kept as raw JSON
/// so that the chart builder decides what counts as a value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct SensorRow {
    #[serde(rename = "Time")]
    pub time: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// The timestamp column is `Time` in table rows, `time` in some envelopes.
impl From<Map<String, Value>> for SensorRow {
    fn from(mut raw: Map<String, Value>) -> Self {
        let time = match raw.remove("Time").or_else(|| raw.remove("time")) {
            Some(Value::String(s)) => s,
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        Self { time, fields: raw }
    }
}

impl SensorRow {
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

/// Filters sent with a sensor data request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorDataFilters {
    pub pipe_id: String,
    pub start_time: String,
    pub end_time: String,
    pub sensors: Vec<SensorSelection>,
}

/// Body of `POST /analyze/sensor/{table}`
#[derive(Debug, Serialize)]
pub struct SensorDataRequest<'a> {
    pub filters: &'a SensorDataFilters,
    pub page: u32,
    pub page_size: u32,
}

/// Response from `/analyze/sensor/{table}`: either a bare row array or a
/// status envelope around one.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SensorDataResponse {
    Rows(Vec<SensorRow>),
    Envelope {
        status: String,
        #[serde(default)]
        data: Vec<SensorRow>,
        #[serde(default)]
        message: Option<String>,
    },
}

/// Error body returned by the analyze API on non-2xx responses
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
