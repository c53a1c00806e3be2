//! Turns raw sensor rows into chart series.
//!
//! One dataset per selected sensor, aligned with a shared label axis built
//! from the row timestamps. Missing samples stay `None` so the chart shows a
//! gap instead of a drop to zero.

use chrono::{DateTime, NaiveDateTime};
use serde::Serialize;
use serde_json::Value;
use std::fmt::Write;
use utoipa::ToSchema;

use crate::analyze::{SensorDescriptor, SensorRow};
use crate::config::DEFAULT_LABEL_FORMAT;
use crate::domain::key_mapper::{find_descriptor, sensor_key};
use crate::domain::selection::SensorSelection;

/// Values above this (in magnitude or spread) trigger the large-value advisory.
pub const LARGE_VALUE_THRESHOLD: f64 = 500.0;

/// Fraction of the value range added above and below the data.
const AXIS_PADDING: f64 = 0.1;

/// Line colors, assigned by selection index.
pub const PALETTE: [&str; 7] = [
    "rgb(75, 192, 192)",
    "rgb(255, 99, 132)",
    "rgb(54, 162, 235)",
    "rgb(255, 159, 64)",
    "rgb(153, 102, 255)",
    "rgb(255, 205, 86)",
    "rgb(201, 203, 207)",
];

const NAIVE_TIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

#[derive(Debug, Clone)]
pub struct ChartStyle {
    pub palette: Vec<String>,
    /// chrono strftime pattern for x-axis labels
    pub label_format: String,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            palette: PALETTE.iter().map(ToString::to_string).collect(),
            label_format: DEFAULT_LABEL_FORMAT.to_string(),
        }
    }
}

impl ChartStyle {
    #[must_use]
    pub fn with_label_format(label_format: impl Into<String>) -> Self {
        Self {
            label_format: label_format.into(),
            ..Self::default()
        }
    }

    fn color(&self, index: usize) -> String {
        if self.palette.is_empty() {
            return PALETTE[index % PALETTE.len()].to_string();
        }
        self.palette[index % self.palette.len()].clone()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ChartDataset {
    pub label: String,
    /// Row key the values were read from
    pub key: String,
    /// One entry per label, null where the row had no usable value
    pub values: Vec<Option<f64>>,
    pub color: String,
    pub background_color: String,
    /// Max magnitude or spread exceeds the large-value threshold
    pub large: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct AxisBounds {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<ChartDataset>,
    /// `None` lets the renderer auto-scale
    pub y_axis_bounds: Option<AxisBounds>,
    pub any_large_values: bool,
}

impl ChartData {
    /// Advisory shown next to a rendered chart, if any.
    #[must_use]
    pub fn advisory(&self) -> Option<&'static str> {
        self.any_large_values
            .then_some("The chart contains very large values; the scale was adapted automatically.")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NoDataReason {
    /// The API returned no rows
    EmptyRows,
    /// Rows came back but none of the selected sensors had a value
    NoValidSeries,
}

impl NoDataReason {
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::EmptyRows => {
                "No data to display. Choose other sensors or another time range."
            }
            Self::NoValidSeries => {
                "No values were found for the selected sensors. Choose other sensors."
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChartOutcome {
    Ready(ChartData),
    NoData(NoDataReason),
}

/// Build chart series for the selected sensors.
#[must_use]
pub fn build_chart(
    rows: &[SensorRow],
    selections: &[SensorSelection],
    metadata: &[SensorDescriptor],
    style: &ChartStyle,
) -> ChartOutcome {
    if rows.is_empty() {
        return ChartOutcome::NoData(NoDataReason::EmptyRows);
    }

    let mut datasets = Vec::with_capacity(selections.len());

    for (index, selection) in selections.iter().enumerate() {
        let key = sensor_key(selection, metadata);
        let values: Vec<Option<f64>> = rows.iter().map(|row| numeric_value(row.get(&key))).collect();

        if values.iter().all(Option::is_none) {
            tracing::debug!(key = %key, "No valid values for sensor, skipping dataset");
            continue;
        }

        let large = is_large(&values);
        if large {
            tracing::debug!(key = %key, "Large values detected");
        }

        let color = style.color(index);
        datasets.push(ChartDataset {
            label: dataset_label(find_descriptor(selection, metadata), &key),
            background_color: with_alpha(&color, 0.1),
            color,
            key,
            values,
            large,
        });
    }

    if datasets.is_empty() {
        return ChartOutcome::NoData(NoDataReason::NoValidSeries);
    }

    let labels = rows
        .iter()
        .map(|row| format_label(&row.time, &style.label_format))
        .collect();
    let any_large_values = datasets.iter().any(|d| d.large);
    let y_axis_bounds = axis_bounds(&datasets);

    ChartOutcome::Ready(ChartData {
        labels,
        datasets,
        y_axis_bounds,
        any_large_values,
    })
}

/// Numbers and numeric strings count; null, booleans, and anything non-finite do not.
fn numeric_value(value: Option<&Value>) -> Option<f64> {
    let number = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|v| v.is_finite())
}

fn min_max(values: impl IntoIterator<Item = f64>) -> Option<(f64, f64)> {
    values.into_iter().fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

fn is_large(values: &[Option<f64>]) -> bool {
    let present = values.iter().flatten().copied();
    let Some((min, max)) = min_max(present) else {
        return false;
    };
    let magnitude = min.abs().max(max.abs());
    magnitude > LARGE_VALUE_THRESHOLD || max - min > LARGE_VALUE_THRESHOLD
}

fn axis_bounds(datasets: &[ChartDataset]) -> Option<AxisBounds> {
    let all = datasets.iter().flat_map(|d| d.values.iter().flatten().copied());
    let (min, max) = min_max(all)?;
    let range = max - min;
    if range <= 0.0 {
        return None;
    }

    let buffer = range * AXIS_PADDING;
    let lower = (min - buffer).max(0.0);
    let upper = max + buffer;
    // Entirely negative data would clamp the floor above the ceiling.
    (upper > lower).then_some(AxisBounds {
        min: lower,
        max: upper,
    })
}

fn dataset_label(descriptor: Option<&SensorDescriptor>, key: &str) -> String {
    let Some(descriptor) = descriptor else {
        return key.to_string();
    };

    let name = [descriptor.description.as_str(), descriptor.code.as_str()]
        .into_iter()
        .find(|s| !s.is_empty())
        .unwrap_or(key);

    if descriptor.units.is_empty() {
        name.to_string()
    } else {
        format!("{name} ({})", descriptor.units)
    }
}

/// `rgb(r, g, b)` to `rgba(r, g, b, a)`; other color syntaxes pass through.
fn with_alpha(color: &str, alpha: f64) -> String {
    match color
        .strip_prefix("rgb(")
        .and_then(|rest| rest.strip_suffix(')'))
    {
        Some(channels) => format!("rgba({channels}, {alpha})"),
        None => color.to_string(),
    }
}

/// Format a row timestamp in its own offset. Unparseable input is shown as-is.
fn format_label(raw: &str, format: &str) -> String {
    let mut out = String::new();

    let written = if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        write!(out, "{}", dt.format(format))
    } else if let Some(naive) = NAIVE_TIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(raw, f).ok())
    {
        write!(out, "{}", naive.format(format))
    } else {
        return raw.to_string();
    };

    match written {
        Ok(()) => out,
        Err(_) => raw.to_string(),
    }
}
