use serde_json::{json, Value};

use crate::domain::ChartData;

/// Seam to the charting library that draws the lines.
pub trait ChartRenderer {
    fn render(&mut self, chart: &ChartData);
}

/// Keeps the last chart as a Chart.js line configuration.
#[derive(Debug, Default)]
pub struct ChartJsRenderer {
    config: Option<Value>,
}

impl ChartJsRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration of the last rendered chart.
    #[must_use]
    pub fn config(&self) -> Option<&Value> {
        self.config.as_ref()
    }
}

impl ChartRenderer for ChartJsRenderer {
    fn render(&mut self, chart: &ChartData) {
        tracing::debug!(
            labels = chart.labels.len(),
            datasets = chart.datasets.len(),
            "Rendering chart"
        );
        self.config = Some(chartjs_config(chart));
    }
}

/// Chart.js `line` configuration for a built chart.
#[must_use]
pub fn chartjs_config(chart: &ChartData) -> Value {
    let datasets: Vec<Value> = chart
        .datasets
        .iter()
        .map(|d| {
            json!({
                "label": d.label,
                "data": d.values,
                "borderColor": d.color,
                "backgroundColor": d.background_color,
                "borderWidth": 2,
                "pointRadius": 3,
                "pointHoverRadius": 5,
                "tension": 0.1,
                "fill": false,
            })
        })
        .collect();

    let mut y_scale = json!({ "beginAtZero": false });
    if let Some(bounds) = chart.y_axis_bounds {
        y_scale["min"] = json!(bounds.min);
        y_scale["max"] = json!(bounds.max);
    }

    json!({
        "type": "line",
        "data": {
            "labels": chart.labels,
            "datasets": datasets,
        },
        "options": {
            "responsive": true,
            "maintainAspectRatio": false,
            "spanGaps": false,
            "scales": {
                "x": { "type": "category" },
                "y": y_scale,
            },
        },
    })
}
