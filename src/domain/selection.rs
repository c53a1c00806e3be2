//! Selection state of the dashboard: chosen pipe, sensors, and time window.
//!
//! State changes go through [`SelectionState::apply`], which consumes the old
//! state and returns the new one, so transitions can be tested without a view.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};

pub const DEFAULT_START_TIME: &str = "00:00";
pub const DEFAULT_END_TIME: &str = "23:59";

/// Reference to a sensor in the pipe's metadata list
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct SensorSelection {
    #[serde(rename = "type")]
    pub sensor_type: String,
    #[serde(default)]
    pub number: Option<i64>,
}

impl SensorSelection {
    #[must_use]
    pub fn new(sensor_type: impl Into<String>, number: Option<i64>) -> Self {
        Self {
            sensor_type: sensor_type.into(),
            number,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    #[default]
    Day,
    Week,
    Month,
    Custom,
}

/// Raw custom range as entered by the user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CustomRangeInput {
    /// `YYYY-MM-DD`
    #[serde(default)]
    pub start_date: Option<String>,
    /// `HH:MM`, defaults to 00:00
    #[serde(default)]
    pub start_time: Option<String>,
    /// `YYYY-MM-DD`
    #[serde(default)]
    pub end_date: Option<String>,
    /// `HH:MM`, defaults to 23:59
    #[serde(default)]
    pub end_time: Option<String>,
}

/// Validated custom window in local wall-clock time. `start < end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CustomRange {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl CustomRange {
    /// # Errors
    ///
    /// Returns `AppError::Validation` unless `start < end`.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> AppResult<Self> {
        if start >= end {
            return Err(AppError::Validation(
                "Start of the range must be before its end".to_string(),
            ));
        }
        Ok(Self { start, end })
    }

    #[must_use]
    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    #[must_use]
    pub fn end(&self) -> NaiveDateTime {
        self.end
    }
}

impl CustomRangeInput {
    /// Parse and check the entered range.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` when a date is missing, a date or time
    /// does not parse, or the start is not before the end.
    pub fn validate(&self) -> AppResult<CustomRange> {
        let (Some(start_date), Some(end_date)) = (non_blank(&self.start_date), non_blank(&self.end_date))
        else {
            return Err(AppError::Validation(
                "Start and end dates are required".to_string(),
            ));
        };

        let start_time = non_blank(&self.start_time).unwrap_or(DEFAULT_START_TIME);
        let end_time = non_blank(&self.end_time).unwrap_or(DEFAULT_END_TIME);

        let start = parse_local(start_date, start_time)?;
        let end = parse_local(end_date, end_time)?;

        CustomRange::new(start, end)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn parse_local(date: &str, time: &str) -> AppResult<NaiveDateTime> {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("Invalid date: {date}")))?;
    let time = NaiveTime::parse_from_str(time, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M:%S"))
        .map_err(|_| AppError::Validation(format!("Invalid time: {time}")))?;
    Ok(date.and_time(time))
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectionAction {
    SelectPipe(String),
    SelectSensors(Vec<SensorSelection>),
    SetPeriod(Period),
    ApplyCustomRange(CustomRangeInput),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    pub pipe: Option<String>,
    pub sensors: Vec<SensorSelection>,
    pub period: Period,
    pub custom: Option<CustomRange>,
}

impl SelectionState {
    /// Apply one user action.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for an empty sensor selection or an
    /// invalid custom range; the previous state is dropped only on success.
    pub fn apply(self, action: SelectionAction) -> AppResult<Self> {
        match action {
            SelectionAction::SelectPipe(name) => Ok(Self {
                pipe: Some(name),
                sensors: Vec::new(),
                ..self
            }),
            SelectionAction::SelectSensors(sensors) => {
                if sensors.is_empty() {
                    return Err(AppError::Validation(
                        "Select at least one sensor".to_string(),
                    ));
                }
                Ok(Self { sensors, ..self })
            }
            SelectionAction::SetPeriod(period) => Ok(Self { period, ..self }),
            SelectionAction::ApplyCustomRange(input) => {
                let range = input.validate()?;
                Ok(Self {
                    period: Period::Custom,
                    custom: Some(range),
                    ..self
                })
            }
        }
    }

    /// A pipe and at least one sensor are chosen, so data can be fetched.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.pipe.is_some() && !self.sensors.is_empty()
    }
}
