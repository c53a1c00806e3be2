//! Event-driven dashboard controller.
//!
//! `Dashboard` owns the selection state and the sensor metadata of the chosen
//! pipe. Every data request is tagged with a sequence number; a response is
//! only rendered if no newer request has been issued and the selection has
//! not changed since.

use chrono::{DateTime, TimeZone};
use std::fmt::Display;

use crate::analyze::{Pipe, SensorApi, SensorDataFilters, SensorDescriptor, SensorRow};
use crate::domain::{
    build_chart, resolve, ChartOutcome, ChartStyle, CustomRangeInput, NoDataReason, Period,
    SelectionAction, SelectionState, SensorSelection,
};
use crate::error::{AppError, AppResult};
use crate::render::ChartRenderer;

/// A data request ready to be sent.
#[derive(Debug, Clone, PartialEq)]
pub struct DataRequest {
    pub seq: u64,
    pub pipe: String,
    pub filters: SensorDataFilters,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Rendered { large_values: bool },
    NoData(NoDataReason),
    /// A newer request was issued, or the selection changed, before this
    /// response arrived.
    Stale,
}

#[derive(Debug, Default)]
pub struct Dashboard {
    state: SelectionState,
    pipes: Vec<Pipe>,
    metadata: Vec<SensorDescriptor>,
    style: ChartStyle,
    latest_seq: u64,
}

impl Dashboard {
    #[must_use]
    pub fn new(style: ChartStyle) -> Self {
        Self {
            style,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    #[must_use]
    pub fn pipes(&self) -> &[Pipe] {
        &self.pipes
    }

    #[must_use]
    pub fn metadata(&self) -> &[SensorDescriptor] {
        &self.metadata
    }

    /// # Errors
    ///
    /// Propagates API client errors; the stored pipe list is kept on failure.
    pub async fn load_pipes<A: SensorApi + ?Sized>(&mut self, api: &A) -> AppResult<&[Pipe]> {
        let pipes = api.list_pipes().await?;
        tracing::info!(count = pipes.len(), "Pipes loaded");
        self.pipes = pipes;
        Ok(&self.pipes)
    }

    /// Switch pipe and load its sensor metadata. Clears the sensor selection.
    ///
    /// # Errors
    ///
    /// Propagates API client errors. The pipe switch itself is kept, with an
    /// empty metadata list.
    pub async fn select_pipe<A: SensorApi + ?Sized>(
        &mut self,
        api: &A,
        pipe: &str,
    ) -> AppResult<&[SensorDescriptor]> {
        self.dispatch(SelectionAction::SelectPipe(pipe.to_string()))?;
        self.metadata.clear();

        let metadata = api.sensor_metadata(pipe).await?;
        tracing::info!(pipe = %pipe, sensors = metadata.len(), "Sensor metadata loaded");
        self.metadata = metadata;
        Ok(&self.metadata)
    }

    /// Returns whether data should be refreshed.
    ///
    /// # Errors
    ///
    /// `AppError::Validation` for an empty selection.
    pub fn select_sensors(&mut self, sensors: Vec<SensorSelection>) -> AppResult<bool> {
        self.dispatch(SelectionAction::SelectSensors(sensors))?;
        Ok(self.state.is_ready())
    }

    /// Returns whether data should be refreshed.
    ///
    /// # Errors
    ///
    /// Never fails today; kept fallible like the other reducer entry points.
    pub fn set_period(&mut self, period: Period) -> AppResult<bool> {
        self.dispatch(SelectionAction::SetPeriod(period))?;
        Ok(self.state.is_ready())
    }

    /// Returns whether data should be refreshed.
    ///
    /// # Errors
    ///
    /// `AppError::Validation` if the range is incomplete, unparseable, or
    /// not increasing.
    pub fn apply_custom_range(&mut self, input: CustomRangeInput) -> AppResult<bool> {
        self.dispatch(SelectionAction::ApplyCustomRange(input))?;
        Ok(self.state.is_ready())
    }

    /// Any accepted selection change invalidates requests still in flight.
    fn dispatch(&mut self, action: SelectionAction) -> AppResult<()> {
        self.state = self.state.clone().apply(action)?;
        self.latest_seq += 1;
        Ok(())
    }

    /// Resolve the window and issue a new request sequence number.
    ///
    /// # Errors
    ///
    /// `AppError::Validation` if no pipe or sensor is selected, or the
    /// custom window is missing.
    pub fn prepare_request<Tz>(&mut self, now: &DateTime<Tz>) -> AppResult<DataRequest>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let Some(pipe) = self.state.pipe.clone() else {
            return Err(AppError::Validation("Select a pipe first".to_string()));
        };
        if self.state.sensors.is_empty() {
            return Err(AppError::Validation(
                "Select at least one sensor".to_string(),
            ));
        }

        let range = resolve(self.state.period, self.state.custom.as_ref(), now)?;

        self.latest_seq += 1;
        tracing::debug!(
            seq = self.latest_seq,
            pipe = %pipe,
            period = ?self.state.period,
            start = %range.start,
            end = %range.end,
            "Prepared data request"
        );

        Ok(DataRequest {
            seq: self.latest_seq,
            filters: SensorDataFilters {
                pipe_id: pipe.clone(),
                start_time: range.start,
                end_time: range.end,
                sensors: self.state.sensors.clone(),
            },
            pipe,
        })
    }

    /// Build and render the chart for a response, unless a newer request or
    /// selection change exists.
    pub fn apply_response<R: ChartRenderer + ?Sized>(
        &self,
        seq: u64,
        rows: &[SensorRow],
        renderer: &mut R,
    ) -> RefreshOutcome {
        if seq < self.latest_seq {
            tracing::debug!(seq, latest = self.latest_seq, "Discarding stale response");
            return RefreshOutcome::Stale;
        }

        match build_chart(rows, &self.state.sensors, &self.metadata, &self.style) {
            ChartOutcome::Ready(chart) => {
                renderer.render(&chart);
                RefreshOutcome::Rendered {
                    large_values: chart.any_large_values,
                }
            }
            ChartOutcome::NoData(reason) => {
                tracing::info!(?reason, "No chart data");
                RefreshOutcome::NoData(reason)
            }
        }
    }

    /// Fetch data for the current selection and render it.
    ///
    /// # Errors
    ///
    /// Validation errors from [`Dashboard::prepare_request`] and API client
    /// errors. The previously rendered chart is left untouched on error.
    pub async fn refresh<A, R, Tz>(
        &mut self,
        api: &A,
        renderer: &mut R,
        now: &DateTime<Tz>,
    ) -> AppResult<RefreshOutcome>
    where
        A: SensorApi + ?Sized,
        R: ChartRenderer + ?Sized,
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let request = self.prepare_request(now)?;
        let rows = api.sensor_data(&request.pipe, &request.filters).await?;
        Ok(self.apply_response(request.seq, &rows, renderer))
    }
}
