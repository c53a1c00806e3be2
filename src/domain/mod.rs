//! Pure data transforms behind the dashboard. Nothing here performs I/O.

pub mod chart;
pub mod key_mapper;
pub mod selection;
pub mod time_range;

pub use chart::{build_chart, ChartData, ChartDataset, ChartOutcome, ChartStyle, NoDataReason};
pub use key_mapper::{find_descriptor, sensor_key};
pub use selection::{
    CustomRange, CustomRangeInput, Period, SelectionAction, SelectionState, SensorSelection,
};
pub use time_range::{resolve, TimeRange};
