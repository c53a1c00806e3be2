use chrono::{DateTime, Days, Months, NaiveDateTime, SecondsFormat, TimeDelta, TimeZone, Timelike};
use serde::Serialize;
use std::fmt::Display;
use utoipa::ToSchema;

use crate::domain::selection::{CustomRange, Period};
use crate::error::{AppError, AppResult};

/// Upper bound when searching for the end of a DST gap.
const MAX_GAP_MINUTES: u32 = 24 * 60;

/// Concrete query window, both ends in RFC 3339
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct TimeRange {
    pub start: String,
    pub end: String,
}

/// Turn a period into a concrete window ending at `now`.
///
/// Presets subtract calendar days or months from the wall clock of `now`, so
/// a "day" across a DST change is not 24 hours. A preset start that falls in
/// a repeated hour takes the earlier instant; one that falls in a DST gap
/// moves to the first instant after the gap. A custom window is interpreted
/// in the same zone.
///
/// # Errors
///
/// Returns `AppError::Validation` for `Period::Custom` without a window, or
/// when a custom bound does not exist in the local zone (DST gap), and
/// `AppError::Internal` if preset arithmetic leaves the representable range.
pub fn resolve<Tz>(
    period: Period,
    custom: Option<&CustomRange>,
    now: &DateTime<Tz>,
) -> AppResult<TimeRange>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let zone = now.timezone();
    let wall_clock = now.naive_local();

    let start = match period {
        Period::Day => wall_clock.checked_sub_days(Days::new(1)),
        Period::Week => wall_clock.checked_sub_days(Days::new(7)),
        Period::Month => wall_clock.checked_sub_months(Months::new(1)),
        Period::Custom => {
            let range = custom.ok_or_else(|| {
                AppError::Validation("Custom period selected but no range was applied".to_string())
            })?;
            let start = local_instant(&zone, range.start())?;
            let end = local_instant(&zone, range.end())?;
            return Ok(TimeRange {
                start: to_iso(&start),
                end: to_iso(&end),
            });
        }
    };

    let start = start
        .and_then(|wall_clock| {
            zone.from_local_datetime(&wall_clock)
                .earliest()
                .or_else(|| after_gap(&zone, wall_clock))
        })
        .ok_or_else(|| {
            AppError::Internal(format!("Cannot compute start of {period:?} window"))
        })?;

    Ok(TimeRange {
        start: to_iso(&start),
        end: to_iso(now),
    })
}

fn local_instant<Tz: TimeZone>(zone: &Tz, wall_clock: NaiveDateTime) -> AppResult<DateTime<Tz>> {
    zone.from_local_datetime(&wall_clock)
        .earliest()
        .ok_or_else(|| AppError::Validation(format!("{wall_clock} does not exist in local time")))
}

/// First whole minute after a skipped wall-clock time.
fn after_gap<Tz: TimeZone>(zone: &Tz, wall_clock: NaiveDateTime) -> Option<DateTime<Tz>> {
    let mut candidate = wall_clock.with_second(0)?.with_nanosecond(0)?;
    for _ in 0..MAX_GAP_MINUTES {
        candidate = candidate.checked_add_signed(TimeDelta::minutes(1))?;
        if let Some(instant) = zone.from_local_datetime(&candidate).earliest() {
            return Some(instant);
        }
    }
    None
}

fn to_iso<Tz>(dt: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    dt.to_rfc3339_opts(SecondsFormat::Millis, false)
}
