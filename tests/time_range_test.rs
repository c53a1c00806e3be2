//! Unit tests for period resolution.
//!
//! Run with: cargo test --test time_range_test

use chrono::{
    DateTime, Days, FixedOffset, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc,
};
use pipe_monitor::domain::{resolve, CustomRange, Period};
use pipe_monitor::error::AppError;

fn moscow(y: i32, m: u32, d: u32, h: u32) -> DateTime<FixedOffset> {
    FixedOffset::east_opt(3 * 3600)
        .unwrap()
        .with_ymd_and_hms(y, m, d, h, 0, 0)
        .unwrap()
}

/// Central European time for 2025: +01:00, +02:00 from 2025-03-30 01:00 UTC
/// until 2025-10-26 01:00 UTC.
#[derive(Debug, Clone, Copy)]
struct CentralEurope;

impl CentralEurope {
    fn winter() -> FixedOffset {
        FixedOffset::east_opt(3600).unwrap()
    }

    fn summer() -> FixedOffset {
        FixedOffset::east_opt(2 * 3600).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Self> {
        CentralEurope
            .with_ymd_and_hms(y, m, d, h, min, 0)
            .earliest()
            .unwrap()
    }
}

impl TimeZone for CentralEurope {
    type Offset = FixedOffset;

    fn from_offset(_offset: &FixedOffset) -> Self {
        CentralEurope
    }

    fn offset_from_local_date(&self, local: &NaiveDate) -> LocalResult<FixedOffset> {
        self.offset_from_local_datetime(&local.and_hms_opt(0, 0, 0).unwrap())
    }

    fn offset_from_local_datetime(&self, local: &NaiveDateTime) -> LocalResult<FixedOffset> {
        let candidates: Vec<FixedOffset> = [Self::summer(), Self::winter()]
            .into_iter()
            .filter(|offset| self.offset_from_utc_datetime(&(*local - *offset)) == *offset)
            .collect();
        match candidates.as_slice() {
            [] => LocalResult::None,
            [only] => LocalResult::Single(*only),
            [earlier, later, ..] => LocalResult::Ambiguous(*earlier, *later),
        }
    }

    fn offset_from_utc_date(&self, utc: &NaiveDate) -> FixedOffset {
        self.offset_from_utc_datetime(&utc.and_hms_opt(0, 0, 0).unwrap())
    }

    fn offset_from_utc_datetime(&self, utc: &NaiveDateTime) -> FixedOffset {
        let summer_start = NaiveDate::from_ymd_opt(2025, 3, 30)
            .unwrap()
            .and_hms_opt(1, 0, 0)
            .unwrap();
        let summer_end = NaiveDate::from_ymd_opt(2025, 10, 26)
            .unwrap()
            .and_hms_opt(1, 0, 0)
            .unwrap();
        if (summer_start..summer_end).contains(utc) {
            Self::summer()
        } else {
            Self::winter()
        }
    }
}

#[test]
fn day_subtracts_one_calendar_day() {
    let range = resolve(Period::Day, None, &moscow(2025, 3, 1, 8)).unwrap();

    assert_eq!(range.start, "2025-02-28T08:00:00.000+03:00");
    assert_eq!(range.end, "2025-03-01T08:00:00.000+03:00");
}

#[test]
fn week_spans_seven_calendar_days() {
    for now in [
        moscow(2025, 3, 5, 12),
        moscow(2024, 3, 3, 0),
        moscow(2025, 1, 2, 23),
    ] {
        let range = resolve(Period::Week, None, &now).unwrap();
        let start = DateTime::parse_from_rfc3339(&range.start).unwrap();
        let end = DateTime::parse_from_rfc3339(&range.end).unwrap();

        assert_eq!(end, now);
        assert_eq!(start.date_naive(), end.date_naive() - Days::new(7));
        assert_eq!(start.time(), end.time());
    }
}

#[test]
fn month_clamps_to_shorter_month() {
    let range = resolve(Period::Month, None, &moscow(2025, 3, 31, 10)).unwrap();
    assert_eq!(range.start, "2025-02-28T10:00:00.000+03:00");

    let range = resolve(Period::Month, None, &moscow(2025, 1, 15, 10)).unwrap();
    assert_eq!(range.start, "2024-12-15T10:00:00.000+03:00");
}

#[test]
fn preset_keeps_offset_of_now() {
    let now = Utc.with_ymd_and_hms(2025, 3, 4, 10, 0, 0).unwrap();
    let range = resolve(Period::Day, None, &now).unwrap();

    assert_eq!(range.start, "2025-03-03T10:00:00.000+00:00");
    assert_eq!(range.end, "2025-03-04T10:00:00.000+00:00");
}

#[test]
fn custom_uses_explicit_window_in_local_zone() {
    let start = NaiveDate::from_ymd_opt(2025, 3, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let end = NaiveDate::from_ymd_opt(2025, 3, 10)
        .unwrap()
        .and_hms_opt(23, 59, 0)
        .unwrap();
    let custom = CustomRange::new(start, end).unwrap();

    let range = resolve(Period::Custom, Some(&custom), &moscow(2025, 4, 1, 12)).unwrap();

    assert_eq!(range.start, "2025-03-01T00:00:00.000+03:00");
    assert_eq!(range.end, "2025-03-10T23:59:00.000+03:00");
}

#[test]
fn custom_without_window_is_rejected() {
    let err = resolve(Period::Custom, None, &moscow(2025, 4, 1, 12)).unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[test]
fn preset_start_in_spring_gap_moves_past_the_gap() {
    let range = resolve(Period::Day, None, &CentralEurope::at(2025, 3, 31, 2, 30)).unwrap();

    assert_eq!(range.start, "2025-03-30T03:00:00.000+02:00");
    assert_eq!(range.end, "2025-03-31T02:30:00.000+02:00");
}

#[test]
fn preset_start_in_repeated_hour_takes_earlier_instant() {
    let range = resolve(Period::Day, None, &CentralEurope::at(2025, 10, 27, 2, 30)).unwrap();

    assert_eq!(range.start, "2025-10-26T02:30:00.000+02:00");
    assert_eq!(range.end, "2025-10-27T02:30:00.000+01:00");
}

#[test]
fn presets_across_dst_keep_wall_clock_time() {
    let now = CentralEurope::at(2025, 4, 2, 12, 0);

    let week = resolve(Period::Week, None, &now).unwrap();
    assert_eq!(week.start, "2025-03-26T12:00:00.000+01:00");

    let month = resolve(Period::Month, None, &now).unwrap();
    assert_eq!(month.start, "2025-03-02T12:00:00.000+01:00");
    assert_eq!(month.end, "2025-04-02T12:00:00.000+02:00");
}

#[test]
fn custom_bound_in_spring_gap_is_rejected() {
    let day = NaiveDate::from_ymd_opt(2025, 3, 30).unwrap();
    let custom = CustomRange::new(
        day.and_hms_opt(2, 30, 0).unwrap(),
        day.and_hms_opt(23, 59, 0).unwrap(),
    )
    .unwrap();

    let err = resolve(
        Period::Custom,
        Some(&custom),
        &CentralEurope::at(2025, 4, 1, 12, 0),
    )
    .unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
}
