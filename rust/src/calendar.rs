//! Working-hours calendar arithmetic.
//!
//! Converts between wall-clock instants and amounts of working time. Each date has
//! one working window starting at the configured day start and lasting either its
//! capacity override or `hours_per_day` (zero on skipped weekend days). Days with
//! zero capacity are stepped over without consuming time.
//!
//! All functions assume a config that passed [`ProjectConfig::validate`]: windows
//! end before midnight and `hours_per_day > 0`, so every day-stepping loop reaches
//! a day with capacity. With a config that fails validation the walking functions
//! do not terminate; debug builds assert instead.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Weekday};

use crate::config::ProjectConfig;

/// Tolerance for day-boundary comparisons in hours.
pub const EPSILON: f64 = 1e-9;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Convert fractional hours to a duration (millisecond resolution).
pub fn hours_to_duration(hours: f64) -> Duration {
    Duration::milliseconds((hours * MILLIS_PER_HOUR).round() as i64)
}

/// Convert a duration to fractional hours.
pub fn duration_to_hours(duration: Duration) -> f64 {
    duration.num_milliseconds() as f64 / MILLIS_PER_HOUR
}

fn debug_assert_walkable(config: &ProjectConfig) {
    debug_assert!(
        config.validate().is_ok(),
        "calendar walk needs a valid ProjectConfig: {:?}",
        config.validate()
    );
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Hours available on `date`: the override if any, else 0 on a skipped weekend,
/// else `hours_per_day`.
pub fn hours_available(date: NaiveDate, config: &ProjectConfig) -> f64 {
    if let Some(&hours) = config.capacity_overrides.get(&date) {
        return hours;
    }
    if config.skip_weekends && is_weekend(date) {
        0.0
    } else {
        config.hours_per_day
    }
}

/// Start of the working window on `date` and the hours available in it.
pub fn working_window_for(date: NaiveDate, config: &ProjectConfig) -> (NaiveDateTime, f64) {
    (
        date.and_time(config.day_start_time()),
        hours_available(date, config),
    )
}

/// End of the working window on `date`.
pub fn day_end(date: NaiveDate, config: &ProjectConfig) -> NaiveDateTime {
    let (start, hours) = working_window_for(date, config);
    start + hours_to_duration(hours)
}

/// Start of the working window on the day after `date`.
pub fn next_day_start(date: NaiveDate, config: &ProjectConfig) -> NaiveDateTime {
    let next = date.succ_opt().unwrap_or(date);
    next.and_time(config.day_start_time())
}

fn previous_day_end(date: NaiveDate, config: &ProjectConfig) -> NaiveDateTime {
    let prev = date.pred_opt().unwrap_or(date);
    day_end(prev, config)
}

/// Move `instant` into its day's working window: forward to the day start if
/// early, to the next day's start if at or past the day end.
pub fn snap_to_work_start(instant: NaiveDateTime, config: &ProjectConfig) -> NaiveDateTime {
    let date = instant.date();
    let (start, hours) = working_window_for(date, config);
    if instant < start {
        return start;
    }
    if instant >= start + hours_to_duration(hours) {
        return next_day_start(date, config);
    }
    instant
}

/// Backward counterpart of [`snap_to_work_start`]: clamp to the day end if late,
/// to the previous day's end if at or before the day start.
fn snap_to_work_end(instant: NaiveDateTime, config: &ProjectConfig) -> NaiveDateTime {
    let date = instant.date();
    let (start, hours) = working_window_for(date, config);
    let end = start + hours_to_duration(hours);
    if instant > end {
        return end;
    }
    if instant <= start {
        return previous_day_end(date, config);
    }
    instant
}

/// Step forward over zero-capacity days, landing on the next working day's start.
pub fn skip_weekends_forward(instant: NaiveDateTime, config: &ProjectConfig) -> NaiveDateTime {
    debug_assert_walkable(config);
    let mut current = instant;
    while hours_available(current.date(), config) <= EPSILON {
        current = next_day_start(current.date(), config);
    }
    current
}

/// Step backward over zero-capacity days, landing on the previous working day's end.
pub fn skip_weekends_backward(instant: NaiveDateTime, config: &ProjectConfig) -> NaiveDateTime {
    debug_assert_walkable(config);
    let mut current = instant;
    while hours_available(current.date(), config) <= EPSILON {
        current = previous_day_end(current.date(), config);
    }
    current
}

/// Advance `start` by `hours` of working time.
///
/// The start is first snapped into a working window; zero-hour additions return
/// that snapped instant.
///
/// # Panics
///
/// In debug builds, if `config` fails [`ProjectConfig::validate`].
pub fn add_working_hours(start: NaiveDateTime, hours: f64, config: &ProjectConfig) -> NaiveDateTime {
    debug_assert_walkable(config);
    let mut remaining = hours;
    let mut current = skip_weekends_forward(snap_to_work_start(start, config), config);

    while remaining > 0.0 {
        let date = current.date();
        let available = duration_to_hours(day_end(date, config) - current);
        if remaining <= available + EPSILON {
            return current + hours_to_duration(remaining);
        }
        remaining -= available;
        current = skip_weekends_forward(next_day_start(date, config), config);
    }

    current
}

/// Find the start such that `add_working_hours(start, hours)` lands on `end`,
/// walking backward through working days.
pub fn subtract_working_hours(
    end: NaiveDateTime,
    hours: f64,
    config: &ProjectConfig,
) -> NaiveDateTime {
    debug_assert_walkable(config);
    let mut remaining = hours;
    let mut current = skip_weekends_backward(snap_to_work_end(end, config), config);

    while remaining > 0.0 {
        let date = current.date();
        let (day_start, _) = working_window_for(date, config);
        let available = duration_to_hours(current - day_start);

        if available <= EPSILON {
            current = skip_weekends_backward(previous_day_end(date, config), config);
            continue;
        }
        if remaining <= available + EPSILON {
            return current - hours_to_duration(remaining);
        }
        remaining -= available;
        current = skip_weekends_backward(previous_day_end(date, config), config);
    }

    current
}

/// Working hours in `[start, end)`; zero when `end <= start`.
pub fn working_hours_between(
    start: NaiveDateTime,
    end: NaiveDateTime,
    config: &ProjectConfig,
) -> f64 {
    if end <= start {
        return 0.0;
    }
    debug_assert_walkable(config);

    let mut total = 0.0;
    let mut current = skip_weekends_forward(snap_to_work_start(start, config), config);

    while current < end {
        let date = current.date();
        let day_end = day_end(date, config);
        let effective_end = day_end.min(end);
        total += duration_to_hours(effective_end - current).max(0.0);

        if day_end >= end {
            break;
        }
        current = skip_weekends_forward(next_day_start(date, config), config);
    }

    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Monday 2026-02-23, 09:00-17:00 weekdays.
    fn config() -> ProjectConfig {
        ProjectConfig::new(at(2026, 2, 23, 0, 0))
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "calendar walk needs a valid ProjectConfig")]
    fn test_zero_capacity_config_is_rejected() {
        let config = config().with_hours_per_day(0.0);
        add_working_hours(at(2026, 2, 23, 9, 0), 1.0, &config);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "calendar walk needs a valid ProjectConfig")]
    fn test_window_past_midnight_is_rejected() {
        let config = config().with_day_start(20, 0);
        working_hours_between(at(2026, 2, 23, 9, 0), at(2026, 2, 24, 9, 0), &config);
    }

    #[test]
    fn test_working_window_weekday_weekend_override() {
        let config = config().with_override(date(2026, 2, 28), 4.0);

        assert_eq!(
            working_window_for(date(2026, 2, 24), &config),
            (at(2026, 2, 24, 9, 0), 8.0)
        );
        assert_eq!(
            working_window_for(date(2026, 3, 1), &config),
            (at(2026, 3, 1, 9, 0), 0.0)
        );
        assert_eq!(
            working_window_for(date(2026, 2, 28), &config),
            (at(2026, 2, 28, 9, 0), 4.0)
        );

        let no_skip = config.with_skip_weekends(false);
        assert_eq!(hours_available(date(2026, 3, 1), &no_skip), 8.0);
    }

    #[test]
    fn test_snap_to_work_start() {
        let config = config();
        // Before the window
        assert_eq!(
            snap_to_work_start(at(2026, 2, 24, 7, 30), &config),
            at(2026, 2, 24, 9, 0)
        );
        // Inside the window
        assert_eq!(
            snap_to_work_start(at(2026, 2, 24, 11, 15), &config),
            at(2026, 2, 24, 11, 15)
        );
        // Exactly at day end
        assert_eq!(
            snap_to_work_start(at(2026, 2, 24, 17, 0), &config),
            at(2026, 2, 25, 9, 0)
        );
    }

    #[test]
    fn test_skip_weekends_both_directions() {
        let config = config();
        assert_eq!(
            skip_weekends_forward(at(2026, 2, 28, 9, 0), &config),
            at(2026, 3, 2, 9, 0)
        );
        assert_eq!(
            skip_weekends_backward(at(2026, 3, 1, 9, 0), &config),
            at(2026, 2, 27, 17, 0)
        );
        // Weekdays pass through untouched
        assert_eq!(
            skip_weekends_forward(at(2026, 2, 25, 12, 0), &config),
            at(2026, 2, 25, 12, 0)
        );
    }

    #[test]
    fn test_add_within_one_day() {
        let config = config();
        assert_eq!(
            add_working_hours(at(2026, 2, 23, 9, 0), 3.5, &config),
            at(2026, 2, 23, 12, 30)
        );
        // Fills the day exactly: lands on day end, not next morning
        assert_eq!(
            add_working_hours(at(2026, 2, 23, 9, 0), 8.0, &config),
            at(2026, 2, 23, 17, 0)
        );
    }

    #[test]
    fn test_add_snaps_start_and_skips_weekend() {
        let config = config();
        // Saturday start moves to Monday 09:00
        assert_eq!(
            add_working_hours(at(2026, 2, 28, 10, 0), 2.0, &config),
            at(2026, 3, 2, 11, 0)
        );
        // Friday 15:00 + 4h: 2h Friday, 2h Monday
        assert_eq!(
            add_working_hours(at(2026, 2, 27, 15, 0), 4.0, &config),
            at(2026, 3, 2, 11, 0)
        );
    }

    #[test]
    fn test_add_honours_saturday_override() {
        let config = config().with_override(date(2026, 2, 28), 4.0);
        // Friday 4h, Saturday 4h, Sunday 0h, Monday 4h
        assert_eq!(
            add_working_hours(at(2026, 2, 27, 13, 0), 12.0, &config),
            at(2026, 3, 2, 13, 0)
        );
    }

    #[test]
    fn test_add_skips_zero_override_weekday() {
        let config = config().with_override(date(2026, 2, 24), 0.0);
        assert_eq!(
            add_working_hours(at(2026, 2, 23, 15, 0), 4.0, &config),
            at(2026, 2, 25, 11, 0)
        );
    }

    #[test]
    fn test_extended_day_override() {
        let config = config().with_override(date(2026, 2, 24), 12.0);
        assert_eq!(
            add_working_hours(at(2026, 2, 24, 9, 0), 11.0, &config),
            at(2026, 2, 24, 20, 0)
        );
        let hours = working_hours_between(at(2026, 2, 24, 9, 0), at(2026, 2, 25, 9, 0), &config);
        assert!((hours - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_hours_returns_snapped_start() {
        let config = config();
        assert_eq!(
            add_working_hours(at(2026, 2, 27, 17, 0), 0.0, &config),
            at(2026, 3, 2, 9, 0)
        );
    }

    #[test]
    fn test_subtract_mirrors_add() {
        let config = config();
        assert_eq!(
            subtract_working_hours(at(2026, 3, 2, 11, 0), 4.0, &config),
            at(2026, 2, 27, 15, 0)
        );
        assert_eq!(
            subtract_working_hours(at(2026, 2, 23, 17, 0), 8.0, &config),
            at(2026, 2, 23, 9, 0)
        );
        // Late end is clamped to the day end first
        assert_eq!(
            subtract_working_hours(at(2026, 2, 24, 20, 0), 2.0, &config),
            at(2026, 2, 24, 15, 0)
        );
    }

    #[test]
    fn test_subtract_from_day_start_walks_to_previous_day() {
        let config = config();
        assert_eq!(
            subtract_working_hours(at(2026, 3, 2, 9, 0), 1.0, &config),
            at(2026, 2, 27, 16, 0)
        );
    }

    #[test]
    fn test_subtract_uses_override_capacity() {
        let config = config().with_override(date(2026, 2, 28), 4.0);
        assert_eq!(
            subtract_working_hours(at(2026, 3, 2, 13, 0), 12.0, &config),
            at(2026, 2, 27, 13, 0)
        );
    }

    #[test]
    fn test_hours_between() {
        let config = config();
        assert_eq!(
            working_hours_between(at(2026, 2, 23, 9, 0), at(2026, 2, 23, 9, 0), &config),
            0.0
        );
        assert_eq!(
            working_hours_between(at(2026, 2, 24, 9, 0), at(2026, 2, 23, 9, 0), &config),
            0.0
        );
        // Friday 13:00 to Monday 13:00 = 4h + 4h
        assert!(
            (working_hours_between(at(2026, 2, 27, 13, 0), at(2026, 3, 2, 13, 0), &config) - 8.0)
                .abs()
                < 1e-9
        );
        // Full week
        assert!(
            (working_hours_between(at(2026, 2, 23, 0, 0), at(2026, 3, 2, 0, 0), &config) - 40.0)
                .abs()
                < 1e-9
        );
    }

    fn arb_config() -> impl Strategy<Value = ProjectConfig> {
        (1u32..=12, 6u32..=10, prop::bool::ANY, prop::option::of(0u32..=10)).prop_map(
            |(hours, start_hour, skip, override_hours)| {
                let mut config = config()
                    .with_hours_per_day(hours as f64)
                    .with_day_start(start_hour, 0)
                    .with_skip_weekends(skip);
                if let Some(h) = override_hours {
                    config = config.with_override(date(2026, 2, 28), h as f64);
                }
                config
            },
        )
    }

    proptest! {
        #[test]
        fn prop_add_then_between_round_trips(
            config in arb_config(),
            offset_minutes in 0i64..(21 * 24 * 60),
            quarter_hours in 1u32..400,
        ) {
            let start = at(2026, 2, 20, 0, 0) + Duration::minutes(offset_minutes);
            let hours = quarter_hours as f64 / 4.0;
            let end = add_working_hours(start, hours, &config);
            let measured = working_hours_between(start, end, &config);
            prop_assert!((measured - hours).abs() < 1e-6, "{} vs {}", measured, hours);
        }

        #[test]
        fn prop_subtract_inverts_add_from_working_instant(
            config in arb_config(),
            offset_minutes in 0i64..(21 * 24 * 60),
            quarter_hours in 1u32..400,
        ) {
            let raw = at(2026, 2, 20, 0, 0) + Duration::minutes(offset_minutes);
            let start = skip_weekends_forward(snap_to_work_start(raw, &config), &config);
            let hours = quarter_hours as f64 / 4.0;
            let end = add_working_hours(start, hours, &config);
            prop_assert_eq!(subtract_working_hours(end, hours, &config), start);
        }
    }
}
