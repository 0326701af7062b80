use chrono::{DateTime, Datelike, Duration, FixedOffset, Timelike};

use crate::error::{AppError, AppResult};

/// Minutes shared by two ranges, zero when they are disjoint.
pub fn overlap_minutes(
    a_start: DateTime<FixedOffset>,
    a_end: DateTime<FixedOffset>,
    b_start: DateTime<FixedOffset>,
    b_end: DateTime<FixedOffset>,
) -> i64 {
    let start = a_start.max(b_start);
    let end = a_end.min(b_end);
    if end <= start {
        0
    } else {
        end.signed_duration_since(start).num_minutes()
    }
}

pub fn midnight_minutes_of(dt: DateTime<FixedOffset>) -> i64 {
    let time = dt.time();
    (time.hour() as i64) * 60 + (time.minute() as i64)
}

/// Local midnight of the day containing `dt`, in the same offset.
pub fn start_of_day(dt: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    dt - Duration::seconds(i64::from(dt.num_seconds_from_midnight()))
        - Duration::nanoseconds(i64::from(dt.nanosecond() % 1_000_000_000))
}

/// Sunday 00:00 of the calendar week containing `dt`.
pub fn start_of_week(dt: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    let days_since_sunday = i64::from(dt.weekday().num_days_from_sunday());
    start_of_day(dt) - Duration::days(days_since_sunday)
}

/// Monday = 0 through Sunday = 6.
pub fn weekday_index(dt: DateTime<FixedOffset>) -> u32 {
    dt.weekday().num_days_from_monday()
}

/// Rounds `dt` up to the next multiple of `step_minutes` counted from local midnight.
pub fn round_up_to_step(
    dt: DateTime<FixedOffset>,
    step_minutes: i64,
) -> AppResult<DateTime<FixedOffset>> {
    if step_minutes <= 0 {
        return Err(AppError::validation("step granularity must be positive"));
    }
    let day_start = start_of_day(dt);
    let elapsed_seconds = dt.signed_duration_since(day_start).num_seconds();
    let step_seconds = step_minutes * 60;
    let steps = (elapsed_seconds + step_seconds - 1) / step_seconds;
    day_start
        .checked_add_signed(Duration::seconds(steps * step_seconds))
        .ok_or_else(|| AppError::validation("time arithmetic out of range"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Weekday};

    fn dt(day: u32, hour: u32, minute: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(2 * 3600)
            .unwrap()
            .with_ymd_and_hms(2025, 5, day, hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn overlap_is_exclusive_at_the_edges() {
        assert_eq!(
            overlap_minutes(dt(5, 9, 0), dt(5, 10, 0), dt(5, 9, 30), dt(5, 11, 0)),
            30
        );
        assert_eq!(
            overlap_minutes(dt(5, 9, 0), dt(5, 10, 0), dt(5, 12, 0), dt(5, 13, 0)),
            0
        );
        assert_eq!(
            overlap_minutes(dt(5, 9, 0), dt(5, 10, 0), dt(5, 10, 0), dt(5, 11, 0)),
            0
        );
    }

    #[test]
    fn week_starts_on_sunday_midnight() {
        // 2025-05-07 is a Wednesday.
        let start = start_of_week(dt(7, 15, 45));
        assert_eq!(start.weekday(), Weekday::Sun);
        assert_eq!(start, dt(4, 0, 0));
        assert_eq!(start_of_week(dt(4, 0, 0)), dt(4, 0, 0));
    }

    #[test]
    fn rounding_snaps_to_step_boundaries() -> AppResult<()> {
        assert_eq!(round_up_to_step(dt(5, 9, 7), 15)?, dt(5, 9, 15));
        assert_eq!(round_up_to_step(dt(5, 9, 30), 30)?, dt(5, 9, 30));
        assert_eq!(round_up_to_step(dt(5, 23, 50), 30)?, dt(6, 0, 0));
        assert!(round_up_to_step(dt(5, 9, 0), 0).is_err());
        Ok(())
    }

    #[test]
    fn minute_helpers() {
        assert_eq!(midnight_minutes_of(dt(5, 14, 30)), 14 * 60 + 30);
        assert_eq!(weekday_index(dt(5, 9, 0)), 0);
        assert_eq!(start_of_day(dt(5, 14, 30)), dt(5, 0, 0));
    }
}
