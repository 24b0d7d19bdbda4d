//! Resolves the date windows used to scope dashboard queries.
//!
//! All functions are pure: the reference day is always passed in so that
//! callers (and tests) control the clock.

use std::ops::RangeInclusive;

use time::{Date, Duration, Month, util};

use crate::Error;

/// Resolve a calendar-month window as an inclusive day range.
///
/// `year` and `month` default to the month containing `today`. The range runs
/// from the first to the last day of the month, so February and leap years
/// come out with the right day count.
///
/// # Errors
/// Returns [Error::InvalidMonth] if `month` is outside 1-12, or
/// [Error::InvalidYear] if `year` is outside the supported date range.
pub fn month_window(
    year: Option<i32>,
    month: Option<u8>,
    today: Date,
) -> Result<RangeInclusive<Date>, Error> {
    let year = year.unwrap_or_else(|| today.year());
    let month = match month {
        Some(number) => Month::try_from(number).map_err(|_| Error::InvalidMonth(number))?,
        None => today.month(),
    };

    let last_day = util::days_in_month(month, year);

    // The day numbers are guaranteed valid for the month, so the only way
    // these constructors can fail is a year outside the supported range.
    let start = Date::from_calendar_date(year, month, 1).map_err(|_| Error::InvalidYear(year))?;
    let end =
        Date::from_calendar_date(year, month, last_day).map_err(|_| Error::InvalidYear(year))?;

    Ok(start..=end)
}

/// Resolve a trailing window of `days` days ending at `today` (inclusive).
///
/// Negative day counts are clamped to 0 rather than producing an inverted
/// range.
pub fn trailing_window(days: i64, today: Date) -> RangeInclusive<Date> {
    let days = days.max(0);
    (today - Duration::days(days))..=today
}

/// The number of days covered by an inclusive day range.
pub fn days_in_window(range: &RangeInclusive<Date>) -> i64 {
    (*range.end() - *range.start()).whole_days() + 1
}
