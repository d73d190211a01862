//! Calendar date helpers.
//!
//! Tasks are bucketed by a canonical `YYYY-MM-DD` key. Everything here is a
//! pure function over `chrono` dates; "today" is always resolved against an
//! explicit time zone so callers and tests agree on the current day.

use chrono::{Datelike, Days, Local, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{DaybookError, DaybookResult};

const DATE_KEY_FORMAT: &str = "%Y-%m-%d";
const CLOCK_FORMAT: &str = "%H:%M";

/// First day of the week used by week and month views.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    Sunday,
    #[default]
    Monday,
}

pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_KEY_FORMAT).to_string()
}

pub fn parse_date_key(s: &str) -> DaybookResult<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_KEY_FORMAT)
        .map_err(|_| DaybookError::InvalidDate(s.to_string()))
}

/// Current date in `tz`, or in the system time zone when `None`.
pub fn today(tz: Option<Tz>) -> NaiveDate {
    match tz {
        Some(tz) => Utc::now().with_timezone(&tz).date_naive(),
        None => Local::now().date_naive(),
    }
}

pub fn today_key(tz: Option<Tz>) -> String {
    date_key(today(tz))
}

/// Parse an IANA time zone name such as `Europe/Berlin`.
pub fn parse_time_zone(name: &str) -> DaybookResult<Tz> {
    name.parse::<Tz>()
        .map_err(|_| DaybookError::Config(format!("Unknown time zone '{}'", name)))
}

/// Shift a date key by `days` (negative moves backwards).
pub fn add_days(key: &str, days: i64) -> DaybookResult<String> {
    let date = parse_date_key(key)?;
    Ok(date_key(shift(date, days)))
}

pub fn shift(date: NaiveDate, days: i64) -> NaiveDate {
    if days >= 0 {
        date.checked_add_days(Days::new(days as u64)).unwrap_or(date)
    } else {
        date.checked_sub_days(Days::new(days.unsigned_abs())).unwrap_or(date)
    }
}

pub fn week_start(date: NaiveDate, start: WeekStart) -> NaiveDate {
    let offset = match start {
        WeekStart::Monday => date.weekday().num_days_from_monday(),
        WeekStart::Sunday => date.weekday().num_days_from_sunday(),
    };
    shift(date, -(offset as i64))
}

pub fn week_end(date: NaiveDate, start: WeekStart) -> NaiveDate {
    shift(week_start(date, start), 6)
}

pub fn week_days(date: NaiveDate, start: WeekStart) -> Vec<NaiveDate> {
    let first = week_start(date, start);
    (0..7).map(|i| shift(first, i)).collect()
}

pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn month_end(date: NaiveDate) -> NaiveDate {
    let first = month_start(date);
    let next_month = first
        .checked_add_months(chrono::Months::new(1))
        .unwrap_or(first);
    shift(next_month, -1)
}

/// Whole weeks covering the month of `date`, as rows of seven dates.
pub fn month_grid(date: NaiveDate, start: WeekStart) -> Vec<Vec<NaiveDate>> {
    let last = month_end(date);
    let mut cursor = week_start(month_start(date), start);
    let mut rows = Vec::new();

    while cursor <= last {
        rows.push((0..7).map(|i| shift(cursor, i)).collect());
        cursor = shift(cursor, 7);
    }

    rows
}

/// Parse a wall-clock `HH:MM` string.
pub fn parse_clock(s: &str) -> DaybookResult<NaiveTime> {
    NaiveTime::parse_from_str(s, CLOCK_FORMAT).map_err(|_| DaybookError::InvalidTime(s.to_string()))
}

pub fn clock(time: NaiveTime) -> String {
    time.format(CLOCK_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_date_key_roundtrip() {
        assert_eq!(date_key(d(2024, 6, 1)), "2024-06-01");
        assert_eq!(parse_date_key("2024-06-01").unwrap(), d(2024, 6, 1));
        assert!(parse_date_key("06/01/2024").is_err());
    }

    #[test]
    fn test_add_days_crosses_month() {
        assert_eq!(add_days("2024-01-31", 1).unwrap(), "2024-02-01");
        assert_eq!(add_days("2024-03-01", -1).unwrap(), "2024-02-29");
    }

    #[test]
    fn test_week_bounds() {
        // 2024-06-05 is a Wednesday
        let wed = d(2024, 6, 5);
        assert_eq!(week_start(wed, WeekStart::Monday), d(2024, 6, 3));
        assert_eq!(week_start(wed, WeekStart::Sunday), d(2024, 6, 2));
        assert_eq!(week_end(wed, WeekStart::Monday), d(2024, 6, 9));
        assert_eq!(week_days(wed, WeekStart::Monday).len(), 7);
    }

    #[test]
    fn test_month_bounds_and_grid() {
        assert_eq!(month_start(d(2024, 2, 17)), d(2024, 2, 1));
        assert_eq!(month_end(d(2024, 2, 17)), d(2024, 2, 29));
        assert_eq!(month_end(d(2024, 12, 3)), d(2024, 12, 31));

        let grid = month_grid(d(2024, 6, 15), WeekStart::Monday);
        assert_eq!(grid.first().unwrap()[0], d(2024, 5, 27));
        assert!(grid.iter().all(|row| row.len() == 7));
        assert!(grid.last().unwrap().contains(&d(2024, 6, 30)));
    }

    #[test]
    fn test_parse_clock() {
        assert_eq!(clock(parse_clock("09:30").unwrap()), "09:30");
        assert!(parse_clock("9.30").is_err());
    }

    #[test]
    fn test_parse_time_zone() {
        assert!(parse_time_zone("Europe/Berlin").is_ok());
        assert!(parse_time_zone("Mars/Olympus").is_err());
    }
}
