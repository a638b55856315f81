//! Date parsing and calendar helpers for lease data.

use time::macros::format_description;
use time::{Date, Month};

/// Parse a strict `YYYY-MM-DD` date (request parameters).
pub fn parse_iso_date(value: &str) -> Result<Date, time::error::Parse> {
    Date::parse(value.trim(), format_description!("[year]-[month]-[day]"))
}

/// Render a date as `YYYY-MM-DD`.
pub fn format_iso_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

/// Parse a lease date as stored: `YYYY-MM-DD`, `M/D/YYYY` or `M/D/YY`.
///
/// An ISO timestamp is truncated to its date part first.
pub fn parse_lease_date(value: &str) -> Option<Date> {
    let value = value.trim();
    let value = value.split_once('T').map_or(value, |(date, _)| date);

    if value.contains('/') {
        return parse_slashed(value);
    }

    parse_iso_date(value).ok()
}

/// `M/D/YY` or `M/D/YYYY`, US order. Two-digit years pivot at 69 like strptime.
fn parse_slashed(value: &str) -> Option<Date> {
    let mut parts = value.split('/');
    let month: u8 = parts.next()?.trim().parse().ok()?;
    let day: u8 = parts.next()?.trim().parse().ok()?;
    let year_part = parts.next()?.trim();
    if parts.next().is_some() {
        return None;
    }

    let year: i32 = year_part.parse().ok()?;
    let year = match year_part.len() {
        2 if year < 69 => 2000 + year,
        2 => 1900 + year,
        4 => year,
        _ => return None,
    };

    Date::from_calendar_date(year, Month::try_from(month).ok()?, day).ok()
}

/// Number of days from `start` to `end`, both included.
pub fn inclusive_days(start: Date, end: Date) -> i64 {
    (end - start).whole_days() + 1
}

/// Months (`YYYY-MM`) touched by the range, first to last inclusive.
pub fn months_between(start: Date, end: Date) -> Vec<String> {
    let mut months = Vec::new();
    let (mut year, mut month) = (start.year(), start.month());

    while (year, u8::from(month)) <= (end.year(), u8::from(end.month())) {
        months.push(format!("{:04}-{:02}", year, u8::from(month)));
        if month == Month::December {
            year += 1;
        }
        month = month.next();
    }

    months
}

/// First and last day of the month containing `today`.
pub fn month_bounds(today: Date) -> (Date, Date) {
    let first = today.replace_day(1).unwrap_or(today);
    let last_day = time::util::days_in_year_month(today.year(), today.month());
    let last = today.replace_day(last_day).unwrap_or(today);
    (first, last)
}
