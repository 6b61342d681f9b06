// Week helpers: weeks start on Monday and end on Sunday

use chrono::{Datelike, Duration, NaiveDate};

/// Monday of the week containing `date`
pub fn monday_of(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Human label for a week-start date, e.g. `Week of 6 Jan 2025`
pub fn week_label(week_start: NaiveDate) -> String {
    format!("Week of {}", week_start.format("%-d %b %Y"))
}
