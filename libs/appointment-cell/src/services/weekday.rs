use chrono::{Datelike, NaiveDate, Weekday};

use crate::models::DayOfWeek;

impl From<Weekday> for DayOfWeek {
    fn from(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Sun => DayOfWeek::Sunday,
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
        }
    }
}

/// Proleptic Gregorian weekday of a calendar date.
pub fn resolve_weekday(date: NaiveDate) -> DayOfWeek {
    date.weekday().into()
}
