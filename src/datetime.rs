//! Serde formats for dates and date-times, and parsing of the values sent by
//! HTML date inputs.

use serde::{Deserialize, Deserializer};
use time::{
    Date, PrimitiveDateTime, format_description::BorrowedFormatItem, macros::format_description,
};

time::serde::format_description!(
    pub iso_date_time,
    PrimitiveDateTime,
    "[year]-[month]-[day]T[hour]:[minute]:[second]"
);

time::serde::format_description!(pub iso_date, Date, "[year]-[month]-[day]");

const DATE_TIME_FORMATS: &[&[BorrowedFormatItem<'_>]] = &[
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    format_description!("[year]-[month]-[day]T[hour]:[minute]"),
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    format_description!("[year]-[month]-[day] [hour]:[minute]"),
];

/// Parse a date-time from a `datetime-local` input or JSON body.
///
/// Seconds are optional and either 'T' or a space may separate the date and time.
pub fn parse_date_time(text: &str) -> Option<PrimitiveDateTime> {
    let text = text.trim();

    DATE_TIME_FORMATS
        .iter()
        .find_map(|format| PrimitiveDateTime::parse(text, format).ok())
}

/// Deserialize a date-time with [parse_date_time].
pub fn deserialize_date_time<'de, D>(deserializer: D) -> Result<PrimitiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;

    parse_date_time(&text).ok_or_else(|| {
        serde::de::Error::custom(format!("\"{text}\" is not a valid date and time"))
    })
}

/// The value for a `datetime-local` input, e.g. "2025-03-14T09:05".
pub fn format_date_time_input(date_time: PrimitiveDateTime) -> String {
    let time = date_time.time();

    format!(
        "{}T{:02}:{:02}",
        date_time.date(),
        time.hour(),
        time.minute()
    )
}
