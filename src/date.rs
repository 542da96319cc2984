use chrono::{Datelike, NaiveDate};
use thiserror::Error;

const LAYOUT: &str = "%Y-%m-%d";

#[derive(Debug, Error, PartialEq, Eq)]
#[error("{input} is not a YYYY-MM-DD date")]
pub struct InvalidDate {
    pub input: String,
}

/// Parses a deadline typed as `YYYY-MM-DD`.
///
/// Only the zero-padded layout is accepted, so `2024-1-01` is rejected even
/// though chrono alone would read it.
pub fn parse_deadline(input: &str) -> Result<NaiveDate, InvalidDate> {
    let invalid = || InvalidDate { input: input.to_string() };
    let date = NaiveDate::parse_from_str(input, LAYOUT).map_err(|_| invalid())?;

    if date.format(LAYOUT).to_string() != input {
        return Err(invalid());
    }
    Ok(date)
}

pub fn ordinal_suffix(day: u32) -> &'static str {
    match day {
        1 | 21 | 31 => "st",
        2 | 22 => "nd",
        3 | 23 => "rd",
        _ => "th",
    }
}

/// Renders a date as e.g. `Monday 1st January 2024`.
pub fn format_deadline(date: NaiveDate) -> String {
    format!(
        "{} {}{} {} {}",
        date.format("%A"),
        date.day(),
        ordinal_suffix(date.day()),
        date.format("%B"),
        date.year()
    )
}
