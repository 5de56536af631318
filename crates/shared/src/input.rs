use chrono::{Datelike, NaiveDate};
use thiserror::Error;

use crate::models::ANONYMOUS_NAME;

pub const MIN_YEAR: i32 = 1900;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("invalid input, please enter a number")]
    NotANumber,
    #[error("invalid year, enter a year between {min} and {max}")]
    YearOutOfRange { min: i32, max: i32 },
    #[error("invalid month, enter a number between 1 and 12")]
    MonthOutOfRange,
    #[error("invalid day, month {month} of {year} has at most {max} days")]
    DayOutOfRange { year: i32, month: u32, max: u32 },
}

/// Parse a numeric menu choice
pub fn parse_choice(raw: &str) -> Result<u32, InputError> {
    raw.trim().parse().map_err(|_| InputError::NotANumber)
}

pub fn parse_number(raw: &str) -> Result<i32, InputError> {
    raw.trim().parse().map_err(|_| InputError::NotANumber)
}

/// Years run from 1900 through next year
pub fn validate_year(year: i32, current_year: i32) -> Result<i32, InputError> {
    let max = current_year + 1;
    if (MIN_YEAR..=max).contains(&year) {
        Ok(year)
    } else {
        Err(InputError::YearOutOfRange { min: MIN_YEAR, max })
    }
}

pub fn validate_month(month: i32) -> Result<u32, InputError> {
    if (1..=12).contains(&month) {
        Ok(month as u32)
    } else {
        Err(InputError::MonthOutOfRange)
    }
}

/// Checks the day against the real length of the month
pub fn validate_day(year: i32, month: u32, day: i32) -> Result<NaiveDate, InputError> {
    let max = days_in_month(year, month);
    let out_of_range = InputError::DayOutOfRange { year, month, max };
    if day < 1 || day as u32 > max {
        return Err(out_of_range);
    }
    NaiveDate::from_ymd_opt(year, month, day as u32).ok_or(out_of_range)
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
        .unwrap_or(31)
}

/// Blank names fall back to [`ANONYMOUS_NAME`]
pub fn display_name_or_default(raw: &str) -> String {
    let name = raw.trim();
    if name.is_empty() {
        ANONYMOUS_NAME.to_string()
    } else {
        name.to_string()
    }
}
