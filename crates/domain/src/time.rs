//! Wall-clock helpers.
//!
//! The schedule is expressed in the local time of the lab, so everything here
//! works on naive local timestamps rather than UTC.

use chrono::{Local, NaiveDateTime, NaiveTime};

use crate::error::ValidationError;

/// Return the current local wall-clock time.
#[must_use]
pub fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Parse an `HH:MM` time of day.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidTime`] when `value` is not a valid
/// 24-hour `HH:MM` string.
pub fn parse_time_of_day(value: &str) -> Result<NaiveTime, ValidationError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|_| ValidationError::InvalidTime(value.to_string()))
}
