//! Validation helpers for DTOs.

use validator::ValidationError;

use crate::state::calendar::{parse_date, to_minutes};

/// Validates that a date is written as ISO `YYYY-MM-DD`.
///
/// # Examples
///
/// ```ignore
/// validate_iso_date("2026-02-10") // Ok
/// validate_iso_date("10/02/2026") // Err
/// ```
pub fn validate_iso_date(value: &str) -> Result<(), ValidationError> {
    parse_date(value).map(|_| ()).map_err(|err| {
        let mut error = ValidationError::new("iso_date");
        error.message = Some(err.to_string().into());
        error
    })
}

/// Validates that a time of day is written as 24-hour `HH:MM`.
pub fn validate_time_of_day(value: &str) -> Result<(), ValidationError> {
    to_minutes(value).map(|_| ()).map_err(|err| {
        let mut error = ValidationError::new("time_of_day");
        error.message = Some(err.to_string().into());
        error
    })
}
