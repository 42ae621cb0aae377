use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dto::validation::{validate_iso_date, validate_time_of_day},
    state::{
        calendar::{format_date, parse_date, to_minutes},
        league::{AvailabilityWindow, ParticipantId},
    },
};

/// One availability window as exchanged over HTTP.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate, PartialEq, Eq)]
pub struct WindowDto {
    /// ISO `YYYY-MM-DD`.
    #[validate(custom(function = "validate_iso_date"))]
    pub date: String,
    /// `HH:MM`, 24-hour.
    #[validate(custom(function = "validate_time_of_day"))]
    pub start_time: String,
    /// `HH:MM`, 24-hour.
    #[validate(custom(function = "validate_time_of_day"))]
    pub end_time: String,
}

impl From<&AvailabilityWindow> for WindowDto {
    fn from(window: &AvailabilityWindow) -> Self {
        Self {
            date: format_date(window.date()),
            start_time: window.start().to_string(),
            end_time: window.end().to_string(),
        }
    }
}

impl WindowDto {
    /// Typed window owned by `participant_id`. Expects a validated DTO.
    pub fn to_window(&self, participant_id: &ParticipantId) -> Result<AvailabilityWindow, String> {
        let date = parse_date(&self.date).map_err(|err| err.to_string())?;
        let start = to_minutes(&self.start_time).map_err(|err| err.to_string())?;
        let end = to_minutes(&self.end_time).map_err(|err| err.to_string())?;
        AvailabilityWindow::new(participant_id.clone(), date, start, end).map_err(|err| err.to_string())
    }
}

/// Full replacement of a participant's availability. An empty list clears it.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ReplaceAvailabilityRequest {
    /// New windows, at most one per date.
    #[validate(nested, length(max = 366))]
    pub windows: Vec<WindowDto>,
}

/// A participant's stored availability, sorted by date.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AvailabilityResponse {
    /// Owner of the windows.
    pub participant_id: String,
    /// Stored windows.
    pub windows: Vec<WindowDto>,
}
