use axum::http::StatusCode;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use deskd_core::error::BookingError;
use deskd_core::types::{Booking, DeskId, Slot};

// ─── Request Types ──────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct DayQuery {
    pub day: NaiveDate,
}

/// Either `day` for a whole-day booking, or an explicit `start`/`end` pair.
#[derive(Deserialize)]
pub struct BookRequest {
    pub desk: String,
    #[serde(default)]
    pub day: Option<NaiveDate>,
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
}

impl BookRequest {
    pub fn validate(&self) -> Result<(DeskId, Slot), String> {
        if self.desk.trim().is_empty() {
            return Err("desk is required".to_string());
        }
        let slot = match (self.day, self.start, self.end) {
            (Some(day), None, None) => Slot::day(day),
            (None, Some(start), Some(end)) => Slot::new(start, end),
            (None, None, None) => return Err("either day or start and end are required".to_string()),
            _ => return Err("give either day or start and end, not a mix".to_string()),
        };
        Ok((DeskId::new(self.desk.trim()), slot))
    }
}

// ─── Response Types ─────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub desks: usize,
    pub version: String,
}

#[derive(Serialize)]
pub struct DayBookingsResponse {
    pub day: NaiveDate,
    pub bookings: Vec<Booking>,
}

#[derive(Serialize)]
pub struct AvailableResponse {
    pub day: NaiveDate,
    pub desks: Vec<DeskId>,
}

#[derive(Serialize)]
pub struct CancelResponse {
    pub cancelled: i64,
}

// ─── Error Mapping ──────────────────────────────────────────────────────────

/// Status code and client-facing message for a booking failure.
/// Storage failures are logged by the caller and never leak their details.
pub fn error_status(err: &BookingError) -> (StatusCode, String) {
    match err {
        BookingError::AlreadyBooked { .. } | BookingError::DuplicateIntent { .. } => {
            (StatusCode::CONFLICT, err.to_string())
        }
        BookingError::NotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        BookingError::InvalidSlot { .. }
        | BookingError::MissingIdentifier { .. }
        | BookingError::InPast { .. }
        | BookingError::UnknownDesk { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
        BookingError::Storage { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "internal storage error".to_string()),
    }
}
