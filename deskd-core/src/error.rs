use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::types::{BookingId, DeskId, Slot, UserId};

/// Failures reported by a [`crate::infrastructure::BookingStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// The durable no-overlap constraint rejected an insert.
    #[error("desk {desk} already holds a booking overlapping {slot}")]
    DeskOverlap { desk: DeskId, slot: Slot },
    /// The durable one-booking-per-start constraint rejected an insert.
    #[error("user {user} already holds a booking starting at {start}")]
    DuplicateStart { user: UserId, start: DateTime<Utc> },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt booking data: {message}")]
    Corrupt { message: String },
    #[error("storage backend error: {message}")]
    Backend { message: String },
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors returned by the booking engine and client.
#[derive(Debug, Error)]
pub enum BookingError {
    #[error("desk {desk} already booked between {slot}")]
    AlreadyBooked { desk: DeskId, slot: Slot },
    #[error("user {user} already has a booking starting at {start}")]
    DuplicateIntent { user: UserId, start: DateTime<Utc> },
    /// Ownership-scoped: also returned when the booking exists but belongs to someone else.
    #[error("booking {booking} not found for user {user}")]
    NotFound { booking: BookingId, user: UserId },
    #[error("slot {slot} must end after it starts and no later than the following midnight")]
    InvalidSlot { slot: Slot },
    #[error("{field} must not be empty")]
    MissingIdentifier { field: &'static str },
    #[error("slot starting at {start} is in the past")]
    InPast { start: DateTime<Utc> },
    #[error("desk {desk} does not exist")]
    UnknownDesk { desk: DeskId },
    #[error("{operation} ({context}): {source}")]
    Storage {
        operation: &'static str,
        context: String,
        #[source]
        source: StoreError,
    },
}

impl BookingError {
    pub(crate) fn storage(operation: &'static str, context: impl Into<String>) -> impl FnOnce(StoreError) -> Self {
        let context = context.into();
        move |source| BookingError::Storage {
            operation,
            context,
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, BookingError>;
