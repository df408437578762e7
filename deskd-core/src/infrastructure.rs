use chrono::NaiveDate;

use crate::conflict::ConflictEngine;
use crate::error::{StoreError, StoreResult};
use crate::types::{Booking, BookingId, DeskId, NewBooking, UserId};

/// Defines the contract for booking storage backends.
///
/// Implementations must enforce two durable constraints on insert, so that
/// racing writers cannot both succeed: no two bookings for one desk may
/// overlap ([`crate::error::StoreError::DeskOverlap`]), and no user may hold two
/// bookings with the same start ([`crate::error::StoreError::DuplicateStart`]).
pub trait BookingStore {
    /// All bookings for a desk, in whatever order the backend returns them
    fn bookings_for_desk(&self, desk: &DeskId) -> StoreResult<Vec<Booking>>;

    /// Persist a booking and return it with its assigned id
    fn insert_booking(&self, booking: NewBooking) -> StoreResult<Booking>;

    /// All bookings whose slot starts on the given UTC day
    fn bookings_for_date(&self, date: NaiveDate) -> StoreResult<Vec<Booking>>;

    /// Bookings owned by `user` starting on or after `since`
    fn future_bookings_for_user(&self, user: &UserId, since: NaiveDate) -> StoreResult<Vec<Booking>>;

    /// Remove a booking. Deleting an absent id succeeds.
    fn delete_booking(&self, id: BookingId) -> StoreResult<()>;
}

/// The set of desks that exist and may be booked.
pub trait DeskDirectory {
    /// Every known desk, in directory order
    fn desks(&self) -> Vec<DeskId>;

    fn desk_exists(&self, desk: &DeskId) -> bool;
}

/// Applies the durable constraints every store must enforce.
pub(crate) fn check_constraints<'a>(
    existing: impl IntoIterator<Item = &'a Booking>,
    booking: &NewBooking,
) -> StoreResult<()> {
    for stored in existing {
        if stored.user == booking.user && stored.slot.start == booking.slot.start {
            return Err(StoreError::DuplicateStart {
                user: booking.user.clone(),
                start: booking.slot.start,
            });
        }
        if stored.desk == booking.desk && ConflictEngine::overlaps(&stored.slot, &booking.slot) {
            return Err(StoreError::DeskOverlap {
                desk: booking.desk.clone(),
                slot: stored.slot,
            });
        }
    }
    Ok(())
}
