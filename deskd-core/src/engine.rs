//! Booking rules: overlap and duplicate checks before insert, ownership
//! checks before delete. All mutation goes through the [`BookingStore`].

use chrono::{NaiveDate, Utc};
use std::collections::HashSet;

use crate::conflict::{ConflictEngine, ConflictResult};
use crate::error::{BookingError, Result, StoreError};
use crate::infrastructure::BookingStore;
use crate::types::{Booking, BookingId, DeskId, NewBooking, Slot, UserId};

/// Stateless per-request view over a store.
///
/// The read-then-write in [`BookingEngine::book`] is only a pre-filter that
/// yields a precise error; under concurrent writers correctness comes from
/// the store's own constraints, whose rejections are reported the same way.
pub struct BookingEngine<'a, S: BookingStore + ?Sized> {
    store: &'a S,
    today: NaiveDate,
}

impl<'a, S: BookingStore + ?Sized> BookingEngine<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self::at(store, Utc::now().date_naive())
    }

    /// An engine whose notion of "today" (for future-booking queries) is fixed.
    pub fn at(store: &'a S, today: NaiveDate) -> Self {
        Self { store, today }
    }

    /// Reserve `desk` for `user` over `slot`.
    pub fn book(&self, user: &UserId, desk: &DeskId, slot: Slot) -> Result<Booking> {
        if user.is_empty() {
            return Err(BookingError::MissingIdentifier { field: "user" });
        }
        if desk.is_empty() {
            return Err(BookingError::MissingIdentifier { field: "desk" });
        }
        let slot = slot.truncated_to_millis();
        if !slot.is_valid() {
            return Err(BookingError::InvalidSlot { slot });
        }

        // 1. A user is committed to an instant regardless of desk.
        let user_bookings = self
            .store
            .future_bookings_for_user(user, self.today)
            .map_err(BookingError::storage("get bookings for user", user.to_string()))?;
        if user_bookings.iter().any(|b| b.slot.start == slot.start) {
            tracing::debug!(user = %user, start = %slot.start, "Duplicate booking intent");
            return Err(BookingError::DuplicateIntent {
                user: user.clone(),
                start: slot.start,
            });
        }

        // 2. The desk must be free for the whole slot.
        let desk_bookings = self
            .store
            .bookings_for_desk(desk)
            .map_err(BookingError::storage("get bookings for desk", desk.to_string()))?;
        if let ConflictResult::Conflict { existing, relation } = ConflictEngine::check(&slot, &desk_bookings) {
            tracing::debug!(
                desk = %desk,
                existing = %existing.id,
                relation = ?relation,
                "Desk already booked"
            );
            return Err(BookingError::AlreadyBooked {
                desk: desk.clone(),
                slot: existing.slot,
            });
        }

        // 3. Persist; the store's constraints catch anyone who got there first.
        let booking = self
            .store
            .insert_booking(NewBooking::new(user.clone(), desk.clone(), slot))
            .map_err(|err| match err {
                StoreError::DeskOverlap { desk, slot } => {
                    tracing::warn!(desk = %desk, "Booking lost a race on the desk overlap constraint");
                    BookingError::AlreadyBooked { desk, slot }
                }
                StoreError::DuplicateStart { user, start } => {
                    tracing::warn!(user = %user, "Booking lost a race on the duplicate start constraint");
                    BookingError::DuplicateIntent { user, start }
                }
                other => BookingError::storage("add booking for desk", desk.to_string())(other),
            })?;

        tracing::info!(
            booking_id = %booking.id,
            user = %booking.user,
            desk = %booking.desk,
            slot = %booking.slot,
            "Booking created"
        );
        Ok(booking)
    }

    /// Every booking starting on `date`.
    pub fn bookings(&self, date: NaiveDate) -> Result<Vec<Booking>> {
        self.store
            .bookings_for_date(date)
            .map_err(BookingError::storage("get bookings for date", date.to_string()))
    }

    /// Bookings held by `user` from today onwards.
    pub fn user_bookings(&self, user: &UserId) -> Result<Vec<Booking>> {
        self.store
            .future_bookings_for_user(user, self.today)
            .map_err(BookingError::storage("get bookings for user", user.to_string()))
    }

    /// Remove a booking, but only if `user` owns it.
    pub fn cancel_booking(&self, id: BookingId, user: &UserId) -> Result<()> {
        let owned = self
            .store
            .future_bookings_for_user(user, self.today)
            .map_err(BookingError::storage("get bookings for user", user.to_string()))?;

        // Someone else's booking looks exactly like a missing one.
        if !owned.iter().any(|b| b.id == id) {
            return Err(BookingError::NotFound {
                booking: id,
                user: user.clone(),
            });
        }

        self.store
            .delete_booking(id)
            .map_err(BookingError::storage("delete booking", id.to_string()))?;

        tracing::info!(booking_id = %id, user = %user, "Booking cancelled");
        Ok(())
    }

    /// `all_desks` minus every desk with a booking on `date`, in input order.
    pub fn available_desks(&self, date: NaiveDate, all_desks: &[DeskId]) -> Result<Vec<DeskId>> {
        let booked: HashSet<DeskId> = self.bookings(date)?.into_iter().map(|b| b.desk).collect();

        Ok(all_desks
            .iter()
            .filter(|desk| !booked.contains(*desk))
            .cloned()
            .collect())
    }
}
