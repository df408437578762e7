use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use crate::error::{StoreError, StoreResult};
use crate::infrastructure::{check_constraints, BookingStore};
use crate::types::{Booking, BookingId, DeskId, NewBooking, UserId};

#[derive(Default)]
struct Bookings {
    // Booking ID -> Booking, iterated in insertion (id) order
    by_id: BTreeMap<BookingId, Booking>,
    last_id: i64,
}

/// A process-local booking store. Nothing survives a restart.
#[derive(Default)]
pub struct InMemoryBookingStore {
    bookings: Mutex<Bookings>,
}

impl InMemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Bookings>> {
        self.bookings.lock().map_err(|_| StoreError::Backend {
            message: "in-memory booking store lock poisoned".to_string(),
        })
    }

    fn select(&self, filter: impl Fn(&Booking) -> bool) -> StoreResult<Vec<Booking>> {
        let bookings = self.lock()?;
        let found = bookings.by_id.values().filter(|b| filter(*b)).cloned().collect();
        Ok(found)
    }
}

impl BookingStore for InMemoryBookingStore {
    fn bookings_for_desk(&self, desk: &DeskId) -> StoreResult<Vec<Booking>> {
        self.select(|b| &b.desk == desk)
    }

    fn insert_booking(&self, booking: NewBooking) -> StoreResult<Booking> {
        let mut bookings = self.lock()?;
        check_constraints(bookings.by_id.values(), &booking)?;

        bookings.last_id += 1;
        let booking = booking.with_id(BookingId(bookings.last_id));
        bookings.by_id.insert(booking.id, booking.clone());
        Ok(booking)
    }

    fn bookings_for_date(&self, date: NaiveDate) -> StoreResult<Vec<Booking>> {
        self.select(|b| b.slot.date() == date)
    }

    fn future_bookings_for_user(&self, user: &UserId, since: NaiveDate) -> StoreResult<Vec<Booking>> {
        self.select(|b| &b.user == user && b.slot.date() >= since)
    }

    fn delete_booking(&self, id: BookingId) -> StoreResult<()> {
        self.lock()?.by_id.remove(&id);
        Ok(())
    }
}
