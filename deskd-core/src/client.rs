//! High-level client that wraps the booking engine + pluggable storage and
//! the desk directory. The CLI and HTTP server both delegate to this.

use chrono::{NaiveDate, Utc};

use crate::directory::DeskList;
use crate::engine::BookingEngine;
use crate::error::{BookingError, Result};
use crate::infrastructure::{BookingStore, DeskDirectory};
use crate::infrastructure_in_memory::InMemoryBookingStore;
use crate::natural;
use crate::types::*;

/// The main entry point for booking desks. Owns the storage backend and the
/// desk directory; a fresh [`BookingEngine`] is built for every call.
pub struct DeskdClient {
    store: Box<dyn BookingStore + Send>,
    desks: Box<dyn DeskDirectory + Send>,
}

impl DeskdClient {
    /// Compose a client from any store and directory.
    pub fn new(store: impl BookingStore + Send + 'static, desks: impl DeskDirectory + Send + 'static) -> Self {
        Self {
            store: Box::new(store),
            desks: Box::new(desks),
        }
    }

    /// Create a client with an empty in-memory store.
    pub fn in_memory(desks: DeskList) -> Self {
        Self::new(InMemoryBookingStore::new(), desks)
    }

    /// Create a client backed by SQLite at the given path.
    /// Bookings persist across restarts.
    #[cfg(feature = "sqlite")]
    pub fn with_sqlite(path: &str, desks: DeskList) -> std::result::Result<Self, crate::error::StoreError> {
        let store = crate::infrastructure_sqlite::SqliteBookingStore::open(path)?;
        Ok(Self::new(store, desks))
    }

    /// Create a client backed by a JSON document at the given path.
    #[cfg(feature = "file")]
    pub fn with_file(path: &str, desks: DeskList) -> std::result::Result<Self, crate::error::StoreError> {
        let store = crate::infrastructure_file::FileBookingStore::open(path)?;
        Ok(Self::new(store, desks))
    }

    fn engine(&self) -> BookingEngine<'_, dyn BookingStore + Send> {
        BookingEngine::new(self.store.as_ref())
    }

    /// Book a desk. The slot may not start before today and the desk must exist.
    pub fn book(&self, user: &UserId, desk: &DeskId, slot: Slot) -> Result<Booking> {
        if slot.date() < today() {
            return Err(BookingError::InPast { start: slot.start });
        }
        if !self.desks.desk_exists(desk) {
            return Err(BookingError::UnknownDesk { desk: desk.clone() });
        }
        self.engine().book(user, desk, slot)
    }

    /// Book a desk for a whole day.
    pub fn book_day(&self, user: &UserId, desk: &DeskId, date: NaiveDate) -> Result<Booking> {
        self.book(user, desk, Slot::day(date))
    }

    /// All bookings on `date`, in natural desk order.
    pub fn bookings(&self, date: NaiveDate) -> Result<Vec<Booking>> {
        let mut bookings = self.engine().bookings(date)?;
        bookings.sort_by(|a, b| natural::compare(a.desk.as_str(), b.desk.as_str()).then(a.slot.start.cmp(&b.slot.start)));
        Ok(bookings)
    }

    /// The user's bookings from today onwards, earliest first.
    pub fn user_bookings(&self, user: &UserId) -> Result<Vec<Booking>> {
        let mut bookings = self.engine().user_bookings(user)?;
        bookings.sort_by_key(|b| b.slot.start);
        Ok(bookings)
    }

    /// Cancel one of the user's own bookings.
    pub fn cancel_booking(&self, id: BookingId, user: &UserId) -> Result<()> {
        self.engine().cancel_booking(id, user)
    }

    /// Desks with no booking on `date`, in natural order.
    pub fn available_desks(&self, date: NaiveDate) -> Result<Vec<DeskId>> {
        let mut desks = self.engine().available_desks(date, &self.desks.desks())?;
        natural::sort(&mut desks);
        Ok(desks)
    }

    /// Every known desk, in natural order.
    pub fn desks(&self) -> Vec<DeskId> {
        let mut desks = self.desks.desks();
        natural::sort(&mut desks);
        desks
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}
