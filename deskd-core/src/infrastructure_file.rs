//! Flat-file BookingStore: one JSON document holding every booking.
//!
//! Enable with the `file` feature flag. Suited to small deployments; each
//! call re-reads the document and every write replaces it atomically.
//! Writers in any process serialise on an exclusive lock of `<path>.lock`.

use chrono::NaiveDate;
use fd_lock::RwLock;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::error::{StoreError, StoreResult};
use crate::infrastructure::{check_constraints, BookingStore};
use crate::types::{Booking, BookingId, DeskId, NewBooking, UserId};

#[derive(Debug, Default, Serialize, Deserialize)]
struct Document {
    last_id: i64,
    bookings: Vec<Booking>,
}

pub struct FileBookingStore {
    path: PathBuf,
    lock_path: PathBuf,
}

impl FileBookingStore {
    /// Use the document at `path`; it is created on first write.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let mut lock_path = path.clone().into_os_string();
        lock_path.push(".lock");
        let store = Self {
            path,
            lock_path: lock_path.into(),
        };
        // Surface unreadable or corrupt files at startup rather than on first request.
        store.load()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> StoreResult<Document> {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Document::default()),
            Err(err) => return Err(err.into()),
        };
        serde_json::from_slice(&raw).map_err(|err| StoreError::Corrupt {
            message: format!("{}: {}", self.path.display(), err),
        })
    }

    fn save(&self, document: &Document) -> StoreResult<()> {
        let raw = serde_json::to_vec_pretty(document).map_err(|err| StoreError::Corrupt {
            message: format!("encode bookings: {}", err),
        })?;
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&raw)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|err| StoreError::Io(err.error))?;
        Ok(())
    }

    fn select(&self, filter: impl Fn(&Booking) -> bool) -> StoreResult<Vec<Booking>> {
        let document = self.load()?;
        Ok(document.bookings.into_iter().filter(|b| filter(b)).collect())
    }

    fn modify<T>(&self, change: impl FnOnce(&mut Document) -> StoreResult<T>) -> StoreResult<T> {
        let lock_file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.lock_path)?;
        let mut lock = RwLock::new(lock_file);
        // Held until the new document has replaced the old one.
        let _guard = lock.write()?;

        let mut document = self.load()?;
        let result = change(&mut document)?;
        self.save(&document)?;
        Ok(result)
    }
}

impl BookingStore for FileBookingStore {
    fn bookings_for_desk(&self, desk: &DeskId) -> StoreResult<Vec<Booking>> {
        self.select(|b| &b.desk == desk)
    }

    fn insert_booking(&self, booking: NewBooking) -> StoreResult<Booking> {
        self.modify(|document| {
            check_constraints(&document.bookings, &booking)?;
            document.last_id += 1;
            let booking = booking.with_id(BookingId(document.last_id));
            document.bookings.push(booking.clone());
            Ok(booking)
        })
    }

    fn bookings_for_date(&self, date: NaiveDate) -> StoreResult<Vec<Booking>> {
        self.select(|b| b.slot.date() == date)
    }

    fn future_bookings_for_user(&self, user: &UserId, since: NaiveDate) -> StoreResult<Vec<Booking>> {
        self.select(|b| &b.user == user && b.slot.date() >= since)
    }

    fn delete_booking(&self, id: BookingId) -> StoreResult<()> {
        self.modify(|document| {
            document.bookings.retain(|b| b.id != id);
            Ok(())
        })
    }
}
