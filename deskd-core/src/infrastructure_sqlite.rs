//! SQLite-backed BookingStore implementation.
//! Provides persistent booking storage across restarts.
//!
//! Enable with the `sqlite` feature flag:
//! ```toml
//! deskd-core = { path = "../deskd-core", features = ["sqlite"] }
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{ffi, params, Connection, ErrorCode};
use std::time::Duration;

use crate::error::{StoreError, StoreResult};
use crate::infrastructure::BookingStore;
use crate::types::*;

const DAY_FORMAT: &str = "%Y-%m-%d";
const DESK_OVERLAP: &str = "desk_overlap";

const SELECT_COLUMNS: &str = "SELECT id, user, desk, start_ms, end_ms FROM bookings";

/// A persistent booking store backed by SQLite.
///
/// The overlap and duplicate-start rules are enforced by the schema itself,
/// so a writer that loses a race is rejected atomically.
pub struct SqliteBookingStore {
    conn: Connection,
}

impl SqliteBookingStore {
    /// Open (or create) a SQLite database at the given path.
    pub fn open(path: &str) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// A private database that lives as long as the store.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> StoreResult<Self> {
        // WAL keeps readers off the writer's back; in-memory databases report "memory".
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        // Wait on a locked database rather than failing immediately.
        conn.busy_timeout(Duration::from_secs(5))?;

        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS bookings (
                id       INTEGER PRIMARY KEY AUTOINCREMENT,
                user     TEXT NOT NULL,
                desk     TEXT NOT NULL,
                day      TEXT NOT NULL,
                start_ms INTEGER NOT NULL,
                end_ms   INTEGER NOT NULL,
                UNIQUE(user, start_ms)
            );
            CREATE INDEX IF NOT EXISTS idx_bookings_desk ON bookings(desk);
            CREATE INDEX IF NOT EXISTS idx_bookings_day ON bookings(day);
            CREATE INDEX IF NOT EXISTS idx_bookings_user_day ON bookings(user, day);

            CREATE TRIGGER IF NOT EXISTS bookings_no_overlap
            BEFORE INSERT ON bookings
            WHEN EXISTS (
                SELECT 1 FROM bookings
                WHERE desk = NEW.desk AND start_ms < NEW.end_ms AND NEW.start_ms < end_ms
            )
            BEGIN
                SELECT RAISE(ABORT, '{DESK_OVERLAP}');
            END;"
        ))?;

        Ok(Self { conn })
    }

    fn query(&self, sql: &str, param: &str) -> StoreResult<Vec<Booking>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params![param], Self::row_to_booking)?;
        let bookings = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(bookings)
    }

    fn row_to_booking(row: &rusqlite::Row) -> rusqlite::Result<Booking> {
        Ok(Booking {
            id: BookingId(row.get(0)?),
            user: UserId::new(row.get::<_, String>(1)?),
            desk: DeskId::new(row.get::<_, String>(2)?),
            slot: Slot::new(Self::millis_to_time(row, 3)?, Self::millis_to_time(row, 4)?),
        })
    }

    fn millis_to_time(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
        let millis: i64 = row.get(idx)?;
        DateTime::from_timestamp_millis(millis).ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, millis))
    }

    /// Translates constraint failures into the store's constraint errors.
    fn insert_error(err: rusqlite::Error, booking: &NewBooking) -> StoreError {
        if let rusqlite::Error::SqliteFailure(failure, message) = &err {
            if failure.code == ErrorCode::ConstraintViolation {
                if failure.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE {
                    return StoreError::DuplicateStart {
                        user: booking.user.clone(),
                        start: booking.slot.start,
                    };
                }
                if message.as_deref() == Some(DESK_OVERLAP) {
                    return StoreError::DeskOverlap {
                        desk: booking.desk.clone(),
                        slot: booking.slot,
                    };
                }
            }
        }
        err.into()
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Backend {
            message: err.to_string(),
        }
    }
}

impl BookingStore for SqliteBookingStore {
    fn bookings_for_desk(&self, desk: &DeskId) -> StoreResult<Vec<Booking>> {
        self.query(&format!("{SELECT_COLUMNS} WHERE desk = ?1"), desk.as_str())
    }

    fn insert_booking(&self, booking: NewBooking) -> StoreResult<Booking> {
        // Rows hold milliseconds; hand back exactly what a later read returns.
        let booking = NewBooking {
            slot: booking.slot.truncated_to_millis(),
            ..booking
        };
        if booking.slot.start >= booking.slot.end {
            return Err(StoreError::Backend {
                message: format!("slot {} is shorter than a millisecond", booking.slot),
            });
        }

        self.conn
            .execute(
                "INSERT INTO bookings (user, desk, day, start_ms, end_ms) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    booking.user.as_str(),
                    booking.desk.as_str(),
                    booking.slot.date().format(DAY_FORMAT).to_string(),
                    booking.slot.start.timestamp_millis(),
                    booking.slot.end.timestamp_millis(),
                ],
            )
            .map_err(|err| Self::insert_error(err, &booking))?;

        let id = BookingId(self.conn.last_insert_rowid());
        Ok(booking.with_id(id))
    }

    fn bookings_for_date(&self, date: NaiveDate) -> StoreResult<Vec<Booking>> {
        self.query(
            &format!("{SELECT_COLUMNS} WHERE day = ?1 ORDER BY id"),
            &date.format(DAY_FORMAT).to_string(),
        )
    }

    fn future_bookings_for_user(&self, user: &UserId, since: NaiveDate) -> StoreResult<Vec<Booking>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SELECT_COLUMNS} WHERE user = ?1 AND day >= ?2 ORDER BY start_ms"))?;
        let rows = stmt.query_map(
            params![user.as_str(), since.format(DAY_FORMAT).to_string()],
            Self::row_to_booking,
        )?;
        let bookings = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(bookings)
    }

    fn delete_booking(&self, id: BookingId) -> StoreResult<()> {
        self.conn.execute("DELETE FROM bookings WHERE id = ?1", params![id.0])?;
        Ok(())
    }
}
