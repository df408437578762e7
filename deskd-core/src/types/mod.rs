mod booking;
mod primitives;

pub use booking::{Booking, NewBooking};
pub use primitives::{BookingId, DeskId, Slot, UserId};
