use serde::{Deserialize, Serialize};

use super::{BookingId, DeskId, Slot, UserId};

/// A reservation of one desk by one user. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    /// Assigned by the store on insert
    pub id: BookingId,
    /// Owner of the booking
    pub user: UserId,
    /// The reserved desk
    pub desk: DeskId,
    /// When the desk is reserved
    pub slot: Slot,
}

/// A booking that has not been persisted yet and so has no id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBooking {
    pub user: UserId,
    pub desk: DeskId,
    pub slot: Slot,
}

impl NewBooking {
    pub fn new(user: UserId, desk: DeskId, slot: Slot) -> Self {
        Self { user, desk, slot }
    }

    /// Attach the id handed out by the store.
    pub fn with_id(self, id: BookingId) -> Booking {
        Booking {
            id,
            user: self.user,
            desk: self.desk,
            slot: self.slot,
        }
    }
}
