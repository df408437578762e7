use crate::types::{Booking, Slot};

/// How an existing slot sits relative to a requested one.
/// Slots are half-open, so touching endpoints do not overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotRelation {
    /// Existing slot ends at or before the requested start
    Before,
    /// Existing slot starts at or after the requested end
    After,
    /// Both slots cover exactly the same interval
    Same,
    /// Existing slot straddles the requested start
    OverlapsStart,
    /// Existing slot straddles the requested end
    OverlapsEnd,
    /// Existing slot covers the whole requested slot
    Contains,
    /// Existing slot lies inside the requested slot
    Within,
}

impl SlotRelation {
    pub fn is_conflict(self) -> bool {
        !matches!(self, SlotRelation::Before | SlotRelation::After)
    }
}

/// Represents the outcome of a conflict check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictResult {
    /// No conflict found
    Ok,
    /// The first stored booking that clashes with the request
    Conflict {
        existing: Booking,
        relation: SlotRelation,
    },
}

/// Pure overlap detection between a requested slot and stored bookings.
pub struct ConflictEngine;

impl ConflictEngine {
    pub fn classify(existing: &Slot, requested: &Slot) -> SlotRelation {
        if existing.end <= requested.start {
            SlotRelation::Before
        } else if existing.start >= requested.end {
            SlotRelation::After
        } else if existing == requested {
            SlotRelation::Same
        } else if existing.start <= requested.start && existing.end >= requested.end {
            SlotRelation::Contains
        } else if requested.start <= existing.start && requested.end >= existing.end {
            SlotRelation::Within
        } else if existing.start < requested.start {
            SlotRelation::OverlapsStart
        } else {
            SlotRelation::OverlapsEnd
        }
    }

    pub fn overlaps(a: &Slot, b: &Slot) -> bool {
        Self::classify(a, b).is_conflict()
    }

    /// Checks the requested slot against bookings in the order given and
    /// reports the first clash.
    pub fn check(requested: &Slot, existing: &[Booking]) -> ConflictResult {
        for booking in existing {
            let relation = Self::classify(&booking.slot, requested);
            if relation.is_conflict() {
                return ConflictResult::Conflict {
                    existing: booking.clone(),
                    relation,
                };
            }
        }

        ConflictResult::Ok
    }
}
