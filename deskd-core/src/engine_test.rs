#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

    use crate::conflict::ConflictEngine;
    use crate::engine::BookingEngine;
    use crate::error::{BookingError, StoreError, StoreResult};
    use crate::infrastructure::BookingStore;
    use crate::infrastructure_in_memory::InMemoryBookingStore;
    use crate::types::{Booking, BookingId, DeskId, NewBooking, Slot, UserId};

    // =========================================================================
    // Helpers
    // =========================================================================
    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2030, 1, 1).unwrap()
    }

    /// Day D of the scenarios, a week after "today".
    fn at(hour: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 1, 7, 0, 0, 0).unwrap() + Duration::hours(hour)
    }

    fn slot(start: i64, end: i64) -> Slot {
        Slot::new(at(start), at(end))
    }

    fn user(name: &str) -> UserId {
        UserId::from(name)
    }

    fn desk(name: &str) -> DeskId {
        DeskId::from(name)
    }

    fn engine(store: &InMemoryBookingStore) -> BookingEngine<'_, InMemoryBookingStore> {
        BookingEngine::at(store, today())
    }

    /// A store whose every call fails.
    struct BrokenStore;

    impl BrokenStore {
        fn fail<T>() -> StoreResult<T> {
            Err(StoreError::Backend {
                message: "connection refused".to_string(),
            })
        }
    }

    impl BookingStore for BrokenStore {
        fn bookings_for_desk(&self, _desk: &DeskId) -> StoreResult<Vec<Booking>> {
            Self::fail()
        }
        fn insert_booking(&self, _booking: NewBooking) -> StoreResult<Booking> {
            Self::fail()
        }
        fn bookings_for_date(&self, _date: NaiveDate) -> StoreResult<Vec<Booking>> {
            Self::fail()
        }
        fn future_bookings_for_user(&self, _user: &UserId, _since: NaiveDate) -> StoreResult<Vec<Booking>> {
            Self::fail()
        }
        fn delete_booking(&self, _id: BookingId) -> StoreResult<()> {
            Self::fail()
        }
    }

    /// Reads see nothing, as if another writer committed between our check
    /// and our insert; the insert then trips the durable constraint.
    struct RacingStore {
        violation: fn(&NewBooking) -> StoreError,
    }

    impl BookingStore for RacingStore {
        fn bookings_for_desk(&self, _desk: &DeskId) -> StoreResult<Vec<Booking>> {
            Ok(vec![])
        }
        fn insert_booking(&self, booking: NewBooking) -> StoreResult<Booking> {
            Err((self.violation)(&booking))
        }
        fn bookings_for_date(&self, _date: NaiveDate) -> StoreResult<Vec<Booking>> {
            Ok(vec![])
        }
        fn future_bookings_for_user(&self, _user: &UserId, _since: NaiveDate) -> StoreResult<Vec<Booking>> {
            Ok(vec![])
        }
        fn delete_booking(&self, _id: BookingId) -> StoreResult<()> {
            Ok(())
        }
    }

    // =========================================================================
    // Book
    // =========================================================================

    #[test]
    fn book_returns_booking_with_generated_id() {
        let store = InMemoryBookingStore::new();
        let booking = engine(&store).book(&user("alice"), &desk("desk1"), slot(0, 1)).unwrap();

        assert_eq!(booking.id, BookingId(1));
        assert_eq!(booking.user, user("alice"));
        assert_eq!(booking.desk, desk("desk1"));
        assert_eq!(booking.slot, slot(0, 1));
        assert_eq!(store.bookings_for_desk(&desk("desk1")).unwrap(), vec![booking]);
    }

    #[test]
    fn overlapping_slots_are_already_booked_in_every_shape() {
        let shapes = [
            ("exact match", slot(9, 11)),
            ("prefix overlap", slot(8, 10)),
            ("suffix overlap", slot(10, 12)),
            ("new contains existing", slot(8, 12)),
            ("existing contains new", slot(9, 10)),
        ];

        for (shape, requested) in shapes {
            let store = InMemoryBookingStore::new();
            let engine = engine(&store);
            engine.book(&user("alice"), &desk("desk1"), slot(9, 11)).unwrap();

            match engine.book(&user("bob"), &desk("desk1"), requested) {
                Err(BookingError::AlreadyBooked { desk: d, slot: s }) => {
                    assert_eq!(d, desk("desk1"), "{shape}");
                    assert_eq!(s, slot(9, 11), "{shape}: should carry the conflicting slot");
                }
                other => panic!("{shape}: expected AlreadyBooked, got {other:?}"),
            }
            assert_eq!(store.bookings_for_desk(&desk("desk1")).unwrap().len(), 1, "{shape}");
        }
    }

    #[test]
    fn adjacent_slots_can_both_be_booked() {
        let store = InMemoryBookingStore::new();
        let engine = engine(&store);
        engine.book(&user("alice"), &desk("desk1"), slot(9, 10)).unwrap();

        // existing end == new start
        engine.book(&user("bob"), &desk("desk1"), slot(10, 11)).unwrap();
        // new end == existing start
        engine.book(&user("carol"), &desk("desk1"), slot(8, 9)).unwrap();

        assert_eq!(store.bookings_for_desk(&desk("desk1")).unwrap().len(), 3);
    }

    #[test]
    fn same_slot_on_different_desks_is_fine_for_different_users() {
        let store = InMemoryBookingStore::new();
        let engine = engine(&store);
        engine.book(&user("alice"), &desk("desk1"), slot(9, 10)).unwrap();
        engine.book(&user("bob"), &desk("desk2"), slot(9, 10)).unwrap();
    }

    #[test]
    fn same_start_on_another_desk_is_duplicate_intent() {
        let store = InMemoryBookingStore::new();
        let engine = engine(&store);
        engine.book(&user("alice"), &desk("desk1"), slot(9, 10)).unwrap();

        let result = engine.book(&user("alice"), &desk("desk2"), slot(9, 12));
        assert!(matches!(
            result,
            Err(BookingError::DuplicateIntent { ref user, start }) if user.as_str() == "alice" && start == at(9)
        ));
        assert!(store.bookings_for_desk(&desk("desk2")).unwrap().is_empty());
    }

    #[test]
    fn invalid_slots_are_rejected() {
        let store = InMemoryBookingStore::new();
        let engine = engine(&store);

        assert!(matches!(
            engine.book(&user("alice"), &desk("desk1"), slot(9, 9)),
            Err(BookingError::InvalidSlot { .. })
        ));
        assert!(matches!(
            engine.book(&user("alice"), &desk("desk1"), slot(10, 9)),
            Err(BookingError::InvalidSlot { .. })
        ));
    }

    #[test]
    fn slots_may_not_run_past_midnight() {
        let store = InMemoryBookingStore::new();
        let engine = engine(&store);

        assert!(matches!(
            engine.book(&user("alice"), &desk("desk1"), slot(12, 36)),
            Err(BookingError::InvalidSlot { .. })
        ));
        assert!(store.bookings_for_desk(&desk("desk1")).unwrap().is_empty());

        // Ending exactly at midnight stays on the start day
        engine.book(&user("alice"), &desk("desk1"), slot(12, 24)).unwrap();
        let next_day = at(24).date_naive();
        assert_eq!(engine.available_desks(next_day, &[desk("desk1")]).unwrap(), vec![desk("desk1")]);
        engine.book(&user("bob"), &desk("desk1"), Slot::day(next_day)).unwrap();
    }

    #[test]
    fn slots_are_kept_to_the_millisecond() {
        let store = InMemoryBookingStore::new();
        let engine = engine(&store);

        let fine = Slot::new(at(9) + Duration::microseconds(250), at(10) + Duration::microseconds(999));
        let booking = engine.book(&user("alice"), &desk("desk1"), fine).unwrap();
        assert_eq!(booking.slot, slot(9, 10));

        let sub_milli = Slot::new(at(11) + Duration::microseconds(100), at(11) + Duration::microseconds(900));
        assert!(matches!(
            engine.book(&user("bob"), &desk("desk1"), sub_milli),
            Err(BookingError::InvalidSlot { .. })
        ));
    }

    #[test]
    fn empty_identifiers_are_rejected() {
        let store = InMemoryBookingStore::new();
        let engine = engine(&store);

        assert!(matches!(
            engine.book(&user(""), &desk("desk1"), slot(9, 10)),
            Err(BookingError::MissingIdentifier { field: "user" })
        ));
        assert!(matches!(
            engine.book(&user("alice"), &desk(""), slot(9, 10)),
            Err(BookingError::MissingIdentifier { field: "desk" })
        ));
    }

    #[test]
    fn storage_failures_are_wrapped_with_operation() {
        let engine = BookingEngine::at(&BrokenStore, today());

        match engine.book(&user("alice"), &desk("desk1"), slot(9, 10)) {
            Err(BookingError::Storage { operation, context, .. }) => {
                assert_eq!(operation, "get bookings for user");
                assert_eq!(context, "alice");
            }
            other => panic!("expected Storage, got {other:?}"),
        }
        assert!(matches!(engine.bookings(today()), Err(BookingError::Storage { .. })));
        assert!(matches!(engine.user_bookings(&user("alice")), Err(BookingError::Storage { .. })));
        assert!(matches!(
            engine.cancel_booking(BookingId(1), &user("alice")),
            Err(BookingError::Storage { .. })
        ));
    }

    #[test]
    fn lost_race_on_desk_is_already_booked() {
        let store = RacingStore {
            violation: |b| StoreError::DeskOverlap {
                desk: b.desk.clone(),
                slot: b.slot,
            },
        };
        let result = BookingEngine::at(&store, today()).book(&user("bob"), &desk("desk1"), slot(9, 10));
        assert!(matches!(result, Err(BookingError::AlreadyBooked { .. })));
    }

    #[test]
    fn lost_race_on_user_start_is_duplicate_intent() {
        let store = RacingStore {
            violation: |b| StoreError::DuplicateStart {
                user: b.user.clone(),
                start: b.slot.start,
            },
        };
        let result = BookingEngine::at(&store, today()).book(&user("bob"), &desk("desk1"), slot(9, 10));
        assert!(matches!(result, Err(BookingError::DuplicateIntent { .. })));
    }

    #[test]
    fn stored_bookings_never_overlap_per_desk() {
        let store = InMemoryBookingStore::new();
        let engine = engine(&store);
        let users = ["u0", "u1", "u2", "u3", "u4", "u5", "u6", "u7"];

        for (i, name) in users.iter().enumerate() {
            let start = (i as i64 * 5) % 7;
            for len in 1..4 {
                let _ = engine.book(&user(name), &desk("desk1"), slot(start, start + len));
            }
        }

        let bookings = store.bookings_for_desk(&desk("desk1")).unwrap();
        assert!(!bookings.is_empty());
        for a in &bookings {
            for b in &bookings {
                if a.id != b.id {
                    assert!(!ConflictEngine::overlaps(&a.slot, &b.slot), "{a:?} overlaps {b:?}");
                }
            }
        }
    }

    // =========================================================================
    // Cancel
    // =========================================================================

    #[test]
    fn cancel_by_other_user_is_not_found_and_keeps_booking() {
        let store = InMemoryBookingStore::new();
        let engine = engine(&store);
        let booking = engine.book(&user("alice"), &desk("desk1"), slot(0, 1)).unwrap();

        assert!(matches!(
            engine.cancel_booking(booking.id, &user("bob")),
            Err(BookingError::NotFound { booking: id, .. }) if id == booking.id
        ));
        assert_eq!(engine.user_bookings(&user("alice")).unwrap(), vec![booking]);
    }

    #[test]
    fn cancel_unknown_id_is_not_found() {
        let store = InMemoryBookingStore::new();
        let engine = engine(&store);
        engine.book(&user("alice"), &desk("desk1"), slot(0, 1)).unwrap();

        assert!(matches!(
            engine.cancel_booking(BookingId(42), &user("alice")),
            Err(BookingError::NotFound { .. })
        ));
    }

    #[test]
    fn cancel_past_booking_is_not_found() {
        let store = InMemoryBookingStore::new();
        let past = Slot::day(NaiveDate::from_ymd_opt(2029, 12, 31).unwrap());
        let booking = store
            .insert_booking(NewBooking::new(user("alice"), desk("desk1"), past))
            .unwrap();

        assert!(matches!(
            engine(&store).cancel_booking(booking.id, &user("alice")),
            Err(BookingError::NotFound { .. })
        ));
    }

    #[test]
    fn scenario_book_clash_cancel_rebook() {
        let store = InMemoryBookingStore::new();
        let engine = engine(&store);
        let (alice, bob, desk1) = (user("alice"), user("bob"), desk("desk1"));

        let booking = engine.book(&alice, &desk1, slot(0, 1)).unwrap();
        assert!(booking.id.0 > 0);

        assert!(matches!(
            engine.book(&bob, &desk1, slot(0, 1)),
            Err(BookingError::AlreadyBooked { desk: ref d, .. }) if d.as_str() == "desk1"
        ));
        assert!(matches!(
            engine.cancel_booking(booking.id, &bob),
            Err(BookingError::NotFound { .. })
        ));

        engine.cancel_booking(booking.id, &alice).unwrap();
        let rebooked = engine.book(&bob, &desk1, slot(0, 1)).unwrap();
        assert_eq!(rebooked.user, bob);
        assert_ne!(rebooked.id, booking.id);
    }

    // =========================================================================
    // Queries
    // =========================================================================

    #[test]
    fn bookings_for_date_only_returns_that_day() {
        let store = InMemoryBookingStore::new();
        let engine = engine(&store);
        engine.book(&user("alice"), &desk("desk1"), slot(9, 10)).unwrap();
        engine.book(&user("bob"), &desk("desk2"), slot(33, 34)).unwrap();

        let day = at(0).date_naive();
        let bookings = engine.bookings(day).unwrap();
        assert_eq!(bookings.len(), 1);
        assert_eq!(bookings[0].user, user("alice"));
        assert!(engine.bookings(today()).unwrap().is_empty());
    }

    #[test]
    fn user_bookings_skip_past_and_other_users() {
        let store = InMemoryBookingStore::new();
        let past = Slot::day(NaiveDate::from_ymd_opt(2029, 12, 31).unwrap());
        store
            .insert_booking(NewBooking::new(user("alice"), desk("desk1"), past))
            .unwrap();
        let today_slot = Slot::day(today());
        let engine = engine(&store);
        let kept = engine.book(&user("alice"), &desk("desk1"), today_slot).unwrap();
        engine.book(&user("bob"), &desk("desk2"), today_slot).unwrap();

        assert_eq!(engine.user_bookings(&user("alice")).unwrap(), vec![kept]);
    }

    #[test]
    fn available_desks_excludes_booked_and_keeps_order() {
        let store = InMemoryBookingStore::new();
        let engine = engine(&store);
        engine.book(&user("alice"), &desk("desk2"), slot(9, 10)).unwrap();

        let all = vec![desk("desk3"), desk("desk2"), desk("desk1")];
        let day = at(0).date_naive();
        assert_eq!(engine.available_desks(day, &all).unwrap(), vec![desk("desk3"), desk("desk1")]);
        assert_eq!(engine.available_desks(today(), &all).unwrap(), all);
    }
}
