/*!
 * End-to-End Booking Scenarios
 *
 * Exercises the Time Anchor, Slot Engine, and Booking Coordinator together
 * against a live database: a cross-midnight voice booking, a concurrent
 * double-booking race, a practice-closed rejection with emergency override,
 * a bare weekday name resolving to the next calendar occurrence (clipped to
 * practice hours), reschedule freeing the old slot, a past-instant voice
 * booking rejected unless `allow_past` is set, and the no-availability-data
 * case.
 */

mod test_utils;

use chrono::{Duration, NaiveTime, TimeZone, Utc};
use uuid::Uuid;

use test_utils::{insert_vet_availability, teardown_test_db, TestApp, TestPractice};
use vetsched_core::models::{AvailabilityType, SlotQueryReason, TimePreference};
use vetsched_core::services::{CreateAppointmentParams, ReschedulePatch, SlotQuery};
use vetsched_core::utils::AppError;

#[tokio::test]
#[ignore] // Requires database to be running
async fn scenario_a_pst_evening_across_utc_midnight() {
    let harness = TestApp::new().await;
    let practice = TestPractice::create(&harness.pool, "Bay Area Vet", "America/Los_Angeles").await;
    practice
        .set_daily_hours(
            &harness.pool,
            NaiveTime::from_hms_opt(0, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(23, 59, 0).unwrap(),
        )
        .await;

    let vet_id = Uuid::new_v4();
    insert_vet_availability(
        &harness.pool,
        practice.id,
        vet_id,
        Utc.with_ymd_and_hms(2025, 10, 4, 2, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2025, 10, 4, 7, 0, 0).unwrap(),
        AvailabilityType::Available,
    )
    .await;

    let owner_id = Uuid::new_v4();
    let confirmation = harness
        .gateway
        .book_voice(
            practice.id,
            practice.timezone,
            "book Oct 3 at 9 PM",
            30,
            Some(vet_id),
            vec![],
            owner_id,
            "voice booking".to_string(),
            owner_id,
            false,
            false,
            Utc.with_ymd_and_hms(2025, 10, 1, 0, 0, 0).unwrap(),
        )
        .await
        .expect("booking should succeed");

    assert_eq!(
        confirmation.confirmed_time_utc,
        Utc.with_ymd_and_hms(2025, 10, 4, 4, 0, 0).unwrap()
    );
    assert!(confirmation.confirmed_time_local.contains("9:00 PM"));
    assert!(confirmation.confirmed_time_local.contains("October 3"));

    teardown_test_db(&harness.pool).await;
}

#[tokio::test]
#[ignore] // Requires database to be running
async fn scenario_b_slot_conflict_under_concurrency() {
    let harness = TestApp::new().await;
    let practice = TestPractice::create(&harness.pool, "Conflict Clinic", "America/Chicago").await;
    practice
        .set_daily_hours(
            &harness.pool,
            NaiveTime::from_hms_opt(0, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(23, 59, 0).unwrap(),
        )
        .await;

    let vet_id = Uuid::new_v4();
    insert_vet_availability(
        &harness.pool,
        practice.id,
        vet_id,
        Utc.with_ymd_and_hms(2025, 10, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2025, 10, 2, 0, 0, 0).unwrap(),
        AvailabilityType::Available,
    )
    .await;

    let at = Utc.with_ymd_and_hms(2025, 10, 1, 16, 0, 0).unwrap();
    let owner_a = Uuid::new_v4();
    let owner_b = Uuid::new_v4();

    let params = |owner_id: Uuid| CreateAppointmentParams {
        practice_id: practice.id,
        vet_id: Some(vet_id),
        appointment_at_utc: at,
        duration_minutes: 30,
        pet_ids: vec![],
        owner_id,
        title: "checkup".to_string(),
        notes: None,
        created_by_user_id: owner_id,
        emergency_override: false,
    };

    let (first, second) = tokio::join!(
        harness.coordinator.create(params(owner_a)),
        harness.coordinator.create(params(owner_b)),
    );

    let successes = [&first, &second].iter().filter(|r| r.is_ok()).count();
    let conflicts = [&first, &second]
        .iter()
        .filter(|r| matches!(r, Err(AppError::SlotConflict(_))))
        .count();

    assert_eq!(successes, 1, "exactly one concurrent create should succeed");
    assert_eq!(conflicts, 1, "the other should fail with SLOT_CONFLICT");

    let non_terminal = harness
        .store
        .list_appointments(practice.id, Some(vet_id), (at, at + Duration::minutes(30)), &[])
        .await
        .expect("list_appointments should succeed");
    assert_eq!(non_terminal.len(), 1);

    teardown_test_db(&harness.pool).await;
}

#[tokio::test]
#[ignore] // Requires database to be running
async fn scenario_c_practice_closed_unless_emergency_override() {
    let harness = TestApp::new().await;
    let practice = TestPractice::create(&harness.pool, "Nine To Five Clinic", "America/Chicago").await;
    practice
        .set_daily_hours(
            &harness.pool,
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
        )
        .await;

    let vet_id = Uuid::new_v4();

    // Tuesday 2025-10-07 20:00 local (Chicago, CDT = UTC-5 in October).
    let after_hours = Utc.with_ymd_and_hms(2025, 10, 8, 1, 0, 0).unwrap();
    let owner_id = Uuid::new_v4();

    let rejected = harness
        .coordinator
        .create(CreateAppointmentParams {
            practice_id: practice.id,
            vet_id: Some(vet_id),
            appointment_at_utc: after_hours,
            duration_minutes: 30,
            pet_ids: vec![],
            owner_id,
            title: "after hours".to_string(),
            notes: None,
            created_by_user_id: owner_id,
            emergency_override: false,
        })
        .await;
    assert!(matches!(rejected, Err(AppError::PracticeClosed(_))));

    insert_vet_availability(
        &harness.pool,
        practice.id,
        vet_id,
        after_hours - Duration::hours(1),
        after_hours + Duration::hours(1),
        AvailabilityType::EmergencyOnly,
    )
    .await;

    let accepted = harness
        .coordinator
        .create(CreateAppointmentParams {
            practice_id: practice.id,
            vet_id: Some(vet_id),
            appointment_at_utc: after_hours,
            duration_minutes: 30,
            pet_ids: vec![],
            owner_id,
            title: "emergency".to_string(),
            notes: None,
            created_by_user_id: owner_id,
            emergency_override: true,
        })
        .await;
    assert!(accepted.is_ok());

    teardown_test_db(&harness.pool).await;
}

#[tokio::test]
#[ignore] // Requires database to be running
async fn scenario_e_reschedule_frees_old_slot() {
    let harness = TestApp::new().await;
    let practice = TestPractice::create(&harness.pool, "Reschedule Clinic", "America/Chicago").await;
    practice
        .set_daily_hours(
            &harness.pool,
            NaiveTime::from_hms_opt(0, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(23, 59, 0).unwrap(),
        )
        .await;

    let vet_id = Uuid::new_v4();
    insert_vet_availability(
        &harness.pool,
        practice.id,
        vet_id,
        Utc.with_ymd_and_hms(2025, 10, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2025, 10, 2, 0, 0, 0).unwrap(),
        AvailabilityType::Available,
    )
    .await;

    let t = Utc.with_ymd_and_hms(2025, 10, 1, 16, 0, 0).unwrap();
    let owner_id = Uuid::new_v4();

    let appointment = harness
        .coordinator
        .create(CreateAppointmentParams {
            practice_id: practice.id,
            vet_id: Some(vet_id),
            appointment_at_utc: t,
            duration_minutes: 30,
            pet_ids: vec![],
            owner_id,
            title: "first booking".to_string(),
            notes: None,
            created_by_user_id: owner_id,
            emergency_override: false,
        })
        .await
        .expect("initial booking should succeed");

    harness
        .coordinator
        .reschedule(
            appointment.id,
            ReschedulePatch {
                new_at_utc: Some(t + Duration::hours(1)),
                new_duration_minutes: None,
                new_vet_id: None,
                emergency_override: false,
            },
        )
        .await
        .expect("reschedule should succeed");

    let second = harness
        .coordinator
        .create(CreateAppointmentParams {
            practice_id: practice.id,
            vet_id: Some(vet_id),
            appointment_at_utc: t,
            duration_minutes: 30,
            pet_ids: vec![],
            owner_id,
            title: "second booking".to_string(),
            notes: None,
            created_by_user_id: owner_id,
            emergency_override: false,
        })
        .await;
    assert!(second.is_ok(), "the old slot should be free after reschedule");

    teardown_test_db(&harness.pool).await;
}

#[tokio::test]
#[ignore] // Requires database to be running
async fn scenario_d_bare_weekday_resolves_to_next_occurrence_window() {
    let harness = TestApp::new().await;
    let practice = TestPractice::create(&harness.pool, "Weekday Resolver Clinic", "America/Chicago").await;
    practice
        .set_daily_hours(
            &harness.pool,
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
        )
        .await;

    // 2025-10-01 is a Wednesday; "Friday" with no further qualifier should
    // resolve to the next calendar Friday, 2025-10-03, as a full local day.
    // Practice hours are 9:00-17:00 America/Chicago (CDT, UTC-5 in October),
    // so bookable slots must clip to [14:00Z, 22:00Z) even though the vet's
    // own availability and the query window span the entire local day.
    let now_utc = Utc.with_ymd_and_hms(2025, 10, 1, 17, 0, 0).unwrap();
    let window_start = Utc.with_ymd_and_hms(2025, 10, 3, 5, 0, 0).unwrap();
    let window_end = Utc.with_ymd_and_hms(2025, 10, 4, 5, 0, 0).unwrap();
    let open_utc = Utc.with_ymd_and_hms(2025, 10, 3, 14, 0, 0).unwrap();
    let close_utc = Utc.with_ymd_and_hms(2025, 10, 3, 22, 0, 0).unwrap();

    let vet_id = Uuid::new_v4();
    insert_vet_availability(
        &harness.pool,
        practice.id,
        vet_id,
        window_start,
        window_end,
        AvailabilityType::Available,
    )
    .await;

    let result = harness
        .gateway
        .find_slots_voice(practice.id, practice.timezone, "Friday", 30, None, None, now_utc)
        .await
        .expect("slot lookup should not error");

    assert_eq!(result.message, "here are the available times");
    assert!(!result.slots.is_empty());
    assert!(result
        .slots
        .iter()
        .all(|s| s.slot.start_at_utc >= open_utc && s.slot.end_at_utc <= close_utc));

    let first = &result.slots[0];
    assert_eq!(first.slot.start_at_utc, open_utc);
    let last = result.slots.last().unwrap();
    assert_eq!(last.slot.end_at_utc, close_utc);
    assert!(first.local_time.contains("Friday"));
    assert!(first.local_time.contains("October 3"));

    teardown_test_db(&harness.pool).await;
}

#[tokio::test]
#[ignore] // Requires database to be running
async fn scenario_g_past_instant_rejected_unless_allow_past() {
    let harness = TestApp::new().await;
    let practice = TestPractice::create(&harness.pool, "Backfill Clinic", "America/Chicago").await;
    practice
        .set_daily_hours(
            &harness.pool,
            NaiveTime::from_hms_opt(0, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(23, 59, 0).unwrap(),
        )
        .await;

    let vet_id = Uuid::new_v4();
    insert_vet_availability(
        &harness.pool,
        practice.id,
        vet_id,
        Utc.with_ymd_and_hms(2025, 10, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2025, 10, 2, 0, 0, 0).unwrap(),
        AvailabilityType::Available,
    )
    .await;

    let now_utc = Utc.with_ymd_and_hms(2025, 10, 1, 20, 0, 0).unwrap();
    let owner_id = Uuid::new_v4();

    let rejected = harness
        .gateway
        .book_voice(
            practice.id,
            practice.timezone,
            "2025-10-01 10:00",
            30,
            Some(vet_id),
            vec![],
            owner_id,
            "backdated".to_string(),
            owner_id,
            false,
            false,
            now_utc,
        )
        .await;
    assert!(matches!(rejected, Err(AppError::PastInstant(_))));

    let accepted = harness
        .gateway
        .book_voice(
            practice.id,
            practice.timezone,
            "2025-10-01 10:00",
            30,
            Some(vet_id),
            vec![],
            owner_id,
            "backfilled".to_string(),
            owner_id,
            false,
            true,
            now_utc,
        )
        .await;
    assert!(accepted.is_ok(), "allow_past should permit a past instant");

    teardown_test_db(&harness.pool).await;
}

#[tokio::test]
#[ignore] // Requires database to be running
async fn scenario_f_no_vet_availability_data() {
    let harness = TestApp::new().await;
    let practice = TestPractice::create(&harness.pool, "Understaffed Clinic", "America/Chicago").await;
    practice
        .set_daily_hours(
            &harness.pool,
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
        )
        .await;

    let window_start = Utc.with_ymd_and_hms(2025, 10, 6, 0, 0, 0).unwrap();
    let window_end = Utc.with_ymd_and_hms(2025, 10, 7, 0, 0, 0).unwrap();

    let result = harness
        .slot_engine
        .generate(&SlotQuery {
            practice_id: practice.id,
            vet_user_id: None,
            window_start_utc: window_start,
            window_end_utc: window_end,
            slot_minutes: SlotQuery::default_slot_minutes(),
            time_preference: None::<TimePreference>,
            practice_tz: practice.timezone,
        })
        .await
        .expect("slot generation should not error");

    assert!(result.slots.is_empty());
    assert_eq!(result.empty_reason, Some(SlotQueryReason::NoVetAvailability));

    teardown_test_db(&harness.pool).await;
}
