use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use mentorhub::{
    access::{self, Capability, Decision},
    error::AppError,
    models::{auth_session::Identity, session::SessionStatus, user::Role},
    repositories::memory::MemoryStore,
    scheduling::calendar::{DayOfWeek, FixedClock},
    services::booking::BookingService,
};
use uuid::Uuid;

fn at(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
}

fn booking_at(now: &str) -> BookingService {
    let store = MemoryStore::new();
    BookingService::new(
        Arc::new(store.clone()),
        Arc::new(store),
        Arc::new(FixedClock(at(now))),
    )
}

#[tokio::test]
async fn mentor_publishes_and_mentee_books_the_next_tuesday() {
    // Monday 2025-08-11.
    let booking = booking_at("2025-08-11 10:00");
    let mentor = Identity::new(Uuid::new_v4(), Role::Mentor);
    let mentee = Identity::new(Uuid::new_v4(), Role::Mentee);
    let other_mentee = Identity::new(Uuid::new_v4(), Role::Mentee);

    access::authorize(&mentor, Capability::ManageAvailability).unwrap();
    let block = booking
        .add_availability_block(
            mentor.user_id,
            DayOfWeek::Tuesday,
            "14:00".parse().unwrap(),
            "15:00".parse().unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        access::decide(&mentee, Capability::ViewAvailability { mentor_id: mentor.user_id }),
        Decision::AllowIfAccepted { mentor_id: mentor.user_id }
    );
    let visible = booking.list_availability(mentor.user_id, true).await.unwrap();
    assert_eq!(visible, vec![block.clone()]);
    assert_eq!(
        booking.resolve_date(block.day_of_week),
        NaiveDate::from_ymd_opt(2025, 8, 12).unwrap()
    );

    access::authorize(&mentee, Capability::BookSession).unwrap();
    let session = booking
        .book_session(
            mentor.user_id,
            mentee.user_id,
            block.day_of_week,
            block.start_time,
            block.end_time,
        )
        .await
        .unwrap();
    assert_eq!(session.date, NaiveDate::from_ymd_opt(2025, 8, 12).unwrap());
    assert_eq!(session.status, SessionStatus::Upcoming);

    let err = booking
        .book_session(
            mentor.user_id,
            other_mentee.user_id,
            block.day_of_week,
            block.start_time,
            block.end_time,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Collision));

    assert_eq!(booking.list_sessions(mentor.user_id).await.unwrap(), vec![session.clone()]);
    assert_eq!(booking.list_sessions(mentee.user_id).await.unwrap(), vec![session.clone()]);
    assert!(booking.list_sessions(other_mentee.user_id).await.unwrap().is_empty());
    assert_eq!(booking.count_sessions().await.unwrap(), 1);
}

#[tokio::test]
async fn deleting_a_block_keeps_booked_sessions() {
    let booking = booking_at("2025-08-13 09:00");
    let mentor = Uuid::new_v4();
    let mentee = Uuid::new_v4();

    let block = booking
        .add_availability_block(
            mentor,
            DayOfWeek::Monday,
            "09:00".parse().unwrap(),
            "10:00".parse().unwrap(),
        )
        .await
        .unwrap();
    let session = booking
        .book_session(mentor, mentee, DayOfWeek::Monday, block.start_time, block.end_time)
        .await
        .unwrap();
    assert_eq!(session.date, NaiveDate::from_ymd_opt(2025, 8, 18).unwrap());

    booking.delete_availability_block(mentor, block.id).await.unwrap();
    assert!(booking.list_availability(mentor, false).await.unwrap().is_empty());
    assert_eq!(booking.list_sessions(mentee).await.unwrap(), vec![session]);

    let err = booking
        .book_session(mentor, Uuid::new_v4(), DayOfWeek::Monday, block.start_time, block.end_time)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn a_replaced_block_accepts_the_freed_range() {
    let booking = booking_at("2025-08-11 08:00");
    let mentor = Uuid::new_v4();

    let wide = booking
        .add_availability_block(
            mentor,
            DayOfWeek::Thursday,
            "09:00".parse().unwrap(),
            "12:00".parse().unwrap(),
        )
        .await
        .unwrap();

    let err = booking
        .add_availability_block(
            mentor,
            DayOfWeek::Thursday,
            "11:00".parse().unwrap(),
            "13:00".parse().unwrap(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Overlap(ref b) if b.id == wide.id));

    booking.delete_availability_block(mentor, wide.id).await.unwrap();
    booking
        .add_availability_block(
            mentor,
            DayOfWeek::Thursday,
            "11:00".parse().unwrap(),
            "13:00".parse().unwrap(),
        )
        .await
        .unwrap();
}
