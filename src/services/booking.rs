use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::{
        auth_session::Identity,
        availability::AvailabilityBlock,
        session::{Session, SessionStatus},
        user::Role,
    },
    repositories::store::{AvailabilityStore, SessionStore},
    scheduling::{
        calendar::{Clock, DayOfWeek, TimeOfDay},
        resolver,
    },
};

/// Turns availability into sessions.
///
/// Every check runs before the single write of an operation, so a failed call
/// leaves the stores untouched.
#[derive(Clone)]
pub struct BookingService {
    availability: Arc<dyn AvailabilityStore>,
    sessions: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
}

fn ensure_ordered(start: TimeOfDay, end: TimeOfDay) -> Result<()> {
    if start >= end {
        return Err(AppError::Validation(format!(
            "Start time {} must be before end time {}",
            start, end
        )));
    }
    Ok(())
}

impl BookingService {
    pub fn new(
        availability: Arc<dyn AvailabilityStore>,
        sessions: Arc<dyn SessionStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            availability,
            sessions,
            clock,
        }
    }

    /// The date a booking for `day` made right now would land on.
    pub fn resolve_date(&self, day: DayOfWeek) -> NaiveDate {
        resolver::next_calendar_date(day, self.clock.now())
    }

    /// Adds a weekly block for `mentor_id`, refusing any same-day overlap.
    pub async fn add_availability_block(
        &self,
        mentor_id: Uuid,
        day_of_week: DayOfWeek,
        start_time: TimeOfDay,
        end_time: TimeOfDay,
    ) -> Result<AvailabilityBlock> {
        ensure_ordered(start_time, end_time)?;

        let existing = self
            .availability
            .list_for_mentor_day(mentor_id, day_of_week)
            .await?;

        if let Some(conflict) =
            resolver::find_overlapping(day_of_week, start_time, end_time, &existing)
        {
            tracing::debug!(
                "⛔ Block {} {}-{} overlaps {} for mentor {}",
                day_of_week,
                start_time,
                end_time,
                conflict.id,
                mentor_id
            );
            return Err(AppError::Overlap(Box::new(conflict.clone())));
        }

        let block = AvailabilityBlock {
            id: Uuid::new_v4(),
            mentor_id,
            day_of_week,
            start_time,
            end_time,
            created_at: Utc::now(),
        };
        self.availability.insert(&block).await?;

        tracing::info!(
            "✅ Availability {} added for mentor {}: {} {}-{}",
            block.id,
            mentor_id,
            day_of_week,
            start_time,
            end_time
        );
        Ok(block)
    }

    /// Deletes one of the mentor's own blocks.
    ///
    /// A block owned by someone else is reported exactly like a missing one.
    pub async fn delete_availability_block(&self, mentor_id: Uuid, block_id: Uuid) -> Result<()> {
        match self.availability.find(block_id).await? {
            Some(block) if block.mentor_id == mentor_id => {}
            Some(block) => {
                tracing::warn!(
                    "⛔ Mentor {} tried to delete block {} owned by {}",
                    mentor_id,
                    block_id,
                    block.mentor_id
                );
                return Err(AppError::not_found("Availability block"));
            }
            None => return Err(AppError::not_found("Availability block")),
        }

        // Ownership is re-checked by the delete itself.
        if !self.availability.delete_owned(mentor_id, block_id).await? {
            return Err(AppError::not_found("Availability block"));
        }
        tracing::info!("🗑️ Availability {} deleted by mentor {}", block_id, mentor_id);
        Ok(())
    }

    /// The mentor's blocks, Monday first. With `hide_expired`, blocks whose
    /// occurrence today has already ended are left out.
    pub async fn list_availability(
        &self,
        mentor_id: Uuid,
        hide_expired: bool,
    ) -> Result<Vec<AvailabilityBlock>> {
        let mut blocks = self.availability.list_for_mentor(mentor_id).await?;
        if hide_expired {
            let now = self.clock.now();
            blocks.retain(|block| !resolver::is_expired(block, now));
        }
        Ok(blocks)
    }

    /// Books the next occurrence of one of the mentor's blocks. The requested
    /// range must be the whole block, and it may not overlap another session
    /// of the mentor on the resolved date.
    pub async fn book_session(
        &self,
        mentor_id: Uuid,
        mentee_id: Uuid,
        day_of_week: DayOfWeek,
        start_time: TimeOfDay,
        end_time: TimeOfDay,
    ) -> Result<Session> {
        ensure_ordered(start_time, end_time)?;
        if mentor_id == mentee_id {
            return Err(AppError::Validation(
                "A session needs two different participants".to_string(),
            ));
        }

        let blocks = self
            .availability
            .list_for_mentor_day(mentor_id, day_of_week)
            .await?;
        if resolver::matching_block(day_of_week, start_time, end_time, &blocks).is_none() {
            return Err(AppError::not_found("Availability slot"));
        }

        let date = self.resolve_date(day_of_week);

        if let Some(existing) = self
            .sessions
            .find_overlapping(mentor_id, date, start_time, end_time)
            .await?
        {
            tracing::warn!(
                "⛔ {} {}-{} for mentor {} clashes with session {}",
                date,
                start_time,
                end_time,
                mentor_id,
                existing.id
            );
            return Err(AppError::Collision);
        }

        let session = Session {
            id: Uuid::new_v4(),
            mentor_id,
            mentee_id,
            date,
            start_time,
            end_time,
            status: SessionStatus::Upcoming,
            created_at: Utc::now(),
        };

        // The store re-checks the range atomically; a racing booking lands here.
        if let Err(e) = self.sessions.insert(&session).await {
            if matches!(e, AppError::Collision) {
                tracing::warn!(
                    "⛔ Lost booking race for mentor {} on {} {}",
                    mentor_id,
                    date,
                    start_time
                );
            }
            return Err(e);
        }

        tracing::info!(
            "📅 Session {} booked: mentor {} mentee {} on {} {}-{}",
            session.id,
            mentor_id,
            mentee_id,
            date,
            start_time,
            end_time
        );
        Ok(session)
    }

    /// Sessions the user takes part in, by date.
    pub async fn list_sessions(&self, user_id: Uuid) -> Result<Vec<Session>> {
        self.sessions.list_for_user(user_id).await
    }

    /// One session, visible to its two participants and to admins.
    pub async fn get_session(&self, identity: &Identity, session_id: Uuid) -> Result<Session> {
        let session = self
            .sessions
            .find(session_id)
            .await?
            .ok_or_else(|| AppError::not_found("Session"))?;

        if identity.role != Role::Admin && !session.involves(identity.user_id) {
            return Err(AppError::not_found("Session"));
        }
        Ok(session)
    }

    pub async fn count_sessions(&self) -> Result<u64> {
        self.sessions.count().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::memory::MemoryStore;
    use crate::scheduling::calendar::FixedClock;
    use chrono::NaiveDateTime;

    fn t(s: &str) -> TimeOfDay {
        s.parse().unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn service_at(now: &str) -> (BookingService, MemoryStore) {
        let store = MemoryStore::new();
        let service = BookingService::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(FixedClock(at(now))),
        );
        (service, store)
    }

    #[tokio::test]
    async fn overlapping_block_is_rejected_and_back_to_back_accepted() {
        let (service, _) = service_at("2025-08-11 08:00");
        let mentor = Uuid::new_v4();

        let first = service
            .add_availability_block(mentor, DayOfWeek::Monday, t("09:00"), t("10:00"))
            .await
            .unwrap();

        let err = service
            .add_availability_block(mentor, DayOfWeek::Monday, t("09:30"), t("10:30"))
            .await
            .unwrap_err();
        match err {
            AppError::Overlap(conflict) => assert_eq!(conflict.id, first.id),
            other => panic!("expected overlap, got {other:?}"),
        }

        service
            .add_availability_block(mentor, DayOfWeek::Monday, t("10:00"), t("11:00"))
            .await
            .unwrap();

        let blocks = service.list_availability(mentor, false).await.unwrap();
        assert_eq!(blocks.len(), 2);
        for (i, a) in blocks.iter().enumerate() {
            for b in &blocks[i + 1..] {
                if a.day_of_week == b.day_of_week {
                    assert!(!resolver::ranges_overlap(
                        a.start_time,
                        a.end_time,
                        b.start_time,
                        b.end_time
                    ));
                }
            }
        }
    }

    #[tokio::test]
    async fn same_range_on_another_day_or_mentor_is_fine() {
        let (service, _) = service_at("2025-08-11 08:00");
        let mentor = Uuid::new_v4();
        service
            .add_availability_block(mentor, DayOfWeek::Monday, t("09:00"), t("10:00"))
            .await
            .unwrap();
        service
            .add_availability_block(mentor, DayOfWeek::Tuesday, t("09:00"), t("10:00"))
            .await
            .unwrap();
        service
            .add_availability_block(Uuid::new_v4(), DayOfWeek::Monday, t("09:00"), t("10:00"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn inverted_or_empty_range_is_a_validation_error() {
        let (service, _) = service_at("2025-08-11 08:00");
        let mentor = Uuid::new_v4();
        for (start, end) in [("10:00", "09:00"), ("10:00", "10:00")] {
            let err = service
                .add_availability_block(mentor, DayOfWeek::Friday, t(start), t(end))
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
        assert!(service.list_availability(mentor, false).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn listed_blocks_round_trip_in_day_order() {
        let (service, _) = service_at("2025-08-11 08:00");
        let mentor = Uuid::new_v4();
        service
            .add_availability_block(mentor, DayOfWeek::Friday, t("13:00"), t("14:00"))
            .await
            .unwrap();
        service
            .add_availability_block(mentor, DayOfWeek::Monday, t("15:00"), t("16:30"))
            .await
            .unwrap();
        service
            .add_availability_block(mentor, DayOfWeek::Monday, t("08:15"), t("09:00"))
            .await
            .unwrap();

        let listed: Vec<_> = service
            .list_availability(mentor, false)
            .await
            .unwrap()
            .into_iter()
            .map(|b| (b.day_of_week, b.start_time.to_string(), b.end_time.to_string()))
            .collect();
        assert_eq!(
            listed,
            vec![
                (DayOfWeek::Monday, "08:15".to_string(), "09:00".to_string()),
                (DayOfWeek::Monday, "15:00".to_string(), "16:30".to_string()),
                (DayOfWeek::Friday, "13:00".to_string(), "14:00".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn expired_blocks_are_hidden_only_on_request() {
        let (service, _) = service_at("2025-08-11 12:00");
        let mentor = Uuid::new_v4();
        service
            .add_availability_block(mentor, DayOfWeek::Monday, t("09:00"), t("10:00"))
            .await
            .unwrap();
        service
            .add_availability_block(mentor, DayOfWeek::Monday, t("13:00"), t("14:00"))
            .await
            .unwrap();

        assert_eq!(service.list_availability(mentor, false).await.unwrap().len(), 2);
        let upcoming = service.list_availability(mentor, true).await.unwrap();
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].start_time, t("13:00"));
    }

    #[tokio::test]
    async fn delete_requires_ownership() {
        let (service, _) = service_at("2025-08-11 08:00");
        let owner = Uuid::new_v4();
        let intruder = Uuid::new_v4();
        let block = service
            .add_availability_block(owner, DayOfWeek::Wednesday, t("09:00"), t("10:00"))
            .await
            .unwrap();

        let err = service
            .delete_availability_block(intruder, block.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(service.list_availability(owner, false).await.unwrap().len(), 1);

        service.delete_availability_block(owner, block.id).await.unwrap();
        assert!(service.list_availability(owner, false).await.unwrap().is_empty());

        let err = service.delete_availability_block(owner, block.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn tuesday_block_booked_on_monday_lands_next_day() {
        // Monday 2025-08-11.
        let (service, _) = service_at("2025-08-11 09:00");
        let mentor = Uuid::new_v4();
        let first_mentee = Uuid::new_v4();
        let second_mentee = Uuid::new_v4();

        service
            .add_availability_block(mentor, DayOfWeek::Tuesday, t("14:00"), t("15:00"))
            .await
            .unwrap();

        let session = service
            .book_session(mentor, first_mentee, DayOfWeek::Tuesday, t("14:00"), t("15:00"))
            .await
            .unwrap();
        assert_eq!(session.date, date("2025-08-12"));
        assert_eq!(session.start_time.to_string(), "14:00");
        assert_eq!(session.end_time.to_string(), "15:00");
        assert_eq!(session.status, SessionStatus::Upcoming);

        let err = service
            .book_session(mentor, second_mentee, DayOfWeek::Tuesday, t("14:00"), t("15:00"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Collision));
        assert!(service.list_sessions(second_mentee).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn double_booking_fails_but_next_block_succeeds() {
        // Thursday, so Friday resolves to 2025-08-15.
        let (service, store) = service_at("2025-08-14 18:00");
        let mentor = Uuid::new_v4();
        for (start, end) in [("10:00", "11:00"), ("11:00", "12:00")] {
            service
                .add_availability_block(mentor, DayOfWeek::Friday, t(start), t(end))
                .await
                .unwrap();
        }

        let first = service
            .book_session(mentor, Uuid::new_v4(), DayOfWeek::Friday, t("10:00"), t("11:00"))
            .await
            .unwrap();
        assert_eq!(first.date, date("2025-08-15"));

        let err = service
            .book_session(mentor, Uuid::new_v4(), DayOfWeek::Friday, t("10:00"), t("11:00"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Collision));
        assert_eq!(store.count().await.unwrap(), 1);

        let second = service
            .book_session(mentor, Uuid::new_v4(), DayOfWeek::Friday, t("11:00"), t("12:00"))
            .await
            .unwrap();
        assert_eq!(second.date, date("2025-08-15"));
        assert_eq!(service.count_sessions().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn partial_ranges_inside_a_block_cannot_be_booked() {
        let (service, store) = service_at("2025-08-14 18:00");
        let mentor = Uuid::new_v4();
        service
            .add_availability_block(mentor, DayOfWeek::Friday, t("10:00"), t("12:00"))
            .await
            .unwrap();

        for (start, end) in [("10:00", "11:00"), ("10:30", "11:30"), ("10:01", "10:02")] {
            let err = service
                .book_session(mentor, Uuid::new_v4(), DayOfWeek::Friday, t(start), t(end))
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::NotFound(_)), "{start}-{end} was booked");
        }
        assert_eq!(store.count().await.unwrap(), 0);

        service
            .book_session(mentor, Uuid::new_v4(), DayOfWeek::Friday, t("10:00"), t("12:00"))
            .await
            .unwrap();
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn replaced_block_cannot_overlap_a_booked_session() {
        let (service, store) = service_at("2025-08-14 18:00");
        let mentor = Uuid::new_v4();
        let wide = service
            .add_availability_block(mentor, DayOfWeek::Friday, t("09:00"), t("12:00"))
            .await
            .unwrap();
        service
            .book_session(mentor, Uuid::new_v4(), DayOfWeek::Friday, t("09:00"), t("12:00"))
            .await
            .unwrap();

        service.delete_availability_block(mentor, wide.id).await.unwrap();
        service
            .add_availability_block(mentor, DayOfWeek::Friday, t("11:00"), t("13:00"))
            .await
            .unwrap();

        let err = service
            .book_session(mentor, Uuid::new_v4(), DayOfWeek::Friday, t("11:00"), t("13:00"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Collision));
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn booking_outside_availability_is_not_found() {
        let (service, store) = service_at("2025-08-11 09:00");
        let mentor = Uuid::new_v4();
        service
            .add_availability_block(mentor, DayOfWeek::Tuesday, t("14:00"), t("15:00"))
            .await
            .unwrap();

        for (day, start, end) in [
            (DayOfWeek::Wednesday, "14:00", "15:00"),
            (DayOfWeek::Tuesday, "14:30", "15:30"),
        ] {
            let err = service
                .book_session(mentor, Uuid::new_v4(), day, t(start), t(end))
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::NotFound(_)));
        }
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn booking_rejects_bad_input_before_touching_stores() {
        let (service, store) = service_at("2025-08-11 09:00");
        let mentor = Uuid::new_v4();
        service
            .add_availability_block(mentor, DayOfWeek::Tuesday, t("14:00"), t("15:00"))
            .await
            .unwrap();

        let err = service
            .book_session(mentor, Uuid::new_v4(), DayOfWeek::Tuesday, t("15:00"), t("14:00"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = service
            .book_session(mentor, mentor, DayOfWeek::Tuesday, t("14:00"), t("15:00"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_bookings_for_one_slot_have_one_winner() {
        let (service, store) = service_at("2025-08-11 09:00");
        let mentor = Uuid::new_v4();
        service
            .add_availability_block(mentor, DayOfWeek::Tuesday, t("14:00"), t("15:00"))
            .await
            .unwrap();

        let attempts: Vec<_> = (0..16)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move {
                    service
                        .book_session(mentor, Uuid::new_v4(), DayOfWeek::Tuesday, t("14:00"), t("15:00"))
                        .await
                })
            })
            .collect();

        let mut booked = 0;
        let mut collided = 0;
        for attempt in attempts {
            match attempt.await.unwrap() {
                Ok(_) => booked += 1,
                Err(AppError::Collision) => collided += 1,
                Err(other) => panic!("unexpected error {other:?}"),
            }
        }
        assert_eq!(booked, 1);
        assert_eq!(collided, 15);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn sessions_are_listed_for_both_participants_by_date() {
        let (service, _) = service_at("2025-08-11 09:00");
        let mentor = Uuid::new_v4();
        let mentee = Uuid::new_v4();
        service
            .add_availability_block(mentor, DayOfWeek::Friday, t("10:00"), t("11:00"))
            .await
            .unwrap();
        service
            .add_availability_block(mentor, DayOfWeek::Tuesday, t("10:00"), t("11:00"))
            .await
            .unwrap();

        let friday = service
            .book_session(mentor, mentee, DayOfWeek::Friday, t("10:00"), t("11:00"))
            .await
            .unwrap();
        let tuesday = service
            .book_session(mentor, mentee, DayOfWeek::Tuesday, t("10:00"), t("11:00"))
            .await
            .unwrap();

        for who in [mentor, mentee] {
            let listed = service.list_sessions(who).await.unwrap();
            assert_eq!(listed, vec![tuesday.clone(), friday.clone()]);
        }
        assert!(service.list_sessions(Uuid::new_v4()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn session_detail_is_private_to_participants() {
        let (service, _) = service_at("2025-08-11 09:00");
        let mentor = Uuid::new_v4();
        let mentee = Uuid::new_v4();
        service
            .add_availability_block(mentor, DayOfWeek::Tuesday, t("14:00"), t("15:00"))
            .await
            .unwrap();
        let session = service
            .book_session(mentor, mentee, DayOfWeek::Tuesday, t("14:00"), t("15:00"))
            .await
            .unwrap();

        let as_mentee = Identity::new(mentee, Role::Mentee);
        let as_mentor = Identity::new(mentor, Role::Mentor);
        let as_admin = Identity::new(Uuid::new_v4(), Role::Admin);
        let as_stranger = Identity::new(Uuid::new_v4(), Role::Mentee);

        for who in [as_mentee, as_mentor, as_admin] {
            assert_eq!(service.get_session(&who, session.id).await.unwrap(), session);
        }
        let err = service.get_session(&as_stranger, session.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
