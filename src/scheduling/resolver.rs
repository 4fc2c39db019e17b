//! Date and time arithmetic that turns recurring weekly availability into
//! concrete dates. Everything here is pure: no clock reads, no storage.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use uuid::Uuid;

use crate::models::{availability::AvailabilityBlock, session::Session};
use crate::scheduling::calendar::{DayOfWeek, TimeOfDay};

/// Days from `from` forward to the next `day`, in `0..=6`.
fn days_until(from: NaiveDate, day: DayOfWeek) -> i64 {
    let current = i64::from(from.weekday().num_days_from_monday());
    (i64::from(day.index()) - current).rem_euclid(7)
}

/// Returns the next date falling on `day`, strictly after the reference date.
///
/// When the reference is already on `day` the result is one week out, so a
/// slot that may have started today is never handed out. Only the date part of
/// `reference` matters.
pub fn next_calendar_date(day: DayOfWeek, reference: NaiveDateTime) -> NaiveDate {
    let today = reference.date();
    let ahead = match days_until(today, day) {
        0 => 7,
        n => n,
    };
    today + Duration::days(ahead)
}

/// Like [`next_calendar_date`] but today counts as an occurrence.
pub fn upcoming_date(day: DayOfWeek, from: NaiveDate) -> NaiveDate {
    from + Duration::days(days_until(from, day))
}

/// Half-open overlap test: `[a_start, a_end)` against `[b_start, b_end)`.
///
/// Back-to-back ranges (one ends exactly when the other starts) do not overlap.
pub fn ranges_overlap(
    a_start: TimeOfDay,
    a_end: TimeOfDay,
    b_start: TimeOfDay,
    b_end: TimeOfDay,
) -> bool {
    !(a_end <= b_start || a_start >= b_end)
}

/// Whether the block's nearest occurrence (today included) has already ended.
pub fn is_expired(block: &AvailabilityBlock, now: NaiveDateTime) -> bool {
    let occurrence = upcoming_date(block.day_of_week, now.date());
    occurrence.and_time(block.end_time.to_naive_time()) <= now
}

/// First block in `existing` on the same day whose range overlaps `[start, end)`.
pub fn find_overlapping<'a>(
    day: DayOfWeek,
    start: TimeOfDay,
    end: TimeOfDay,
    existing: &'a [AvailabilityBlock],
) -> Option<&'a AvailabilityBlock> {
    existing.iter().find(|block| {
        block.day_of_week == day && ranges_overlap(start, end, block.start_time, block.end_time)
    })
}

/// The block on `day` whose range is exactly `[start, end)`. Sessions take
/// their times from a whole block.
pub fn matching_block<'a>(
    day: DayOfWeek,
    start: TimeOfDay,
    end: TimeOfDay,
    blocks: &'a [AvailabilityBlock],
) -> Option<&'a AvailabilityBlock> {
    blocks
        .iter()
        .find(|block| block.day_of_week == day && block.start_time == start && block.end_time == end)
}

/// First session of `mentor_id` on `date` whose range overlaps `[start, end)`.
pub fn clashing_session<'a>(
    mentor_id: Uuid,
    date: NaiveDate,
    start: TimeOfDay,
    end: TimeOfDay,
    existing: impl IntoIterator<Item = &'a Session>,
) -> Option<&'a Session> {
    existing.into_iter().find(|session| {
        session.mentor_id == mentor_id
            && session.date == date
            && ranges_overlap(start, end, session.start_time, session.end_time)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::session::SessionStatus;
    use chrono::{NaiveTime, Utc};

    fn t(s: &str) -> TimeOfDay {
        s.parse().unwrap()
    }

    fn at(date: &str, time: &str) -> NaiveDateTime {
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .unwrap()
            .and_time(NaiveTime::parse_from_str(time, "%H:%M").unwrap())
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn block(day: DayOfWeek, start: &str, end: &str) -> AvailabilityBlock {
        AvailabilityBlock {
            id: Uuid::new_v4(),
            mentor_id: Uuid::nil(),
            day_of_week: day,
            start_time: t(start),
            end_time: t(end),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn back_to_back_ranges_do_not_overlap() {
        assert!(!ranges_overlap(t("10:00"), t("11:00"), t("11:00"), t("12:00")));
        assert!(!ranges_overlap(t("11:00"), t("12:00"), t("10:00"), t("11:00")));
    }

    #[test]
    fn partial_and_nested_ranges_overlap() {
        assert!(ranges_overlap(t("10:00"), t("11:00"), t("10:30"), t("11:30")));
        assert!(ranges_overlap(t("10:30"), t("11:30"), t("10:00"), t("11:00")));
        assert!(ranges_overlap(t("09:00"), t("12:00"), t("10:00"), t("11:00")));
        assert!(ranges_overlap(t("10:00"), t("11:00"), t("10:00"), t("11:00")));
    }

    #[test]
    fn next_monday_from_a_wednesday() {
        // 2025-08-13 is a Wednesday.
        let reference = at("2025-08-13", "16:45");
        let first = next_calendar_date(DayOfWeek::Monday, reference);
        let second = next_calendar_date(DayOfWeek::Monday, reference);
        assert_eq!(first, date("2025-08-18"));
        assert_eq!(first, second);
    }

    #[test]
    fn same_weekday_is_pushed_a_full_week() {
        // Monday morning, before any slot could have started.
        let reference = at("2025-08-11", "00:00");
        assert_eq!(next_calendar_date(DayOfWeek::Monday, reference), date("2025-08-18"));
    }

    #[test]
    fn tomorrow_resolves_to_tomorrow() {
        let reference = at("2025-08-11", "23:59");
        assert_eq!(next_calendar_date(DayOfWeek::Tuesday, reference), date("2025-08-12"));
    }

    #[test]
    fn sunday_wraps_to_following_week() {
        // 2025-08-17 is a Sunday.
        let reference = at("2025-08-17", "09:00");
        assert_eq!(next_calendar_date(DayOfWeek::Monday, reference), date("2025-08-18"));
        assert_eq!(next_calendar_date(DayOfWeek::Saturday, reference), date("2025-08-23"));
        assert_eq!(next_calendar_date(DayOfWeek::Sunday, reference), date("2025-08-24"));
    }

    #[test]
    fn every_weekday_resolves_within_one_week() {
        let reference = at("2025-08-13", "12:00");
        for day in DayOfWeek::ALL {
            let resolved = next_calendar_date(day, reference);
            let gap = (resolved - reference.date()).num_days();
            assert!((1..=7).contains(&gap), "{day} resolved {gap} days out");
            assert_eq!(DayOfWeek::from(resolved.weekday()), day);
        }
    }

    #[test]
    fn upcoming_date_includes_today() {
        assert_eq!(upcoming_date(DayOfWeek::Monday, date("2025-08-11")), date("2025-08-11"));
        assert_eq!(upcoming_date(DayOfWeek::Sunday, date("2025-08-11")), date("2025-08-17"));
    }

    #[test]
    fn todays_block_expires_once_it_ends() {
        let monday = block(DayOfWeek::Monday, "09:00", "10:00");
        assert!(!is_expired(&monday, at("2025-08-11", "09:59")));
        assert!(is_expired(&monday, at("2025-08-11", "10:00")));
        assert!(is_expired(&monday, at("2025-08-11", "18:00")));
    }

    #[test]
    fn blocks_on_other_days_are_not_expired() {
        let tuesday = block(DayOfWeek::Tuesday, "09:00", "10:00");
        let sunday = block(DayOfWeek::Sunday, "00:00", "00:30");
        let now = at("2025-08-11", "23:00");
        assert!(!is_expired(&tuesday, now));
        assert!(!is_expired(&sunday, now));
    }

    #[test]
    fn finds_overlap_only_on_the_same_day() {
        let existing = vec![
            block(DayOfWeek::Monday, "09:00", "10:00"),
            block(DayOfWeek::Tuesday, "09:00", "10:00"),
        ];

        let hit = find_overlapping(DayOfWeek::Monday, t("09:30"), t("10:30"), &existing);
        assert_eq!(hit.map(|b| b.day_of_week), Some(DayOfWeek::Monday));

        assert!(find_overlapping(DayOfWeek::Monday, t("10:00"), t("11:00"), &existing).is_none());
        assert!(find_overlapping(DayOfWeek::Wednesday, t("09:00"), t("10:00"), &existing).is_none());
    }

    #[test]
    fn matching_block_requires_the_exact_range() {
        let blocks = vec![block(DayOfWeek::Friday, "10:00", "12:00")];
        assert!(matching_block(DayOfWeek::Friday, t("10:00"), t("12:00"), &blocks).is_some());
        assert!(matching_block(DayOfWeek::Friday, t("10:00"), t("11:00"), &blocks).is_none());
        assert!(matching_block(DayOfWeek::Friday, t("10:30"), t("11:30"), &blocks).is_none());
        assert!(matching_block(DayOfWeek::Thursday, t("10:00"), t("12:00"), &blocks).is_none());
    }

    #[test]
    fn clashing_session_ignores_other_dates_and_back_to_back() {
        let mentor = Uuid::new_v4();
        let day = NaiveDate::from_ymd_opt(2025, 8, 15).unwrap();
        let booked = Session {
            id: Uuid::new_v4(),
            mentor_id: mentor,
            mentee_id: Uuid::new_v4(),
            date: day,
            start_time: t("10:00"),
            end_time: t("11:00"),
            status: SessionStatus::Upcoming,
            created_at: Utc::now(),
        };
        let existing = [booked.clone()];

        let hit = clashing_session(mentor, day, t("10:30"), t("11:30"), &existing);
        assert_eq!(hit.map(|s| s.id), Some(booked.id));
        assert!(clashing_session(mentor, day, t("11:00"), t("12:00"), &existing).is_none());
        assert!(clashing_session(mentor, day.succ_opt().unwrap(), t("10:00"), t("11:00"), &existing).is_none());
        assert!(clashing_session(Uuid::new_v4(), day, t("10:00"), t("11:00"), &existing).is_none());
    }
}
