//! crates/tutors_core/src/booking.rs
//!
//! The weekly availability/booking grid and the student-side booking action.
//!
//! A grid is 7 days (Monday first) by K timeslots. Each cell merges three sets
//! fetched from storage: the tutor's recurring weekly availability, lessons
//! already on the calendar, and lesson requests for the concrete date.

use chrono::{
    Datelike, Days, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday,
};
use mockable::Clock;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{
    times_overlap, AvailabilitySlot, Lesson, LessonRequest, LessonRequestStatus,
    NewAvailabilitySlot, NewLessonRequest, Tutor,
};
use crate::ports::{DatabaseService, PortError, PortResult};
use crate::realtime::{ChangeEvent, RealtimeHub};

//=========================================================================================
// Grid Types
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellStatus {
    Available,
    Pending,
    Confirmed,
    Unavailable,
}

impl CellStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CellStatus::Available => "available",
            CellStatus::Pending => "pending",
            CellStatus::Confirmed => "confirmed",
            CellStatus::Unavailable => "unavailable",
        }
    }

    /// Only available cells can be booked.
    pub fn is_bookable(&self) -> bool {
        matches!(self, CellStatus::Available)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridCell {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: CellStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridDay {
    pub date: NaiveDate,
    pub weekday: Weekday,
    pub cells: Vec<GridCell>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BookingGrid {
    pub tutor_id: Uuid,
    pub week_start: NaiveDate,
    pub previous_week: NaiveDate,
    pub next_week: NaiveDate,
    pub days: Vec<GridDay>,
}

impl BookingGrid {
    pub fn cell(&self, date: NaiveDate, start_time: NaiveTime) -> Option<&GridCell> {
        self.days
            .iter()
            .find(|d| d.date == date)
            .and_then(|d| d.cells.iter().find(|c| c.start_time == start_time))
    }
}

//=========================================================================================
// Grid Settings
//=========================================================================================

/// The daily window and slot length the grid is cut into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSettings {
    day_start: NaiveTime,
    day_end: NaiveTime,
    slot_minutes: u32,
}

fn minutes_of(time: NaiveTime) -> u32 {
    time.num_seconds_from_midnight() / 60
}

impl GridSettings {
    pub fn new(day_start: NaiveTime, day_end: NaiveTime, slot_minutes: u32) -> PortResult<Self> {
        if slot_minutes == 0 {
            return Err(PortError::Validation("slot length must be positive".to_string()));
        }
        if day_start >= day_end {
            return Err(PortError::Validation(format!(
                "day start {} must be before day end {}",
                day_start, day_end
            )));
        }
        let window = minutes_of(day_end) - minutes_of(day_start);
        if window % slot_minutes != 0 {
            return Err(PortError::Validation(format!(
                "a {} minute window cannot be split into {} minute slots",
                window, slot_minutes
            )));
        }
        Ok(Self {
            day_start,
            day_end,
            slot_minutes,
        })
    }

    pub fn slot_minutes(&self) -> u32 {
        self.slot_minutes
    }

    pub fn slot_length(&self) -> Duration {
        Duration::minutes(i64::from(self.slot_minutes))
    }

    /// Start times of every slot in a day, ascending.
    pub fn slot_starts(&self) -> Vec<NaiveTime> {
        let first = minutes_of(self.day_start);
        let last = minutes_of(self.day_end);
        (first..last)
            .step_by(self.slot_minutes as usize)
            .filter_map(|m| NaiveTime::from_hms_opt(m / 60, m % 60, 0))
            .collect()
    }
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            day_start: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or(NaiveTime::MIN),
            day_end: NaiveTime::from_hms_opt(22, 0, 0).unwrap_or(NaiveTime::MIN),
            slot_minutes: 60,
        }
    }
}

//=========================================================================================
// Pure Grid Computation
//=========================================================================================

/// The Monday on or before `date`. `None` past the start of the calendar.
pub fn week_start(date: NaiveDate) -> Option<NaiveDate> {
    date.checked_sub_days(Days::new(u64::from(date.weekday().num_days_from_monday())))
}

/// Moves a week anchor by whole weeks. `None` when the result is not a
/// representable date.
pub fn shift_week(anchor: NaiveDate, weeks: i64) -> Option<NaiveDate> {
    let days = Days::new(weeks.unsigned_abs().checked_mul(7)?);
    if weeks < 0 {
        anchor.checked_sub_days(days)
    } else {
        anchor.checked_add_days(days)
    }
}

fn outside_calendar(date: NaiveDate) -> PortError {
    PortError::Validation(format!("week of {} is outside the supported calendar", date))
}

fn cell_status(
    date: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
    availability: &[AvailabilitySlot],
    requests: &[LessonRequest],
    lessons: &[Lesson],
    now: NaiveDateTime,
) -> CellStatus {
    let has_request = |status: LessonRequestStatus| {
        requests
            .iter()
            .any(|r| r.status == status && r.overlaps(date, start, end))
    };

    if has_request(LessonRequestStatus::Pending) {
        CellStatus::Pending
    } else if has_request(LessonRequestStatus::Approved)
        || lessons.iter().any(|l| l.overlaps(date, start, end))
    {
        CellStatus::Confirmed
    } else if date.and_time(start) < now {
        CellStatus::Unavailable
    } else if availability
        .iter()
        .any(|s| s.covers(date.weekday(), start, end))
    {
        CellStatus::Available
    } else {
        CellStatus::Unavailable
    }
}

/// Builds the 7 x K grid for the week beginning at `week_start`.
///
/// Precedence per cell: pending request, then approved request or lesson,
/// then recurring availability. Past cells are never available. Fails when the
/// week or its neighbours fall off the calendar.
pub fn build_grid(
    settings: &GridSettings,
    tutor_id: Uuid,
    week_start: NaiveDate,
    availability: &[AvailabilitySlot],
    requests: &[LessonRequest],
    lessons: &[Lesson],
    now: NaiveDateTime,
) -> PortResult<BookingGrid> {
    let previous_week = shift_week(week_start, -1).ok_or_else(|| outside_calendar(week_start))?;
    let next_week = shift_week(week_start, 1).ok_or_else(|| outside_calendar(week_start))?;
    let starts = settings.slot_starts();
    let length = settings.slot_length();
    let days = week_start
        .iter_days()
        .take(7)
        .map(|date| {
            let cells = starts
                .iter()
                .map(|&start| {
                    let end = start + length;
                    GridCell {
                        date,
                        start_time: start,
                        end_time: end,
                        status: cell_status(date, start, end, availability, requests, lessons, now),
                    }
                })
                .collect();
            GridDay {
                date,
                weekday: date.weekday(),
                cells,
            }
        })
        .collect();

    Ok(BookingGrid {
        tutor_id,
        week_start,
        previous_week,
        next_week,
        days,
    })
}

/// Rejects inverted windows and overlapping windows on the same weekday.
pub fn validate_availability(slots: &[NewAvailabilitySlot]) -> PortResult<()> {
    if let Some(bad) = slots.iter().find(|s| s.start_time >= s.end_time) {
        return Err(PortError::Validation(format!(
            "{:?} window {}-{} ends before it starts",
            bad.weekday, bad.start_time, bad.end_time
        )));
    }
    for (i, a) in slots.iter().enumerate() {
        for b in slots.iter().skip(i + 1) {
            if a.weekday == b.weekday
                && times_overlap(a.start_time, a.end_time, b.start_time, b.end_time)
            {
                return Err(PortError::Validation(format!(
                    "{:?} windows {}-{} and {}-{} overlap",
                    a.weekday, a.start_time, a.end_time, b.start_time, b.end_time
                )));
            }
        }
    }
    Ok(())
}

//=========================================================================================
// Booking Service
//=========================================================================================

pub struct BookingService {
    db: Arc<dyn DatabaseService>,
    hub: RealtimeHub,
    clock: Arc<dyn Clock>,
    settings: GridSettings,
    offset: FixedOffset,
}

impl BookingService {
    pub fn new(
        db: Arc<dyn DatabaseService>,
        hub: RealtimeHub,
        clock: Arc<dyn Clock>,
        settings: GridSettings,
        offset: FixedOffset,
    ) -> Self {
        Self {
            db,
            hub,
            clock,
            settings,
            offset,
        }
    }

    pub fn settings(&self) -> &GridSettings {
        &self.settings
    }

    /// Local wall-clock time in the schedule's offset.
    pub fn now(&self) -> NaiveDateTime {
        self.clock.utc().with_timezone(&self.offset).naive_local()
    }

    /// Approved tutors are visible to everyone; unapproved ones only to their owner.
    async fn visible_tutor(&self, viewer: Uuid, tutor_id: Uuid) -> PortResult<Tutor> {
        let tutor = self.db.get_tutor(tutor_id).await?;
        if tutor.approved || tutor.user_id == viewer {
            Ok(tutor)
        } else {
            Err(PortError::NotFound(format!("Tutor {} not found", tutor_id)))
        }
    }

    /// Grid for the week containing `anchor`, or the current week.
    pub async fn week_grid(
        &self,
        viewer: Uuid,
        tutor_id: Uuid,
        anchor: Option<NaiveDate>,
    ) -> PortResult<BookingGrid> {
        let tutor = self.visible_tutor(viewer, tutor_id).await?;
        self.grid_for(&tutor, anchor).await
    }

    async fn grid_for(&self, tutor: &Tutor, anchor: Option<NaiveDate>) -> PortResult<BookingGrid> {
        let now = self.now();
        let anchor = anchor.unwrap_or_else(|| now.date());
        let monday = week_start(anchor).ok_or_else(|| outside_calendar(anchor))?;
        let sunday = monday
            .checked_add_days(Days::new(6))
            .ok_or_else(|| outside_calendar(anchor))?;

        let (availability, requests, lessons) = futures::try_join!(
            self.db.get_availability(tutor.id),
            self.db.list_lesson_requests_in_range(tutor.id, monday, sunday),
            self.db.list_lessons_in_range(tutor.id, monday, sunday),
        )?;

        build_grid(
            &self.settings,
            tutor.id,
            monday,
            &availability,
            &requests,
            &lessons,
            now,
        )
    }

    /// Books an available cell, inserting a pending lesson request.
    pub async fn request_lesson(
        &self,
        student_id: Uuid,
        tutor_id: Uuid,
        date: NaiveDate,
        start_time: NaiveTime,
        student_message: Option<String>,
    ) -> PortResult<LessonRequest> {
        let tutor = self.db.get_tutor(tutor_id).await?;
        if !tutor.approved {
            return Err(PortError::NotFound(format!("Tutor {} not found", tutor_id)));
        }
        if tutor.user_id == student_id {
            return Err(PortError::Validation(
                "Tutors cannot request lessons with themselves".to_string(),
            ));
        }

        let grid = self.grid_for(&tutor, Some(date)).await?;
        let cell = grid.cell(date, start_time).ok_or_else(|| {
            PortError::Validation(format!("{} {} is not a bookable time slot", date, start_time))
        })?;
        if !cell.status.is_bookable() {
            return Err(PortError::SlotUnavailable);
        }

        let request = NewLessonRequest {
            tutor_id,
            student_id,
            date,
            start_time: cell.start_time,
            end_time: cell.end_time,
            student_message: student_message
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty()),
        };
        let created = match self.db.create_lesson_request(request).await {
            Ok(created) => created,
            Err(PortError::AlreadyExists(detail)) => {
                warn!("Lost booking race for tutor {}: {}", tutor_id, detail);
                return Err(PortError::SlotUnavailable);
            }
            Err(e) => return Err(e),
        };

        info!(
            "Lesson request {} created for tutor {} on {} at {}",
            created.id, tutor_id, date, start_time
        );
        self.hub
            .publish(ChangeEvent::LessonRequestInserted(created.clone()));
        Ok(created)
    }

    pub async fn availability(&self, viewer: Uuid, tutor_id: Uuid) -> PortResult<Vec<AvailabilitySlot>> {
        let tutor = self.visible_tutor(viewer, tutor_id).await?;
        self.db.get_availability(tutor.id).await
    }

    /// Replaces the calling tutor's weekly template.
    pub async fn set_availability(
        &self,
        user_id: Uuid,
        slots: Vec<NewAvailabilitySlot>,
    ) -> PortResult<Vec<AvailabilitySlot>> {
        let tutor = self.db.find_tutor_by_user(user_id).await?.ok_or_else(|| {
            PortError::Forbidden("Only tutors can manage availability".to_string())
        })?;
        validate_availability(&slots)?;
        let stored = self.db.replace_availability(tutor.id, slots).await?;
        info!("Tutor {} now has {} availability windows", tutor.id, stored.len());
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LessonStatus, LessonType};
    use crate::test_support::{application, at, date, seed_student, seed_tutor, time, Fixture};
    use chrono::Utc;
    use rstest::rstest;

    fn slot(weekday: Weekday, start: u32, end: u32) -> AvailabilitySlot {
        AvailabilitySlot {
            id: Uuid::new_v4(),
            tutor_id: Uuid::nil(),
            weekday,
            start_time: time(start, 0),
            end_time: time(end, 0),
        }
    }

    fn request(day: NaiveDate, start: u32, status: LessonRequestStatus) -> LessonRequest {
        LessonRequest {
            id: Uuid::new_v4(),
            tutor_id: Uuid::nil(),
            student_id: Uuid::new_v4(),
            date: day,
            start_time: time(start, 0),
            end_time: time(start + 1, 0),
            status,
            student_message: None,
            tutor_response: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn lesson(day: NaiveDate, start: u32, status: LessonStatus) -> Lesson {
        Lesson {
            id: Uuid::new_v4(),
            tutor_id: Uuid::nil(),
            student_id: Uuid::new_v4(),
            date: day,
            start_time: time(start, 0),
            end_time: time(start + 1, 0),
            status,
            lesson_type: LessonType::Regular,
            price_cents: 1000,
            notes: None,
            request_id: None,
            created_at: Utc::now(),
        }
    }

    #[rstest]
    #[case(date(2024, 6, 12), date(2024, 6, 10))]
    #[case(date(2024, 6, 10), date(2024, 6, 10))]
    #[case(date(2024, 6, 16), date(2024, 6, 10))]
    #[case(date(2024, 6, 17), date(2024, 6, 17))]
    fn weeks_start_on_monday(#[case] day: NaiveDate, #[case] expected: NaiveDate) {
        assert_eq!(week_start(day), Some(expected));
    }

    #[test]
    fn navigation_moves_by_seven_days() {
        assert_eq!(shift_week(date(2024, 6, 10), 1), Some(date(2024, 6, 17)));
        assert_eq!(shift_week(date(2024, 6, 10), -1), Some(date(2024, 6, 3)));
    }

    #[test]
    fn calendar_edges_do_not_overflow() {
        assert_eq!(shift_week(NaiveDate::MAX, 1), None);
        assert_eq!(shift_week(date(2024, 6, 10), i64::MIN), None);
        let grid = build_grid(
            &GridSettings::default(),
            Uuid::nil(),
            NaiveDate::MAX,
            &[],
            &[],
            &[],
            at(2024, 6, 1, 0, 0),
        );
        assert!(matches!(grid, Err(PortError::Validation(_))));
    }

    #[test]
    fn default_settings_give_fourteen_hourly_slots() {
        let starts = GridSettings::default().slot_starts();
        assert_eq!(starts.len(), 14);
        assert_eq!(starts.first(), Some(&time(8, 0)));
        assert_eq!(starts.last(), Some(&time(21, 0)));
    }

    #[rstest]
    #[case(time(8, 0), time(22, 0), 0)]
    #[case(time(22, 0), time(8, 0), 60)]
    #[case(time(8, 0), time(9, 30), 60)]
    fn invalid_settings_are_rejected(
        #[case] start: NaiveTime,
        #[case] end: NaiveTime,
        #[case] minutes: u32,
    ) {
        assert!(matches!(
            GridSettings::new(start, end, minutes),
            Err(PortError::Validation(_))
        ));
    }

    #[test]
    fn half_hour_settings_double_the_slots() {
        let settings = GridSettings::new(time(9, 0), time(11, 0), 30).unwrap();
        assert_eq!(
            settings.slot_starts(),
            vec![time(9, 0), time(9, 30), time(10, 0), time(10, 30)]
        );
    }

    #[test]
    fn cell_precedence_follows_requests_then_lessons_then_template() {
        let monday = date(2024, 6, 10);
        let wednesday = date(2024, 6, 12);
        let availability = vec![slot(Weekday::Wed, 9, 17)];
        let requests = vec![
            request(wednesday, 10, LessonRequestStatus::Pending),
            request(wednesday, 11, LessonRequestStatus::Approved),
            request(wednesday, 12, LessonRequestStatus::Declined),
        ];
        let lessons = vec![
            lesson(wednesday, 13, LessonStatus::Confirmed),
            lesson(wednesday, 14, LessonStatus::Cancelled),
            lesson(wednesday, 18, LessonStatus::Confirmed),
        ];
        let grid = build_grid(
            &GridSettings::default(),
            Uuid::nil(),
            monday,
            &availability,
            &requests,
            &lessons,
            at(2024, 6, 1, 0, 0),
        )
        .unwrap();

        let status = |h: u32| grid.cell(wednesday, time(h, 0)).map(|c| c.status);
        assert_eq!(status(8), Some(CellStatus::Unavailable));
        assert_eq!(status(9), Some(CellStatus::Available));
        assert_eq!(status(10), Some(CellStatus::Pending));
        assert_eq!(status(11), Some(CellStatus::Confirmed));
        assert_eq!(status(12), Some(CellStatus::Available));
        assert_eq!(status(13), Some(CellStatus::Confirmed));
        assert_eq!(status(14), Some(CellStatus::Available));
        assert_eq!(status(18), Some(CellStatus::Confirmed));
        assert_eq!(status(17), Some(CellStatus::Unavailable));
        assert_eq!(grid.days.len(), 7);
        assert_eq!(grid.previous_week, date(2024, 6, 3));
        assert_eq!(grid.next_week, date(2024, 6, 17));
        assert!(grid.days.iter().all(|d| d.cells.len() == 14));
        assert_eq!(
            grid.cell(date(2024, 6, 13), time(9, 0)).map(|c| c.status),
            Some(CellStatus::Unavailable)
        );
    }

    #[test]
    fn past_cells_are_not_bookable_but_keep_their_booking_status() {
        let wednesday = date(2024, 6, 12);
        let grid = build_grid(
            &GridSettings::default(),
            Uuid::nil(),
            date(2024, 6, 10),
            &[slot(Weekday::Wed, 9, 17)],
            &[request(wednesday, 10, LessonRequestStatus::Approved)],
            &[],
            at(2024, 6, 12, 12, 30),
        )
        .unwrap();
        let status = |h: u32| grid.cell(wednesday, time(h, 0)).map(|c| c.status);
        assert_eq!(status(9), Some(CellStatus::Unavailable));
        assert_eq!(status(10), Some(CellStatus::Confirmed));
        assert_eq!(status(12), Some(CellStatus::Unavailable));
        assert_eq!(status(13), Some(CellStatus::Available));
    }

    #[test]
    fn overlapping_availability_is_rejected() {
        let slots = vec![
            NewAvailabilitySlot {
                weekday: Weekday::Mon,
                start_time: time(9, 0),
                end_time: time(12, 0),
            },
            NewAvailabilitySlot {
                weekday: Weekday::Mon,
                start_time: time(11, 0),
                end_time: time(13, 0),
            },
        ];
        assert!(matches!(validate_availability(&slots), Err(PortError::Validation(_))));
    }

    #[tokio::test]
    async fn booking_turns_available_cell_pending_and_blocks_rebooking() {
        let fx = Fixture::at(2024, 6, 1, 9, 0);
        let tutor = seed_tutor(&fx).await;
        let student = seed_student(&fx, "Asha").await;
        let other = seed_student(&fx, "Ravi").await;
        fx.booking
            .set_availability(
                tutor.user_id,
                vec![NewAvailabilitySlot {
                    weekday: Weekday::Wed,
                    start_time: time(9, 0),
                    end_time: time(17, 0),
                }],
            )
            .await
            .unwrap();

        let wednesday = date(2024, 6, 12);
        let before = fx.booking.week_grid(student, tutor.id, Some(wednesday)).await.unwrap();
        assert_eq!(
            before.cell(wednesday, time(14, 0)).map(|c| c.status),
            Some(CellStatus::Available)
        );

        let created = fx
            .booking
            .request_lesson(student, tutor.id, wednesday, time(14, 0), Some("  Hi!  ".into()))
            .await
            .unwrap();
        assert_eq!(created.status, LessonRequestStatus::Pending);
        assert_eq!(created.end_time, time(15, 0));
        assert_eq!(created.student_message.as_deref(), Some("Hi!"));

        let after = fx.booking.week_grid(student, tutor.id, Some(wednesday)).await.unwrap();
        assert_eq!(
            after.cell(wednesday, time(14, 0)).map(|c| c.status),
            Some(CellStatus::Pending)
        );

        let second = fx
            .booking
            .request_lesson(other, tutor.id, wednesday, time(14, 0), None)
            .await;
        assert!(matches!(second, Err(PortError::SlotUnavailable)));
    }

    #[tokio::test]
    async fn booking_outside_template_or_grid_fails() {
        let fx = Fixture::at(2024, 6, 1, 9, 0);
        let tutor = seed_tutor(&fx).await;
        let student = seed_student(&fx, "Asha").await;
        let wednesday = date(2024, 6, 12);

        let no_template = fx
            .booking
            .request_lesson(student, tutor.id, wednesday, time(14, 0), None)
            .await;
        assert!(matches!(no_template, Err(PortError::SlotUnavailable)));

        let off_grid = fx
            .booking
            .request_lesson(student, tutor.id, wednesday, time(14, 15), None)
            .await;
        assert!(matches!(off_grid, Err(PortError::Validation(_))));

        let own = fx
            .booking
            .request_lesson(tutor.user_id, tutor.id, wednesday, time(14, 0), None)
            .await;
        assert!(matches!(own, Err(PortError::Validation(_))));
    }

    #[tokio::test]
    async fn unknown_tutor_grid_is_not_found() {
        let fx = Fixture::default();
        let result = fx.booking.week_grid(Uuid::new_v4(), Uuid::new_v4(), None).await;
        assert!(matches!(result, Err(PortError::NotFound(_))));
    }

    #[tokio::test]
    async fn far_future_week_is_a_validation_error() {
        let fx = Fixture::at(2024, 6, 1, 9, 0);
        let tutor = seed_tutor(&fx).await;
        let student = seed_student(&fx, "Asha").await;
        let far = NaiveDate::from_ymd_opt(262142, 12, 31).unwrap();

        let grid = fx.booking.week_grid(student, tutor.id, Some(far)).await;
        assert!(matches!(grid, Err(PortError::Validation(_))));

        let booking = fx
            .booking
            .request_lesson(student, tutor.id, far, time(14, 0), None)
            .await;
        assert!(matches!(booking, Err(PortError::Validation(_))));
    }

    #[tokio::test]
    async fn unapproved_tutor_schedule_is_visible_to_owner_only() {
        let fx = Fixture::at(2024, 6, 1, 9, 0);
        let owner = seed_student(&fx, "Meera").await;
        let student = seed_student(&fx, "Asha").await;
        let tutor = fx
            .directory
            .submit_application(owner, application("Meera"))
            .await
            .unwrap();

        let hidden = fx.booking.week_grid(student, tutor.id, None).await;
        assert!(matches!(hidden, Err(PortError::NotFound(_))));
        let template = fx.booking.availability(student, tutor.id).await;
        assert!(matches!(template, Err(PortError::NotFound(_))));

        assert!(fx.booking.week_grid(owner, tutor.id, None).await.is_ok());
        assert!(fx.booking.availability(owner, tutor.id).await.is_ok());
    }

    #[tokio::test]
    async fn students_cannot_set_availability() {
        let fx = Fixture::default();
        let student = seed_student(&fx, "Asha").await;
        let result = fx.booking.set_availability(student, vec![]).await;
        assert!(matches!(result, Err(PortError::Forbidden(_))));
    }
}
