//! crates/tutors_core/src/dashboard.rs
//!
//! Everything a dashboard shows on mount, loaded with one concurrent fan-out.

use chrono::NaiveDate;
use futures::future::{self, BoxFuture, FutureExt};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{AvailabilitySlot, Lesson, LessonRequest, LessonRequestStatus, Tutor};
use crate::ports::{DatabaseService, PortResult};

#[derive(Debug, Clone)]
pub struct Dashboard {
    /// Present when the user has a tutor profile (approved or not).
    pub tutor: Option<Tutor>,
    /// Lessons dated today or later, in either role, ascending.
    pub upcoming_lessons: Vec<Lesson>,
    pub sent_requests: Vec<LessonRequest>,
    pub pending_requests: Vec<LessonRequest>,
    pub availability: Vec<AvailabilitySlot>,
}

pub struct DashboardService {
    db: Arc<dyn DatabaseService>,
}

fn empty<T: Send + 'static>() -> BoxFuture<'static, PortResult<Vec<T>>> {
    future::ready(Ok(Vec::new())).boxed()
}

impl DashboardService {
    pub fn new(db: Arc<dyn DatabaseService>) -> Self {
        Self { db }
    }

    pub async fn load(&self, user_id: Uuid, today: NaiveDate) -> PortResult<Dashboard> {
        let tutor = self.db.find_tutor_by_user(user_id).await?;

        let (tutor_lessons, pending_requests, availability): (
            BoxFuture<'_, PortResult<Vec<Lesson>>>,
            BoxFuture<'_, PortResult<Vec<LessonRequest>>>,
            BoxFuture<'_, PortResult<Vec<AvailabilitySlot>>>,
        ) = match &tutor {
            Some(t) => (
                self.db.list_lessons_for_tutor(t.id),
                self.db
                    .list_lesson_requests_for_tutor(t.id, Some(LessonRequestStatus::Pending)),
                self.db.get_availability(t.id),
            ),
            None => (empty(), empty(), empty()),
        };

        let (student_lessons, sent_requests, tutor_lessons, pending_requests, availability) =
            futures::try_join!(
                self.db.list_lessons_for_student(user_id),
                self.db.list_lesson_requests_for_student(user_id),
                tutor_lessons,
                pending_requests,
                availability,
            )?;

        let mut upcoming_lessons: Vec<Lesson> = student_lessons
            .into_iter()
            .chain(tutor_lessons)
            .filter(|l| l.date >= today)
            .collect();
        upcoming_lessons.sort_by_key(|l| (l.date, l.start_time));

        Ok(Dashboard {
            tutor,
            upcoming_lessons,
            sent_requests,
            pending_requests,
            availability,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::NewAvailabilitySlot;
    use crate::test_support::{date, seed_student, seed_tutor, time, Fixture};
    use chrono::Weekday;

    #[tokio::test]
    async fn student_dashboard_has_no_tutor_sections() {
        let fx = Fixture::default();
        let student = seed_student(&fx, "Asha").await;
        let board = fx.dashboard.load(student, date(2024, 6, 1)).await.unwrap();
        assert!(board.tutor.is_none());
        assert!(board.pending_requests.is_empty());
        assert!(board.availability.is_empty());
    }

    #[tokio::test]
    async fn tutor_dashboard_collects_everything() {
        let fx = Fixture::at(2024, 6, 1, 9, 0);
        let tutor = seed_tutor(&fx).await;
        let student = seed_student(&fx, "Asha").await;
        fx.booking
            .set_availability(
                tutor.user_id,
                vec![NewAvailabilitySlot {
                    weekday: Weekday::Wed,
                    start_time: time(9, 0),
                    end_time: time(18, 0),
                }],
            )
            .await
            .unwrap();
        let first = fx
            .booking
            .request_lesson(student, tutor.id, date(2024, 6, 12), time(10, 0), None)
            .await
            .unwrap();
        fx.booking
            .request_lesson(student, tutor.id, date(2024, 6, 12), time(11, 0), None)
            .await
            .unwrap();
        fx.lessons.approve(tutor.user_id, first.id, None).await.unwrap();

        let board = fx.dashboard.load(tutor.user_id, date(2024, 6, 1)).await.unwrap();
        assert_eq!(board.tutor.map(|t| t.id), Some(tutor.id));
        assert_eq!(board.upcoming_lessons.len(), 1);
        assert_eq!(board.pending_requests.len(), 1);
        assert_eq!(board.availability.len(), 1);

        let student_board = fx.dashboard.load(student, date(2024, 6, 1)).await.unwrap();
        assert_eq!(student_board.upcoming_lessons.len(), 1);
        assert_eq!(student_board.sent_requests.len(), 2);

        let later = fx.dashboard.load(student, date(2024, 6, 13)).await.unwrap();
        assert!(later.upcoming_lessons.is_empty());
    }
}
