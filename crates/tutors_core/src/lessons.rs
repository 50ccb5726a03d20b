//! crates/tutors_core/src/lessons.rs
//!
//! The tutor-side lesson request workflow: review, approve, decline.
//!
//! Approval is two storage steps, a conditional status update and a lesson
//! insert. The insert relies on the storage-level uniqueness of `LessonKey`, so
//! approving again (after a crash between the steps, or a double click) repairs
//! a missing lesson and never creates a second one.

use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::{
    lesson_price, Lesson, LessonRequest, LessonRequestStatus, LessonType, NewLesson, Tutor,
};
use crate::ports::{DatabaseService, PortError, PortResult};
use crate::realtime::{ChangeEvent, RealtimeHub};

pub const DEFAULT_APPROVAL_RESPONSE: &str = "Your lesson request has been approved!";
pub const DEFAULT_DECLINE_RESPONSE: &str = "Sorry, I'm not available at this time.";

/// Which requests a tutor wants to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestFilter {
    #[default]
    Pending,
    Approved,
    Declined,
    All,
}

impl RequestFilter {
    pub fn status(&self) -> Option<LessonRequestStatus> {
        match self {
            RequestFilter::Pending => Some(LessonRequestStatus::Pending),
            RequestFilter::Approved => Some(LessonRequestStatus::Approved),
            RequestFilter::Declined => Some(LessonRequestStatus::Declined),
            RequestFilter::All => None,
        }
    }
}

impl std::str::FromStr for RequestFilter {
    type Err = PortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RequestFilter::Pending),
            "approved" | "confirmed" => Ok(RequestFilter::Approved),
            "declined" | "rejected" => Ok(RequestFilter::Declined),
            "all" => Ok(RequestFilter::All),
            other => Err(PortError::Validation(format!("unknown request filter '{}'", other))),
        }
    }
}

/// The result of an approval.
#[derive(Debug, Clone)]
pub struct Approval {
    pub request: LessonRequest,
    pub lesson: Lesson,
    /// False when the lesson already existed, e.g. on a retried approval.
    pub lesson_created: bool,
}

pub struct LessonRequestService {
    db: Arc<dyn DatabaseService>,
    hub: RealtimeHub,
}

impl LessonRequestService {
    pub fn new(db: Arc<dyn DatabaseService>, hub: RealtimeHub) -> Self {
        Self { db, hub }
    }

    async fn tutor_for(&self, user_id: Uuid) -> PortResult<Tutor> {
        self.db
            .find_tutor_by_user(user_id)
            .await?
            .ok_or_else(|| PortError::Forbidden("Only tutors can review lesson requests".to_string()))
    }

    /// Loads a request and checks that `user_id` owns the tutor profile it targets.
    async fn owned_request(&self, user_id: Uuid, request_id: Uuid) -> PortResult<(Tutor, LessonRequest)> {
        let tutor = self.tutor_for(user_id).await?;
        let request = self.db.get_lesson_request(request_id).await?;
        if request.tutor_id != tutor.id {
            return Err(PortError::Forbidden(format!(
                "Lesson request {} belongs to another tutor",
                request_id
            )));
        }
        Ok((tutor, request))
    }

    pub async fn list_for_tutor(
        &self,
        user_id: Uuid,
        filter: RequestFilter,
    ) -> PortResult<Vec<LessonRequest>> {
        let tutor = self.tutor_for(user_id).await?;
        self.db
            .list_lesson_requests_for_tutor(tutor.id, filter.status())
            .await
    }

    pub async fn list_for_student(&self, student_id: Uuid) -> PortResult<Vec<LessonRequest>> {
        self.db.list_lesson_requests_for_student(student_id).await
    }

    /// Approves a request and ensures exactly one confirmed lesson exists for it.
    ///
    /// Approving an approved request is idempotent. Approving a declined one is
    /// `InvalidState`.
    pub async fn approve(
        &self,
        user_id: Uuid,
        request_id: Uuid,
        response: Option<String>,
    ) -> PortResult<Approval> {
        let (tutor, request) = self.owned_request(user_id, request_id).await?;
        let price_cents = lesson_price(tutor.hourly_rate_cents, request.start_time, request.end_time)
            .ok_or_else(|| {
                PortError::Validation(format!(
                    "Hourly rate {} cannot be priced for request {}",
                    tutor.hourly_rate_cents, request_id
                ))
            })?;
        let response = response
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| DEFAULT_APPROVAL_RESPONSE.to_string());

        let request = match request.status {
            LessonRequestStatus::Pending => {
                self.resolve(request_id, LessonRequestStatus::Approved, &response)
                    .await?
            }
            LessonRequestStatus::Approved => {
                info!("Lesson request {} already approved; ensuring lesson", request_id);
                request
            }
            LessonRequestStatus::Declined => {
                return Err(PortError::InvalidState(format!(
                    "Lesson request {} was declined and cannot be approved",
                    request_id
                )))
            }
        };

        let (lesson, lesson_created) = self.ensure_lesson(&request, price_cents).await.map_err(|e| {
            error!(
                "Lesson request {} is approved but its lesson could not be stored: {:?}",
                request_id, e
            );
            e
        })?;

        Ok(Approval {
            request,
            lesson,
            lesson_created,
        })
    }

    pub async fn decline(
        &self,
        user_id: Uuid,
        request_id: Uuid,
        response: Option<String>,
    ) -> PortResult<LessonRequest> {
        let (_, request) = self.owned_request(user_id, request_id).await?;
        if !request.status.can_transition_to(LessonRequestStatus::Declined) {
            return Err(PortError::InvalidState(format!(
                "Lesson request {} is already {}",
                request_id, request.status
            )));
        }
        let response = response
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| DEFAULT_DECLINE_RESPONSE.to_string());
        self.resolve(request_id, LessonRequestStatus::Declined, &response)
            .await
    }

    /// Conditional pending -> `status` update. If a concurrent caller won the race
    /// with the same outcome, their result is accepted.
    async fn resolve(
        &self,
        request_id: Uuid,
        status: LessonRequestStatus,
        response: &str,
    ) -> PortResult<LessonRequest> {
        match self.db.resolve_lesson_request(request_id, status, response).await {
            Ok(updated) => {
                info!("Lesson request {} is now {}", request_id, updated.status);
                self.hub
                    .publish(ChangeEvent::LessonRequestUpdated(updated.clone()));
                Ok(updated)
            }
            Err(PortError::InvalidState(detail)) => {
                let current = self.db.get_lesson_request(request_id).await?;
                if current.status == status {
                    warn!("Lesson request {} resolved concurrently: {}", request_id, detail);
                    Ok(current)
                } else {
                    Err(PortError::InvalidState(detail))
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Single insert; a uniqueness violation means the lesson is already there.
    async fn ensure_lesson(&self, request: &LessonRequest, price_cents: i64) -> PortResult<(Lesson, bool)> {
        let key = request.key();
        let previous = self
            .db
            .count_lessons_between(key.tutor_id, key.student_id)
            .await?;
        let lesson_type = if previous == 0 {
            LessonType::Trial
        } else {
            LessonType::Regular
        };
        let new_lesson = NewLesson {
            key,
            lesson_type,
            price_cents,
            notes: request.student_message.clone(),
            request_id: Some(request.id),
        };

        match self.db.insert_lesson(new_lesson).await {
            Ok(lesson) => {
                info!("Lesson {} created from request {}", lesson.id, request.id);
                self.hub.publish(ChangeEvent::LessonInserted(lesson.clone()));
                Ok((lesson, true))
            }
            Err(PortError::AlreadyExists(_)) => {
                let existing = self.db.find_lesson(&key).await?.ok_or_else(|| {
                    PortError::Unexpected(format!(
                        "Lesson for request {} reported as existing but not found",
                        request.id
                    ))
                })?;
                Ok((existing, false))
            }
            Err(e) => Err(e),
        }
    }
}
