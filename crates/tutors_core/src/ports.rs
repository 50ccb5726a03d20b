//! crates/tutors_core/src/ports.rs
//!
//! Defines the storage contract for the marketplace's core logic.
//! The `DatabaseService` trait is the boundary of the hexagonal architecture: the
//! services in this crate only ever talk to storage through it, so the same
//! workflows run against PostgreSQL or the in-memory store.

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::domain::{
    AvailabilitySlot, Chat, Lesson, LessonKey, LessonRequest, LessonRequestStatus, Message,
    NewAvailabilitySlot, NewLesson, NewLessonRequest, NewMessage, NewTutorApplication, Tutor,
    UserProfile,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port and service operations.
/// This abstracts away the specific errors from storage backends.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    /// A uniquely-keyed record already exists. Storage constraints are the
    /// only source of this error.
    #[error("Already exists: {0}")]
    AlreadyExists(String),
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Slot is no longer available")]
    SlotUnavailable,
    #[error("Unauthorized")]
    Unauthorized,
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Storage Port
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Users and Auth Sessions ---

    /// Resolves an auth session token written by the OAuth provider to a user id.
    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;

    /// Returns the profiles that exist among `user_ids`; unknown ids are skipped.
    async fn get_user_profiles(&self, user_ids: &[Uuid]) -> PortResult<Vec<UserProfile>>;

    // --- Tutors ---

    async fn list_approved_tutors(&self) -> PortResult<Vec<Tutor>>;

    async fn get_tutor(&self, tutor_id: Uuid) -> PortResult<Tutor>;

    /// `Ok(None)` when the user has never applied.
    async fn find_tutor_by_user(&self, user_id: Uuid) -> PortResult<Option<Tutor>>;

    /// Inserts an unapproved tutor. `AlreadyExists` if the user already has a profile.
    async fn create_tutor_application(
        &self,
        user_id: Uuid,
        application: NewTutorApplication,
    ) -> PortResult<Tutor>;

    // --- Availability ---

    async fn get_availability(&self, tutor_id: Uuid) -> PortResult<Vec<AvailabilitySlot>>;

    /// Replaces the tutor's whole weekly template in one step.
    async fn replace_availability(
        &self,
        tutor_id: Uuid,
        slots: Vec<NewAvailabilitySlot>,
    ) -> PortResult<Vec<AvailabilitySlot>>;

    // --- Lesson Requests ---

    /// Inserts a pending request. `AlreadyExists` if a live (pending or approved)
    /// request already holds the same tutor, date and start time.
    async fn create_lesson_request(&self, request: NewLessonRequest) -> PortResult<LessonRequest>;

    async fn get_lesson_request(&self, request_id: Uuid) -> PortResult<LessonRequest>;

    /// Newest first. `None` lists every status.
    async fn list_lesson_requests_for_tutor(
        &self,
        tutor_id: Uuid,
        status: Option<LessonRequestStatus>,
    ) -> PortResult<Vec<LessonRequest>>;

    async fn list_lesson_requests_for_student(&self, student_id: Uuid)
        -> PortResult<Vec<LessonRequest>>;

    /// Requests for a tutor with `from <= date <= to`, any status.
    async fn list_lesson_requests_in_range(
        &self,
        tutor_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> PortResult<Vec<LessonRequest>>;

    /// Moves a request out of `Pending` with a conditional update.
    ///
    /// Returns `InvalidState` when the stored request is no longer pending, so two
    /// racing resolutions can never both succeed.
    async fn resolve_lesson_request(
        &self,
        request_id: Uuid,
        status: LessonRequestStatus,
        tutor_response: &str,
    ) -> PortResult<LessonRequest>;

    // --- Lessons ---

    /// Inserts a confirmed lesson. `AlreadyExists` on a duplicate `LessonKey`.
    async fn insert_lesson(&self, lesson: NewLesson) -> PortResult<Lesson>;

    async fn find_lesson(&self, key: &LessonKey) -> PortResult<Option<Lesson>>;

    async fn list_lessons_for_tutor(&self, tutor_id: Uuid) -> PortResult<Vec<Lesson>>;

    async fn list_lessons_for_student(&self, student_id: Uuid) -> PortResult<Vec<Lesson>>;

    async fn list_lessons_in_range(
        &self,
        tutor_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> PortResult<Vec<Lesson>>;

    async fn count_lessons_between(&self, tutor_id: Uuid, student_id: Uuid) -> PortResult<i64>;

    // --- Chats and Messages ---

    /// Returns the chat for the unordered pair, creating it if needed.
    /// Must be atomic: concurrent calls for the same pair return the same chat.
    async fn find_or_create_chat(&self, user_a: Uuid, user_b: Uuid) -> PortResult<Chat>;

    async fn get_chat(&self, chat_id: Uuid) -> PortResult<Chat>;

    async fn list_chats_for_user(&self, user_id: Uuid) -> PortResult<Vec<Chat>>;

    /// Appends a message and bumps the chat's `updated_at`.
    async fn insert_message(&self, message: NewMessage) -> PortResult<Message>;

    /// Ascending by `created_at`.
    async fn list_messages(&self, chat_id: Uuid) -> PortResult<Vec<Message>>;

    async fn latest_message(&self, chat_id: Uuid) -> PortResult<Option<Message>>;
}
