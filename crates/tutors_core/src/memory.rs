//! crates/tutors_core/src/memory.rs
//!
//! An in-memory implementation of the `DatabaseService` port.
//!
//! It enforces the same uniqueness rules as the SQL schema (one tutor profile per
//! user, one lesson per `LessonKey`, one live request per tutor slot, one chat per
//! unordered pair), so the services behave identically on both backends.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::{
    AvailabilitySlot, Chat, Lesson, LessonKey, LessonRequest, LessonRequestStatus, LessonStatus,
    Message, NewAvailabilitySlot, NewLesson, NewLessonRequest, NewMessage, NewTutorApplication,
    Tutor, UserProfile,
};
use crate::ports::{DatabaseService, PortError, PortResult};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, UserProfile>,
    auth_sessions: HashMap<String, Uuid>,
    tutors: Vec<Tutor>,
    availability: Vec<AvailabilitySlot>,
    lesson_requests: Vec<LessonRequest>,
    lessons: Vec<Lesson>,
    chats: Vec<Chat>,
    messages: Vec<Message>,
}

#[derive(Default)]
pub struct InMemoryDatabase {
    tables: Mutex<Tables>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Seeding helpers (users and sessions come from the OAuth provider) ---

    pub async fn insert_user(&self, profile: UserProfile) {
        self.tables.lock().await.users.insert(profile.id, profile);
    }

    pub async fn insert_auth_session(&self, session_id: &str, user_id: Uuid) {
        self.tables
            .lock()
            .await
            .auth_sessions
            .insert(session_id.to_string(), user_id);
    }

    /// Flips the approval flag, as an external reviewer would.
    pub async fn set_tutor_approval(&self, tutor_id: Uuid, approved: bool) -> PortResult<()> {
        let mut tables = self.tables.lock().await;
        let tutor = tables
            .tutors
            .iter_mut()
            .find(|t| t.id == tutor_id)
            .ok_or_else(|| PortError::NotFound(format!("Tutor {} not found", tutor_id)))?;
        tutor.approved = approved;
        Ok(())
    }
}

fn sort_newest_first(requests: &mut [LessonRequest]) {
    requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

fn sort_by_schedule(lessons: &mut [Lesson]) {
    lessons.sort_by(|a, b| (a.date, a.start_time).cmp(&(b.date, b.start_time)));
}

#[async_trait]
impl DatabaseService for InMemoryDatabase {
    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        self.tables
            .lock()
            .await
            .auth_sessions
            .get(session_id)
            .copied()
            .ok_or(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        self.tables.lock().await.auth_sessions.remove(session_id);
        Ok(())
    }

    async fn get_user_profiles(&self, user_ids: &[Uuid]) -> PortResult<Vec<UserProfile>> {
        let tables = self.tables.lock().await;
        Ok(user_ids
            .iter()
            .filter_map(|id| tables.users.get(id).cloned())
            .collect())
    }

    async fn list_approved_tutors(&self) -> PortResult<Vec<Tutor>> {
        let tables = self.tables.lock().await;
        Ok(tables.tutors.iter().filter(|t| t.approved).cloned().collect())
    }

    async fn get_tutor(&self, tutor_id: Uuid) -> PortResult<Tutor> {
        let tables = self.tables.lock().await;
        tables
            .tutors
            .iter()
            .find(|t| t.id == tutor_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Tutor {} not found", tutor_id)))
    }

    async fn find_tutor_by_user(&self, user_id: Uuid) -> PortResult<Option<Tutor>> {
        let tables = self.tables.lock().await;
        Ok(tables.tutors.iter().find(|t| t.user_id == user_id).cloned())
    }

    async fn create_tutor_application(
        &self,
        user_id: Uuid,
        application: NewTutorApplication,
    ) -> PortResult<Tutor> {
        let mut tables = self.tables.lock().await;
        if tables.tutors.iter().any(|t| t.user_id == user_id) {
            return Err(PortError::AlreadyExists(format!(
                "User {} already has a tutor profile",
                user_id
            )));
        }
        let tutor = Tutor {
            id: Uuid::new_v4(),
            user_id,
            display_name: application.display_name,
            language: application.language,
            native_language: application.native_language,
            hourly_rate_cents: application.hourly_rate_cents,
            rating: 0.0,
            approved: false,
            avatar_url: application.avatar_url,
            video_url: application.video_url,
            headline: application.headline,
            bio: application.bio,
            created_at: Utc::now(),
        };
        tables.tutors.push(tutor.clone());
        Ok(tutor)
    }

    async fn get_availability(&self, tutor_id: Uuid) -> PortResult<Vec<AvailabilitySlot>> {
        let tables = self.tables.lock().await;
        let mut slots: Vec<AvailabilitySlot> = tables
            .availability
            .iter()
            .filter(|s| s.tutor_id == tutor_id)
            .cloned()
            .collect();
        slots.sort_by_key(|s| (s.weekday.number_from_monday(), s.start_time));
        Ok(slots)
    }

    async fn replace_availability(
        &self,
        tutor_id: Uuid,
        slots: Vec<NewAvailabilitySlot>,
    ) -> PortResult<Vec<AvailabilitySlot>> {
        {
            let mut tables = self.tables.lock().await;
            tables.availability.retain(|s| s.tutor_id != tutor_id);
            tables
                .availability
                .extend(slots.into_iter().map(|slot| AvailabilitySlot {
                    id: Uuid::new_v4(),
                    tutor_id,
                    weekday: slot.weekday,
                    start_time: slot.start_time,
                    end_time: slot.end_time,
                }));
        }
        self.get_availability(tutor_id).await
    }

    async fn create_lesson_request(&self, request: NewLessonRequest) -> PortResult<LessonRequest> {
        let mut tables = self.tables.lock().await;
        let taken = tables.lesson_requests.iter().any(|r| {
            r.tutor_id == request.tutor_id
                && r.date == request.date
                && r.start_time == request.start_time
                && r.status.holds_slot()
        });
        if taken {
            return Err(PortError::AlreadyExists(format!(
                "A live request already holds {} {}",
                request.date, request.start_time
            )));
        }
        let now = Utc::now();
        let stored = LessonRequest {
            id: Uuid::new_v4(),
            tutor_id: request.tutor_id,
            student_id: request.student_id,
            date: request.date,
            start_time: request.start_time,
            end_time: request.end_time,
            status: LessonRequestStatus::Pending,
            student_message: request.student_message,
            tutor_response: None,
            created_at: now,
            updated_at: now,
        };
        tables.lesson_requests.push(stored.clone());
        Ok(stored)
    }

    async fn get_lesson_request(&self, request_id: Uuid) -> PortResult<LessonRequest> {
        let tables = self.tables.lock().await;
        tables
            .lesson_requests
            .iter()
            .find(|r| r.id == request_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Lesson request {} not found", request_id)))
    }

    async fn list_lesson_requests_for_tutor(
        &self,
        tutor_id: Uuid,
        status: Option<LessonRequestStatus>,
    ) -> PortResult<Vec<LessonRequest>> {
        let tables = self.tables.lock().await;
        let mut requests: Vec<LessonRequest> = tables
            .lesson_requests
            .iter()
            .filter(|r| r.tutor_id == tutor_id && status.map_or(true, |s| r.status == s))
            .cloned()
            .collect();
        sort_newest_first(&mut requests);
        Ok(requests)
    }

    async fn list_lesson_requests_for_student(
        &self,
        student_id: Uuid,
    ) -> PortResult<Vec<LessonRequest>> {
        let tables = self.tables.lock().await;
        let mut requests: Vec<LessonRequest> = tables
            .lesson_requests
            .iter()
            .filter(|r| r.student_id == student_id)
            .cloned()
            .collect();
        sort_newest_first(&mut requests);
        Ok(requests)
    }

    async fn list_lesson_requests_in_range(
        &self,
        tutor_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> PortResult<Vec<LessonRequest>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .lesson_requests
            .iter()
            .filter(|r| r.tutor_id == tutor_id && r.date >= from && r.date <= to)
            .cloned()
            .collect())
    }

    async fn resolve_lesson_request(
        &self,
        request_id: Uuid,
        status: LessonRequestStatus,
        tutor_response: &str,
    ) -> PortResult<LessonRequest> {
        let mut tables = self.tables.lock().await;
        let request = tables
            .lesson_requests
            .iter_mut()
            .find(|r| r.id == request_id)
            .ok_or_else(|| PortError::NotFound(format!("Lesson request {} not found", request_id)))?;
        if request.status != LessonRequestStatus::Pending {
            return Err(PortError::InvalidState(format!(
                "Lesson request {} is already {}",
                request_id, request.status
            )));
        }
        request.status = status;
        request.tutor_response = Some(tutor_response.to_string());
        request.updated_at = Utc::now();
        Ok(request.clone())
    }

    async fn insert_lesson(&self, lesson: NewLesson) -> PortResult<Lesson> {
        let mut tables = self.tables.lock().await;
        if tables.lessons.iter().any(|l| l.key() == lesson.key) {
            return Err(PortError::AlreadyExists(format!(
                "Lesson for tutor {} on {} at {} already exists",
                lesson.key.tutor_id, lesson.key.date, lesson.key.start_time
            )));
        }
        let stored = Lesson {
            id: Uuid::new_v4(),
            tutor_id: lesson.key.tutor_id,
            student_id: lesson.key.student_id,
            date: lesson.key.date,
            start_time: lesson.key.start_time,
            end_time: lesson.key.end_time,
            status: LessonStatus::Confirmed,
            lesson_type: lesson.lesson_type,
            price_cents: lesson.price_cents,
            notes: lesson.notes,
            request_id: lesson.request_id,
            created_at: Utc::now(),
        };
        tables.lessons.push(stored.clone());
        Ok(stored)
    }

    async fn find_lesson(&self, key: &LessonKey) -> PortResult<Option<Lesson>> {
        let tables = self.tables.lock().await;
        Ok(tables.lessons.iter().find(|l| &l.key() == key).cloned())
    }

    async fn list_lessons_for_tutor(&self, tutor_id: Uuid) -> PortResult<Vec<Lesson>> {
        let tables = self.tables.lock().await;
        let mut lessons: Vec<Lesson> = tables
            .lessons
            .iter()
            .filter(|l| l.tutor_id == tutor_id)
            .cloned()
            .collect();
        sort_by_schedule(&mut lessons);
        Ok(lessons)
    }

    async fn list_lessons_for_student(&self, student_id: Uuid) -> PortResult<Vec<Lesson>> {
        let tables = self.tables.lock().await;
        let mut lessons: Vec<Lesson> = tables
            .lessons
            .iter()
            .filter(|l| l.student_id == student_id)
            .cloned()
            .collect();
        sort_by_schedule(&mut lessons);
        Ok(lessons)
    }

    async fn list_lessons_in_range(
        &self,
        tutor_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> PortResult<Vec<Lesson>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .lessons
            .iter()
            .filter(|l| l.tutor_id == tutor_id && l.date >= from && l.date <= to)
            .cloned()
            .collect())
    }

    async fn count_lessons_between(&self, tutor_id: Uuid, student_id: Uuid) -> PortResult<i64> {
        let tables = self.tables.lock().await;
        let count = tables
            .lessons
            .iter()
            .filter(|l| l.tutor_id == tutor_id && l.student_id == student_id)
            .count();
        Ok(count as i64)
    }

    async fn find_or_create_chat(&self, user_a: Uuid, user_b: Uuid) -> PortResult<Chat> {
        let (low, high) = Chat::normalise_pair(user_a, user_b);
        let mut tables = self.tables.lock().await;
        if let Some(chat) = tables
            .chats
            .iter()
            .find(|c| c.participant_low == low && c.participant_high == high)
        {
            return Ok(chat.clone());
        }
        let now = Utc::now();
        let chat = Chat {
            id: Uuid::new_v4(),
            participant_low: low,
            participant_high: high,
            created_at: now,
            updated_at: now,
        };
        tables.chats.push(chat.clone());
        Ok(chat)
    }

    async fn get_chat(&self, chat_id: Uuid) -> PortResult<Chat> {
        let tables = self.tables.lock().await;
        tables
            .chats
            .iter()
            .find(|c| c.id == chat_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Chat {} not found", chat_id)))
    }

    async fn list_chats_for_user(&self, user_id: Uuid) -> PortResult<Vec<Chat>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .chats
            .iter()
            .filter(|c| c.has_participant(user_id))
            .cloned()
            .collect())
    }

    async fn insert_message(&self, message: NewMessage) -> PortResult<Message> {
        let mut tables = self.tables.lock().await;
        let now = Utc::now();
        let chat = tables
            .chats
            .iter_mut()
            .find(|c| c.id == message.chat_id)
            .ok_or_else(|| PortError::NotFound(format!("Chat {} not found", message.chat_id)))?;
        chat.updated_at = now;
        let stored = Message {
            id: Uuid::new_v4(),
            chat_id: message.chat_id,
            sender_id: message.sender_id,
            content: message.content,
            created_at: now,
        };
        tables.messages.push(stored.clone());
        Ok(stored)
    }

    async fn list_messages(&self, chat_id: Uuid) -> PortResult<Vec<Message>> {
        let tables = self.tables.lock().await;
        let mut messages: Vec<Message> = tables
            .messages
            .iter()
            .filter(|m| m.chat_id == chat_id)
            .cloned()
            .collect();
        messages.sort_by_key(|m| m.created_at);
        Ok(messages)
    }

    async fn latest_message(&self, chat_id: Uuid) -> PortResult<Option<Message>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .messages
            .iter()
            .filter(|m| m.chat_id == chat_id)
            .max_by_key(|m| m.created_at)
            .cloned())
    }
}
