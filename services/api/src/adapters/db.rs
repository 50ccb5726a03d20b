//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.
//!
//! Uniqueness rules (one lesson per key, one live request per slot, one chat per
//! pair, one tutor profile per user) live in the schema; unique violations come
//! back from here as `PortError::AlreadyExists`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::{FromRow, PgPool};
use tutors_core::domain::{
    weekday_from_iso, AvailabilitySlot, Chat, Lesson, LessonKey, LessonRequest,
    LessonRequestStatus, Message, NewAvailabilitySlot, NewLesson, NewLessonRequest, NewMessage,
    NewTutorApplication, Tutor, UserProfile,
};
use tutors_core::ports::{DatabaseService, PortError, PortResult};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Runs the embedded migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

/// Maps a `sqlx` error onto the port's error vocabulary.
fn map_sqlx(err: sqlx::Error, what: impl Fn() -> String) -> PortError {
    match err {
        sqlx::Error::RowNotFound => PortError::NotFound(format!("{} not found", what())),
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            PortError::AlreadyExists(what())
        }
        other => PortError::Unexpected(other.to_string()),
    }
}

fn unexpected(err: sqlx::Error) -> PortError {
    PortError::Unexpected(err.to_string())
}

fn corrupt(err: impl std::fmt::Display) -> PortError {
    PortError::Unexpected(format!("Corrupt row: {}", err))
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    display_name: String,
    email: Option<String>,
    avatar_url: Option<String>,
}
impl UserRecord {
    fn to_domain(self) -> UserProfile {
        UserProfile {
            id: self.id,
            display_name: self.display_name,
            email: self.email,
            avatar_url: self.avatar_url,
        }
    }
}

const TUTOR_COLUMNS: &str = "id, user_id, display_name, language, native_language, \
    hourly_rate_cents, rating, approved, avatar_url, video_url, headline, bio, created_at";

#[derive(FromRow)]
struct TutorRecord {
    id: Uuid,
    user_id: Uuid,
    display_name: String,
    language: String,
    native_language: String,
    hourly_rate_cents: i64,
    rating: f32,
    approved: bool,
    avatar_url: Option<String>,
    video_url: Option<String>,
    headline: String,
    bio: String,
    created_at: DateTime<Utc>,
}
impl TutorRecord {
    fn to_domain(self) -> Tutor {
        Tutor {
            id: self.id,
            user_id: self.user_id,
            display_name: self.display_name,
            language: self.language,
            native_language: self.native_language,
            hourly_rate_cents: self.hourly_rate_cents,
            rating: self.rating,
            approved: self.approved,
            avatar_url: self.avatar_url,
            video_url: self.video_url,
            headline: self.headline,
            bio: self.bio,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct AvailabilityRecord {
    id: Uuid,
    tutor_id: Uuid,
    weekday: i16,
    start_time: NaiveTime,
    end_time: NaiveTime,
}
impl AvailabilityRecord {
    fn to_domain(self) -> PortResult<AvailabilitySlot> {
        let weekday = u32::try_from(self.weekday)
            .ok()
            .and_then(weekday_from_iso)
            .ok_or_else(|| corrupt(format!("weekday {}", self.weekday)))?;
        Ok(AvailabilitySlot {
            id: self.id,
            tutor_id: self.tutor_id,
            weekday,
            start_time: self.start_time,
            end_time: self.end_time,
        })
    }
}

const REQUEST_COLUMNS: &str = "id, tutor_id, student_id, lesson_date, start_time, end_time, \
    status, student_message, tutor_response, created_at, updated_at";

#[derive(FromRow)]
struct LessonRequestRecord {
    id: Uuid,
    tutor_id: Uuid,
    student_id: Uuid,
    lesson_date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
    status: String,
    student_message: Option<String>,
    tutor_response: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl LessonRequestRecord {
    fn to_domain(self) -> PortResult<LessonRequest> {
        Ok(LessonRequest {
            id: self.id,
            tutor_id: self.tutor_id,
            student_id: self.student_id,
            date: self.lesson_date,
            start_time: self.start_time,
            end_time: self.end_time,
            status: self.status.parse().map_err(corrupt)?,
            student_message: self.student_message,
            tutor_response: self.tutor_response,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const LESSON_COLUMNS: &str = "id, tutor_id, student_id, lesson_date, start_time, end_time, \
    status, lesson_type, price_cents, notes, request_id, created_at";

#[derive(FromRow)]
struct LessonRecord {
    id: Uuid,
    tutor_id: Uuid,
    student_id: Uuid,
    lesson_date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
    status: String,
    lesson_type: String,
    price_cents: i64,
    notes: Option<String>,
    request_id: Option<Uuid>,
    created_at: DateTime<Utc>,
}
impl LessonRecord {
    fn to_domain(self) -> PortResult<Lesson> {
        Ok(Lesson {
            id: self.id,
            tutor_id: self.tutor_id,
            student_id: self.student_id,
            date: self.lesson_date,
            start_time: self.start_time,
            end_time: self.end_time,
            status: self.status.parse().map_err(corrupt)?,
            lesson_type: self.lesson_type.parse().map_err(corrupt)?,
            price_cents: self.price_cents,
            notes: self.notes,
            request_id: self.request_id,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct ChatRecord {
    id: Uuid,
    participant_low: Uuid,
    participant_high: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl ChatRecord {
    fn to_domain(self) -> Chat {
        Chat {
            id: self.id,
            participant_low: self.participant_low,
            participant_high: self.participant_high,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(FromRow)]
struct MessageRecord {
    id: Uuid,
    chat_id: Uuid,
    sender_id: Uuid,
    content: String,
    created_at: DateTime<Utc>,
}
impl MessageRecord {
    fn to_domain(self) -> Message {
        Message {
            id: self.id,
            chat_id: self.chat_id,
            sender_id: self.sender_id,
            content: self.content,
            created_at: self.created_at,
        }
    }
}

fn requests_to_domain(records: Vec<LessonRequestRecord>) -> PortResult<Vec<LessonRequest>> {
    records.into_iter().map(LessonRequestRecord::to_domain).collect()
}

fn lessons_to_domain(records: Vec<LessonRecord>) -> PortResult<Vec<Lesson>> {
    records.into_iter().map(LessonRecord::to_domain).collect()
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let user_id: Option<(Uuid,)> = sqlx::query_as(
            "SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > now()",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        user_id.map(|(id,)| id).ok_or(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn get_user_profiles(&self, user_ids: &[Uuid]) -> PortResult<Vec<UserProfile>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        let records = sqlx::query_as::<_, UserRecord>(
            "SELECT id, display_name, email, avatar_url FROM users WHERE id = ANY($1)",
        )
        .bind(user_ids.to_vec())
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(UserRecord::to_domain).collect())
    }

    async fn list_approved_tutors(&self) -> PortResult<Vec<Tutor>> {
        let records = sqlx::query_as::<_, TutorRecord>(&format!(
            "SELECT {} FROM tutors WHERE approved ORDER BY rating DESC, created_at ASC",
            TUTOR_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(TutorRecord::to_domain).collect())
    }

    async fn get_tutor(&self, tutor_id: Uuid) -> PortResult<Tutor> {
        let record = sqlx::query_as::<_, TutorRecord>(&format!(
            "SELECT {} FROM tutors WHERE id = $1",
            TUTOR_COLUMNS
        ))
        .bind(tutor_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx(e, || format!("Tutor {}", tutor_id)))?;
        Ok(record.to_domain())
    }

    async fn find_tutor_by_user(&self, user_id: Uuid) -> PortResult<Option<Tutor>> {
        let record = sqlx::query_as::<_, TutorRecord>(&format!(
            "SELECT {} FROM tutors WHERE user_id = $1",
            TUTOR_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(TutorRecord::to_domain))
    }

    async fn create_tutor_application(
        &self,
        user_id: Uuid,
        application: NewTutorApplication,
    ) -> PortResult<Tutor> {
        let record = sqlx::query_as::<_, TutorRecord>(&format!(
            "INSERT INTO tutors (id, user_id, display_name, language, native_language, \
             hourly_rate_cents, avatar_url, video_url, headline, bio) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING {}",
            TUTOR_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(application.display_name)
        .bind(application.language)
        .bind(application.native_language)
        .bind(application.hourly_rate_cents)
        .bind(application.avatar_url)
        .bind(application.video_url)
        .bind(application.headline)
        .bind(application.bio)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx(e, || format!("User {} already has a tutor profile", user_id)))?;
        Ok(record.to_domain())
    }

    async fn get_availability(&self, tutor_id: Uuid) -> PortResult<Vec<AvailabilitySlot>> {
        let records = sqlx::query_as::<_, AvailabilityRecord>(
            "SELECT id, tutor_id, weekday, start_time, end_time FROM tutor_availability \
             WHERE tutor_id = $1 ORDER BY weekday, start_time",
        )
        .bind(tutor_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        records.into_iter().map(AvailabilityRecord::to_domain).collect()
    }

    async fn replace_availability(
        &self,
        tutor_id: Uuid,
        slots: Vec<NewAvailabilitySlot>,
    ) -> PortResult<Vec<AvailabilitySlot>> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;
        sqlx::query("DELETE FROM tutor_availability WHERE tutor_id = $1")
            .bind(tutor_id)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;

        let mut stored = Vec::with_capacity(slots.len());
        for slot in slots {
            let record = sqlx::query_as::<_, AvailabilityRecord>(
                "INSERT INTO tutor_availability (id, tutor_id, weekday, start_time, end_time) \
                 VALUES ($1, $2, $3, $4, $5) RETURNING id, tutor_id, weekday, start_time, end_time",
            )
            .bind(Uuid::new_v4())
            .bind(tutor_id)
            .bind(slot.weekday.number_from_monday() as i16)
            .bind(slot.start_time)
            .bind(slot.end_time)
            .fetch_one(&mut *tx)
            .await
            .map_err(unexpected)?;
            stored.push(record.to_domain()?);
        }
        tx.commit().await.map_err(unexpected)?;
        Ok(stored)
    }

    async fn create_lesson_request(&self, request: NewLessonRequest) -> PortResult<LessonRequest> {
        let record = sqlx::query_as::<_, LessonRequestRecord>(&format!(
            "INSERT INTO lesson_requests (id, tutor_id, student_id, lesson_date, start_time, \
             end_time, status, student_message) \
             VALUES ($1, $2, $3, $4, $5, $6, 'pending', $7) RETURNING {}",
            REQUEST_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(request.tutor_id)
        .bind(request.student_id)
        .bind(request.date)
        .bind(request.start_time)
        .bind(request.end_time)
        .bind(request.student_message)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            map_sqlx(e, || {
                format!(
                    "Slot {} {} for tutor {}",
                    request.date, request.start_time, request.tutor_id
                )
            })
        })?;
        record.to_domain()
    }

    async fn get_lesson_request(&self, request_id: Uuid) -> PortResult<LessonRequest> {
        let record = sqlx::query_as::<_, LessonRequestRecord>(&format!(
            "SELECT {} FROM lesson_requests WHERE id = $1",
            REQUEST_COLUMNS
        ))
        .bind(request_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx(e, || format!("Lesson request {}", request_id)))?;
        record.to_domain()
    }

    async fn list_lesson_requests_for_tutor(
        &self,
        tutor_id: Uuid,
        status: Option<LessonRequestStatus>,
    ) -> PortResult<Vec<LessonRequest>> {
        let records = sqlx::query_as::<_, LessonRequestRecord>(&format!(
            "SELECT {} FROM lesson_requests WHERE tutor_id = $1 \
             AND ($2::text IS NULL OR status = $2) ORDER BY created_at DESC",
            REQUEST_COLUMNS
        ))
        .bind(tutor_id)
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        requests_to_domain(records)
    }

    async fn list_lesson_requests_for_student(
        &self,
        student_id: Uuid,
    ) -> PortResult<Vec<LessonRequest>> {
        let records = sqlx::query_as::<_, LessonRequestRecord>(&format!(
            "SELECT {} FROM lesson_requests WHERE student_id = $1 ORDER BY created_at DESC",
            REQUEST_COLUMNS
        ))
        .bind(student_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        requests_to_domain(records)
    }

    async fn list_lesson_requests_in_range(
        &self,
        tutor_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> PortResult<Vec<LessonRequest>> {
        let records = sqlx::query_as::<_, LessonRequestRecord>(&format!(
            "SELECT {} FROM lesson_requests WHERE tutor_id = $1 \
             AND lesson_date BETWEEN $2 AND $3 ORDER BY lesson_date, start_time",
            REQUEST_COLUMNS
        ))
        .bind(tutor_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        requests_to_domain(records)
    }

    async fn resolve_lesson_request(
        &self,
        request_id: Uuid,
        status: LessonRequestStatus,
        tutor_response: &str,
    ) -> PortResult<LessonRequest> {
        if !LessonRequestStatus::Pending.can_transition_to(status) {
            return Err(PortError::InvalidState(format!(
                "Cannot resolve a request to {}",
                status
            )));
        }
        let record = sqlx::query_as::<_, LessonRequestRecord>(&format!(
            "UPDATE lesson_requests SET status = $2, tutor_response = $3, updated_at = now() \
             WHERE id = $1 AND status = 'pending' RETURNING {}",
            REQUEST_COLUMNS
        ))
        .bind(request_id)
        .bind(status.as_str())
        .bind(tutor_response)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        match record {
            Some(record) => record.to_domain(),
            None => {
                // Either the request is gone or someone else resolved it first.
                let current = self.get_lesson_request(request_id).await?;
                Err(PortError::InvalidState(format!(
                    "Lesson request {} is already {}",
                    request_id, current.status
                )))
            }
        }
    }

    async fn insert_lesson(&self, lesson: NewLesson) -> PortResult<Lesson> {
        let key = lesson.key;
        let record = sqlx::query_as::<_, LessonRecord>(&format!(
            "INSERT INTO lessons (id, tutor_id, student_id, lesson_date, start_time, end_time, \
             status, lesson_type, price_cents, notes, request_id) \
             VALUES ($1, $2, $3, $4, $5, $6, 'confirmed', $7, $8, $9, $10) RETURNING {}",
            LESSON_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(key.tutor_id)
        .bind(key.student_id)
        .bind(key.date)
        .bind(key.start_time)
        .bind(key.end_time)
        .bind(lesson.lesson_type.as_str())
        .bind(lesson.price_cents)
        .bind(lesson.notes)
        .bind(lesson.request_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            map_sqlx(e, || {
                format!(
                    "Lesson for tutor {} on {} at {}",
                    key.tutor_id, key.date, key.start_time
                )
            })
        })?;
        record.to_domain()
    }

    async fn find_lesson(&self, key: &LessonKey) -> PortResult<Option<Lesson>> {
        let record = sqlx::query_as::<_, LessonRecord>(&format!(
            "SELECT {} FROM lessons WHERE tutor_id = $1 AND student_id = $2 \
             AND lesson_date = $3 AND start_time = $4 AND end_time = $5",
            LESSON_COLUMNS
        ))
        .bind(key.tutor_id)
        .bind(key.student_id)
        .bind(key.date)
        .bind(key.start_time)
        .bind(key.end_time)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        record.map(LessonRecord::to_domain).transpose()
    }

    async fn list_lessons_for_tutor(&self, tutor_id: Uuid) -> PortResult<Vec<Lesson>> {
        let records = sqlx::query_as::<_, LessonRecord>(&format!(
            "SELECT {} FROM lessons WHERE tutor_id = $1 ORDER BY lesson_date, start_time",
            LESSON_COLUMNS
        ))
        .bind(tutor_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        lessons_to_domain(records)
    }

    async fn list_lessons_for_student(&self, student_id: Uuid) -> PortResult<Vec<Lesson>> {
        let records = sqlx::query_as::<_, LessonRecord>(&format!(
            "SELECT {} FROM lessons WHERE student_id = $1 ORDER BY lesson_date, start_time",
            LESSON_COLUMNS
        ))
        .bind(student_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        lessons_to_domain(records)
    }

    async fn list_lessons_in_range(
        &self,
        tutor_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> PortResult<Vec<Lesson>> {
        let records = sqlx::query_as::<_, LessonRecord>(&format!(
            "SELECT {} FROM lessons WHERE tutor_id = $1 \
             AND lesson_date BETWEEN $2 AND $3 ORDER BY lesson_date, start_time",
            LESSON_COLUMNS
        ))
        .bind(tutor_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        lessons_to_domain(records)
    }

    async fn count_lessons_between(&self, tutor_id: Uuid, student_id: Uuid) -> PortResult<i64> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM lessons WHERE tutor_id = $1 AND student_id = $2",
        )
        .bind(tutor_id)
        .bind(student_id)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(count)
    }

    async fn find_or_create_chat(&self, user_a: Uuid, user_b: Uuid) -> PortResult<Chat> {
        let (low, high) = Chat::normalise_pair(user_a, user_b);
        sqlx::query(
            "INSERT INTO chats (id, participant_low, participant_high) VALUES ($1, $2, $3) \
             ON CONFLICT (participant_low, participant_high) DO NOTHING",
        )
        .bind(Uuid::new_v4())
        .bind(low)
        .bind(high)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;

        let record = sqlx::query_as::<_, ChatRecord>(
            "SELECT id, participant_low, participant_high, created_at, updated_at FROM chats \
             WHERE participant_low = $1 AND participant_high = $2",
        )
        .bind(low)
        .bind(high)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx(e, || format!("Chat between {} and {}", low, high)))?;
        Ok(record.to_domain())
    }

    async fn get_chat(&self, chat_id: Uuid) -> PortResult<Chat> {
        let record = sqlx::query_as::<_, ChatRecord>(
            "SELECT id, participant_low, participant_high, created_at, updated_at FROM chats \
             WHERE id = $1",
        )
        .bind(chat_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx(e, || format!("Chat {}", chat_id)))?;
        Ok(record.to_domain())
    }

    async fn list_chats_for_user(&self, user_id: Uuid) -> PortResult<Vec<Chat>> {
        let records = sqlx::query_as::<_, ChatRecord>(
            "SELECT id, participant_low, participant_high, created_at, updated_at FROM chats \
             WHERE participant_low = $1 OR participant_high = $1 ORDER BY updated_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(ChatRecord::to_domain).collect())
    }

    async fn insert_message(&self, message: NewMessage) -> PortResult<Message> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;
        let record = sqlx::query_as::<_, MessageRecord>(
            "INSERT INTO messages (id, chat_id, sender_id, content) VALUES ($1, $2, $3, $4) \
             RETURNING id, chat_id, sender_id, content, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(message.chat_id)
        .bind(message.sender_id)
        .bind(&message.content)
        .fetch_one(&mut *tx)
        .await
        .map_err(unexpected)?;

        sqlx::query("UPDATE chats SET updated_at = $2 WHERE id = $1")
            .bind(message.chat_id)
            .bind(record.created_at)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        tx.commit().await.map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn list_messages(&self, chat_id: Uuid) -> PortResult<Vec<Message>> {
        let records = sqlx::query_as::<_, MessageRecord>(
            "SELECT id, chat_id, sender_id, content, created_at FROM messages \
             WHERE chat_id = $1 ORDER BY created_at ASC",
        )
        .bind(chat_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(MessageRecord::to_domain).collect())
    }

    async fn latest_message(&self, chat_id: Uuid) -> PortResult<Option<Message>> {
        let record = sqlx::query_as::<_, MessageRecord>(
            "SELECT id, chat_id, sender_id, content, created_at FROM messages \
             WHERE chat_id = $1 ORDER BY created_at DESC LIMIT 1",
        )
        .bind(chat_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(MessageRecord::to_domain))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    #[test]
    fn availability_rows_decode_iso_weekdays() {
        let record = AvailabilityRecord {
            id: Uuid::new_v4(),
            tutor_id: Uuid::new_v4(),
            weekday: 3,
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
        };
        assert_eq!(record.to_domain().unwrap().weekday, Weekday::Wed);
    }

    #[test]
    fn out_of_range_weekday_is_reported_as_corrupt() {
        let record = AvailabilityRecord {
            id: Uuid::new_v4(),
            tutor_id: Uuid::new_v4(),
            weekday: 0,
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
        };
        assert!(matches!(record.to_domain(), Err(PortError::Unexpected(_))));
    }

    #[test]
    fn legacy_request_statuses_still_decode() {
        let now = Utc::now();
        let record = LessonRequestRecord {
            id: Uuid::new_v4(),
            tutor_id: Uuid::new_v4(),
            student_id: Uuid::new_v4(),
            lesson_date: NaiveDate::from_ymd_opt(2024, 6, 12).unwrap(),
            start_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
            status: "rejected".to_string(),
            student_message: None,
            tutor_response: None,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(
            record.to_domain().unwrap().status,
            LessonRequestStatus::Declined
        );
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        let err = map_sqlx(sqlx::Error::RowNotFound, || "Chat 1".to_string());
        assert!(matches!(err, PortError::NotFound(msg) if msg == "Chat 1 not found"));
    }
}
