//! crates/tutors_core/src/domain.rs
//!
//! Defines the pure, core data structures for the marketplace.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc, Weekday};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

//=========================================================================================
// Users and Tutors
//=========================================================================================

/// Public display information about a user identity.
#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    pub id: Uuid,
    pub display_name: String,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
}

/// A marketplace-side tutor profile, distinct from the underlying user identity.
#[derive(Debug, Clone, PartialEq)]
pub struct Tutor {
    pub id: Uuid,
    pub user_id: Uuid,
    pub display_name: String,
    pub language: String,
    pub native_language: String,
    pub hourly_rate_cents: i64,
    pub rating: f32,
    pub approved: bool,
    pub avatar_url: Option<String>,
    pub video_url: Option<String>,
    pub headline: String,
    pub bio: String,
    pub created_at: DateTime<Utc>,
}

/// The fields a user submits when applying to become a tutor.
#[derive(Debug, Clone)]
pub struct NewTutorApplication {
    pub display_name: String,
    pub language: String,
    pub native_language: String,
    pub hourly_rate_cents: i64,
    pub avatar_url: Option<String>,
    pub video_url: Option<String>,
    pub headline: String,
    pub bio: String,
}

//=========================================================================================
// Availability
//=========================================================================================

/// A recurring weekly window in which a tutor accepts lessons.
#[derive(Debug, Clone, PartialEq)]
pub struct AvailabilitySlot {
    pub id: Uuid,
    pub tutor_id: Uuid,
    pub weekday: Weekday,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl AvailabilitySlot {
    /// True when this slot fully covers `[start, end)` on `weekday`.
    pub fn covers(&self, weekday: Weekday, start: NaiveTime, end: NaiveTime) -> bool {
        self.weekday == weekday && self.start_time <= start && end <= self.end_time
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewAvailabilitySlot {
    pub weekday: Weekday,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

/// Converts an ISO weekday number (Monday = 1 .. Sunday = 7) into a `Weekday`.
pub fn weekday_from_iso(number: u32) -> Option<Weekday> {
    match number {
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        7 => Some(Weekday::Sun),
        _ => None,
    }
}

/// Half-open interval overlap on a single day.
pub fn times_overlap(a_start: NaiveTime, a_end: NaiveTime, b_start: NaiveTime, b_end: NaiveTime) -> bool {
    a_start < b_end && b_start < a_end
}

//=========================================================================================
// Status Enums
//=========================================================================================

/// Returned when a stored status string does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} value '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LessonRequestStatus {
    Pending,
    Approved,
    Declined,
}

impl LessonRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LessonRequestStatus::Pending => "pending",
            LessonRequestStatus::Approved => "approved",
            LessonRequestStatus::Declined => "declined",
        }
    }

    /// A request leaves `Pending` exactly once and never moves backward.
    pub fn can_transition_to(&self, next: LessonRequestStatus) -> bool {
        matches!(
            (self, next),
            (LessonRequestStatus::Pending, LessonRequestStatus::Approved)
                | (LessonRequestStatus::Pending, LessonRequestStatus::Declined)
        )
    }

    /// Pending and approved requests occupy their slot; declined ones free it.
    pub fn holds_slot(&self) -> bool {
        !matches!(self, LessonRequestStatus::Declined)
    }
}

impl FromStr for LessonRequestStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(LessonRequestStatus::Pending),
            // Older rows used "confirmed" and "rejected".
            "approved" | "confirmed" => Ok(LessonRequestStatus::Approved),
            "declined" | "rejected" => Ok(LessonRequestStatus::Declined),
            other => Err(UnknownVariant {
                kind: "lesson request status",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for LessonRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LessonStatus {
    Confirmed,
    Completed,
    Cancelled,
}

impl LessonStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LessonStatus::Confirmed => "confirmed",
            LessonStatus::Completed => "completed",
            LessonStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for LessonStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmed" | "scheduled" => Ok(LessonStatus::Confirmed),
            "completed" => Ok(LessonStatus::Completed),
            "cancelled" => Ok(LessonStatus::Cancelled),
            other => Err(UnknownVariant {
                kind: "lesson status",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LessonType {
    Trial,
    Regular,
}

impl LessonType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LessonType::Trial => "trial",
            LessonType::Regular => "regular",
        }
    }
}

impl FromStr for LessonType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trial" => Ok(LessonType::Trial),
            "regular" => Ok(LessonType::Regular),
            other => Err(UnknownVariant {
                kind: "lesson type",
                value: other.to_string(),
            }),
        }
    }
}

//=========================================================================================
// Lesson Requests and Lessons
//=========================================================================================

/// Identifies a lesson uniquely; storage enforces at most one lesson per key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LessonKey {
    pub tutor_id: Uuid,
    pub student_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

/// A student-initiated proposal for a specific lesson, subject to tutor approval.
#[derive(Debug, Clone, PartialEq)]
pub struct LessonRequest {
    pub id: Uuid,
    pub tutor_id: Uuid,
    pub student_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: LessonRequestStatus,
    pub student_message: Option<String>,
    pub tutor_response: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LessonRequest {
    pub fn key(&self) -> LessonKey {
        LessonKey {
            tutor_id: self.tutor_id,
            student_id: self.student_id,
            date: self.date,
            start_time: self.start_time,
            end_time: self.end_time,
        }
    }

    pub fn overlaps(&self, date: NaiveDate, start: NaiveTime, end: NaiveTime) -> bool {
        self.date == date && times_overlap(self.start_time, self.end_time, start, end)
    }
}

#[derive(Debug, Clone)]
pub struct NewLessonRequest {
    pub tutor_id: Uuid,
    pub student_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub student_message: Option<String>,
}

/// A confirmed, scheduled teaching session.
#[derive(Debug, Clone, PartialEq)]
pub struct Lesson {
    pub id: Uuid,
    pub tutor_id: Uuid,
    pub student_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: LessonStatus,
    pub lesson_type: LessonType,
    pub price_cents: i64,
    pub notes: Option<String>,
    pub request_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Lesson {
    pub fn key(&self) -> LessonKey {
        LessonKey {
            tutor_id: self.tutor_id,
            student_id: self.student_id,
            date: self.date,
            start_time: self.start_time,
            end_time: self.end_time,
        }
    }

    pub fn overlaps(&self, date: NaiveDate, start: NaiveTime, end: NaiveTime) -> bool {
        self.status != LessonStatus::Cancelled
            && self.date == date
            && times_overlap(self.start_time, self.end_time, start, end)
    }
}

#[derive(Debug, Clone)]
pub struct NewLesson {
    pub key: LessonKey,
    pub lesson_type: LessonType,
    pub price_cents: i64,
    pub notes: Option<String>,
    pub request_id: Option<Uuid>,
}

/// Highest hourly rate a tutor can apply with, in cents.
pub const MAX_HOURLY_RATE_CENTS: i64 = 100_000_000;

/// Price of a lesson at `hourly_rate_cents`, rounded half-up to a whole cent.
/// `None` when the amount does not fit in an `i64`.
pub fn lesson_price(hourly_rate_cents: i64, start: NaiveTime, end: NaiveTime) -> Option<i64> {
    let minutes = (end - start).num_minutes().max(0);
    hourly_rate_cents
        .checked_mul(minutes)?
        .checked_add(30)
        .map(|total| total / 60)
}

//=========================================================================================
// Chats and Messages
//=========================================================================================

/// An unordered pairing of two users enabling message exchange.
///
/// The pair is stored normalised so that `participant_low < participant_high`.
#[derive(Debug, Clone, PartialEq)]
pub struct Chat {
    pub id: Uuid,
    pub participant_low: Uuid,
    pub participant_high: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Chat {
    /// Orders two participant ids into the canonical `(low, high)` pair.
    pub fn normalise_pair(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }

    pub fn has_participant(&self, user_id: Uuid) -> bool {
        self.participant_low == user_id || self.participant_high == user_id
    }

    /// The other participant, or `None` if `user_id` is not part of this chat.
    pub fn peer_of(&self, user_id: Uuid) -> Option<Uuid> {
        if self.participant_low == user_id {
            Some(self.participant_high)
        } else if self.participant_high == user_id {
            Some(self.participant_low)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: Uuid,
    pub chat_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub chat_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
}

/// A chat as shown in the user's inbox.
#[derive(Debug, Clone)]
pub struct ChatSummary {
    pub chat: Chat,
    pub peer: UserProfile,
    pub last_message: Option<Message>,
}
