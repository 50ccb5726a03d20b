//! services/api/src/web/dto.rs
//!
//! Request and response payloads of the REST API. The core domain carries no
//! serialization concerns; everything that crosses the wire is defined here.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use tutors_core::booking::{GridCell, GridDay};
use tutors_core::domain::{weekday_from_iso, NewAvailabilitySlot, NewTutorApplication};
use tutors_core::{
    Approval, AvailabilitySlot, BookingGrid, ChatSummary, Dashboard, Lesson, LessonRequest,
    Message, PortError, PortResult, Tutor, TutorFilter, TutorSort, UserProfile,
};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

//=========================================================================================
// Users and Tutors
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub display_name: String,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
}

impl From<UserProfile> for UserResponse {
    fn from(user: UserProfile) -> Self {
        Self {
            id: user.id,
            display_name: user.display_name,
            email: user.email,
            avatar_url: user.avatar_url,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct TutorResponse {
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

impl From<Tutor> for TutorResponse {
    fn from(t: Tutor) -> Self {
        Self {
            id: t.id,
            user_id: t.user_id,
            display_name: t.display_name,
            language: t.language,
            native_language: t.native_language,
            hourly_rate_cents: t.hourly_rate_cents,
            rating: t.rating,
            approved: t.approved,
            avatar_url: t.avatar_url,
            video_url: t.video_url,
            headline: t.headline,
            bio: t.bio,
            created_at: t.created_at,
        }
    }
}

/// Query string of `GET /tutors`.
#[derive(Deserialize, IntoParams, Default)]
#[into_params(parameter_in = Query)]
pub struct TutorListQuery {
    /// Taught or native language, case insensitive.
    pub language: Option<String>,
    pub min_price_cents: Option<i64>,
    pub max_price_cents: Option<i64>,
    /// Free text matched against name, headline, bio and languages.
    pub search: Option<String>,
    /// One of `rating` (default), `price_asc`, `price_desc`.
    pub sort: Option<String>,
}

impl TutorListQuery {
    pub fn into_filter(self) -> PortResult<TutorFilter> {
        Ok(TutorFilter {
            language: self.language,
            min_price_cents: self.min_price_cents,
            max_price_cents: self.max_price_cents,
            search: self.search,
            sort: self.sort.as_deref().map(str::parse::<TutorSort>).transpose()?.unwrap_or_default(),
        })
    }
}

#[derive(Deserialize, ToSchema)]
pub struct TutorApplicationRequest {
    pub display_name: String,
    pub language: String,
    pub native_language: String,
    pub hourly_rate_cents: i64,
    pub avatar_url: Option<String>,
    pub video_url: Option<String>,
    #[serde(default)]
    pub headline: String,
    #[serde(default)]
    pub bio: String,
}

impl From<TutorApplicationRequest> for NewTutorApplication {
    fn from(req: TutorApplicationRequest) -> Self {
        Self {
            display_name: req.display_name,
            language: req.language,
            native_language: req.native_language,
            hourly_rate_cents: req.hourly_rate_cents,
            avatar_url: req.avatar_url,
            video_url: req.video_url,
            headline: req.headline,
            bio: req.bio,
        }
    }
}

/// `GET /tutors/application` answers with `application: null` before the user applies.
#[derive(Serialize, ToSchema)]
pub struct MyApplicationResponse {
    pub application: Option<TutorResponse>,
}

//=========================================================================================
// Schedule and Availability
//=========================================================================================

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ScheduleQuery {
    /// Any date in the wanted week; defaults to the current week.
    pub week: Option<NaiveDate>,
}

#[derive(Serialize, ToSchema)]
pub struct GridCellResponse {
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    /// `available`, `pending`, `confirmed` or `unavailable`.
    pub status: String,
    pub bookable: bool,
}

impl From<&GridCell> for GridCellResponse {
    fn from(cell: &GridCell) -> Self {
        Self {
            start_time: cell.start_time,
            end_time: cell.end_time,
            status: cell.status.as_str().to_string(),
            bookable: cell.status.is_bookable(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct GridDayResponse {
    pub date: NaiveDate,
    /// ISO weekday, Monday = 1.
    pub weekday: u32,
    pub cells: Vec<GridCellResponse>,
}

impl From<&GridDay> for GridDayResponse {
    fn from(day: &GridDay) -> Self {
        Self {
            date: day.date,
            weekday: day.weekday.number_from_monday(),
            cells: day.cells.iter().map(GridCellResponse::from).collect(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ScheduleResponse {
    pub tutor_id: Uuid,
    pub week_start: NaiveDate,
    pub previous_week: NaiveDate,
    pub next_week: NaiveDate,
    pub days: Vec<GridDayResponse>,
}

impl From<BookingGrid> for ScheduleResponse {
    fn from(grid: BookingGrid) -> Self {
        Self {
            tutor_id: grid.tutor_id,
            week_start: grid.week_start,
            previous_week: grid.previous_week,
            next_week: grid.next_week,
            days: grid.days.iter().map(GridDayResponse::from).collect(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct AvailabilitySlotResponse {
    pub id: Uuid,
    pub tutor_id: Uuid,
    /// ISO weekday, Monday = 1.
    pub weekday: u32,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl From<AvailabilitySlot> for AvailabilitySlotResponse {
    fn from(slot: AvailabilitySlot) -> Self {
        Self {
            id: slot.id,
            tutor_id: slot.tutor_id,
            weekday: slot.weekday.number_from_monday(),
            start_time: slot.start_time,
            end_time: slot.end_time,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct AvailabilitySlotPayload {
    /// ISO weekday, Monday = 1 .. Sunday = 7.
    pub weekday: u32,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Deserialize, ToSchema)]
pub struct SetAvailabilityRequest {
    pub slots: Vec<AvailabilitySlotPayload>,
}

impl SetAvailabilityRequest {
    pub fn into_slots(self) -> PortResult<Vec<NewAvailabilitySlot>> {
        self.slots
            .into_iter()
            .map(|s| {
                let weekday = weekday_from_iso(s.weekday).ok_or_else(|| {
                    PortError::Validation(format!("weekday must be 1..=7, got {}", s.weekday))
                })?;
                Ok(NewAvailabilitySlot {
                    weekday,
                    start_time: s.start_time,
                    end_time: s.end_time,
                })
            })
            .collect()
    }
}

//=========================================================================================
// Lesson Requests and Lessons
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct CreateLessonRequestBody {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub message: Option<String>,
}

#[derive(Serialize, ToSchema, Debug, Clone)]
pub struct LessonRequestResponse {
    pub id: Uuid,
    pub tutor_id: Uuid,
    pub student_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    /// `pending`, `approved` or `declined`.
    pub status: String,
    pub student_message: Option<String>,
    pub tutor_response: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<LessonRequest> for LessonRequestResponse {
    fn from(r: LessonRequest) -> Self {
        Self {
            id: r.id,
            tutor_id: r.tutor_id,
            student_id: r.student_id,
            date: r.date,
            start_time: r.start_time,
            end_time: r.end_time,
            status: r.status.as_str().to_string(),
            student_message: r.student_message,
            tutor_response: r.tutor_response,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Serialize, ToSchema, Debug, Clone)]
pub struct LessonResponse {
    pub id: Uuid,
    pub tutor_id: Uuid,
    pub student_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: String,
    /// `trial` for a student's first lesson with the tutor, otherwise `regular`.
    pub lesson_type: String,
    pub price_cents: i64,
    pub notes: Option<String>,
    pub request_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<Lesson> for LessonResponse {
    fn from(l: Lesson) -> Self {
        Self {
            id: l.id,
            tutor_id: l.tutor_id,
            student_id: l.student_id,
            date: l.date,
            start_time: l.start_time,
            end_time: l.end_time,
            status: l.status.as_str().to_string(),
            lesson_type: l.lesson_type.as_str().to_string(),
            price_cents: l.price_cents,
            notes: l.notes,
            request_id: l.request_id,
            created_at: l.created_at,
        }
    }
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RequestListQuery {
    /// `pending` (default), `approved`, `declined` or `all`.
    pub status: Option<String>,
}

/// Body of approve and decline; an empty object uses the default response text.
#[derive(Deserialize, ToSchema, Default)]
pub struct ReviewRequestBody {
    #[serde(default)]
    pub response: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct ApprovalResponse {
    pub request: LessonRequestResponse,
    pub lesson: LessonResponse,
    pub lesson_created: bool,
}

impl From<Approval> for ApprovalResponse {
    fn from(a: Approval) -> Self {
        Self {
            request: a.request.into(),
            lesson: a.lesson.into(),
            lesson_created: a.lesson_created,
        }
    }
}

//=========================================================================================
// Chats and Messages
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct CreateChatRequest {
    pub peer_id: Uuid,
}

#[derive(Serialize, ToSchema)]
pub struct ChatResponse {
    pub id: Uuid,
    pub participants: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<tutors_core::Chat> for ChatResponse {
    fn from(c: tutors_core::Chat) -> Self {
        Self {
            id: c.id,
            participants: vec![c.participant_low, c.participant_high],
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct MessageResponse {
    pub id: Uuid,
    pub chat_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<Message> for MessageResponse {
    fn from(m: Message) -> Self {
        Self {
            id: m.id,
            chat_id: m.chat_id,
            sender_id: m.sender_id,
            content: m.content,
            created_at: m.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ChatSummaryResponse {
    pub chat_id: Uuid,
    pub peer: UserResponse,
    pub last_message: Option<MessageResponse>,
    pub updated_at: DateTime<Utc>,
}

impl From<ChatSummary> for ChatSummaryResponse {
    fn from(s: ChatSummary) -> Self {
        Self {
            chat_id: s.chat.id,
            updated_at: s.chat.updated_at,
            peer: s.peer.into(),
            last_message: s.last_message.map(MessageResponse::from),
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct SendMessageRequest {
    pub content: String,
}

//=========================================================================================
// Dashboard
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct DashboardResponse {
    pub tutor: Option<TutorResponse>,
    pub upcoming_lessons: Vec<LessonResponse>,
    pub sent_requests: Vec<LessonRequestResponse>,
    pub pending_requests: Vec<LessonRequestResponse>,
    pub availability: Vec<AvailabilitySlotResponse>,
}

impl From<Dashboard> for DashboardResponse {
    fn from(d: Dashboard) -> Self {
        Self {
            tutor: d.tutor.map(TutorResponse::from),
            upcoming_lessons: d.upcoming_lessons.into_iter().map(Into::into).collect(),
            sent_requests: d.sent_requests.into_iter().map(Into::into).collect(),
            pending_requests: d.pending_requests.into_iter().map(Into::into).collect(),
            availability: d.availability.into_iter().map(Into::into).collect(),
        }
    }
}
