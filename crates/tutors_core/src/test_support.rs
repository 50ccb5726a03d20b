//! Shared fixtures for the core's unit tests.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use mockable::{Clock, DefaultClock};
use std::sync::Arc;
use uuid::Uuid;

use crate::booking::{BookingService, GridSettings};
use crate::dashboard::DashboardService;
use crate::directory::TutorDirectory;
use crate::domain::{NewTutorApplication, Tutor, UserProfile};
use crate::lessons::LessonRequestService;
use crate::memory::InMemoryDatabase;
use crate::messaging::ChatService;
use crate::ports::DatabaseService;
use crate::realtime::RealtimeHub;

pub(crate) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub(crate) fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

pub(crate) fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    date(y, m, d).and_time(time(h, min))
}

/// A clock frozen at one instant.
struct FixtureClock {
    utc_now: DateTime<Utc>,
}

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.utc_now.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.utc_now
    }
}

pub(crate) struct Fixture {
    pub db: Arc<InMemoryDatabase>,
    pub booking: BookingService,
    pub lessons: LessonRequestService,
    pub chats: ChatService,
    pub directory: TutorDirectory,
    pub dashboard: DashboardService,
}

impl Fixture {
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        let db = Arc::new(InMemoryDatabase::new());
        let port: Arc<dyn DatabaseService> = db.clone();
        let hub = RealtimeHub::new(64);
        let utc = FixedOffset::east_opt(0).unwrap();
        Self {
            booking: BookingService::new(port.clone(), hub.clone(), clock, GridSettings::default(), utc),
            lessons: LessonRequestService::new(port.clone(), hub.clone()),
            chats: ChatService::new(port.clone(), hub),
            directory: TutorDirectory::new(port.clone()),
            dashboard: DashboardService::new(port),
            db,
        }
    }

    /// A fixture whose clock is frozen at the given UTC wall time.
    pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> Self {
        Self::with_clock(Arc::new(FixtureClock {
            utc_now: Utc.from_utc_datetime(&at(y, m, d, h, min)),
        }))
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::with_clock(Arc::new(DefaultClock))
    }
}

pub(crate) fn application(name: &str) -> NewTutorApplication {
    NewTutorApplication {
        display_name: name.to_string(),
        language: "English".to_string(),
        native_language: "Hindi".to_string(),
        hourly_rate_cents: 1200,
        avatar_url: None,
        video_url: None,
        headline: "Conversational English".to_string(),
        bio: "Ten years of teaching".to_string(),
    }
}

pub(crate) async fn seed_student(fx: &Fixture, name: &str) -> Uuid {
    let id = Uuid::new_v4();
    fx.db
        .insert_user(UserProfile {
            id,
            display_name: name.to_string(),
            email: None,
            avatar_url: None,
        })
        .await;
    id
}

/// A user with an approved tutor profile.
pub(crate) async fn seed_tutor(fx: &Fixture) -> Tutor {
    let user = seed_student(fx, "Priya").await;
    let tutor = fx
        .directory
        .submit_application(user, application("Priya"))
        .await
        .unwrap();
    fx.db.set_tutor_approval(tutor.id, true).await.unwrap();
    fx.db.get_tutor(tutor.id).await.unwrap()
}
