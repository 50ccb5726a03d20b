//! services/api/src/web/state.rs
//!
//! Defines the application state shared by every handler and WebSocket connection.

use crate::config::Config;
use mockable::Clock;
use std::sync::Arc;
use tutors_core::{
    BookingService, ChatService, DashboardService, DatabaseService, LessonRequestService,
    RealtimeHub, TutorDirectory,
};

//=========================================================================================
// AppState (Shared Across All Connections)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub config: Arc<Config>,
    pub hub: RealtimeHub,
    pub directory: TutorDirectory,
    pub booking: BookingService,
    pub lessons: LessonRequestService,
    pub chats: ChatService,
    pub dashboard: DashboardService,
}

impl AppState {
    /// Wires every core service to the same storage, change feed and clock.
    pub fn new(db: Arc<dyn DatabaseService>, config: Arc<Config>, clock: Arc<dyn Clock>) -> Self {
        let hub = RealtimeHub::new(config.realtime_capacity);
        Self {
            directory: TutorDirectory::new(db.clone()),
            booking: BookingService::new(
                db.clone(),
                hub.clone(),
                clock,
                config.grid,
                config.schedule_offset,
            ),
            lessons: LessonRequestService::new(db.clone(), hub.clone()),
            chats: ChatService::new(db.clone(), hub.clone()),
            dashboard: DashboardService::new(db.clone()),
            db,
            config,
            hub,
        }
    }
}
