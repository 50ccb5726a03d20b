pub mod booking;
pub mod chat_thread;
pub mod dashboard;
pub mod directory;
pub mod domain;
pub mod lessons;
pub mod memory;
pub mod messaging;
pub mod ports;
pub mod realtime;

#[cfg(test)]
pub(crate) mod test_support;

pub use booking::{BookingGrid, BookingService, CellStatus, GridSettings};
pub use dashboard::{Dashboard, DashboardService};
pub use directory::{TutorDirectory, TutorFilter, TutorSort};
pub use domain::{
    AvailabilitySlot, Chat, ChatSummary, Lesson, LessonRequest, LessonRequestStatus, Message,
    Tutor, UserProfile,
};
pub use lessons::{Approval, LessonRequestService, RequestFilter};
pub use messaging::ChatService;
pub use ports::{DatabaseService, PortError, PortResult};
pub use realtime::{ChangeEvent, LessonActivity, RealtimeHub};
