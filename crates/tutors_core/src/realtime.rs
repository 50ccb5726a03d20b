//! crates/tutors_core/src/realtime.rs
//!
//! An in-process change feed. Services publish every insert and update they
//! make; subscribers receive filtered streams of the events they care about.

use futures::stream::{self, BoxStream, StreamExt};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::{Lesson, LessonRequest, Message};

/// A row-level change, as pushed to subscribers.
#[derive(Debug, Clone)]
pub enum ChangeEvent {
    MessageInserted(Message),
    LessonRequestInserted(LessonRequest),
    LessonRequestUpdated(LessonRequest),
    LessonInserted(Lesson),
}

/// What the lesson request feed carries: request changes and the lessons
/// approvals produce.
#[derive(Debug, Clone)]
pub enum LessonActivity {
    Request(LessonRequest),
    Lesson(Lesson),
}

#[derive(Clone)]
pub struct RealtimeHub {
    sender: broadcast::Sender<ChangeEvent>,
}

impl RealtimeHub {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Fans an event out to current subscribers. Having none is not an error.
    pub fn publish(&self, event: ChangeEvent) {
        if let Err(e) = self.sender.send(event) {
            debug!("No realtime subscribers for {:?}", e.0);
        }
    }

    /// Messages inserted into `chat_id` by anyone other than `viewer`.
    pub fn subscribe_messages(&self, chat_id: Uuid, viewer: Uuid) -> BoxStream<'static, Message> {
        self.filtered(move |event| match event {
            ChangeEvent::MessageInserted(message)
                if message.chat_id == chat_id && message.sender_id != viewer =>
            {
                Some(message)
            }
            _ => None,
        })
    }

    /// Request inserts, status changes and lesson inserts that involve the given
    /// tutor profile or the given student.
    pub fn subscribe_lesson_requests(
        &self,
        tutor_id: Option<Uuid>,
        student_id: Uuid,
    ) -> BoxStream<'static, LessonActivity> {
        let involves = move |tutor: Uuid, student: Uuid| Some(tutor) == tutor_id || student == student_id;
        self.filtered(move |event| match event {
            ChangeEvent::LessonRequestInserted(request)
            | ChangeEvent::LessonRequestUpdated(request)
                if involves(request.tutor_id, request.student_id) =>
            {
                Some(LessonActivity::Request(request))
            }
            ChangeEvent::LessonInserted(lesson) if involves(lesson.tutor_id, lesson.student_id) => {
                Some(LessonActivity::Lesson(lesson))
            }
            _ => None,
        })
    }

    fn filtered<T, F>(&self, filter: F) -> BoxStream<'static, T>
    where
        T: Send + 'static,
        F: FnMut(ChangeEvent) -> Option<T> + Send + 'static,
    {
        let receiver = self.sender.subscribe();
        stream::unfold((receiver, filter), |(mut receiver, mut filter)| async move {
            loop {
                match receiver.recv().await {
                    Ok(event) => {
                        if let Some(item) = filter(event) {
                            return Some((item, (receiver, filter)));
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Realtime subscriber lagged; skipped {} events", skipped);
                    }
                    Err(RecvError::Closed) => return None,
                }
            }
        })
        .boxed()
    }
}

impl Default for RealtimeHub {
    fn default() -> Self {
        Self::new(256)
    }
}
