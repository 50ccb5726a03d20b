//! services/api/src/web/protocol.rs
//!
//! Defines the WebSocket message protocol between the browser client and the API
//! server for live chat delivery and lesson request notifications.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tutors_core::LessonActivity;

use crate::web::dto::{LessonRequestResponse, LessonResponse, MessageResponse};

//=========================================================================================
// Messages Sent FROM the Client (Browser) TO the Server
//=========================================================================================

/// Represents the structured text messages a client can send to the server.
#[derive(Deserialize, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Starts pushing new messages of a chat the caller takes part in.
    SubscribeChat { chat_id: Uuid },

    UnsubscribeChat { chat_id: Uuid },

    /// Sends a message. `temp_id` is the client's optimistic id (`temp-N`) and is
    /// echoed back in the ack or rejection.
    SendMessage {
        chat_id: Uuid,
        temp_id: String,
        content: String,
    },

    /// Starts pushing inserts and status changes of the caller's lesson requests,
    /// both sent and, for tutors, received, and the lessons approvals create.
    WatchLessonRequests,
}

//=========================================================================================
// Messages Sent FROM the Server TO the Client (Browser)
//=========================================================================================

/// Represents the structured text messages the server can send to the client.
#[derive(Serialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Confirms a subscription. `topic` is `chat:<id>` or `lesson_requests`.
    Subscribed { topic: String },

    Unsubscribed { topic: String },

    /// A message from another participant of a subscribed chat.
    NewMessage { message: MessageResponse },

    /// The stored version of a message the client sent optimistically.
    MessageAck {
        temp_id: String,
        message: MessageResponse,
    },

    /// The send failed; the client should roll back `temp_id`.
    MessageRejected { temp_id: String, reason: String },

    LessonRequestChanged { request: LessonRequestResponse },

    /// An approval put a lesson on the calendar.
    LessonCreated { lesson: LessonResponse },

    /// Reports a failed command; the connection stays open.
    Error { message: String },
}

impl From<LessonActivity> for ServerMessage {
    fn from(activity: LessonActivity) -> Self {
        match activity {
            LessonActivity::Request(request) => ServerMessage::LessonRequestChanged {
                request: request.into(),
            },
            LessonActivity::Lesson(lesson) => ServerMessage::LessonCreated {
                lesson: lesson.into(),
            },
        }
    }
}

pub fn chat_topic(chat_id: Uuid) -> String {
    format!("chat:{}", chat_id)
}

pub const LESSON_REQUESTS_TOPIC: &str = "lesson_requests";
