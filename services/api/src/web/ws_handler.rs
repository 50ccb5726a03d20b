//! services/api/src/web/ws_handler.rs
//!
//! This is the main entry point and control loop for a WebSocket connection.
//! Each subscription runs as its own forwarding task that stops when its token
//! is cancelled; closing the socket cancels them all.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
    Extension,
};
use futures::{
    stream::{BoxStream, StreamExt},
    Sink, SinkExt,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::web::{
    dto::MessageResponse,
    protocol::{chat_topic, ClientMessage, ServerMessage, LESSON_REQUESTS_TOPIC},
    state::AppState,
};

/// The write half of a connection, shared with its forwarding tasks.
type WsSender<S> = Arc<Mutex<S>>;

/// The handler for upgrading HTTP requests to WebSocket connections.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state, user_id))
}

/// Live subscriptions of one connection.
struct Subscriptions {
    connection: CancellationToken,
    chats: HashMap<Uuid, CancellationToken>,
    lesson_requests: Option<CancellationToken>,
}

impl Subscriptions {
    fn new() -> Self {
        Self {
            connection: CancellationToken::new(),
            chats: HashMap::new(),
            lesson_requests: None,
        }
    }
}

async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>, user_id: Uuid) {
    info!("New WebSocket connection established for user: {}", user_id);

    let (sender, mut receiver) = socket.split();
    let ws_sender = Arc::new(Mutex::new(sender));
    let mut subscriptions = Subscriptions::new();

    loop {
        match receiver.next().await {
            Some(Ok(Message::Text(text))) => {
                match serde_json::from_str::<ClientMessage>(text.as_str()) {
                    Ok(client_msg) => {
                        handle_client_message(
                            client_msg,
                            &app_state,
                            user_id,
                            &ws_sender,
                            &mut subscriptions,
                        )
                        .await;
                    }
                    Err(e) => {
                        warn!("Failed to deserialize client message: {}", e);
                        send(
                            &ws_sender,
                            &ServerMessage::Error {
                                message: format!("Unrecognised message: {}", e),
                            },
                        )
                        .await;
                    }
                }
            }
            Some(Ok(Message::Close(_))) => {
                info!("Client sent close message.");
                break;
            }
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                warn!("WebSocket error for user {}: {}", user_id, e);
                break;
            }
            None => {
                info!("Client disconnected.");
                break;
            }
        }
    }

    // --- Cleanup ---
    subscriptions.connection.cancel();
    info!("WebSocket connection closed for user: {}", user_id);
}

async fn handle_client_message<S>(
    client_msg: ClientMessage,
    app_state: &Arc<AppState>,
    user_id: Uuid,
    ws_sender: &WsSender<S>,
    subscriptions: &mut Subscriptions,
) where
    S: Sink<Message> + Send + Unpin + 'static,
{
    match client_msg {
        ClientMessage::SubscribeChat { chat_id } => {
            if subscriptions.chats.contains_key(&chat_id) {
                send(ws_sender, &ServerMessage::Subscribed { topic: chat_topic(chat_id) }).await;
                return;
            }
            match app_state.chats.subscribe_to_messages(user_id, chat_id).await {
                Ok(feed) => {
                    let token = subscriptions.connection.child_token();
                    subscriptions.chats.insert(chat_id, token.clone());
                    let feed = feed
                        .map(|m| ServerMessage::NewMessage {
                            message: MessageResponse::from(m),
                        })
                        .boxed();
                    spawn_forwarder(feed, ws_sender.clone(), token);
                    send(ws_sender, &ServerMessage::Subscribed { topic: chat_topic(chat_id) }).await;
                }
                Err(e) => {
                    warn!("User {} could not subscribe to chat {}: {}", user_id, chat_id, e);
                    send(ws_sender, &ServerMessage::Error { message: e.to_string() }).await;
                }
            }
        }
        ClientMessage::UnsubscribeChat { chat_id } => {
            if let Some(token) = subscriptions.chats.remove(&chat_id) {
                token.cancel();
            }
            send(ws_sender, &ServerMessage::Unsubscribed { topic: chat_topic(chat_id) }).await;
        }
        ClientMessage::SendMessage {
            chat_id,
            temp_id,
            content,
        } => {
            let reply = match app_state.chats.send_message(user_id, chat_id, &content).await {
                Ok(stored) => ServerMessage::MessageAck {
                    temp_id,
                    message: stored.into(),
                },
                Err(e) => {
                    warn!("Message {} from {} rejected: {}", temp_id, user_id, e);
                    ServerMessage::MessageRejected {
                        temp_id,
                        reason: e.to_string(),
                    }
                }
            };
            send(ws_sender, &reply).await;
        }
        ClientMessage::WatchLessonRequests => {
            if subscriptions.lesson_requests.is_some() {
                send(
                    ws_sender,
                    &ServerMessage::Subscribed {
                        topic: LESSON_REQUESTS_TOPIC.to_string(),
                    },
                )
                .await;
                return;
            }
            let tutor_id = match app_state.db.find_tutor_by_user(user_id).await {
                Ok(tutor) => tutor.map(|t| t.id),
                Err(e) => {
                    error!("Failed to look up tutor profile for {}: {:?}", user_id, e);
                    send(ws_sender, &ServerMessage::Error { message: e.to_string() }).await;
                    return;
                }
            };
            let token = subscriptions.connection.child_token();
            subscriptions.lesson_requests = Some(token.clone());
            let feed = app_state
                .hub
                .subscribe_lesson_requests(tutor_id, user_id)
                .map(ServerMessage::from)
                .boxed();
            spawn_forwarder(feed, ws_sender.clone(), token);
            send(
                ws_sender,
                &ServerMessage::Subscribed {
                    topic: LESSON_REQUESTS_TOPIC.to_string(),
                },
            )
            .await;
        }
    }
}

/// Pushes every item of `feed` to the socket until `token` is cancelled, the
/// feed ends or the socket stops accepting writes.
fn spawn_forwarder<S>(
    mut feed: BoxStream<'static, ServerMessage>,
    ws_sender: WsSender<S>,
    token: CancellationToken,
) where
    S: Sink<Message> + Send + Unpin + 'static,
{
    tokio::spawn(async move {
        loop {
            tokio::select! {
                // Cancellation wins over a ready item.
                biased;
                _ = token.cancelled() => {
                    debug!("Subscription cancelled.");
                    break;
                }
                next = feed.next() => match next {
                    Some(msg) => {
                        if !send(&ws_sender, &msg).await {
                            break;
                        }
                    }
                    None => break,
                },
            }
        }
    });
}

/// Serialises and sends one message. Returns false when the socket is gone.
async fn send<S>(ws_sender: &WsSender<S>, msg: &ServerMessage) -> bool
where
    S: Sink<Message> + Unpin,
{
    let json = match serde_json::to_string(msg) {
        Ok(json) => json,
        Err(e) => {
            error!("Failed to serialise server message: {}", e);
            return true;
        }
    };
    if ws_sender.lock().await.send(Message::Text(json.into())).await.is_err() {
        debug!("Failed to send message; client is gone.");
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
    use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
    use mockable::Clock;
    use serde_json::{json, Value};
    use std::time::Duration;
    use tutors_core::domain::{NewAvailabilitySlot, NewTutorApplication, UserProfile};
    use tutors_core::memory::InMemoryDatabase;
    use tutors_core::{DatabaseService, Tutor};

    struct FrozenClock(DateTime<Utc>);

    impl Clock for FrozenClock {
        fn local(&self) -> DateTime<Local> {
            self.0.with_timezone(&Local)
        }

        fn utc(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn app() -> (Arc<AppState>, Arc<InMemoryDatabase>) {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("STORAGE_BACKEND", "memory"),
            ("SCHEDULE_UTC_OFFSET_MINUTES", "0"),
        ]);
        let config = Config::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap();
        let db = Arc::new(InMemoryDatabase::new());
        let clock = Arc::new(FrozenClock(Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()));
        let state = Arc::new(AppState::new(db.clone(), Arc::new(config), clock));
        (state, db)
    }

    async fn user(db: &InMemoryDatabase, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        db.insert_user(UserProfile {
            id,
            display_name: name.to_string(),
            email: None,
            avatar_url: None,
        })
        .await;
        id
    }

    async fn tutor(state: &AppState, db: &InMemoryDatabase) -> Tutor {
        let owner = user(db, "Priya").await;
        let tutor = state
            .directory
            .submit_application(
                owner,
                NewTutorApplication {
                    display_name: "Priya".to_string(),
                    language: "English".to_string(),
                    native_language: "Hindi".to_string(),
                    hourly_rate_cents: 1200,
                    avatar_url: None,
                    video_url: None,
                    headline: "Conversational English".to_string(),
                    bio: "Ten years of teaching".to_string(),
                },
            )
            .await
            .unwrap();
        db.set_tutor_approval(tutor.id, true).await.unwrap();
        state
            .booking
            .set_availability(
                owner,
                vec![NewAvailabilitySlot {
                    weekday: Weekday::Wed,
                    start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                    end_time: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
                }],
            )
            .await
            .unwrap();
        db.get_tutor(tutor.id).await.unwrap()
    }

    /// One client connection whose outgoing frames land in a channel.
    struct Connection {
        user_id: Uuid,
        sender: WsSender<UnboundedSender<Message>>,
        outbox: UnboundedReceiver<Message>,
        subscriptions: Subscriptions,
    }

    impl Connection {
        fn open(user_id: Uuid) -> Self {
            let (tx, rx) = mpsc::unbounded();
            Self {
                user_id,
                sender: Arc::new(Mutex::new(tx)),
                outbox: rx,
                subscriptions: Subscriptions::new(),
            }
        }

        async fn command(&mut self, state: &Arc<AppState>, msg: ClientMessage) {
            handle_client_message(msg, state, self.user_id, &self.sender, &mut self.subscriptions)
                .await;
        }

        async fn next(&mut self) -> Value {
            let frame = tokio::time::timeout(Duration::from_secs(1), self.outbox.next())
                .await
                .expect("a frame within a second")
                .expect("the connection is open");
            match frame {
                Message::Text(text) => serde_json::from_str(text.as_str()).unwrap(),
                other => panic!("unexpected frame {:?}", other),
            }
        }

        async fn is_quiet(&mut self) -> bool {
            tokio::time::timeout(Duration::from_millis(100), self.outbox.next())
                .await
                .is_err()
        }
    }

    #[tokio::test]
    async fn sends_are_acked_with_temp_id_and_pushed_to_the_peer_only() {
        let (state, db) = app();
        let alice = user(&db, "Alice").await;
        let bob = user(&db, "Bob").await;
        let chat = state.chats.get_or_create_chat(alice, bob).await.unwrap();
        let mut alice_ws = Connection::open(alice);
        let mut bob_ws = Connection::open(bob);

        for ws in [&mut alice_ws, &mut bob_ws] {
            ws.command(&state, ClientMessage::SubscribeChat { chat_id: chat.id }).await;
            let frame = ws.next().await;
            assert_eq!(frame["type"], "subscribed");
            assert_eq!(frame["topic"], format!("chat:{}", chat.id));
        }

        alice_ws
            .command(
                &state,
                ClientMessage::SendMessage {
                    chat_id: chat.id,
                    temp_id: "temp-1".to_string(),
                    content: "  hello  ".to_string(),
                },
            )
            .await;
        let ack = alice_ws.next().await;
        assert_eq!(ack["type"], "message_ack");
        assert_eq!(ack["temp_id"], "temp-1");
        assert_eq!(ack["message"]["content"], "hello");

        let pushed = bob_ws.next().await;
        assert_eq!(pushed["type"], "new_message");
        assert_eq!(pushed["message"]["id"], ack["message"]["id"]);
        assert!(alice_ws.is_quiet().await);

        alice_ws
            .command(
                &state,
                ClientMessage::SendMessage {
                    chat_id: chat.id,
                    temp_id: "temp-2".to_string(),
                    content: "   ".to_string(),
                },
            )
            .await;
        let rejected = alice_ws.next().await;
        assert_eq!(rejected["type"], "message_rejected");
        assert_eq!(rejected["temp_id"], "temp-2");
        assert!(bob_ws.is_quiet().await);
    }

    #[tokio::test]
    async fn outsiders_cannot_subscribe_to_a_chat() {
        let (state, db) = app();
        let alice = user(&db, "Alice").await;
        let bob = user(&db, "Bob").await;
        let eve = user(&db, "Eve").await;
        let chat = state.chats.get_or_create_chat(alice, bob).await.unwrap();

        let mut eve_ws = Connection::open(eve);
        eve_ws.command(&state, ClientMessage::SubscribeChat { chat_id: chat.id }).await;
        assert_eq!(eve_ws.next().await["type"], "error");

        state.chats.send_message(alice, chat.id, "private").await.unwrap();
        assert!(eve_ws.is_quiet().await);
    }

    #[tokio::test]
    async fn unsubscribing_stops_delivery() {
        let (state, db) = app();
        let alice = user(&db, "Alice").await;
        let bob = user(&db, "Bob").await;
        let chat = state.chats.get_or_create_chat(alice, bob).await.unwrap();
        let mut bob_ws = Connection::open(bob);

        bob_ws.command(&state, ClientMessage::SubscribeChat { chat_id: chat.id }).await;
        assert_eq!(bob_ws.next().await["type"], "subscribed");
        bob_ws.command(&state, ClientMessage::UnsubscribeChat { chat_id: chat.id }).await;
        assert_eq!(bob_ws.next().await["type"], "unsubscribed");
        assert!(bob_ws.subscriptions.chats.is_empty());

        state.chats.send_message(alice, chat.id, "anyone?").await.unwrap();
        assert!(bob_ws.is_quiet().await);
    }

    #[tokio::test]
    async fn lesson_request_feed_reaches_tutor_and_student() {
        let (state, db) = app();
        let tutor = tutor(&state, &db).await;
        let student = user(&db, "Asha").await;
        let mut tutor_ws = Connection::open(tutor.user_id);
        let mut student_ws = Connection::open(student);

        for ws in [&mut tutor_ws, &mut student_ws] {
            ws.command(&state, ClientMessage::WatchLessonRequests).await;
            let frame = ws.next().await;
            assert_eq!(frame["type"], "subscribed");
            assert_eq!(frame["topic"], "lesson_requests");
        }

        let request = state
            .booking
            .request_lesson(
                student,
                tutor.id,
                NaiveDate::from_ymd_opt(2024, 6, 12).unwrap(),
                NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
                None,
            )
            .await
            .unwrap();
        for ws in [&mut tutor_ws, &mut student_ws] {
            let frame = ws.next().await;
            assert_eq!(frame["type"], "lesson_request_changed");
            assert_eq!(frame["request"]["id"], json!(request.id));
            assert_eq!(frame["request"]["status"], "pending");
        }

        state
            .lessons
            .approve(tutor.user_id, request.id, None)
            .await
            .unwrap();
        for ws in [&mut tutor_ws, &mut student_ws] {
            let updated = ws.next().await;
            assert_eq!(updated["type"], "lesson_request_changed");
            assert_eq!(updated["request"]["status"], "approved");
            let created = ws.next().await;
            assert_eq!(created["type"], "lesson_created");
            assert_eq!(created["lesson"]["request_id"], json!(request.id));
            assert_eq!(created["lesson"]["lesson_type"], "trial");
        }
    }
}
