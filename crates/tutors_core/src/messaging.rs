//! crates/tutors_core/src/messaging.rs
//!
//! Chats between two users: find-or-create, inbox listing, history, sending and
//! the push subscription for incoming messages.

use futures::future::try_join_all;
use futures::stream::BoxStream;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::{Chat, ChatSummary, Message, NewMessage, UserProfile};
use crate::ports::{DatabaseService, PortError, PortResult};
use crate::realtime::{ChangeEvent, RealtimeHub};

pub struct ChatService {
    db: Arc<dyn DatabaseService>,
    hub: RealtimeHub,
}

impl ChatService {
    pub fn new(db: Arc<dyn DatabaseService>, hub: RealtimeHub) -> Self {
        Self { db, hub }
    }

    /// Returns the chat between `me` and `peer`, creating it on first contact.
    ///
    /// Idempotent for the unordered pair; storage guarantees one chat per pair
    /// even when both users make first contact at the same time.
    pub async fn get_or_create_chat(&self, me: Uuid, peer: Uuid) -> PortResult<Chat> {
        if me == peer {
            return Err(PortError::Validation("Cannot start a chat with yourself".to_string()));
        }
        let profiles = self.db.get_user_profiles(&[peer]).await?;
        if profiles.is_empty() {
            return Err(PortError::NotFound(format!("User {} not found", peer)));
        }
        let chat = self.db.find_or_create_chat(me, peer).await?;
        debug!("Chat {} resolved for {} and {}", chat.id, me, peer);
        Ok(chat)
    }

    /// The caller's chats with peer info and the latest message, most recent first.
    pub async fn get_user_chats(&self, me: Uuid) -> PortResult<Vec<ChatSummary>> {
        let chats = self.db.list_chats_for_user(me).await?;
        let peer_ids: Vec<Uuid> = chats.iter().filter_map(|c| c.peer_of(me)).collect();

        let (profiles, latest) = futures::try_join!(
            self.db.get_user_profiles(&peer_ids),
            try_join_all(chats.iter().map(|c| self.db.latest_message(c.id))),
        )?;
        let profiles: HashMap<Uuid, UserProfile> =
            profiles.into_iter().map(|p| (p.id, p)).collect();

        let mut summaries: Vec<ChatSummary> = chats
            .into_iter()
            .zip(latest)
            .filter_map(|(chat, last_message)| {
                let peer_id = chat.peer_of(me)?;
                let peer = profiles.get(&peer_id).cloned().unwrap_or_else(|| UserProfile {
                    id: peer_id,
                    display_name: "Unknown user".to_string(),
                    email: None,
                    avatar_url: None,
                });
                Some(ChatSummary {
                    chat,
                    peer,
                    last_message,
                })
            })
            .collect();
        summaries.sort_by(|a, b| b.chat.updated_at.cmp(&a.chat.updated_at));
        Ok(summaries)
    }

    async fn chat_for_participant(&self, me: Uuid, chat_id: Uuid) -> PortResult<Chat> {
        let chat = self.db.get_chat(chat_id).await?;
        if !chat.has_participant(me) {
            return Err(PortError::Forbidden(format!(
                "User {} is not part of chat {}",
                me, chat_id
            )));
        }
        Ok(chat)
    }

    /// Message history in ascending `created_at` order.
    pub async fn messages(&self, me: Uuid, chat_id: Uuid) -> PortResult<Vec<Message>> {
        self.chat_for_participant(me, chat_id).await?;
        self.db.list_messages(chat_id).await
    }

    pub async fn send_message(&self, me: Uuid, chat_id: Uuid, content: &str) -> PortResult<Message> {
        let content = content.trim();
        if content.is_empty() {
            return Err(PortError::Validation("Message cannot be empty".to_string()));
        }
        self.chat_for_participant(me, chat_id).await?;
        let message = self
            .db
            .insert_message(NewMessage {
                chat_id,
                sender_id: me,
                content: content.to_string(),
            })
            .await?;
        info!("Message {} sent in chat {}", message.id, chat_id);
        self.hub
            .publish(ChangeEvent::MessageInserted(message.clone()));
        Ok(message)
    }

    /// New messages in `chat_id` from other participants. The caller's own
    /// messages are never delivered back.
    pub async fn subscribe_to_messages(
        &self,
        me: Uuid,
        chat_id: Uuid,
    ) -> PortResult<BoxStream<'static, Message>> {
        self.chat_for_participant(me, chat_id).await?;
        Ok(self.hub.subscribe_messages(chat_id, me))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seed_student, Fixture};
    use futures::StreamExt;
    use std::time::Duration;

    #[tokio::test]
    async fn chat_lookup_is_idempotent_in_either_order() {
        let fx = Fixture::default();
        let a = seed_student(&fx, "Asha").await;
        let b = seed_student(&fx, "Ravi").await;

        let first = fx.chats.get_or_create_chat(a, b).await.unwrap();
        let second = fx.chats.get_or_create_chat(b, a).await.unwrap();
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn simultaneous_first_contact_yields_one_chat() {
        let fx = Fixture::default();
        let a = seed_student(&fx, "Asha").await;
        let b = seed_student(&fx, "Ravi").await;

        let (x, y) = tokio::join!(
            fx.chats.get_or_create_chat(a, b),
            fx.chats.get_or_create_chat(b, a),
        );
        assert_eq!(x.unwrap().id, y.unwrap().id);
        assert_eq!(fx.chats.get_user_chats(a).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn self_chat_and_unknown_peer_are_rejected() {
        let fx = Fixture::default();
        let a = seed_student(&fx, "Asha").await;
        assert!(matches!(
            fx.chats.get_or_create_chat(a, a).await,
            Err(PortError::Validation(_))
        ));
        assert!(matches!(
            fx.chats.get_or_create_chat(a, Uuid::new_v4()).await,
            Err(PortError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn inbox_shows_peer_and_latest_message() {
        let fx = Fixture::default();
        let a = seed_student(&fx, "Asha").await;
        let b = seed_student(&fx, "Ravi").await;
        let c = seed_student(&fx, "Meera").await;

        let with_b = fx.chats.get_or_create_chat(a, b).await.unwrap();
        let with_c = fx.chats.get_or_create_chat(a, c).await.unwrap();
        fx.chats.send_message(a, with_b.id, "first").await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        fx.chats.send_message(b, with_b.id, "second").await.unwrap();

        let inbox = fx.chats.get_user_chats(a).await.unwrap();
        assert_eq!(inbox.len(), 2);
        assert_eq!(inbox[0].chat.id, with_b.id);
        assert_eq!(inbox[0].peer.display_name, "Ravi");
        assert_eq!(
            inbox[0].last_message.as_ref().map(|m| m.content.as_str()),
            Some("second")
        );
        assert_eq!(inbox[1].chat.id, with_c.id);
        assert!(inbox[1].last_message.is_none());
    }

    #[tokio::test]
    async fn history_is_ascending_and_participants_only() {
        let fx = Fixture::default();
        let a = seed_student(&fx, "Asha").await;
        let b = seed_student(&fx, "Ravi").await;
        let outsider = seed_student(&fx, "Meera").await;
        let chat = fx.chats.get_or_create_chat(a, b).await.unwrap();

        for text in ["one", "two", "three"] {
            fx.chats.send_message(a, chat.id, text).await.unwrap();
        }
        let history = fx.chats.messages(b, chat.id).await.unwrap();
        let texts: Vec<&str> = history.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(texts, vec!["one", "two", "three"]);

        assert!(matches!(
            fx.chats.messages(outsider, chat.id).await,
            Err(PortError::Forbidden(_))
        ));
        assert!(matches!(
            fx.chats.send_message(outsider, chat.id, "hi").await,
            Err(PortError::Forbidden(_))
        ));
        assert!(matches!(
            fx.chats.send_message(a, chat.id, "   ").await,
            Err(PortError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn subscription_delivers_peer_messages_without_echo() {
        let fx = Fixture::default();
        let a = seed_student(&fx, "Asha").await;
        let b = seed_student(&fx, "Ravi").await;
        let chat = fx.chats.get_or_create_chat(a, b).await.unwrap();

        let mut feed = fx.chats.subscribe_to_messages(a, chat.id).await.unwrap();
        fx.chats.send_message(a, chat.id, "mine").await.unwrap();
        let theirs = fx.chats.send_message(b, chat.id, "theirs").await.unwrap();

        let delivered = tokio::time::timeout(Duration::from_secs(1), feed.next())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(delivered.id, theirs.id);

        let nothing_more = tokio::time::timeout(Duration::from_millis(50), feed.next()).await;
        assert!(nothing_more.is_err());
    }
}
