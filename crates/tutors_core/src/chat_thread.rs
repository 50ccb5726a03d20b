//! crates/tutors_core/src/chat_thread.rs
//!
//! The local view of one chat as a client holds it: server history plus
//! optimistic entries that are waiting for the server to confirm them.
//!
//! Optimistic entries carry a `TempId` rendered as `temp-N`. A temp id is never a
//! UUID, so it cannot collide with a server-issued message id.

use chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;

use crate::domain::Message;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TempId(u64);

impl fmt::Display for TempId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "temp-{}", self.0)
    }
}

impl std::str::FromStr for TempId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix("temp-")
            .and_then(|n| n.parse().ok())
            .map(TempId)
            .ok_or(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryId {
    Server(Uuid),
    Pending(TempId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThreadEntry {
    pub id: EntryId,
    pub sender_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl ThreadEntry {
    pub fn is_pending(&self) -> bool {
        matches!(self.id, EntryId::Pending(_))
    }
}

impl From<Message> for ThreadEntry {
    fn from(message: Message) -> Self {
        Self {
            id: EntryId::Server(message.id),
            sender_id: message.sender_id,
            content: message.content,
            created_at: message.created_at,
        }
    }
}

pub struct ChatThread {
    chat_id: Uuid,
    viewer: Uuid,
    entries: Vec<ThreadEntry>,
    next_temp: u64,
}

impl ChatThread {
    pub fn new(chat_id: Uuid, viewer: Uuid) -> Self {
        Self {
            chat_id,
            viewer,
            entries: Vec::new(),
            next_temp: 1,
        }
    }

    pub fn chat_id(&self) -> Uuid {
        self.chat_id
    }

    pub fn entries(&self) -> &[ThreadEntry] {
        &self.entries
    }

    /// Replaces server history, keeping pending entries.
    pub fn load(&mut self, history: Vec<Message>) {
        self.entries.retain(ThreadEntry::is_pending);
        let chat_id = self.chat_id;
        for message in history.into_iter().filter(|m| m.chat_id == chat_id) {
            self.insert_server(message);
        }
    }

    /// Shows a message immediately, before the server has stored it.
    pub fn apply_optimistic(&mut self, content: &str, now: DateTime<Utc>) -> TempId {
        let temp = TempId(self.next_temp);
        self.next_temp += 1;
        self.entries.push(ThreadEntry {
            id: EntryId::Pending(temp),
            sender_id: self.viewer,
            content: content.to_string(),
            created_at: now,
        });
        self.sort();
        temp
    }

    /// Swaps a pending entry for the stored message. If the stored message
    /// already arrived through the subscription, the pending entry is dropped.
    pub fn reconcile(&mut self, temp: TempId, stored: Message) {
        self.entries.retain(|e| e.id != EntryId::Pending(temp));
        self.insert_server(stored);
    }

    /// Removes a failed optimistic entry and returns its content so the input
    /// box can be restored.
    pub fn rollback(&mut self, temp: TempId) -> Option<String> {
        let index = self
            .entries
            .iter()
            .position(|e| e.id == EntryId::Pending(temp))?;
        Some(self.entries.remove(index).content)
    }

    /// Applies a pushed message. Returns false for duplicates and other chats.
    pub fn receive(&mut self, message: Message) -> bool {
        if message.chat_id != self.chat_id {
            return false;
        }
        self.insert_server(message)
    }

    fn insert_server(&mut self, message: Message) -> bool {
        if self
            .entries
            .iter()
            .any(|e| e.id == EntryId::Server(message.id))
        {
            return false;
        }
        self.entries.push(ThreadEntry::from(message));
        self.sort();
        true
    }

    fn sort(&mut self) {
        self.entries.sort_by_key(|e| e.created_at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn message(chat_id: Uuid, sender_id: Uuid, content: &str, at: DateTime<Utc>) -> Message {
        Message {
            id: Uuid::new_v4(),
            chat_id,
            sender_id,
            content: content.to_string(),
            created_at: at,
        }
    }

    #[test]
    fn temp_ids_are_namespaced() {
        let temp = TempId(7);
        assert_eq!(temp.to_string(), "temp-7");
        assert_eq!("temp-7".parse::<TempId>(), Ok(temp));
        assert!(Uuid::new_v4().to_string().parse::<TempId>().is_err());
    }

    #[test]
    fn optimistic_send_reconciles_to_server_message() {
        let chat = Uuid::new_v4();
        let me = Uuid::new_v4();
        let now = Utc::now();
        let mut thread = ChatThread::new(chat, me);

        let temp = thread.apply_optimistic("hello", now);
        assert!(thread.entries()[0].is_pending());

        let stored = message(chat, me, "hello", now + Duration::milliseconds(3));
        thread.reconcile(temp, stored.clone());
        assert_eq!(thread.entries().len(), 1);
        assert_eq!(thread.entries()[0].id, EntryId::Server(stored.id));
    }

    #[test]
    fn reconcile_after_push_does_not_duplicate() {
        let chat = Uuid::new_v4();
        let me = Uuid::new_v4();
        let now = Utc::now();
        let mut thread = ChatThread::new(chat, me);

        let temp = thread.apply_optimistic("hi", now);
        let stored = message(chat, me, "hi", now);
        assert!(thread.receive(stored.clone()));
        thread.reconcile(temp, stored);
        assert_eq!(thread.entries().len(), 1);
    }

    #[test]
    fn rollback_restores_input() {
        let mut thread = ChatThread::new(Uuid::new_v4(), Uuid::new_v4());
        let temp = thread.apply_optimistic("draft", Utc::now());
        assert_eq!(thread.rollback(temp), Some("draft".to_string()));
        assert!(thread.entries().is_empty());
        assert_eq!(thread.rollback(temp), None);
    }

    #[test]
    fn pushes_are_deduplicated_and_kept_in_order() {
        let chat = Uuid::new_v4();
        let me = Uuid::new_v4();
        let peer = Uuid::new_v4();
        let now = Utc::now();
        let mut thread = ChatThread::new(chat, me);

        let early = message(chat, peer, "early", now);
        let late = message(chat, peer, "late", now + Duration::seconds(1));
        thread.load(vec![late.clone()]);
        assert!(thread.receive(early.clone()));
        assert!(!thread.receive(late));
        assert!(!thread.receive(message(Uuid::new_v4(), peer, "other chat", now)));

        let texts: Vec<&str> = thread.entries().iter().map(|e| e.content.as_str()).collect();
        assert_eq!(texts, vec!["early", "late"]);
    }

    #[test]
    fn reload_keeps_pending_entries() {
        let chat = Uuid::new_v4();
        let me = Uuid::new_v4();
        let now = Utc::now();
        let mut thread = ChatThread::new(chat, me);
        thread.apply_optimistic("sending", now + Duration::seconds(5));
        thread.load(vec![message(chat, me, "old", now)]);
        assert_eq!(thread.entries().len(), 2);
        assert!(thread.entries()[1].is_pending());
    }

    #[test]
    fn load_keeps_only_this_chat_and_drops_repeats() {
        let chat = Uuid::new_v4();
        let peer = Uuid::new_v4();
        let now = Utc::now();
        let mut thread = ChatThread::new(chat, Uuid::new_v4());

        let mine = message(chat, peer, "here", now);
        thread.load(vec![
            mine.clone(),
            message(Uuid::new_v4(), peer, "elsewhere", now),
            mine.clone(),
        ]);
        assert_eq!(thread.entries().len(), 1);
        assert_eq!(thread.entries()[0].id, EntryId::Server(mine.id));
    }
}
