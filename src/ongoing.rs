//! Process-wide registry of chats with an in-flight AI response.
//!
//! Navigating away from a chat unmounts the view that started the stream,
//! but the stream keeps running and its result still gets saved. The
//! registry is the single source of truth for "something is still writing
//! into this chat": entries are pushed when a stream starts and popped when
//! it completes or errors, and a remounting view scans it to resume showing
//! streaming state without re-issuing the provider call.

use once_cell::sync::Lazy;
use std::sync::Mutex;

static REGISTRY: Lazy<OngoingChats> = Lazy::new(OngoingChats::new);

pub fn registry() -> &'static OngoingChats {
    &REGISTRY
}

#[derive(Clone, Debug, PartialEq)]
pub struct OngoingChat {
    pub chat_id: String,
    /// Timestamp of the streaming AI message; its id until persistence.
    pub ai_message_id: u64,
    /// Durable id of the user message this response answers.
    pub message_id: String,
    /// Index of the orphaned user message when this is a retry attempt.
    pub retry: Option<usize>,
    /// Handle into the live stream buffer (see [`crate::session`]).
    pub stream: u64,
}

#[derive(Default)]
pub struct OngoingChats {
    entries: Mutex<Vec<OngoingChat>>,
}

impl OngoingChats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry. No-op when `chat_id` is empty. At most one entry per
    /// `(chat_id, message_id)` pair may exist, so any previous entry for the
    /// pair is evicted first.
    pub fn push(&self, entry: OngoingChat) {
        if entry.chat_id.is_empty() {
            return;
        }
        let mut entries = self.entries.lock().expect("ongoing registry poisoned");
        entries.retain(|existing| {
            !(existing.chat_id == entry.chat_id && existing.message_id == entry.message_id)
        });
        entries.push(entry);
    }

    /// Remove every entry matching both keys. Idempotent: popping an id that
    /// is already gone changes nothing.
    pub fn pop(&self, chat_id: &str, ai_message_id: u64) {
        let mut entries = self.entries.lock().expect("ongoing registry poisoned");
        entries.retain(|existing| {
            !(existing.chat_id == chat_id && existing.ai_message_id == ai_message_id)
        });
    }

    /// First entry still writing into the given chat, if any. Scanned on
    /// chat-view mount to rehydrate streaming UI state after navigation.
    pub fn find_for_chat(&self, chat_id: &str) -> Option<OngoingChat> {
        let entries = self.entries.lock().expect("ongoing registry poisoned");
        entries
            .iter()
            .find(|entry| entry.chat_id == chat_id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("ongoing registry poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
