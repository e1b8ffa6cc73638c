//! Exchange driver: one exchange is a user message plus the AI response
//! being streamed into its placeholder.
//!
//! The provider stream, the persistence of its result, and the registry
//! bookkeeping all run in a detached task so they survive navigation.
//! Views only poll the stream buffer: when the view that started an
//! exchange unmounts, its polling stops (suppressing render-visible writes)
//! while the exchange itself runs to completion in the background.

use crate::ai::GeminiClient;
use crate::api::ApiClient;
use crate::ongoing::{self, OngoingChat};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::warn;

pub const GEMINI_ERROR_PREFIX: &str = "Error: Failed to get response from Gemini.";

/// How long a finished buffer stays around for a poller to pick up the final
/// snapshot before the exchange task drops it.
const DISCARD_GRACE: std::time::Duration = std::time::Duration::from_secs(30);

static STREAM_STORE: Lazy<StreamStore> = Lazy::new(StreamStore::default);

struct StreamStore {
    counter: AtomicU64,
    entries: Mutex<HashMap<u64, StreamEntry>>,
}

impl Default for StreamStore {
    fn default() -> Self {
        Self {
            counter: AtomicU64::new(1),
            entries: Mutex::new(HashMap::new()),
        }
    }
}

#[derive(Default)]
struct StreamEntry {
    buffer: String,
    done: bool,
}

impl StreamStore {
    fn create_handle(&self) -> StreamHandle {
        let id = self.counter.fetch_add(1, Ordering::Relaxed);
        let mut entries = self.entries.lock().expect("stream store poisoned");
        entries.insert(id, StreamEntry::default());
        StreamHandle { id }
    }

    fn replace(&self, id: u64, text: &str) {
        let mut entries = self.entries.lock().expect("stream store poisoned");
        if let Some(entry) = entries.get_mut(&id) {
            entry.buffer = text.to_string();
        }
    }

    fn finish(&self, id: u64) {
        let mut entries = self.entries.lock().expect("stream store poisoned");
        if let Some(entry) = entries.get_mut(&id) {
            entry.done = true;
        }
    }

    fn fail(&self, id: u64, message: String) {
        let mut entries = self.entries.lock().expect("stream store poisoned");
        if let Some(entry) = entries.get_mut(&id) {
            entry.buffer = message;
            entry.done = true;
        }
    }

    fn snapshot(&self, id: u64) -> Option<(String, bool)> {
        let entries = self.entries.lock().expect("stream store poisoned");
        entries
            .get(&id)
            .map(|entry| (entry.buffer.clone(), entry.done))
    }

    fn remove(&self, id: u64) {
        let mut entries = self.entries.lock().expect("stream store poisoned");
        entries.remove(&id);
    }
}

#[derive(Clone, Copy)]
pub struct StreamHandle {
    id: u64,
}

impl StreamHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn replace(&self, text: &str) {
        STREAM_STORE.replace(self.id, text);
    }

    pub fn finish(&self) {
        STREAM_STORE.finish(self.id);
    }

    pub fn fail(&self, message: &str) {
        STREAM_STORE.fail(self.id, message.to_string());
    }
}

/// Accumulated text and done flag for a live exchange. None once the buffer
/// has been discarded.
pub fn snapshot(stream_id: u64) -> Option<(String, bool)> {
    STREAM_STORE.snapshot(stream_id)
}

/// Drop a finished exchange's buffer. Safe to call more than once.
pub fn discard(stream_id: u64) {
    STREAM_STORE.remove(stream_id);
}

/// Drop a buffer after a grace period. The exchange task runs this once the
/// result is persisted, so buffers are reclaimed even when the view that
/// would normally poll and discard them never remounts.
async fn discard_after(stream_id: u64, delay: std::time::Duration) {
    tokio::time::sleep(delay).await;
    STREAM_STORE.remove(stream_id);
}

pub struct ExchangeRequest {
    pub chat_id: String,
    pub prompt: String,
    /// Timestamp of the placeholder AI message.
    pub ai_message_id: u64,
    /// Durable id of the user message being answered.
    pub message_id: String,
    /// Index of the orphaned user message when this is a retry.
    pub retry: Option<usize>,
}

/// Start an exchange: register it as ongoing, then stream, persist, and
/// deregister in a detached task. Returns the stream id to poll.
///
/// The registry pop happens on every exit path, even when persisting the
/// error text itself fails.
pub fn start_exchange(api: ApiClient, request: ExchangeRequest) -> u64 {
    let handle = STREAM_STORE.create_handle();
    let stream_id = handle.id();

    ongoing::registry().push(OngoingChat {
        chat_id: request.chat_id.clone(),
        ai_message_id: request.ai_message_id,
        message_id: request.message_id.clone(),
        retry: request.retry,
        stream: stream_id,
    });

    tokio::spawn(async move {
        let ExchangeRequest {
            chat_id,
            prompt,
            ai_message_id,
            message_id,
            ..
        } = request;

        let outcome = match GeminiClient::from_env() {
            Ok(gemini) => {
                gemini
                    .stream_generate(&prompt, |accumulated| handle.replace(accumulated))
                    .await
            }
            Err(err) => Err(err),
        };

        match outcome {
            Ok(full) => {
                handle.finish();
                if let Err(err) = api.save_ai_message(&chat_id, &full, &message_id).await {
                    warn!("failed to save AI response for chat {chat_id}: {err}");
                }
            }
            Err(err) => {
                let error_text = format!("{GEMINI_ERROR_PREFIX} {err}");
                handle.fail(&error_text);
                // The error is persisted like a real answer so it survives
                // a reload.
                if let Err(err) = api.save_ai_message(&chat_id, &error_text, &message_id).await {
                    warn!("failed to save error response for chat {chat_id}: {err}");
                }
            }
        }

        ongoing::registry().pop(&chat_id, ai_message_id);
        discard_after(stream_id, DISCARD_GRACE).await;
    });

    stream_id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_replaces_and_finishes() {
        let handle = STREAM_STORE.create_handle();

        handle.replace("Hel");
        handle.replace("Hello");
        assert_eq!(snapshot(handle.id()), Some(("Hello".to_string(), false)));

        handle.finish();
        assert_eq!(snapshot(handle.id()), Some(("Hello".to_string(), true)));

        discard(handle.id());
        assert_eq!(snapshot(handle.id()), None);
    }

    #[test]
    fn failure_substitutes_error_text() {
        let handle = STREAM_STORE.create_handle();
        handle.replace("partial");
        handle.fail("Error: Failed to get response from Gemini. boom");

        let (text, done) = snapshot(handle.id()).unwrap();
        assert!(text.starts_with(GEMINI_ERROR_PREFIX));
        assert!(done);
        discard(handle.id());
    }

    #[test]
    fn discard_is_idempotent() {
        let handle = STREAM_STORE.create_handle();
        discard(handle.id());
        discard(handle.id());
        assert_eq!(snapshot(handle.id()), None);
    }

    #[tokio::test]
    async fn finished_buffer_is_reclaimed_without_a_poller() {
        let handle = STREAM_STORE.create_handle();
        handle.replace("Pong");
        handle.finish();
        assert_eq!(snapshot(handle.id()), Some(("Pong".to_string(), true)));

        // No view ever polls or discards this buffer; the exchange task's
        // cleanup still removes it once the grace period elapses.
        discard_after(handle.id(), std::time::Duration::ZERO).await;
        assert_eq!(snapshot(handle.id()), None);
    }
}
