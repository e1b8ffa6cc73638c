use crate::api::ApiClient;
use crate::ongoing;
use crate::reconcile;
use crate::session::{self, ExchangeRequest};
use crate::types::{ChatSummary, FirstChatData, Message, Sender, now_ms};
use crate::ui::refresh_chats;
use crate::views::shared::{
    Composer, FileChips, format_message_timestamp, markdown_to_html,
};
use dioxus::prelude::*;
use tracing::warn;

const POLL_INTERVAL_MS: u64 = 80;

fn is_pending_ai(msg: &Message, loading: bool) -> bool {
    loading && matches!(msg.sender, Sender::Ai) && msg.text.is_empty()
}

fn fallback_message_id() -> String {
    format!("local-{}", now_ms())
}

/// Observe a running exchange, copying its accumulated text into the
/// placeholder message until the stream finishes. The provider call itself
/// runs in a detached task (see [`crate::session`]); this loop only renders
/// its progress, so unmounting the view stops the rendering and nothing
/// else.
async fn poll_exchange(
    mut messages: Signal<Vec<Message>>,
    mut loading: Signal<bool>,
    api: ApiClient,
    chats: Signal<Vec<ChatSummary>>,
    chats_error: Signal<bool>,
    stream_id: u64,
    ai_message_id: u64,
    message_id: String,
    user_index: Option<usize>,
) {
    loop {
        let Some((text, done)) = session::snapshot(stream_id) else {
            break;
        };
        if !text.is_empty() {
            messages.with_mut(|msgs| {
                let applied =
                    reconcile::apply_stream_text(msgs, ai_message_id, &message_id, &text);
                if !applied && done {
                    // Placeholder is gone; put the final text (answer or
                    // error) back in the right slot.
                    match user_index {
                        Some(index) => reconcile::write_error_after(
                            msgs,
                            index,
                            Some(&message_id),
                            &text,
                            ai_message_id,
                        ),
                        None => {
                            reconcile::insert_placeholder(
                                msgs,
                                None,
                                ai_message_id,
                                Some(message_id.clone()),
                            );
                            reconcile::apply_stream_text(msgs, ai_message_id, &message_id, &text);
                        }
                    }
                }
            });
        }
        if done {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(POLL_INTERVAL_MS)).await;
    }

    session::discard(stream_id);
    loading.set(false);
    // Completed exchanges bump the chat's last activity; reflect it in the
    // sidebar ordering.
    refresh_chats(api, chats, chats_error).await;
}

#[component]
pub fn ChatView(
    chat_id: String,
    chats: Signal<Vec<ChatSummary>>,
    chats_error: Signal<bool>,
    mut active_chat: Signal<Option<String>>,
    mut first_chat: Signal<Option<FirstChatData>>,
    base_font_px: Signal<i32>,
) -> Element {
    let mut messages = use_signal(Vec::<Message>::new);
    let input = use_signal(String::new);
    let mut loading = use_signal(|| false);
    let attached_files = use_signal(Vec::new);
    let api = use_signal(ApiClient::from_env);
    let chat = use_signal(|| chat_id.clone());

    // Mount: consume the first-chat hand-off exactly once, or load history
    // and rehydrate any stream that is still running against this chat.
    use_future(move || async move {
        let chat_id = chat();
        let client = api();

        let handoff = first_chat.with_mut(|slot| slot.take());
        if let Some(first) = handoff {
            send_first_message(
                messages, loading, client, chats, chats_error, chat_id, first,
            )
            .await;
            return;
        }

        match client.fetch_history(&chat_id).await {
            Ok(history) => messages.set(history),
            Err(err) => {
                warn!("failed to load chat {chat_id}: {err}");
                active_chat.set(None);
                return;
            }
        }

        // A stream started elsewhere may still be writing into this chat.
        // Resume observing it; never re-issue the provider call.
        if let Some(entry) = ongoing::registry().find_for_chat(&chat_id) {
            messages.with_mut(|msgs| {
                let already = msgs.iter().any(|msg| {
                    msg.sender == Sender::Ai
                        && msg.timestamp == entry.ai_message_id
                        && msg.message_id.as_deref() == Some(entry.message_id.as_str())
                });
                if !already {
                    reconcile::insert_placeholder(
                        msgs,
                        entry.retry,
                        entry.ai_message_id,
                        Some(entry.message_id.clone()),
                    );
                }
            });
            loading.set(true);
            poll_exchange(
                messages,
                loading,
                client,
                chats,
                chats_error,
                entry.stream,
                entry.ai_message_id,
                entry.message_id.clone(),
                entry.retry,
            )
            .await;
        }
    });

    let mut send_message = move |text: String| {
        let trimmed = text.trim().to_string();
        let files_now = attached_files();
        if (trimmed.is_empty() && files_now.is_empty()) || loading() {
            return;
        }
        let files = if files_now.is_empty() {
            None
        } else {
            Some(files_now)
        };

        let mut input = input;
        let mut attached_files = attached_files;
        messages.with_mut(|msgs| msgs.push(Message::user(trimmed.clone(), files.clone())));
        input.set(String::new());
        attached_files.set(Vec::new());
        loading.set(true);

        let chat_id = chat();
        let client = api();
        spawn(async move {
            let prompt = reconcile::build_prompt(&trimmed, files.as_deref());
            let message_id = match client
                .save_user_message(&chat_id, &trimmed, files.as_deref())
                .await
            {
                Ok(id) => id,
                Err(err) => {
                    // Non-fatal: the message stays on screen, the reply is
                    // keyed by a local id instead.
                    warn!("failed to save user message for chat {chat_id}: {err}");
                    fallback_message_id()
                }
            };

            let user_index = messages.with_mut(|msgs| {
                if let Some(last) = msgs
                    .iter_mut()
                    .rev()
                    .find(|msg| msg.sender == Sender::User && msg.message_id.is_none())
                {
                    last.message_id = Some(message_id.clone());
                }
                msgs.len().saturating_sub(1)
            });

            let ai_message_id = now_ms();
            messages.with_mut(|msgs| {
                reconcile::insert_placeholder(msgs, None, ai_message_id, Some(message_id.clone()));
            });

            let stream_id = session::start_exchange(
                client.clone(),
                ExchangeRequest {
                    chat_id,
                    prompt,
                    ai_message_id,
                    message_id: message_id.clone(),
                    retry: None,
                },
            );
            poll_exchange(
                messages,
                loading,
                client,
                chats,
                chats_error,
                stream_id,
                ai_message_id,
                message_id,
                Some(user_index),
            )
            .await;
        });
    };

    // User-initiated retry for an orphaned user message: the reply slot is
    // spliced in directly after it, not appended.
    let mut retry_message = move |index: usize| {
        if loading() {
            return;
        }
        let Some(user_message) = messages.with(|msgs| msgs.get(index).cloned()) else {
            return;
        };
        if user_message.sender != Sender::User {
            return;
        }

        let message_id = user_message
            .message_id
            .clone()
            .unwrap_or_else(fallback_message_id);
        let prompt = reconcile::build_prompt(
            &user_message.text.as_plain(),
            user_message.files.as_deref(),
        );
        let ai_message_id = now_ms();

        loading.set(true);
        messages.with_mut(|msgs| {
            reconcile::insert_placeholder(msgs, Some(index), ai_message_id, Some(message_id.clone()));
        });

        let chat_id = chat();
        let client = api();
        spawn(async move {
            let stream_id = session::start_exchange(
                client.clone(),
                ExchangeRequest {
                    chat_id,
                    prompt,
                    ai_message_id,
                    message_id: message_id.clone(),
                    retry: Some(index),
                },
            );
            poll_exchange(
                messages,
                loading,
                client,
                chats,
                chats_error,
                stream_id,
                ai_message_id,
                message_id,
                Some(index),
            )
            .await;
        });
    };

    let messages_snapshot = messages();
    let loading_now = loading();

    rsx! {
        div { class: "chat-area",
            div { class: "messages-body",
                if messages_snapshot.is_empty() && !loading_now {
                    div { class: "welcome-center",
                        h2 { "Welcome, User" }
                        p { "Ask me anything!" }
                    }
                }
                for (i, msg) in messages_snapshot.iter().enumerate() {
                    {
                        let side = match msg.sender {
                            Sender::User => "user",
                            Sender::Ai => "ai",
                        };
                        let text_plain = msg.text.as_plain();
                        rsx! {
                            div { class: "message-row {side}",
                                div { class: "message-stack",
                                    if is_pending_ai(msg, loading_now) {
                                        div { class: "shimmer-line",
                                            span { class: "shimmer-text", "Typing…" }
                                        }
                                    } else {
                                        div { class: "bubble {side}",
                                            if matches!(msg.sender, Sender::Ai) {
                                                AiBubble { content: text_plain, show_copy: !loading_now }
                                            } else {
                                                "{text_plain}"
                                            }
                                        }
                                    }
                                    if let Some(files) = msg.files.clone().filter(|files| !files.is_empty()) {
                                        FileChips { files }
                                    }
                                    if let Some(ts) = format_message_timestamp(msg.timestamp) {
                                        div { class: "message-meta",
                                            span { class: "message-timestamp", "{ts}" }
                                        }
                                    }
                                    if reconcile::is_orphan(&messages_snapshot, i) && !loading_now {
                                        button {
                                            class: "btn retry-btn", r#type: "button",
                                            onclick: move |_| retry_message(i),
                                            "Retry"
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }

            div { class: "input-wrapper",
                Composer {
                    input,
                    attached_files,
                    base_font_px,
                    disabled: loading_now,
                    on_send: move |_| {
                        let text = input();
                        send_message(text);
                    },
                }
            }
        }
    }
}

#[component]
fn AiBubble(content: String, show_copy: bool) -> Element {
    let content_html = markdown_to_html(&content);
    let copy_payload = content.clone();
    let on_copy = move |_| {
        let raw = copy_payload.clone();
        spawn(async move {
            #[cfg(any(feature = "desktop", feature = "mobile"))]
            {
                if let Ok(mut cb) = arboard::Clipboard::new() {
                    let _ = cb.set_text(raw);
                }
            }
        });
    };

    rsx! {
        if show_copy && !content.is_empty() {
            div { class: "bubble-controls",
                button { class: "action-btn", title: "Copy", onclick: on_copy, "Copy" }
            }
        }
        div { class: "md", dangerous_inner_html: "{content_html}" }
    }
}

/// First message of a brand-new chat: the backend already stored the user
/// message when the chat was created, so only the AI side runs here.
async fn send_first_message(
    mut messages: Signal<Vec<Message>>,
    mut loading: Signal<bool>,
    api: ApiClient,
    chats: Signal<Vec<ChatSummary>>,
    chats_error: Signal<bool>,
    chat_id: String,
    first: FirstChatData,
) {
    let message_id = first.message_id.unwrap_or_else(fallback_message_id);
    messages.with_mut(|msgs| {
        msgs.push(Message {
            message_id: Some(message_id.clone()),
            sender: Sender::User,
            text: first.text.clone().into(),
            files: first.files.clone(),
            timestamp: now_ms(),
        });
    });
    loading.set(true);

    let prompt = reconcile::build_prompt(&first.text, first.files.as_deref());
    let ai_message_id = now_ms();
    messages.with_mut(|msgs| {
        reconcile::insert_placeholder(msgs, None, ai_message_id, Some(message_id.clone()));
    });

    let stream_id = session::start_exchange(
        api.clone(),
        ExchangeRequest {
            chat_id,
            prompt,
            ai_message_id,
            message_id: message_id.clone(),
            retry: None,
        },
    );
    poll_exchange(
        messages,
        loading,
        api,
        chats,
        chats_error,
        stream_id,
        ai_message_id,
        message_id,
        Some(0),
    )
    .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MessageText;

    #[test]
    fn pending_detection_requires_empty_streaming_ai() {
        let pending = Message::placeholder(100, Some("m1".into()));
        assert!(is_pending_ai(&pending, true));
        assert!(!is_pending_ai(&pending, false));

        let answered = Message {
            text: MessageText::Single("done".into()),
            ..Message::placeholder(100, Some("m1".into()))
        };
        assert!(!is_pending_ai(&answered, true));

        let user = Message::user("hi", None);
        assert!(!is_pending_ai(&user, true));
    }
}
