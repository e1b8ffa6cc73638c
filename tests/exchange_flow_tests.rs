//! Scenario tests for a full exchange lifecycle: placeholder creation,
//! streamed updates, error substitution, and registry-driven resume after
//! a view remount. No network; the stream is simulated by the sequence of
//! accumulated snapshots a poller would observe.

use gemchat::ongoing::{OngoingChat, OngoingChats};
use gemchat::reconcile::{
    apply_stream_text, insert_placeholder, is_orphan, write_error_after,
};
use gemchat::session::GEMINI_ERROR_PREFIX;
use gemchat::types::{Message, MessageText, Sender};

fn user_message(text: &str, message_id: &str) -> Message {
    Message {
        message_id: Some(message_id.to_string()),
        sender: Sender::User,
        text: MessageText::Single(text.to_string()),
        files: None,
        timestamp: 1,
    }
}

#[test]
fn streamed_exchange_fills_placeholder_and_clears_registry() {
    let registry = OngoingChats::new();
    let mut messages = vec![user_message("Ping", "m1")];

    // Send: placeholder goes in, exchange registers as ongoing.
    let ai_message_id = 100;
    insert_placeholder(&mut messages, None, ai_message_id, Some("m1".into()));
    registry.push(OngoingChat {
        chat_id: "chat-1".into(),
        ai_message_id,
        message_id: "m1".into(),
        retry: None,
        stream: 7,
    });
    assert!(!is_orphan(&messages, 0));

    // Chunks arrive as growing accumulated text.
    for snapshot in ["Pon", "Pong"] {
        assert!(apply_stream_text(&mut messages, ai_message_id, "m1", snapshot));
    }
    assert_eq!(messages[1].text.as_plain(), "Pong");

    // Completion pops the registry; the chat has nothing in flight.
    registry.pop("chat-1", ai_message_id);
    assert!(registry.find_for_chat("chat-1").is_none());
    assert!(!is_orphan(&messages, 0));
}

#[test]
fn failed_exchange_surfaces_error_text_and_offers_retry() {
    let registry = OngoingChats::new();
    let mut messages = vec![user_message("Ping", "m1")];

    let ai_message_id = 100;
    insert_placeholder(&mut messages, None, ai_message_id, Some("m1".into()));
    registry.push(OngoingChat {
        chat_id: "chat-1".into(),
        ai_message_id,
        message_id: "m1".into(),
        retry: None,
        stream: 7,
    });

    // Zero chunks arrive; the stream fails and the error text lands in the
    // answer slot.
    let error_text = format!("{GEMINI_ERROR_PREFIX} connection refused");
    write_error_after(&mut messages, 0, Some("m1"), &error_text, ai_message_id);
    registry.pop("chat-1", ai_message_id);

    assert_eq!(messages.len(), 2);
    assert!(messages[1].text.as_plain().starts_with(GEMINI_ERROR_PREFIX));
    // An error answer still occupies the slot, so no retry is offered for
    // the answered message; the retry path is for truly unanswered ones.
    assert!(!is_orphan(&messages, 0));
}

#[test]
fn remount_resumes_streaming_placeholder_from_registry() {
    let registry = OngoingChats::new();

    // The stream was started by a view that has since unmounted.
    registry.push(OngoingChat {
        chat_id: "chat-1".into(),
        ai_message_id: 100,
        message_id: "m1".into(),
        retry: None,
        stream: 7,
    });

    // Remount: history has only the user message, the registry says an
    // answer is still streaming, so the placeholder is recreated.
    let mut messages = vec![user_message("Ping", "m1")];
    let entry = registry.find_for_chat("chat-1").expect("entry should exist");
    let already = messages.iter().any(|msg| {
        msg.sender == Sender::Ai
            && msg.timestamp == entry.ai_message_id
            && msg.message_id.as_deref() == Some(entry.message_id.as_str())
    });
    assert!(!already);
    insert_placeholder(
        &mut messages,
        entry.retry,
        entry.ai_message_id,
        Some(entry.message_id.clone()),
    );

    // Polling picks up mid-stream with the full accumulated text.
    assert!(apply_stream_text(
        &mut messages,
        entry.ai_message_id,
        &entry.message_id,
        "Pong"
    ));
    assert_eq!(messages[1].text.as_plain(), "Pong");
}

#[test]
fn retry_splices_answer_after_the_orphaned_message() {
    let mut messages = vec![
        user_message("first", "m1"),
        user_message("second", "m2"),
        Message {
            message_id: Some("m2".into()),
            sender: Sender::Ai,
            text: MessageText::Single("answer two".into()),
            files: None,
            timestamp: 50,
        },
    ];
    assert!(is_orphan(&messages, 0));

    // Retry the first message; its answer goes directly after it, not at
    // the end of the list.
    let at = insert_placeholder(&mut messages, Some(0), 100, Some("m1".into()));
    assert_eq!(at, 1);
    assert!(apply_stream_text(&mut messages, 100, "m1", "answer one"));

    let texts: Vec<String> = messages.iter().map(|m| m.text.as_plain()).collect();
    assert_eq!(texts, ["first", "answer one", "second", "answer two"]);
    assert!(!is_orphan(&messages, 0));
    assert!(!is_orphan(&messages, 2));
}
