//! Pure bookkeeping over the ordered message list: orphan detection,
//! in-place stream updates, and error substitution. No side effects here;
//! everything is recomputed or applied against the caller's list.

use crate::types::{FileAttachment, Message, MessageText, Sender};

/// A user message is an orphan when nothing answered it: the next message
/// either does not exist or is not from the AI. Orphans are the only
/// messages eligible for a user-initiated retry.
pub fn is_orphan(messages: &[Message], index: usize) -> bool {
    let Some(message) = messages.get(index) else {
        return false;
    };
    if message.sender != Sender::User {
        return false;
    }
    match messages.get(index + 1) {
        Some(next) => next.sender != Sender::Ai,
        None => true,
    }
}

/// Replace (never append onto) the text of the streaming AI message keyed by
/// `(timestamp == ai_message_id, message_id)`. Replacement with the full
/// accumulated text tolerates out-of-order re-renders. Returns whether a
/// message was updated.
pub fn apply_stream_text(
    messages: &mut [Message],
    ai_message_id: u64,
    message_id: &str,
    text: &str,
) -> bool {
    let mut updated = false;
    for message in messages.iter_mut() {
        if message.timestamp == ai_message_id
            && message.message_id.as_deref() == Some(message_id)
        {
            message.text = MessageText::Single(text.to_string());
            updated = true;
        }
    }
    updated
}

/// Insert an empty AI placeholder directly after `after` (retry), or append
/// it (normal send). Returns the placeholder's index.
pub fn insert_placeholder(
    messages: &mut Vec<Message>,
    after: Option<usize>,
    ai_message_id: u64,
    message_id: Option<String>,
) -> usize {
    let placeholder = Message::placeholder(ai_message_id, message_id);
    match after {
        Some(index) if index + 1 <= messages.len() => {
            messages.insert(index + 1, placeholder);
            index + 1
        }
        _ => {
            messages.push(placeholder);
            messages.len() - 1
        }
    }
}

/// Write an error string in place of the answer to the user message at
/// `user_index`: overwrite the AI message directly following it when it
/// belongs to the same exchange, otherwise splice a new error AI message in
/// at that position.
pub fn write_error_after(
    messages: &mut Vec<Message>,
    user_index: usize,
    message_id: Option<&str>,
    error_text: &str,
    ai_message_id: u64,
) {
    let matches_exchange = |next: &Message| {
        next.sender == Sender::Ai
            && (message_id.is_none() || next.message_id.as_deref() == message_id)
    };

    if let Some(next) = messages.get_mut(user_index + 1) {
        if matches_exchange(next) {
            next.text = MessageText::Single(error_text.to_string());
            return;
        }
    }

    let error_message = Message {
        message_id: message_id.map(|id| id.to_string()),
        sender: Sender::Ai,
        text: MessageText::Single(error_text.to_string()),
        files: None,
        timestamp: ai_message_id,
    };
    let at = (user_index + 1).min(messages.len());
    messages.insert(at, error_message);
}

/// Re-derive the provider prompt from a message's original text and files.
pub fn build_prompt(text: &str, files: Option<&[FileAttachment]>) -> String {
    let trimmed = text.trim();
    let Some(files) = files.filter(|files| !files.is_empty()) else {
        return trimmed.to_string();
    };
    let file_info = files
        .iter()
        .map(|file| format!("File: {} ({})", file.name, file.mime_type))
        .collect::<Vec<_>>()
        .join(", ");
    if trimmed.is_empty() {
        format!("Analyze these files: {file_info}")
    } else {
        format!("{trimmed}\n\nAttached files: {file_info}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(message_id: Option<&str>, ts: u64) -> Message {
        Message {
            message_id: message_id.map(|id| id.to_string()),
            sender: Sender::User,
            text: MessageText::Single("question".into()),
            files: None,
            timestamp: ts,
        }
    }

    fn ai(message_id: Option<&str>, ts: u64, text: &str) -> Message {
        Message {
            message_id: message_id.map(|id| id.to_string()),
            sender: Sender::Ai,
            text: MessageText::Single(text.into()),
            files: None,
            timestamp: ts,
        }
    }

    #[test]
    fn orphan_truth_table() {
        let answered = vec![user(Some("m1"), 1), ai(Some("m1"), 2, "answer")];
        assert!(!is_orphan(&answered, 0));
        // An AI message is never an orphan.
        assert!(!is_orphan(&answered, 1));

        let unanswered = vec![user(Some("m1"), 1)];
        assert!(is_orphan(&unanswered, 0));

        let back_to_back = vec![user(Some("m1"), 1), user(Some("m2"), 2)];
        assert!(is_orphan(&back_to_back, 0));
        assert!(is_orphan(&back_to_back, 1));

        // Out of range.
        assert!(!is_orphan(&unanswered, 5));
    }

    #[test]
    fn stream_text_replaces_instead_of_appending() {
        let mut messages = vec![user(Some("m1"), 1), Message::placeholder(100, Some("m1".into()))];

        assert!(apply_stream_text(&mut messages, 100, "m1", "Hel"));
        assert!(apply_stream_text(&mut messages, 100, "m1", "Hello "));
        assert!(apply_stream_text(&mut messages, 100, "m1", "Hello  world"));
        assert_eq!(messages[1].text.as_plain(), "Hello  world");
    }

    #[test]
    fn stream_text_requires_both_keys() {
        let mut messages = vec![Message::placeholder(100, Some("m1".into()))];
        assert!(!apply_stream_text(&mut messages, 100, "other", "x"));
        assert!(!apply_stream_text(&mut messages, 200, "m1", "x"));
        assert!(messages[0].text.is_empty());
    }

    #[test]
    fn placeholder_appends_or_splices() {
        let mut messages = vec![user(Some("m1"), 1), user(Some("m2"), 2)];

        let appended = insert_placeholder(&mut messages, None, 100, Some("m2".into()));
        assert_eq!(appended, 2);

        // Retry for the first user message goes directly after it.
        let spliced = insert_placeholder(&mut messages, Some(0), 200, Some("m1".into()));
        assert_eq!(spliced, 1);
        assert_eq!(messages[1].timestamp, 200);
        assert_eq!(messages[1].sender, Sender::Ai);
        assert_eq!(messages.len(), 4);
    }

    #[test]
    fn error_overwrites_existing_answer_slot() {
        let mut messages = vec![user(Some("m1"), 1), ai(Some("m1"), 100, "partial")];
        write_error_after(&mut messages, 0, Some("m1"), "Error: boom", 100);

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].text.as_plain(), "Error: boom");
    }

    #[test]
    fn error_inserts_when_no_answer_follows() {
        let mut messages = vec![user(Some("m1"), 1), user(Some("m2"), 2)];
        write_error_after(&mut messages, 0, Some("m1"), "Error: boom", 100);

        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].sender, Sender::Ai);
        assert_eq!(messages[1].message_id.as_deref(), Some("m1"));
        assert_eq!(messages[1].text.as_plain(), "Error: boom");
        // The second user message shifted right.
        assert_eq!(messages[2].message_id.as_deref(), Some("m2"));
    }

    #[test]
    fn prompt_includes_attachment_summary() {
        let files = vec![FileAttachment {
            name: "report.pdf".into(),
            size: 10,
            mime_type: "application/pdf".into(),
            content: None,
            last_modified: None,
        }];

        assert_eq!(build_prompt("Summarize this", None), "Summarize this");
        assert_eq!(
            build_prompt("Summarize this", Some(&files)),
            "Summarize this\n\nAttached files: File: report.pdf (application/pdf)"
        );
        assert_eq!(
            build_prompt("  ", Some(&files)),
            "Analyze these files: File: report.pdf (application/pdf)"
        );
    }
}
