use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Ai,
}

/// Message body. Backend history items carry an ordered list of parts;
/// a single part collapses to a plain string on normalization.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageText {
    Single(String),
    Parts(Vec<String>),
}

impl MessageText {
    pub fn empty() -> Self {
        MessageText::Single(String::new())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            MessageText::Single(text) => text.is_empty(),
            MessageText::Parts(parts) => parts.iter().all(|part| part.is_empty()),
        }
    }

    /// Flattened form used for rendering and prompt derivation. Parts are
    /// separated by blank lines so each stays its own markdown paragraph.
    pub fn as_plain(&self) -> String {
        match self {
            MessageText::Single(text) => text.clone(),
            MessageText::Parts(parts) => parts.join("\n\n"),
        }
    }
}

impl From<String> for MessageText {
    fn from(text: String) -> Self {
        MessageText::Single(text)
    }
}

impl From<&str> for MessageText {
    fn from(text: &str) -> Self {
        MessageText::Single(text.to_string())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileAttachment {
    pub name: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub mime_type: String,
    /// Plain text for text-like files, data URL for everything else.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Durable id assigned by the backend; None until persistence succeeds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    pub sender: Sender,
    pub text: MessageText,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<FileAttachment>>,
    /// Milliseconds since the Unix epoch. Doubles as the unique id of an
    /// in-progress AI message before the backend assigns a durable one.
    pub timestamp: u64,
}

impl Message {
    pub fn user(text: impl Into<MessageText>, files: Option<Vec<FileAttachment>>) -> Self {
        Self {
            message_id: None,
            sender: Sender::User,
            text: text.into(),
            files,
            timestamp: now_ms(),
        }
    }

    /// Empty AI message a live stream will write into.
    pub fn placeholder(ai_message_id: u64, message_id: Option<String>) -> Self {
        Self {
            message_id,
            sender: Sender::Ai,
            text: MessageText::empty(),
            files: None,
            timestamp: ai_message_id,
        }
    }
}

/// Sidebar listing entry returned by `GET /api/userchats`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSummary {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Hand-off from the dashboard to the newly created chat's view.
/// Must be consumed exactly once, or the first message gets re-sent on
/// remount.
#[derive(Clone, Debug, PartialEq)]
pub struct FirstChatData {
    pub text: String,
    pub files: Option<Vec<FileAttachment>>,
    pub message_id: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThemeMode {
    Dark,
    Light,
}

pub fn now_ms() -> u64 {
    let nanos = OffsetDateTime::now_utc().unix_timestamp_nanos();
    (nanos / 1_000_000) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_text_collapses_to_plain() {
        let single = MessageText::Single("hello".into());
        assert_eq!(single.as_plain(), "hello");

        // Separate paragraphs, not one markdown-collapsed line.
        let parts = MessageText::Parts(vec!["one".into(), "two".into()]);
        assert_eq!(parts.as_plain(), "one\n\ntwo");
    }

    #[test]
    fn message_text_untagged_serde() {
        let single: MessageText = serde_json::from_str(r#""hi""#).unwrap();
        assert_eq!(single, MessageText::Single("hi".into()));

        let parts: MessageText = serde_json::from_str(r#"["a","b"]"#).unwrap();
        assert_eq!(parts, MessageText::Parts(vec!["a".into(), "b".into()]));
    }

    #[test]
    fn sender_uses_lowercase_wire_names() {
        assert_eq!(serde_json::to_string(&Sender::User).unwrap(), r#""user""#);
        assert_eq!(serde_json::to_string(&Sender::Ai).unwrap(), r#""ai""#);
    }

    #[test]
    fn attachment_round_trips_camel_case() {
        let file = FileAttachment {
            name: "notes.txt".into(),
            size: 12,
            mime_type: "text/plain".into(),
            content: Some("hello world!".into()),
            last_modified: Some(1_700_000_000_000),
        };
        let json = serde_json::to_string(&file).unwrap();
        assert!(json.contains(r#""lastModified""#));
        assert!(json.contains(r#""type":"text/plain""#));
        let back: FileAttachment = serde_json::from_str(&json).unwrap();
        assert_eq!(back, file);
    }
}
