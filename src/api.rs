//! Thin client for the chat persistence backend.
//!
//! All external shapes are validated at this boundary and normalized into
//! the internal [`Message`] type once; unchecked backend records never reach
//! view state.

use crate::types::{ChatSummary, FileAttachment, Message, MessageText, Sender};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_BASE_URL: &str = "http://localhost:3000";
const DEFAULT_USER_ID: &str = "user123";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("chat not found")]
    NotFound,
    #[error("server does not support this route")]
    RouteMissing,
    #[error("backend error {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("malformed response from backend: {0}")]
    Malformed(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    user_id: String,
}

// ---------------
// Wire shapes
// ---------------

#[derive(Deserialize)]
pub struct CreatedChat {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "messageId", default)]
    pub message_id: Option<String>,
}

#[derive(Deserialize)]
struct HistoryResponse {
    history: Option<Vec<HistoryRecord>>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryRecord {
    #[serde(rename = "messageId", default)]
    pub message_id: Option<String>,
    pub role: String,
    #[serde(default)]
    pub parts: Vec<HistoryPart>,
    #[serde(default)]
    pub files: Option<Vec<FileAttachment>>,
    #[serde(default)]
    pub timestamp: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryPart {
    #[serde(default)]
    pub text: String,
}

#[derive(Serialize)]
struct CreateChatBody<'a> {
    #[serde(rename = "userId")]
    user_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    files: Option<&'a [FileAttachment]>,
}

#[derive(Serialize)]
struct SaveUserBody<'a> {
    #[serde(rename = "userId")]
    user_id: &'a str,
    question: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    files: Option<&'a [FileAttachment]>,
}

#[derive(Deserialize)]
struct SaveUserResponse {
    #[serde(rename = "messageId")]
    message_id: String,
}

#[derive(Serialize)]
struct SaveAiBody<'a> {
    #[serde(rename = "userId")]
    user_id: &'a str,
    answer: &'a str,
    #[serde(rename = "messageId")]
    message_id: &'a str,
}

/// A backend history record mapped into the internal message shape.
/// Exactly one part collapses to a single string; anything else keeps the
/// ordered parts. Unknown roles are treated as AI output.
pub fn normalize_record(record: HistoryRecord) -> Message {
    let sender = if record.role == "user" {
        Sender::User
    } else {
        Sender::Ai
    };
    let mut texts: Vec<String> = record.parts.into_iter().map(|part| part.text).collect();
    let text = if texts.len() == 1 {
        MessageText::Single(texts.remove(0))
    } else {
        MessageText::Parts(texts)
    };
    Message {
        message_id: record.message_id,
        sender,
        text,
        files: record.files,
        timestamp: record.timestamp.unwrap_or(0),
    }
}

impl ApiClient {
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("CHAT_API_BASE").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let user_id = std::env::var("CHAT_USER_ID").unwrap_or_else(|_| DEFAULT_USER_ID.to_string());
        Self::new(base_url, user_id)
    }

    pub fn new(base_url: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            user_id: user_id.into(),
        }
    }

    /// Create a new chat seeded with the first user message.
    pub async fn create_chat(
        &self,
        text: &str,
        files: Option<&[FileAttachment]>,
    ) -> ApiResult<CreatedChat> {
        let url = format!("{}/api/chats", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&CreateChatBody {
                user_id: &self.user_id,
                text,
                files,
            })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::Status { status, body });
        }
        serde_json::from_str::<CreatedChat>(&body).map_err(|err| ApiError::Malformed(err.to_string()))
    }

    /// Fetch and normalize a chat's message history.
    ///
    /// A missing history array is treated the same as a missing chat: the
    /// caller navigates back home either way.
    pub async fn fetch_history(&self, chat_id: &str) -> ApiResult<Vec<Message>> {
        let url = format!(
            "{}/api/chats/{}?userId={}",
            self.base_url, chat_id, self.user_id
        );
        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound);
        }
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::Status { status, body });
        }

        let parsed: HistoryResponse =
            serde_json::from_str(&body).map_err(|err| ApiError::Malformed(err.to_string()))?;
        let records = parsed
            .history
            .ok_or_else(|| ApiError::Malformed("missing history array".to_string()))?;
        Ok(records.into_iter().map(normalize_record).collect())
    }

    /// Persist a user message; returns the backend-assigned message id.
    pub async fn save_user_message(
        &self,
        chat_id: &str,
        question: &str,
        files: Option<&[FileAttachment]>,
    ) -> ApiResult<String> {
        let url = format!("{}/api/chats/{}/user", self.base_url, chat_id);
        let response = self
            .http
            .put(&url)
            .json(&SaveUserBody {
                user_id: &self.user_id,
                question,
                files,
            })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::Status { status, body });
        }
        serde_json::from_str::<SaveUserResponse>(&body)
            .map(|resp| resp.message_id)
            .map_err(|err| ApiError::Malformed(err.to_string()))
    }

    /// Persist an AI answer (or an error string standing in for one) against
    /// the message id of the user message that triggered it.
    pub async fn save_ai_message(
        &self,
        chat_id: &str,
        answer: &str,
        message_id: &str,
    ) -> ApiResult<()> {
        let url = format!("{}/api/chats/{}/ai", self.base_url, chat_id);
        let response = self
            .http
            .put(&url)
            .json(&SaveAiBody {
                user_id: &self.user_id,
                answer,
                message_id,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status { status, body });
        }
        Ok(())
    }

    /// Delete a chat. A 404 whose body says the route itself is missing is
    /// distinguished from a 404 for an unknown chat.
    pub async fn delete_chat(&self, chat_id: &str) -> ApiResult<()> {
        let url = format!(
            "{}/api/chats/{}?userId={}",
            self.base_url, chat_id, self.user_id
        );
        let response = self.http.delete(&url).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::NOT_FOUND {
            if body.contains("Cannot DELETE") {
                return Err(ApiError::RouteMissing);
            }
            return Err(ApiError::NotFound);
        }
        Err(ApiError::Status { status, body })
    }

    /// Chat summaries for the sidebar, newest first.
    pub async fn list_chats(&self) -> ApiResult<Vec<ChatSummary>> {
        let url = format!("{}/api/userchats?userId={}", self.base_url, self.user_id);
        let response = self.http.get(&url).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::Status { status, body });
        }
        let mut chats: Vec<ChatSummary> =
            serde_json::from_str(&body).map_err(|err| ApiError::Malformed(err.to_string()))?;
        chats.reverse();
        Ok(chats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(json: &str) -> HistoryRecord {
        serde_json::from_str(json).expect("record should parse")
    }

    #[test]
    fn single_part_collapses_to_string() {
        let msg = normalize_record(record(
            r#"{"messageId":"m1","role":"user","parts":[{"text":"hello"}],"timestamp":42}"#,
        ));
        assert_eq!(msg.sender, Sender::User);
        assert_eq!(msg.text, MessageText::Single("hello".into()));
        assert_eq!(msg.message_id.as_deref(), Some("m1"));
        assert_eq!(msg.timestamp, 42);
    }

    #[test]
    fn multi_part_keeps_ordered_parts() {
        let msg = normalize_record(record(
            r#"{"role":"model","parts":[{"text":"a"},{"text":"b"}]}"#,
        ));
        assert_eq!(msg.sender, Sender::Ai);
        assert_eq!(msg.text, MessageText::Parts(vec!["a".into(), "b".into()]));
        assert_eq!(msg.timestamp, 0);
    }

    #[test]
    fn unknown_role_maps_to_ai() {
        let msg = normalize_record(record(r#"{"role":"assistant","parts":[{"text":"x"}]}"#));
        assert_eq!(msg.sender, Sender::Ai);
    }

    #[test]
    fn saved_message_round_trips_through_history_shape() {
        let files = vec![FileAttachment {
            name: "a.txt".into(),
            size: 3,
            mime_type: "text/plain".into(),
            content: Some("abc".into()),
            last_modified: None,
        }];
        let saved = Message {
            message_id: Some("m9".into()),
            sender: Sender::User,
            text: MessageText::Single("Ping".into()),
            files: Some(files.clone()),
            timestamp: 1234,
        };

        // What the backend hands back for the same message.
        let wire = format!(
            r#"{{"messageId":"m9","role":"user","parts":[{{"text":"Ping"}}],"files":{},"timestamp":1234}}"#,
            serde_json::to_string(&files).unwrap()
        );
        let fetched = normalize_record(record(&wire));
        assert_eq!(fetched, saved);
    }

    #[test]
    fn missing_history_is_malformed() {
        let parsed: HistoryResponse = serde_json::from_str(r#"{"something":"else"}"#).unwrap();
        assert!(parsed.history.is_none());
    }
}
