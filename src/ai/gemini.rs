use crate::storage;
use futures::StreamExt;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_MODEL: &str = "gemini-1.5-flash";
const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Debug, Error)]
pub enum AiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Gemini error {status}: {body}")]
    Api { status: StatusCode, body: String },
    #[error("no GEMINI_API_KEY configured; set the env var or save a key in settings")]
    MissingKey,
    #[error("Gemini returned no candidates")]
    EmptyResponse,
}

pub type AiResult<T> = Result<T, AiError>;

pub struct GeminiClient {
    client: Client,
    model: String,
    api_key: String,
}

// ---------------
// Wire shapes
// ---------------

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
    #[serde(rename = "finishReason", default)]
    pub finish_reason: Option<String>,
}

#[derive(Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
pub struct CandidatePart {
    #[serde(default)]
    pub text: String,
}

/// Decode one SSE `data:` payload into `(text piece, stream finished)`.
pub fn parse_gemini_sse_data(data: &str) -> Option<(String, bool)> {
    let trimmed = data.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed == "[DONE]" {
        return Some((String::new(), true));
    }

    let parsed: GenerateResponse = serde_json::from_str(trimmed).ok()?;
    let candidate = parsed.candidates.into_iter().next()?;
    let done = candidate.finish_reason.is_some();
    let piece = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .map(|part| part.text)
                .collect::<String>()
        })
        .unwrap_or_default();
    Some((piece, done))
}

/// Incremental SSE framing: feed raw bytes as they arrive, get back the
/// complete `data:` payloads. Multi-line data fields are joined, events are
/// delimited by blank lines, CR is tolerated.
#[derive(Default)]
pub struct SseParser {
    buffer: String,
    data_acc: Option<String>,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, chunk: &str) -> Vec<String> {
        let mut payloads = Vec::new();
        self.buffer.push_str(chunk);
        while let Some(pos) = self.buffer.find('\n') {
            let mut line = self.buffer[..pos].to_string();
            if line.ends_with('\r') {
                line.pop();
            }
            self.buffer = self.buffer[pos + 1..].to_string();

            if line.is_empty() {
                // End of event
                if let Some(data) = self.data_acc.take() {
                    payloads.push(data);
                }
                continue;
            }

            if let Some(rest) = line.strip_prefix("data:") {
                let fragment = rest.trim_start();
                match &mut self.data_acc {
                    Some(acc) => acc.push_str(fragment),
                    None => self.data_acc = Some(fragment.to_string()),
                }
            }
        }
        payloads
    }

    /// Flush a trailing event that was never terminated by a blank line.
    pub fn finish(&mut self) -> Option<String> {
        self.data_acc.take()
    }
}

impl GeminiClient {
    /// Configure from `GEMINI_API_KEY` / `GEMINI_MODEL`, falling back to the
    /// key saved through the settings view.
    pub fn from_env() -> AiResult<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|key| !key.is_empty())
            .or_else(storage::gemini_api_key)
            .ok_or(AiError::MissingKey)?;
        let model = std::env::var("GEMINI_MODEL")
            .ok()
            .filter(|model| !model.is_empty())
            .or_else(storage::selected_model)
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        Ok(Self::new(model, api_key))
    }

    pub fn new(model: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            model: model.into(),
            api_key: api_key.into(),
        }
    }

    fn request_body(prompt: &str) -> GenerateRequest<'_> {
        GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        }
    }

    /// Single-shot completion.
    pub async fn generate(&self, prompt: &str) -> AiResult<String> {
        let url = format!("{}/{}:generateContent", API_BASE, self.model);
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::request_body(prompt))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(AiError::Api { status, body });
        }

        let parsed: GenerateResponse =
            serde_json::from_str(&body).map_err(|_| AiError::EmptyResponse)?;
        let candidate = parsed
            .candidates
            .into_iter()
            .next()
            .ok_or(AiError::EmptyResponse)?;
        let text = candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .map(|part| part.text)
                    .collect::<String>()
            })
            .unwrap_or_default();
        Ok(text)
    }

    /// Streaming completion. `on_chunk` receives the cumulative
    /// concatenation of everything streamed so far (not the delta), once per
    /// received event, in provider order. Returns the final full text.
    pub async fn stream_generate(
        &self,
        prompt: &str,
        mut on_chunk: impl FnMut(&str),
    ) -> AiResult<String> {
        let url = format!("{}/{}:streamGenerateContent?alt=sse", API_BASE, self.model);
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("accept", "text/event-stream")
            .json(&Self::request_body(prompt))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::Api { status, body });
        }

        let mut full = String::new();
        let mut parser = SseParser::new();
        let mut stream = response.bytes_stream();
        while let Some(item) = stream.next().await {
            let bytes = item?;
            let chunk = String::from_utf8_lossy(&bytes);
            for data in parser.feed(&chunk) {
                if let Some((piece, done)) = parse_gemini_sse_data(&data) {
                    if !piece.is_empty() {
                        full.push_str(&piece);
                        on_chunk(&full);
                    }
                    if done {
                        return Ok(full);
                    }
                }
            }
        }
        if let Some(data) = parser.finish() {
            if let Some((piece, _)) = parse_gemini_sse_data(&data) {
                if !piece.is_empty() {
                    full.push_str(&piece);
                    on_chunk(&full);
                }
            }
        }

        Ok(full)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_gemini_data_payloads() {
        assert!(parse_gemini_sse_data("").is_none());
        assert_eq!(
            parse_gemini_sse_data("[DONE]"),
            Some((String::new(), true))
        );
        assert_eq!(
            parse_gemini_sse_data(r#"{"candidates":[{"content":{"parts":[{"text":"hello"}]}}]}"#),
            Some(("hello".to_string(), false))
        );
        assert_eq!(
            parse_gemini_sse_data(
                r#"{"candidates":[{"content":{"parts":[{"text":"!"}]},"finishReason":"STOP"}]}"#
            ),
            Some(("!".to_string(), true))
        );
        assert!(parse_gemini_sse_data("not json").is_none());
    }

    #[test]
    fn sse_parser_reassembles_split_events() {
        let mut parser = SseParser::new();

        // One event arriving across two network chunks.
        assert!(parser.feed("data: {\"a\":").is_empty());
        let events = parser.feed("1}\n\ndata: {\"b\":2}\n\n");
        assert_eq!(events, vec![r#"{"a":1}"#.to_string(), r#"{"b":2}"#.to_string()]);
    }

    #[test]
    fn sse_parser_joins_multi_line_data() {
        let mut parser = SseParser::new();
        let events = parser.feed("data: {\"x\":\ndata: 1}\n\n");
        assert_eq!(events, vec![r#"{"x":1}"#.to_string()]);
    }

    #[test]
    fn sse_parser_tolerates_crlf_and_comments() {
        let mut parser = SseParser::new();
        let events = parser.feed(": keepalive\r\ndata: {\"y\":2}\r\n\r\n");
        assert_eq!(events, vec![r#"{"y":2}"#.to_string()]);
    }

    #[test]
    fn accumulation_is_monotonic_concatenation() {
        let pieces = ["Hel", "lo ", " world"];
        let mut full = String::new();
        let mut seen: Vec<String> = Vec::new();
        for piece in pieces {
            full.push_str(piece);
            seen.push(full.clone());
        }
        assert_eq!(seen, vec!["Hel", "Hello ", "Hello  world"]);
        assert_eq!(full, "Hello  world");
    }
}
