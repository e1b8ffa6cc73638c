//! AI module for Gemchat
//!
//! This module wraps the Google generative-language REST API. It exposes a
//! non-streaming call and a chunked streaming call whose update contract is
//! explicit: the caller hands in an `on_chunk(accumulated_text)` callback
//! and receives the final concatenated text when the stream completes.
//!
//! # Usage
//!
//! ```rust,no_run
//! use gemchat::ai::{AiResult, GeminiClient};
//!
//! # async fn example() -> AiResult<()> {
//! let gemini = GeminiClient::from_env()?;
//! let answer = gemini.generate("Hello!").await?;
//! # Ok(())
//! # }
//! ```

mod gemini;

pub use gemini::{AiError, AiResult, GeminiClient, SseParser, parse_gemini_sse_data};
