//! Transport-only Gemini API client primitives.
//!
//! This crate owns request building, SSE parsing, and response decoding for
//! the `generateContent` endpoint family only. It intentionally contains no
//! credential discovery and no runtime UI coupling.
//!
//! The wire contract is the public Generative Language API: streamed replies
//! arrive as SSE frames whose `data:` payloads are `GenerateContentResponse`
//! JSON objects, with no end-of-stream marker beyond connection close.

pub mod client;
pub mod config;
pub mod error;
pub mod payload;
pub mod response;
pub mod sse;
pub mod url;

pub use client::GeminiClient;
pub use config::GeminiApiConfig;
pub use error::GeminiApiError;
pub use payload::{Content, GenerateContentRequest, Part};
pub use response::{FinishReason, GenerateContentResponse};
pub use sse::SseStreamParser;
pub use url::{normalize_gemini_url, DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL};
