//! `local-model`: async client for a locally hosted model server.
//!
//! Speaks the Ollama-style HTTP JSON API (`/api/generate`, `/api/chat`,
//! `/api/embed`) and the multipart upload accepted by Whisper-compatible
//! speech-to-text servers.
//!
//! # Architecture
//!
//! ```text
//! GenerateRequest / ChatRequest / EmbedRequest
//!     │
//!     ▼
//! OllamaClient     ← one POST per call, `error` bodies → LocalModelError::Api
//!     │
//!     ▼
//! GenerateStream   ← futures::Stream<Item = Result<GenerateResponse>>
//!     │              background task decodes NDJSON into an mpsc channel
//!     ▼
//! collect_generation ← concatenates tokens, drops fence tokens
//! ```
//!
//! # Quick start
//!
//! ```rust,ignore
//! use local_model::{collect_generation, GenerateRequest, OllamaClient};
//!
//! let client = OllamaClient::new("http://localhost:11434", None)?;
//! let stream = client
//!     .generate_stream(GenerateRequest::new("qwen3:14b-q4_K_M", "Write hello world"))
//!     .await?;
//! println!("{}", collect_generation(stream).await?);
//! ```

pub mod client;
pub mod error;
pub mod runner;
pub mod stream;
pub mod transcribe;
pub mod types;

#[cfg(test)]
mod tests;

pub use client::OllamaClient;
pub use error::LocalModelError;
pub use runner::{collect_generation, is_fence_token};
pub use stream::GenerateStream;
pub use transcribe::WhisperClient;
pub use types::{
    ChatMessage, ChatRequest, ChatResponse, EmbedRequest, EmbedResponse, GenerateRequest,
    GenerateResponse, Role, TranscriptionResponse,
};

/// Convenience `Result` alias for this crate.
pub type Result<T> = std::result::Result<T, LocalModelError>;
