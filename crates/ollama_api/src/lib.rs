//! Transport-only client primitives for the Ollama generate endpoint.
//!
//! This crate owns request building, stream decoding, and error taxonomy for
//! `POST /api/generate` only. It intentionally contains no prompt history,
//! no retry policy, and no runtime UI coupling.

pub mod client;
pub mod config;
pub mod error;
pub mod ndjson;
pub mod payload;
pub mod url;

pub use client::{CancellationSignal, OllamaClient};
pub use config::{OllamaConfig, DEFAULT_MODEL_ID};
pub use error::OllamaApiError;
pub use ndjson::NdjsonStreamParser;
pub use payload::{GenerateChunk, GenerateRequest};
pub use url::{normalize_generate_url, DEFAULT_OLLAMA_BASE_URL};
