//! Interactive terminal chat client for a local Ollama server.
//!
//! ## Provider bootstrap
//!
//! The provider is selected at startup from the environment:
//!
//! - `OLLAMA_CHAT_PROVIDER=ollama` (default) talks to a local Ollama server
//! - `OLLAMA_CHAT_PROVIDER=mock` streams a deterministic offline reply
//!
//! Ollama transport configuration, all optional:
//!
//! - `OLLAMA_CHAT_MODEL` — model identifier, default `llama3.2`
//! - `OLLAMA_CHAT_BASE_URL` — server base URL, default `http://localhost:11434`
//! - `OLLAMA_CHAT_TIMEOUT_SEC` — request timeout in seconds; unset keeps the
//!   wait unbounded
//! - `OLLAMA_CHAT_NO_STREAM` — fetch each reply in one round trip instead of
//!   streaming
//!
//! ## Scroll behavior
//!
//! The transcript viewport follows new content while it sits at or near the
//! bottom and holds position once the reader scrolls away. Explicit scroll
//! input is ignored while a reply is streaming unless
//! `OLLAMA_CHAT_SCROLL_UNLOCKED` is set.

pub mod app;
pub mod format;
pub mod providers;
pub mod runtime;
pub mod scroll;
pub mod transcript;
pub mod tui;
