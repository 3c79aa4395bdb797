//! Completion backend abstraction for the agentic memory engine.
//!
//! The memory engine prefers an LLM for keyword extraction and falls back to
//! a local heuristic. This crate supplies the LLM side of that seam:
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  LlmBackend trait                       │
//! │  - complete() -> CompletionResponse     │
//! └─────────────────────────────────────────┘
//!                    │
//!          ┌─────────┴─────────┐
//!          ▼                   ▼
//!   ┌──────────────┐     ┌────────────┐
//!   │ OpenAiBackend│     │ MockBackend│
//!   └──────────────┘     └────────────┘
//! ```

pub mod backend;
pub mod error;
pub mod openai;
pub mod types;

pub use backend::{LlmBackend, MockBackend, MockResponse, SharedBackend, with_retry};
pub use error::{LlmError, Result};
pub use openai::{DEFAULT_OPENAI_BASE, OpenAiBackend, OpenAiConfig, create_shared_backend};
pub use types::{CompletionRequest, CompletionResponse, Message, Role, StopReason, Usage};
