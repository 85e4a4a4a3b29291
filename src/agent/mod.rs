//! Agent module — core orchestration logic.
//!
//! This module contains:
//! - Message types and the tag-framing protocol
//! - LLM client trait and implementations
//! - Run events for streaming delivery
//! - The orchestration loop itself
//!
//! # Adding a New LLM Provider
//!
//! See [`llm::ProviderRegistry`] for instructions.

mod context;
mod events;
mod message;
mod orchestrator;

pub mod framing;

// LLM providers in submodule
pub mod llm;

// Re-exports for convenience
pub use context::{PromptBuilder, MAX_HISTORY_MESSAGES};
pub use events::{EventSink, RunEvent};
pub use framing::Framed;
pub use llm::{LlmClient, LlmResponse, OpenAiClient, ProviderRegistry, ToolChoice, Usage};
pub use message::{Message, Role, ToolCallRequest};
pub use orchestrator::{Orchestrator, OrchestratorConfig};
