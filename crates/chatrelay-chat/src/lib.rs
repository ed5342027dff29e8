//! Chat turn handling for the relay.
//!
//! Assembles stored history into a model prompt, calls the hosted model,
//! and persists the resulting turns.

pub mod error;
pub mod history;
pub mod llm;
pub mod orchestrator;

pub use error::ChatError;
pub use history::{assemble_prompt, PromptMessage};
pub use llm::{ChatModel, Completion, OpenAiCompatibleClient, Usage};
pub use orchestrator::{ChatOrchestrator, ChatReply};
