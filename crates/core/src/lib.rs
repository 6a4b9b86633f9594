//! # Kaede Core
//!
//! Domain types, traits, and error definitions for the Kaede personal agent.
//! This crate has no I/O of its own — it defines the domain model that the
//! other crates implement against.
//!
//! Every external collaborator (LLM provider, memory service, tools) is a
//! trait here, so the agent loop can be tested with mocks and the concrete
//! implementations can be swapped via configuration.

pub mod error;
pub mod memory;
pub mod message;
pub mod provider;
pub mod status;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, MemoryError, ProviderError, Result, ToolError};
pub use memory::{MemoryStore, RecalledTurn};
pub use message::{Conversation, Message, MessageToolCall, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, ToolDefinition, Usage};
pub use status::{StatusBus, StatusEvent, StatusKind};
pub use tool::{Tool, ToolRegistry, ToolResult};
