//! The Kaede agent: the bounded model↔tool loop and the system prompt
//! assembly that feeds it.

pub mod context;
pub mod loop_runner;

pub use context::ContextAssembler;
pub use loop_runner::AgentLoop;
