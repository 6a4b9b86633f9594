//! LLM provider implementations for Kaede.
//!
//! One implementation covers every backend the agent targets: the
//! OpenAI-compatible `/chat/completions` surface exposed by Gemini,
//! OpenRouter, OpenAI, Ollama, and friends.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatProvider;
