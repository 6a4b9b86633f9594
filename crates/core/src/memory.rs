//! MemoryStore trait — persistent conversational memory across restarts.
//!
//! The memory service groups turns into sessions attributed to two fixed
//! participants (the user identity and the agent identity). The core only
//! depends on this narrow interface; the remote API behind it is opaque.
//!
//! Memory is an enhancement, never a correctness dependency: every call may
//! fail, and every call site must log the failure and continue without it.

use crate::error::MemoryError;
use crate::message::Role;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A past turn recalled from the memory service at cold start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecalledTurn {
    /// Either `User` or `Assistant`
    pub role: Role,

    /// The turn's text content
    pub text: String,
}

/// The memory service contract the agent loop depends on.
///
/// Implementations: remote HTTP session service, in-memory (for testing).
/// Exactly one session is current at a time; all stores go to it.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// The backend name (e.g., "remote", "in_memory").
    fn name(&self) -> &str;

    /// Start a new session and make it current. When `id` is absent the
    /// implementation generates one.
    async fn start_session(&self, id: Option<&str>) -> std::result::Result<String, MemoryError>;

    /// Persist a user turn to the current session.
    async fn store_user_turn(&self, text: &str) -> std::result::Result<(), MemoryError>;

    /// Persist an agent turn to the current session.
    async fn store_agent_turn(&self, text: &str) -> std::result::Result<(), MemoryError>;

    /// A condensed digest of prior sessions for prompt injection.
    ///
    /// Expensive — callers are expected to cache the result. `None` means
    /// the service has nothing useful yet.
    async fn context_summary(&self) -> std::result::Result<Option<String>, MemoryError>;

    /// The most recent turns across sessions, oldest first, used once at
    /// cold start to seed the conversation. Implementations cap this to the
    /// most recent session and at most `limit` turns.
    async fn recent_turns(
        &self,
        limit: usize,
    ) -> std::result::Result<Vec<RecalledTurn>, MemoryError>;
}
