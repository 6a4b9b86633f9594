//! Remote memory store — client for the session-oriented memory service.
//!
//! Turns are attributed to two fixed participants: the user identity and the
//! agent identity. The session handle is materialized lazily on first use so
//! construction stays cheap at startup; cold-start restoration reads the
//! most recent existing session *before* the first new session is started.

use async_trait::async_trait;
use chrono::Utc;
use kaede_core::error::MemoryError;
use kaede_core::memory::{MemoryStore, RecalledTurn};
use kaede_core::message::Role;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Default participant names.
pub const USER_PEER: &str = "creator";
pub const AGENT_PEER: &str = "kaede";

/// How many messages of a restored session to keep.
const RESTORE_SESSION_LIMIT: usize = 1;

pub struct RemoteMemoryStore {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    user_peer: String,
    agent_peer: String,
    /// The current session id, `None` until the first session is started.
    session_id: RwLock<Option<String>>,
}

impl RemoteMemoryStore {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            user_peer: USER_PEER.into(),
            agent_peer: AGENT_PEER.into(),
            session_id: RwLock::new(None),
        }
    }

    /// Override the participant identities.
    pub fn with_peers(mut self, user_peer: impl Into<String>, agent_peer: impl Into<String>) -> Self {
        self.user_peer = user_peer.into();
        self.agent_peer = agent_peer.into();
        self
    }

    fn generate_session_id() -> String {
        let stamp = Utc::now().format("%Y%m%d-%H%M%S");
        let suffix = &Uuid::new_v4().simple().to_string()[..6];
        format!("session-{stamp}-{suffix}")
    }

    /// Materialize a session if none is current yet.
    async fn ensure_session(&self) -> Result<String, MemoryError> {
        if let Some(id) = self.session_id.read().await.clone() {
            return Ok(id);
        }
        self.start_session(None).await
    }

    async fn store_turn(&self, peer: &str, text: &str) -> Result<(), MemoryError> {
        let session = self.ensure_session().await?;
        let url = format!("{}/sessions/{session}/messages", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({
                "peer_id": peer,
                "content": text,
            }))
            .send()
            .await
            .map_err(|e| MemoryError::Unreachable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(MemoryError::Service(format!(
                "store failed with status {}",
                response.status()
            )));
        }
        Ok(())
    }

    /// Format the service's session context into prompt-ready text.
    fn format_context(&self, ctx: &SessionContext) -> Option<String> {
        let mut parts = Vec::new();

        if let Some(summary) = ctx.summary.as_ref().map(|s| s.content.trim())
            && !summary.is_empty()
        {
            parts.push(format!("**Conversation summary:** {summary}"));
        }

        if let Some(rep) = ctx.peer_representation.as_deref()
            && !rep.trim().is_empty()
        {
            parts.push(format!("**Understanding of the user:** {}", rep.trim()));
        }

        if !ctx.peer_card.is_empty() {
            let card = ctx
                .peer_card
                .iter()
                .map(|item| format!("- {item}"))
                .collect::<Vec<_>>()
                .join("\n");
            parts.push(format!("**Traits:**\n{card}"));
        }

        if !ctx.messages.is_empty() {
            let lines: Vec<String> = ctx
                .messages
                .iter()
                .rev()
                .take(10)
                .rev()
                .map(|m| {
                    let who = if m.peer_id == self.agent_peer {
                        &self.agent_peer
                    } else {
                        &self.user_peer
                    };
                    let clipped: String = m.content.chars().take(200).collect();
                    format!("  {who}: {clipped}")
                })
                .collect();
            parts.push(format!("**Recent exchanges:**\n{}", lines.join("\n")));
        }

        if parts.is_empty() {
            None
        } else {
            Some(format!("# Persistent memory\n\n{}", parts.join("\n\n")))
        }
    }
}

#[async_trait]
impl MemoryStore for RemoteMemoryStore {
    fn name(&self) -> &str {
        "remote"
    }

    async fn start_session(&self, id: Option<&str>) -> Result<String, MemoryError> {
        let session_id = id
            .map(str::to_string)
            .unwrap_or_else(Self::generate_session_id);

        let url = format!("{}/sessions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({
                "id": session_id,
                "peers": [self.user_peer, self.agent_peer],
            }))
            .send()
            .await
            .map_err(|e| MemoryError::Unreachable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(MemoryError::Service(format!(
                "session start failed with status {}",
                response.status()
            )));
        }

        debug!(session = %session_id, "Started memory session");
        *self.session_id.write().await = Some(session_id.clone());
        Ok(session_id)
    }

    async fn store_user_turn(&self, text: &str) -> Result<(), MemoryError> {
        let peer = self.user_peer.clone();
        self.store_turn(&peer, text).await
    }

    async fn store_agent_turn(&self, text: &str) -> Result<(), MemoryError> {
        let peer = self.agent_peer.clone();
        self.store_turn(&peer, text).await
    }

    async fn context_summary(&self) -> Result<Option<String>, MemoryError> {
        let session = self.ensure_session().await?;
        let url = format!("{}/sessions/{session}/context", self.base_url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .query(&[("summary", "true")])
            .send()
            .await
            .map_err(|e| MemoryError::Unreachable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(MemoryError::Service(format!(
                "context fetch failed with status {}",
                response.status()
            )));
        }

        let ctx: SessionContext = response
            .json()
            .await
            .map_err(|e| MemoryError::MalformedResponse(e.to_string()))?;

        Ok(self.format_context(&ctx))
    }

    async fn recent_turns(&self, limit: usize) -> Result<Vec<RecalledTurn>, MemoryError> {
        let url = format!("{}/sessions", self.base_url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| MemoryError::Unreachable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(MemoryError::Service(format!(
                "session list failed with status {}",
                response.status()
            )));
        }

        let sessions: Vec<SessionRef> = response
            .json()
            .await
            .map_err(|e| MemoryError::MalformedResponse(e.to_string()))?;

        let mut turns = Vec::new();

        // Only the most recent session(s) — restoration is a cost, not an archive.
        for session in sessions.iter().rev().take(RESTORE_SESSION_LIMIT) {
            let url = format!("{}/sessions/{}/messages", self.base_url, session.id);
            let response = match self
                .client
                .get(&url)
                .bearer_auth(&self.api_key)
                .send()
                .await
            {
                Ok(r) if r.status().is_success() => r,
                _ => continue,
            };

            let messages: Vec<SessionMessage> = match response.json().await {
                Ok(m) => m,
                Err(_) => continue,
            };

            for msg in messages {
                let role = if msg.peer_id == self.agent_peer {
                    Role::Assistant
                } else {
                    Role::User
                };
                turns.push(RecalledTurn {
                    role,
                    text: msg.content,
                });
            }
        }

        if turns.len() > limit {
            turns.drain(..turns.len() - limit);
        }
        Ok(turns)
    }
}

// --- Wire types ---

#[derive(Debug, Deserialize)]
struct SessionRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct SessionMessage {
    peer_id: String,
    content: String,
}

#[derive(Debug, Default, Deserialize)]
struct SessionContext {
    #[serde(default)]
    summary: Option<ContextSummary>,
    #[serde(default)]
    peer_representation: Option<String>,
    #[serde(default)]
    peer_card: Vec<String>,
    #[serde(default)]
    messages: Vec<SessionMessage>,
}

#[derive(Debug, Deserialize)]
struct ContextSummary {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ids_are_unique_and_prefixed() {
        let a = RemoteMemoryStore::generate_session_id();
        let b = RemoteMemoryStore::generate_session_id();
        assert!(a.starts_with("session-"));
        assert_ne!(a, b);
    }

    #[test]
    fn format_context_empty_is_none() {
        let store = RemoteMemoryStore::new("https://example.com", "key");
        let ctx = SessionContext::default();
        assert!(store.format_context(&ctx).is_none());
    }

    #[test]
    fn format_context_includes_sections() {
        let store = RemoteMemoryStore::new("https://example.com", "key");
        let ctx = SessionContext {
            summary: Some(ContextSummary {
                content: "We discussed gardening.".into(),
            }),
            peer_representation: Some("Enjoys plants.".into()),
            peer_card: vec!["patient".into(), "curious".into()],
            messages: vec![SessionMessage {
                peer_id: "creator".into(),
                content: "How do I repot a fern?".into(),
            }],
        };
        let text = store.format_context(&ctx).unwrap();
        assert!(text.starts_with("# Persistent memory"));
        assert!(text.contains("We discussed gardening."));
        assert!(text.contains("- patient"));
        assert!(text.contains("creator: How do I repot a fern?"));
    }

    #[test]
    fn format_context_clips_long_messages() {
        let store = RemoteMemoryStore::new("https://example.com", "key");
        let ctx = SessionContext {
            messages: vec![SessionMessage {
                peer_id: "creator".into(),
                content: "x".repeat(500),
            }],
            ..Default::default()
        };
        let text = store.format_context(&ctx).unwrap();
        let line = text.lines().last().unwrap();
        assert!(line.len() < 300);
    }
}
