//! In-memory store — ephemeral sessions, used for tests and for running
//! without a remote memory service.

use async_trait::async_trait;
use kaede_core::error::MemoryError;
use kaede_core::memory::{MemoryStore, RecalledTurn};
use kaede_core::message::Role;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Default)]
struct Session {
    id: String,
    turns: Vec<RecalledTurn>,
}

#[derive(Default)]
pub struct InMemoryStore {
    sessions: RwLock<Vec<Session>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sessions started so far (test helper).
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// The id of the current session, if any (test helper).
    pub async fn current_session_id(&self) -> Option<String> {
        self.sessions.read().await.last().map(|s| s.id.clone())
    }

    /// Turns stored in the current session (test helper).
    pub async fn current_session_turns(&self) -> Vec<RecalledTurn> {
        self.sessions
            .read()
            .await
            .last()
            .map(|s| s.turns.clone())
            .unwrap_or_default()
    }

    async fn push_turn(&self, role: Role, text: &str) -> Result<(), MemoryError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.last_mut().ok_or(MemoryError::NoSession)?;
        session.turns.push(RecalledTurn {
            role,
            text: text.into(),
        });
        Ok(())
    }
}

#[async_trait]
impl MemoryStore for InMemoryStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn start_session(&self, id: Option<&str>) -> Result<String, MemoryError> {
        let session_id = id
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        self.sessions.write().await.push(Session {
            id: session_id.clone(),
            turns: Vec::new(),
        });
        Ok(session_id)
    }

    async fn store_user_turn(&self, text: &str) -> Result<(), MemoryError> {
        self.push_turn(Role::User, text).await
    }

    async fn store_agent_turn(&self, text: &str) -> Result<(), MemoryError> {
        self.push_turn(Role::Assistant, text).await
    }

    async fn context_summary(&self) -> Result<Option<String>, MemoryError> {
        let sessions = self.sessions.read().await;
        let lines: Vec<String> = sessions
            .iter()
            .flat_map(|s| s.turns.iter())
            .map(|t| {
                let who = match t.role {
                    Role::Assistant => "agent",
                    _ => "user",
                };
                format!("  {who}: {}", t.text)
            })
            .collect();

        if lines.is_empty() {
            Ok(None)
        } else {
            Ok(Some(format!(
                "# Persistent memory\n\n**Recent exchanges:**\n{}",
                lines.join("\n")
            )))
        }
    }

    async fn recent_turns(&self, limit: usize) -> Result<Vec<RecalledTurn>, MemoryError> {
        let sessions = self.sessions.read().await;
        let mut turns = sessions
            .iter()
            .rev()
            .find(|s| !s.turns.is_empty())
            .map(|s| s.turns.clone())
            .unwrap_or_default();

        if turns.len() > limit {
            turns.drain(..turns.len() - limit);
        }
        Ok(turns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn store_requires_session() {
        let store = InMemoryStore::new();
        assert!(store.store_user_turn("hello").await.is_err());

        store.start_session(None).await.unwrap();
        assert!(store.store_user_turn("hello").await.is_ok());
    }

    #[tokio::test]
    async fn turns_go_to_current_session() {
        let store = InMemoryStore::new();
        store.start_session(Some("first")).await.unwrap();
        store.store_user_turn("one").await.unwrap();

        store.start_session(Some("second")).await.unwrap();
        store.store_agent_turn("two").await.unwrap();

        assert_eq!(store.session_count().await, 2);
        assert_eq!(store.current_session_id().await.as_deref(), Some("second"));
        let current = store.current_session_turns().await;
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].text, "two");
        assert_eq!(current[0].role, Role::Assistant);
    }

    #[tokio::test]
    async fn recent_turns_from_latest_nonempty_session() {
        let store = InMemoryStore::new();
        store.start_session(None).await.unwrap();
        store.store_user_turn("old question").await.unwrap();
        store.store_agent_turn("old answer").await.unwrap();
        // A fresh, empty session on top (the post-restore state)
        store.start_session(None).await.unwrap();

        let turns = store.recent_turns(10).await.unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].text, "old question");
    }

    #[tokio::test]
    async fn recent_turns_respects_limit() {
        let store = InMemoryStore::new();
        store.start_session(None).await.unwrap();
        for i in 0..15 {
            store.store_user_turn(&format!("turn {i}")).await.unwrap();
        }

        let turns = store.recent_turns(10).await.unwrap();
        assert_eq!(turns.len(), 10);
        assert_eq!(turns[0].text, "turn 5");
        assert_eq!(turns[9].text, "turn 14");
    }

    #[tokio::test]
    async fn context_summary_none_when_empty() {
        let store = InMemoryStore::new();
        assert!(store.context_summary().await.unwrap().is_none());

        store.start_session(None).await.unwrap();
        store.store_user_turn("remember me").await.unwrap();
        let summary = store.context_summary().await.unwrap().unwrap();
        assert!(summary.contains("remember me"));
    }
}
