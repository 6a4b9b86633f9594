//! System prompt assembly.
//!
//! The prompt is rebuilt each turn from, in priority order: persona
//! (`SOUL.md`), behavioral guidelines (`AGENTS.md`), persistent memory, and
//! runtime facts. Absent sections are omitted, never left as placeholders.
//!
//! The memory section is the expensive one — it requires a round trip to the
//! memory service — so it is fetched once and cached for the process
//! lifetime, until `refresh_memory` invalidates it.

use kaede_core::memory::MemoryStore;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;

const SECTION_DELIMITER: &str = "\n\n---\n\n";

#[derive(Default)]
struct MemoryCache {
    /// Distinguishes "not fetched yet" from "fetched, service had nothing".
    loaded: bool,
    text: Option<String>,
}

pub struct ContextAssembler {
    workspace: PathBuf,
    memory: Option<Arc<dyn MemoryStore>>,
    cache: RwLock<MemoryCache>,
}

impl ContextAssembler {
    pub fn new(workspace: impl Into<PathBuf>, memory: Option<Arc<dyn MemoryStore>>) -> Self {
        Self {
            workspace: workspace.into(),
            memory,
            cache: RwLock::new(MemoryCache::default()),
        }
    }

    /// Build the system prompt for the next model call.
    pub async fn build_system_prompt(&self) -> String {
        let mut parts = Vec::new();

        if let Some(soul) = self.load_file("SOUL.md").await {
            parts.push(soul);
        }

        if let Some(agents) = self.load_file("AGENTS.md").await {
            parts.push(agents);
        }

        if self.memory.is_some() {
            if let Some(memory_text) = self.memory_text().await {
                parts.push(memory_text);
            }
        } else if let Some(local) = self.load_file("memory/MEMORY.md").await {
            parts.push(format!("# Long-term Memory\n\n{local}"));
        }

        parts.push(self.runtime_facts());

        parts.join(SECTION_DELIMITER)
    }

    /// Invalidate the cached memory section so the next prompt build
    /// re-fetches it. Safe to call repeatedly.
    pub async fn refresh_memory(&self) {
        let mut cache = self.cache.write().await;
        cache.loaded = false;
        cache.text = None;
    }

    /// The memory section, fetched at most once per cache generation.
    /// A fetch failure degrades to "no memory" and is logged.
    async fn memory_text(&self) -> Option<String> {
        let memory = self.memory.as_ref()?;

        {
            let cache = self.cache.read().await;
            if cache.loaded {
                return cache.text.clone();
            }
        }

        let mut cache = self.cache.write().await;
        if cache.loaded {
            return cache.text.clone();
        }
        cache.loaded = true;
        cache.text = match memory.context_summary().await {
            Ok(text) => text,
            Err(e) => {
                warn!("Memory context load failed: {e}");
                None
            }
        };
        cache.text.clone()
    }

    async fn load_file(&self, relative: &str) -> Option<String> {
        let path = self.workspace.join(relative);
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            Err(_) => None,
        }
    }

    /// Cheap, recomputed every call.
    fn runtime_facts(&self) -> String {
        let now = chrono::Local::now();
        let memory_status = if self.memory.is_some() {
            "remote (persistent)"
        } else {
            "local files only"
        };
        format!(
            "# Runtime Context\n\
             - Current time: {}\n\
             - Workspace: {}\n\
             - Memory: {memory_status}\n\
             - Available tools: use tool calls to take actions.",
            now.format("%Y-%m-%d %H:%M:%S"),
            self.workspace.display(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use kaede_core::error::MemoryError;
    use kaede_core::memory::RecalledTurn;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts context fetches; used to verify the cache discipline.
    struct CountingStore {
        fetches: AtomicUsize,
        summary: Option<String>,
        fail: bool,
    }

    impl CountingStore {
        fn with_summary(text: &str) -> Self {
            Self {
                fetches: AtomicUsize::new(0),
                summary: Some(text.into()),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                fetches: AtomicUsize::new(0),
                summary: None,
                fail: true,
            }
        }
    }

    #[async_trait]
    impl MemoryStore for CountingStore {
        fn name(&self) -> &str {
            "counting"
        }
        async fn start_session(&self, _id: Option<&str>) -> Result<String, MemoryError> {
            Ok("s".into())
        }
        async fn store_user_turn(&self, _text: &str) -> Result<(), MemoryError> {
            Ok(())
        }
        async fn store_agent_turn(&self, _text: &str) -> Result<(), MemoryError> {
            Ok(())
        }
        async fn context_summary(&self) -> Result<Option<String>, MemoryError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(MemoryError::Unreachable("down".into()))
            } else {
                Ok(self.summary.clone())
            }
        }
        async fn recent_turns(&self, _limit: usize) -> Result<Vec<RecalledTurn>, MemoryError> {
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn persona_and_policy_sections_in_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("SOUL.md"), "# Persona\nI am Kaede.").unwrap();
        std::fs::write(dir.path().join("AGENTS.md"), "# Guidelines\nBe concise.").unwrap();

        let assembler = ContextAssembler::new(dir.path(), None);
        let prompt = assembler.build_system_prompt().await;

        let persona = prompt.find("I am Kaede").unwrap();
        let policy = prompt.find("Be concise").unwrap();
        let runtime = prompt.find("# Runtime Context").unwrap();
        assert!(persona < policy && policy < runtime);
        assert!(prompt.contains("\n\n---\n\n"));
    }

    #[tokio::test]
    async fn missing_files_are_omitted() {
        let dir = tempfile::tempdir().unwrap();
        let assembler = ContextAssembler::new(dir.path(), None);
        let prompt = assembler.build_system_prompt().await;

        // Only the runtime section survives
        assert!(prompt.starts_with("# Runtime Context"));
        assert!(prompt.contains("local files only"));
    }

    #[tokio::test]
    async fn local_memory_fallback_without_remote() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("memory")).unwrap();
        std::fs::write(dir.path().join("memory/MEMORY.md"), "User likes tea.").unwrap();

        let assembler = ContextAssembler::new(dir.path(), None);
        let prompt = assembler.build_system_prompt().await;
        assert!(prompt.contains("# Long-term Memory"));
        assert!(prompt.contains("User likes tea."));
    }

    #[tokio::test]
    async fn remote_memory_fetched_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(CountingStore::with_summary("# Persistent memory\n\nGardening."));
        let assembler = ContextAssembler::new(dir.path(), Some(store.clone()));

        let first = assembler.build_system_prompt().await;
        let second = assembler.build_system_prompt().await;
        assert!(first.contains("Gardening."));
        assert!(second.contains("Gardening."));
        assert_eq!(store.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn refresh_invalidates_cache_idempotently() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(CountingStore::with_summary("remembered"));
        let assembler = ContextAssembler::new(dir.path(), Some(store.clone()));

        assembler.build_system_prompt().await;
        assert_eq!(store.fetches.load(Ordering::SeqCst), 1);

        // Two refreshes without an intervening build still cost one re-fetch
        assembler.refresh_memory().await;
        assembler.refresh_memory().await;
        assembler.build_system_prompt().await;
        assert_eq!(store.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn memory_failure_degrades_to_no_memory() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(CountingStore::failing());
        let assembler = ContextAssembler::new(dir.path(), Some(store.clone()));

        let prompt = assembler.build_system_prompt().await;
        assert!(prompt.contains("# Runtime Context"));

        // The failure is cached too; no retry storm per prompt build
        assembler.build_system_prompt().await;
        assert_eq!(store.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn runtime_facts_report_memory_mode() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(CountingStore::with_summary("x"));
        let assembler = ContextAssembler::new(dir.path(), Some(store));
        let prompt = assembler.build_system_prompt().await;
        assert!(prompt.contains("remote (persistent)"));
        assert!(prompt.contains("Current time:"));
    }
}
