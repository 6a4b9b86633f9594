//! The agent reasoning loop.
//!
//! One `run` call drives the model↔tool cycle for a single user turn:
//! append the user message, call the model, execute any requested tools,
//! feed the results back, and repeat until the model answers in plain text
//! or the iteration budget runs out. Every limit here is a cost bound —
//! each iteration and each byte of tool output is paid model context.
//!
//! Callers must serialize `run` invocations; the loop holds the
//! conversation exclusively and offers no internal locking.

use kaede_core::error::Result;
use kaede_core::memory::MemoryStore;
use kaede_core::message::{Conversation, Message, Role};
use kaede_core::provider::{Provider, ProviderRequest};
use kaede_core::status::{StatusBus, StatusEvent};
use kaede_core::tool::ToolRegistry;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::context::ContextAssembler;

/// Hard cap on model↔tool iterations per user turn.
pub const MAX_ITERATIONS: u32 = 10;

/// Conversation window, in whole messages.
pub const MAX_HISTORY: usize = 12;

/// Ceiling on a single rendered tool result, in characters.
pub const MAX_TOOL_RESULT_CHARS: usize = 3000;

/// Response-length ceiling per completion.
pub const DEFAULT_MAX_TOKENS: u32 = 2048;

/// How many past turns to replay at cold start.
const RESTORE_TURN_LIMIT: usize = 10;

/// Returned when the iteration budget runs out without a plain-text answer.
const EXHAUSTION_FALLBACK: &str =
    "I hit my iteration limit for this turn and am returning partial results. \
     Ask me to continue if you'd like me to keep going.";

pub struct AgentLoop {
    provider: Arc<dyn Provider>,
    model: String,
    max_tokens: u32,
    tools: Arc<ToolRegistry>,
    context: ContextAssembler,
    memory: Option<Arc<dyn MemoryStore>>,
    status: Arc<StatusBus>,
    conversation: Conversation,
    max_iterations: u32,
    max_history: usize,
    max_tool_result_chars: usize,
}

impl AgentLoop {
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        tools: Arc<ToolRegistry>,
        context: ContextAssembler,
        status: Arc<StatusBus>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            tools,
            context,
            memory: None,
            status,
            conversation: Conversation::new(),
            max_iterations: MAX_ITERATIONS,
            max_history: MAX_HISTORY,
            max_tool_result_chars: MAX_TOOL_RESULT_CHARS,
        }
    }

    /// Attach a memory store for persistence and cold-start restoration.
    pub fn with_memory(mut self, memory: Arc<dyn MemoryStore>) -> Self {
        self.memory = Some(memory);
        self
    }

    /// Override the response-length ceiling.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = max;
        self
    }

    /// Override the iteration budget.
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max;
        self
    }

    /// Override the conversation window.
    pub fn with_max_history(mut self, max: usize) -> Self {
        self.max_history = max;
        self
    }

    /// Override the per-tool-result character ceiling.
    pub fn with_max_tool_result_chars(mut self, max: usize) -> Self {
        self.max_tool_result_chars = max;
        self
    }

    /// Read-only view of the conversation, for UI layers.
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Cold-start initialization: replay recent turns from memory into the
    /// conversation, then start a fresh session. Restoration must come
    /// first or the new empty session would shadow the turns worth
    /// replaying. Best-effort throughout.
    pub async fn bootstrap(&mut self) {
        let Some(memory) = &self.memory else {
            return;
        };

        match memory.recent_turns(RESTORE_TURN_LIMIT).await {
            Ok(turns) if !turns.is_empty() => {
                info!(count = turns.len(), "Restored past conversation");
                for turn in turns {
                    let message = match turn.role {
                        Role::Assistant => Message::assistant(turn.text),
                        _ => Message::user(turn.text),
                    };
                    self.conversation.push(message);
                }
                self.conversation.truncate_to(self.max_history);
            }
            Ok(_) => {}
            Err(e) => warn!("Past context restore failed: {e}"),
        }

        if let Err(e) = memory.start_session(None).await {
            warn!("Could not start memory session: {e}");
        }
    }

    /// Process one user message and return the final reply.
    ///
    /// A provider transport error propagates to the caller with the
    /// conversation retained as appended so far; everything else (memory
    /// failures, malformed tool arguments, tool failures) is absorbed.
    pub async fn run(&mut self, user_message: &str) -> Result<String> {
        self.conversation.push(Message::user(user_message));
        self.conversation.truncate_to(self.max_history);
        self.persist_user(user_message).await;

        // Assembled once per turn, not per iteration
        let system_prompt = self.context.build_system_prompt().await;
        let tool_definitions = self.tools.definitions();

        for iteration in 0..self.max_iterations {
            debug!(iteration, messages = self.conversation.len(), "Agent loop iteration");
            self.status.publish(StatusEvent::thinking("Thinking..."));

            let mut messages = Vec::with_capacity(self.conversation.len() + 1);
            messages.push(Message::system(&system_prompt));
            messages.extend(self.conversation.messages.iter().cloned());

            let response = self
                .provider
                .complete(ProviderRequest {
                    model: self.model.clone(),
                    messages,
                    max_tokens: Some(self.max_tokens),
                    tools: tool_definitions.clone(),
                })
                .await?;

            let assistant = response.message;
            let tool_calls = assistant.tool_calls.clone();
            self.conversation.push(assistant.clone());

            if tool_calls.is_empty() {
                let final_text = assistant.content;
                self.persist_agent(&final_text).await;
                self.status.publish(StatusEvent::done(final_text.clone()));
                return Ok(final_text);
            }

            // Strictly sequential, in the order the model asked: later calls
            // may depend on earlier ones' side effects.
            for call in &tool_calls {
                self.status
                    .publish(StatusEvent::tool(format!("Running {}...", call.name)));

                let arguments = match serde_json::from_str(&call.arguments) {
                    Ok(value) => value,
                    Err(e) => {
                        warn!(tool = %call.name, "Unparsable tool arguments, substituting empty: {e}");
                        serde_json::Value::Object(serde_json::Map::new())
                    }
                };

                let output = self.tools.dispatch(&call.name, arguments).await;
                let output = clip_tool_result(&output, self.max_tool_result_chars);
                self.conversation.push(Message::tool_result(&call.id, output));
            }
            self.conversation.truncate_to(self.max_history);
        }

        warn!(
            max_iterations = self.max_iterations,
            "Iteration budget exhausted without a final answer"
        );
        self.status.publish(StatusEvent::done(EXHAUSTION_FALLBACK));
        Ok(EXHAUSTION_FALLBACK.into())
    }

    /// Clear the conversation and start a fresh memory session. The cached
    /// memory summary is invalidated so the next prompt reflects the new
    /// session boundary.
    pub async fn reset(&mut self) {
        self.conversation.clear();
        if let Some(memory) = &self.memory
            && let Err(e) = memory.start_session(None).await
        {
            warn!("Failed to start new memory session: {e}");
        }
        self.context.refresh_memory().await;
    }

    /// Manually invalidate the cached memory summary (`/refresh`).
    pub async fn refresh_memory(&self) {
        self.context.refresh_memory().await;
    }

    async fn persist_user(&self, text: &str) {
        let Some(memory) = &self.memory else {
            return;
        };
        if let Err(e) = memory.store_user_turn(text).await {
            warn!("Failed to persist user turn: {e}");
        }
    }

    async fn persist_agent(&self, text: &str) {
        let Some(memory) = &self.memory else {
            return;
        };
        if let Err(e) = memory.store_agent_turn(text).await {
            warn!("Failed to persist agent turn: {e}");
        }
    }
}

/// Truncate a rendered tool result to `max_chars`, marking the cut.
fn clip_tool_result(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let clipped: String = text.chars().take(max_chars).collect();
    format!("{clipped}\n\n[TRUNCATED at {max_chars} chars]")
}
