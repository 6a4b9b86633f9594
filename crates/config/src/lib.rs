//! Configuration loading and validation for Kaede.
//!
//! Loads `~/.kaede/config.toml` with environment-variable overrides.
//! A missing model API key is a fatal configuration error at startup;
//! a missing memory API key just disables persistent memory.

use kaede_core::error::Error;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default OpenAI-compatible endpoint (Gemini's compatibility layer).
pub const DEFAULT_API_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/openai";

/// Default memory service endpoint.
pub const DEFAULT_MEMORY_URL: &str = "https://api.honcho.dev";

/// The root configuration structure, mapping to `~/.kaede/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Model API key. Env override: `KAEDE_API_KEY` or `GEMINI_API_KEY`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// OpenAI-compatible base URL
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// Response-length ceiling per completion
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Workspace directory holding SOUL.md, AGENTS.md, memory/MEMORY.md
    /// and the sandbox root. Defaults to `~/.kaede/workspace`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace: Option<PathBuf>,

    /// Memory service configuration
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Agent loop budgets
    #[serde(default)]
    pub agent: AgentConfig,

    /// Tool trust configuration
    #[serde(default)]
    pub tools: ToolsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Memory service API key. Env override: `KAEDE_MEMORY_API_KEY`.
    /// Absent means no persistent memory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Memory service base URL
    #[serde(default = "default_memory_url")]
    pub base_url: String,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_memory_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Hard cap on model↔tool iterations per user turn
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Conversation window, in whole messages
    #[serde(default = "default_max_history")]
    pub max_history: usize,

    /// Ceiling on a single rendered tool result, in characters
    #[serde(default = "default_max_tool_result_chars")]
    pub max_tool_result_chars: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            max_history: default_max_history(),
            max_tool_result_chars: default_max_tool_result_chars(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// When true (the default), file and shell tools are confined to the
    /// workspace sandbox. Set to false only on an already-isolated host.
    #[serde(default = "default_true")]
    pub sandboxed: bool,

    /// Override the sandboxed shell allow-list. Empty means the built-in
    /// default list.
    #[serde(default)]
    pub allowed_commands: Vec<String>,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            sandboxed: true,
            allowed_commands: Vec::new(),
        }
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.into()
}
fn default_memory_url() -> String {
    DEFAULT_MEMORY_URL.into()
}
fn default_model() -> String {
    "gemini-3-flash-preview".into()
}
fn default_max_tokens() -> u32 {
    2048
}
fn default_max_iterations() -> u32 {
    10
}
fn default_max_history() -> usize {
    12
}
fn default_max_tool_result_chars() -> usize {
    3000
}
fn default_true() -> bool {
    true
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("workspace", &self.workspace)
            .field("memory.api_key", &redact(&self.memory.api_key))
            .field("memory.base_url", &self.memory.base_url)
            .field("agent", &self.agent)
            .field("tools", &self.tools)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_api_url(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            workspace: None,
            memory: MemoryConfig::default(),
            agent: AgentConfig::default(),
            tools: ToolsConfig::default(),
        }
    }
}

impl AppConfig {
    /// The configuration directory, `~/.kaede`.
    pub fn config_dir() -> PathBuf {
        home_dir().join(".kaede")
    }

    /// The default workspace directory, `~/.kaede/workspace`.
    pub fn default_workspace_dir() -> PathBuf {
        Self::config_dir().join("workspace")
    }

    /// The effective workspace directory.
    pub fn workspace_dir(&self) -> PathBuf {
        self.workspace
            .clone()
            .unwrap_or_else(Self::default_workspace_dir)
    }

    /// Load from the default location, then apply environment overrides.
    pub fn load() -> Result<Self, Error> {
        let path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from a specific file; a missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, Error> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;

        toml::from_str(&raw).map_err(|e| Error::Config {
            message: format!("Failed to parse {}: {e}", path.display()),
        })
    }

    /// Environment variables take precedence over the config file.
    pub fn apply_env_overrides(&mut self) {
        for var in ["KAEDE_API_KEY", "GEMINI_API_KEY"] {
            if let Ok(key) = std::env::var(var)
                && !key.trim().is_empty()
            {
                self.api_key = Some(key.trim().to_string());
                break;
            }
        }
        if let Ok(key) = std::env::var("KAEDE_MEMORY_API_KEY")
            && !key.trim().is_empty()
        {
            self.memory.api_key = Some(key.trim().to_string());
        }
        if let Ok(url) = std::env::var("KAEDE_MEMORY_URL")
            && !url.trim().is_empty()
        {
            self.memory.base_url = url.trim().to_string();
        }
    }

    /// Startup validation. A missing model API key is fatal.
    pub fn validate(&self) -> Result<(), Error> {
        match &self.api_key {
            Some(key) if !key.trim().is_empty() => Ok(()),
            _ => Err(Error::Config {
                message: format!(
                    "No model API key configured. Set GEMINI_API_KEY or add api_key to {}",
                    Self::config_dir().join("config.toml").display()
                ),
            }),
        }
    }

    /// Whether a persistent memory service is configured.
    pub fn memory_enabled(&self) -> bool {
        self.memory
            .api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty())
    }
}

fn home_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    let var = "USERPROFILE";
    #[cfg(not(target_os = "windows"))]
    let var = "HOME";

    std::env::var(var).map(PathBuf::from).unwrap_or_default()
}
