//! Web fetch tool — retrieve a URL as text.
//!
//! Network failures and non-success statuses come back as `[ERROR]` results
//! so the agent loop can show them to the model instead of aborting the turn.

use async_trait::async_trait;
use kaede_core::error::ToolError;
use kaede_core::tool::{Tool, ToolResult};
use std::time::Duration;
use tracing::debug;

const DEFAULT_MAX_LENGTH: usize = 10_000;
const FETCH_TIMEOUT_SECS: u64 = 30;

pub struct WebFetchTool {
    client: reqwest::Client,
}

impl WebFetchTool {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .user_agent(concat!("kaede/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();
        Self { client }
    }

    /// Truncate on a char boundary and mark the cut.
    fn clip(body: &str, max_length: usize) -> String {
        if body.chars().count() <= max_length {
            return body.to_string();
        }
        let clipped: String = body.chars().take(max_length).collect();
        format!("{clipped}\n[TRUNCATED at {max_length} chars]")
    }
}

impl Default for WebFetchTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for WebFetchTool {
    fn name(&self) -> &str {
        "web_fetch"
    }

    fn description(&self) -> &str {
        "Fetch the content of a URL as text."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "The URL to fetch"
                },
                "max_length": {
                    "type": "integer",
                    "description": "Maximum characters to return (default: 10000)"
                }
            },
            "required": ["url"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let url = arguments["url"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'url' argument".into()))?;
        let max_length = arguments["max_length"]
            .as_u64()
            .map(|n| n as usize)
            .unwrap_or(DEFAULT_MAX_LENGTH);

        debug!(url, "Fetching URL");

        let response = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => return Ok(ToolResult::labeled(format!("[ERROR] {e}"))),
        };

        let status = response.status();
        if !status.is_success() {
            return Ok(ToolResult::labeled(format!(
                "[ERROR] HTTP {status} fetching {url}"
            )));
        }

        match response.text().await {
            Ok(body) => Ok(ToolResult::ok(Self::clip(&body, max_length))),
            Err(e) => Ok(ToolResult::labeled(format!("[ERROR] {e}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_short_body_untouched() {
        let body = "short";
        assert_eq!(WebFetchTool::clip(body, 100), "short");
    }

    #[test]
    fn clip_marks_truncation() {
        let body = "x".repeat(50);
        let clipped = WebFetchTool::clip(&body, 20);
        assert!(clipped.starts_with(&"x".repeat(20)));
        assert!(clipped.ends_with("[TRUNCATED at 20 chars]"));
    }

    #[test]
    fn clip_respects_char_boundaries() {
        let body = "héllo wörld".repeat(10);
        let clipped = WebFetchTool::clip(&body, 15);
        assert!(clipped.contains("[TRUNCATED at 15 chars]"));
    }

    #[tokio::test]
    async fn missing_url_argument() {
        let tool = WebFetchTool::new();
        assert!(tool.execute(serde_json::json!({})).await.is_err());
    }

    #[tokio::test]
    async fn unreachable_host_is_error_label() {
        let tool = WebFetchTool::new();
        let result = tool
            .execute(serde_json::json!({"url": "http://127.0.0.1:1/nothing"}))
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.output.starts_with("[ERROR]"));
    }
}
