//! Anthropic Client
//!
//! LLM client implementation for Anthropic Claude API.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;

use super::llm_client::{preview, LlmClient, ToolCallResult, ToolDefinition};

/// Default Anthropic model
const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";

/// Anthropic Claude API client
#[derive(Clone)]
pub struct AnthropicClient {
    api_key: String,
    client: reqwest::Client,
    model: String,
}

impl AnthropicClient {
    /// Create a new Anthropic client with the given API key
    pub fn new(api_key: String) -> Self {
        let model = std::env::var("ANTHROPIC_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Self {
            api_key,
            client: reqwest::Client::new(),
            model,
        }
    }

    /// Create with a specific model
    pub fn with_model(api_key: String, model: &str) -> Self {
        Self {
            api_key,
            client: reqwest::Client::new(),
            model: model.to_string(),
        }
    }

    /// POST a request body to the Messages API and return the parsed body
    async fn post(&self, body: &Value) -> Result<Value> {
        let response = self
            .client
            .post(MESSAGES_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Anthropic API error {}: {}", status, body));
        }

        let text = response.text().await?;
        tracing::debug!("Anthropic raw response: {}", preview(&text));
        serde_json::from_str(&text).map_err(|e| anyhow!("Failed to parse Anthropic response: {}", e))
    }

    /// Internal API call with tool_use for structured output
    async fn call_api_with_tools(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        tools: &[ToolDefinition],
        tool_choice: Value,
    ) -> Result<Vec<ToolCallResult>> {
        let claude_tools: Vec<Value> = tools
            .iter()
            .map(|t| {
                serde_json::json!({
                    "name": t.name,
                    "description": t.description,
                    "input_schema": t.parameters
                })
            })
            .collect();

        let body = self
            .post(&serde_json::json!({
                "model": &self.model,
                "max_tokens": 4096,
                "system": system_prompt,
                "messages": [{"role": "user", "content": user_prompt}],
                "tools": claude_tools,
                "tool_choice": tool_choice
            }))
            .await?;

        Ok(Self::tool_uses(&body))
    }

    /// Collect `tool_use` content blocks in response order
    fn tool_uses(body: &Value) -> Vec<ToolCallResult> {
        body["content"]
            .as_array()
            .into_iter()
            .flatten()
            .filter(|block| block["type"] == "tool_use")
            .map(|block| ToolCallResult {
                tool_name: block["name"].as_str().unwrap_or_default().to_string(),
                arguments: block["input"].clone(),
            })
            .collect()
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn chat_with_tool(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        tool: &ToolDefinition,
    ) -> Result<ToolCallResult> {
        let choice = serde_json::json!({"type": "tool", "name": &tool.name});
        self.call_api_with_tools(system_prompt, user_prompt, std::slice::from_ref(tool), choice)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("No tool_use block in Anthropic response"))
    }

    async fn chat_with_tools(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        tools: &[ToolDefinition],
    ) -> Result<Vec<ToolCallResult>> {
        let choice = serde_json::json!({"type": "auto"});
        self.call_api_with_tools(system_prompt, user_prompt, tools, choice)
            .await
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn provider_name(&self) -> &str {
        "Anthropic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_model() {
        let client = AnthropicClient::with_model("test-key".to_string(), "claude-3-opus");
        assert_eq!(client.model_name(), "claude-3-opus");
        assert_eq!(client.provider_name(), "Anthropic");
    }

    #[test]
    fn test_tool_uses_keeps_order_and_skips_text() {
        let body = serde_json::json!({
            "stop_reason": "tool_use",
            "content": [
                {"type": "text", "text": "Let me pick a method."},
                {"type": "tool_use", "id": "t1", "name": "select_survey", "input": {"audience": "Gen Z"}},
                {"type": "tool_use", "id": "t2", "name": "select_focus_group", "input": {}}
            ]
        });
        let calls = AnthropicClient::tool_uses(&body);
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].tool_name, "select_survey");
        assert_eq!(calls[0].arguments["audience"], "Gen Z");
        assert_eq!(calls[1].tool_name, "select_focus_group");
    }

    #[test]
    fn test_tool_uses_empty_when_prose_only() {
        let body = serde_json::json!({
            "content": [{"type": "text", "text": "Which audience do you mean?"}]
        });
        assert!(AnthropicClient::tool_uses(&body).is_empty());
    }
}
