//! LLM Client Trait
//!
//! Unified interface for LLM providers (Anthropic, OpenAI).

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Tool/function definition for structured output
///
/// - Anthropic: maps to `tools` array with `tool_choice`
/// - OpenAI: maps to `tools` array of `function` entries with `tool_choice`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool/function name (e.g., "generate_survey")
    pub name: String,
    /// Description of what the tool does
    pub description: String,
    /// JSON Schema for the tool's parameters
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// Result from a tool/function call
///
/// Contains the structured JSON arguments returned by the LLM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallResult {
    /// Name of the tool that was called
    pub tool_name: String,
    /// Structured arguments as JSON
    pub arguments: serde_json::Value,
}

/// Tool-calling interface shared by the Anthropic and OpenAI clients
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Call LLM with a single tool, forcing structured output
    async fn chat_with_tool(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        tool: &ToolDefinition,
    ) -> Result<ToolCallResult>;

    /// Offer a closed set of tools and let the model pick
    ///
    /// Returns every invocation in the order the provider reported them.
    /// An empty vec means the model answered in prose instead.
    async fn chat_with_tools(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        tools: &[ToolDefinition],
    ) -> Result<Vec<ToolCallResult>>;

    /// Get the model name for logging
    fn model_name(&self) -> &str;

    /// Get the provider name for logging
    fn provider_name(&self) -> &str;
}

/// Trim a raw provider body for debug logs
pub(crate) fn preview(text: &str) -> &str {
    let mut end = text.len().min(1000);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_respects_char_boundaries() {
        let text = "é".repeat(600);
        let p = preview(&text);
        assert!(p.len() <= 1000);
        assert!(p.chars().all(|c| c == 'é'));
    }

    #[test]
    fn test_tool_definition_new() {
        let tool = ToolDefinition::new("t", "desc", serde_json::json!({"type": "object"}));
        assert_eq!(tool.name, "t");
        assert_eq!(tool.parameters["type"], "object");
    }
}
