//! OpenAI Client
//!
//! LLM client implementation for OpenAI API.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::Deserialize;

use super::llm_client::{preview, LlmClient, ToolCallResult, ToolDefinition};

/// Default OpenAI model
const DEFAULT_MODEL: &str = "gpt-4o";

const COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

/// OpenAI API client
#[derive(Clone)]
pub struct OpenAiClient {
    api_key: String,
    client: reqwest::Client,
    model: String,
}

#[derive(Deserialize)]
struct FunctionCall {
    name: String,
    arguments: String, // OpenAI returns arguments as a JSON string
}

#[derive(Deserialize)]
struct ToolCall {
    function: FunctionCall,
}

#[derive(Deserialize)]
struct Message {
    #[serde(default)]
    tool_calls: Vec<ToolCall>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct ApiResponse {
    choices: Vec<Choice>,
}

impl OpenAiClient {
    /// Create a new OpenAI client with the given API key
    pub fn new(api_key: String) -> Self {
        let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
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

    async fn post(&self, body: &serde_json::Value) -> Result<ApiResponse> {
        let response = self
            .client
            .post(COMPLETIONS_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("OpenAI API error {}: {}", status, body));
        }

        let response_text = response.text().await?;
        tracing::debug!("OpenAI raw response: {}", preview(&response_text));

        serde_json::from_str(&response_text)
            .map_err(|e| anyhow!("Failed to parse OpenAI response: {}", e))
    }

    /// Internal API call with tool calling for structured output
    async fn call_api_with_tools(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        tools: &[ToolDefinition],
        tool_choice: serde_json::Value,
    ) -> Result<Vec<ToolCallResult>> {
        let functions: Vec<serde_json::Value> = tools
            .iter()
            .map(|t| {
                serde_json::json!({
                    "type": "function",
                    "function": {
                        "name": &t.name,
                        "description": &t.description,
                        "parameters": &t.parameters
                    }
                })
            })
            .collect();

        let api_response = self
            .post(&serde_json::json!({
                "model": &self.model,
                "messages": [
                    {"role": "system", "content": system_prompt},
                    {"role": "user", "content": user_prompt}
                ],
                "temperature": 0.7,
                "tools": functions,
                "tool_choice": tool_choice
            }))
            .await?;

        let Some(choice) = api_response.choices.into_iter().next() else {
            return Err(anyhow!("OpenAI returned no choices"));
        };

        choice
            .message
            .tool_calls
            .into_iter()
            .map(|call| {
                // Parse the arguments JSON string into a Value
                let arguments: serde_json::Value = serde_json::from_str(&call.function.arguments)
                    .map_err(|e| anyhow!("Failed to parse function arguments: {}", e))?;
                Ok(ToolCallResult {
                    tool_name: call.function.name,
                    arguments,
                })
            })
            .collect()
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn chat_with_tool(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        tool: &ToolDefinition,
    ) -> Result<ToolCallResult> {
        let choice = serde_json::json!({"type": "function", "function": {"name": &tool.name}});
        self.call_api_with_tools(system_prompt, user_prompt, std::slice::from_ref(tool), choice)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("No tool_calls in OpenAI response"))
    }

    async fn chat_with_tools(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        tools: &[ToolDefinition],
    ) -> Result<Vec<ToolCallResult>> {
        self.call_api_with_tools(system_prompt, user_prompt, tools, serde_json::json!("auto"))
            .await
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn provider_name(&self) -> &str {
        "OpenAI"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_model() {
        let client = OpenAiClient::with_model("test-key".to_string(), "gpt-4o-mini");
        assert_eq!(client.model_name(), "gpt-4o-mini");
        assert_eq!(client.provider_name(), "OpenAI");
    }

    #[test]
    fn test_prose_reply_has_no_tool_calls() {
        let body = r#"{"choices":[{"message":{"content":"hello"}}]}"#;
        let parsed: ApiResponse = serde_json::from_str(body).unwrap();
        assert!(parsed.choices[0].message.tool_calls.is_empty());
    }

    #[test]
    fn test_tool_call_arguments_are_a_string() {
        let body = r#"{"choices":[{"message":{"content":null,"tool_calls":[
            {"id":"c1","type":"function","function":{"name":"select_survey","arguments":"{\"audience\":\"Parents\"}"}}
        ]}}]}"#;
        let parsed: ApiResponse = serde_json::from_str(body).unwrap();
        let call = &parsed.choices[0].message.tool_calls[0];
        assert_eq!(call.function.name, "select_survey");
        let args: serde_json::Value = serde_json::from_str(&call.function.arguments).unwrap();
        assert_eq!(args["audience"], "Parents");
    }
}
