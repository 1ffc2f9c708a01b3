//! Client Factory
//!
//! Picks a provider from `LLM_BACKEND` and builds its client behind an
//! `Arc` so the classifier and executor share one connection pool.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;

use crate::anthropic_client::AnthropicClient;
use crate::llm_client::{LlmClient, ToolCallResult, ToolDefinition};
use crate::openai_client::OpenAiClient;

/// Environment variable naming the provider
pub const BACKEND_ENV: &str = "LLM_BACKEND";

/// Hosted model provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Provider {
    #[default]
    Anthropic,
    OpenAi,
}

impl Provider {
    /// Provider named by `LLM_BACKEND`, Anthropic when unset
    pub fn from_env() -> Result<Self> {
        match std::env::var(BACKEND_ENV) {
            Ok(value) => value.parse(),
            Err(_) => Ok(Self::default()),
        }
    }

    /// Variable holding this provider's API key
    pub fn api_key_env(self) -> &'static str {
        match self {
            Provider::Anthropic => "ANTHROPIC_API_KEY",
            Provider::OpenAi => "OPENAI_API_KEY",
        }
    }
}

impl FromStr for Provider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "anthropic" | "claude" => Ok(Provider::Anthropic),
            "openai" | "gpt" => Ok(Provider::OpenAi),
            other => bail!("unknown {BACKEND_ENV} '{other}' (expected anthropic, claude, openai or gpt)"),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Provider::Anthropic => "Anthropic",
            Provider::OpenAi => "OpenAI",
        })
    }
}

/// Create the client selected by `LLM_BACKEND`, reading its API key from the environment
pub fn create_llm_client() -> Result<Arc<dyn LlmClient>> {
    let provider = Provider::from_env()?;
    let key_env = provider.api_key_env();
    let api_key = std::env::var(key_env).map_err(|_| anyhow!("{key_env} environment variable not set"))?;
    Ok(build(provider, api_key))
}

/// Stand-in used when no provider is configured; every call fails with the reason
#[derive(Debug, Clone)]
pub struct UnconfiguredClient {
    reason: String,
}

impl UnconfiguredClient {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

#[async_trait]
impl LlmClient for UnconfiguredClient {
    async fn chat_with_tool(&self, _system: &str, _user: &str, tool: &ToolDefinition) -> Result<ToolCallResult> {
        bail!("no LLM provider for {}: {}", tool.name, self.reason)
    }

    async fn chat_with_tools(
        &self,
        _system: &str,
        _user: &str,
        _tools: &[ToolDefinition],
    ) -> Result<Vec<ToolCallResult>> {
        bail!("no LLM provider: {}", self.reason)
    }

    fn model_name(&self) -> &str {
        "none"
    }

    fn provider_name(&self) -> &str {
        "Unconfigured"
    }
}

fn build(provider: Provider, api_key: String) -> Arc<dyn LlmClient> {
    tracing::debug!(%provider, "Creating LLM client");
    match provider {
        Provider::Anthropic => Arc::new(AnthropicClient::new(api_key)),
        Provider::OpenAi => Arc::new(OpenAiClient::new(api_key)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_aliases() {
        assert_eq!("claude".parse::<Provider>().unwrap(), Provider::Anthropic);
        assert_eq!(" GPT ".parse::<Provider>().unwrap(), Provider::OpenAi);
        let err = "gemini".parse::<Provider>().unwrap_err();
        assert!(err.to_string().contains("gemini"));
    }

    #[test]
    fn test_api_key_env_per_provider() {
        assert_eq!(Provider::default().api_key_env(), "ANTHROPIC_API_KEY");
        assert_eq!(Provider::OpenAi.api_key_env(), "OPENAI_API_KEY");
    }

    #[test]
    fn test_build_picks_provider() {
        let client = build(Provider::OpenAi, "k".to_string());
        assert_eq!(client.provider_name(), "OpenAI");
        let client = build(Provider::Anthropic, "k".to_string());
        assert_eq!(client.provider_name(), "Anthropic");
    }
}
