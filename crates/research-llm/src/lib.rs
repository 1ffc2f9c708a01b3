//! Provider-agnostic LLM access for the research pipeline
//!
//! This crate knows nothing about surveys or focus groups. It exposes one
//! trait, [`LlmClient`], with forced and model-chosen tool calls, plus
//! Anthropic and OpenAI implementations.
//!
//! ## Backend Selection
//!
//! Set `LLM_BACKEND` environment variable:
//! - `anthropic` (default): Anthropic Claude API
//! - `openai`: OpenAI API

pub mod anthropic_client;
pub mod client_factory;
pub mod llm_client;
pub mod openai_client;

pub use client_factory::{create_llm_client, Provider, UnconfiguredClient};
pub use llm_client::{LlmClient, ToolCallResult, ToolDefinition};
