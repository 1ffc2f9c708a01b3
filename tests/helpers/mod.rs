//! Scripted LLM clients for integration tests
//!
//! Classification (`chat_with_tools`) and generation (`chat_with_tool`)
//! are scripted independently so each pipeline stage can succeed, fail,
//! return nothing, or hang.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::{json, Value};

use synthetic_research::{LlmClient, ResearchConfig, ResearchPipeline, ToolCallResult, ToolDefinition};

#[derive(Debug, Clone)]
pub enum Script {
    /// Answer with this tool call
    Reply(ToolCallResult),
    /// Answer with no tool call at all
    Empty,
    /// Transport-level error
    Fail,
    /// Never answer
    Hang,
}

pub struct ScriptedClient {
    classify: Script,
    generate: Script,
    classify_calls: AtomicUsize,
    generate_calls: AtomicUsize,
    classify_prompts: Mutex<Vec<String>>,
    generate_tools: Mutex<Vec<String>>,
}

impl ScriptedClient {
    pub fn new(classify: Script, generate: Script) -> Self {
        Self {
            classify,
            generate,
            classify_calls: AtomicUsize::new(0),
            generate_calls: AtomicUsize::new(0),
            classify_prompts: Mutex::new(Vec::new()),
            generate_tools: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self::new(Script::Fail, Script::Fail)
    }

    pub fn hanging() -> Self {
        Self::new(Script::Hang, Script::Hang)
    }

    pub fn total_calls(&self) -> usize {
        self.classify_calls.load(Ordering::SeqCst) + self.generate_calls.load(Ordering::SeqCst)
    }

    pub fn generate_calls(&self) -> usize {
        self.generate_calls.load(Ordering::SeqCst)
    }

    pub fn classify_prompts(&self) -> Vec<String> {
        self.classify_prompts.lock().unwrap().clone()
    }

    pub fn generate_tools(&self) -> Vec<String> {
        self.generate_tools.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedClient {
    async fn chat_with_tool(
        &self,
        _system_prompt: &str,
        _user_prompt: &str,
        tool: &ToolDefinition,
    ) -> Result<ToolCallResult> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        self.generate_tools.lock().unwrap().push(tool.name.clone());
        match &self.generate {
            Script::Reply(call) => Ok(call.clone()),
            Script::Empty => Err(anyhow!("No tool call in response")),
            Script::Fail => Err(anyhow!("API error 503: overloaded")),
            Script::Hang => std::future::pending().await,
        }
    }

    async fn chat_with_tools(
        &self,
        _system_prompt: &str,
        user_prompt: &str,
        _tools: &[ToolDefinition],
    ) -> Result<Vec<ToolCallResult>> {
        self.classify_calls.fetch_add(1, Ordering::SeqCst);
        self.classify_prompts.lock().unwrap().push(user_prompt.to_string());
        match &self.classify {
            Script::Reply(call) => Ok(vec![call.clone()]),
            Script::Empty => Ok(Vec::new()),
            Script::Fail => Err(anyhow!("connection refused")),
            Script::Hang => std::future::pending().await,
        }
    }

    fn model_name(&self) -> &str {
        "scripted"
    }

    fn provider_name(&self) -> &str {
        "Scripted"
    }
}

pub fn tool_call(name: &str, arguments: Value) -> ToolCallResult {
    ToolCallResult {
        tool_name: name.to_string(),
        arguments,
    }
}

pub fn select(tool: &str, audience: &str, question: &str) -> Script {
    Script::Reply(tool_call(
        tool,
        json!({"audience": audience, "researchQuestion": question}),
    ))
}

pub fn select_with(tool: &str, arguments: Value) -> Script {
    Script::Reply(tool_call(tool, arguments))
}

pub fn survey_payload() -> Value {
    json!({
        "title": "Morning Coffee Habits",
        "abstract": "Most respondents drink coffee daily.",
        "audience": "General Population",
        "sampleSize": 400,
        "questions": [
            {
                "title": "Daily Cups",
                "questionText": "How many cups of coffee do you drink a day?",
                "options": [
                    {"label": "None", "percentage": 12},
                    {"label": "One", "percentage": 38},
                    {"label": "Two", "percentage": 31},
                    {"label": "Three or more", "percentage": 19}
                ]
            },
            {
                "title": "Brew Method",
                "questionText": "How do you usually make coffee at home?",
                "options": [
                    {"label": "Drip", "percentage": 41},
                    {"label": "Espresso", "percentage": 22},
                    {"label": "Pods", "percentage": 37}
                ]
            },
            {
                "title": "Café Spend",
                "questionText": "How much do you spend at cafés each week?",
                "options": [
                    {"label": "Nothing", "percentage": 30},
                    {"label": "Under $10", "percentage": 35},
                    {"label": "$10 or more", "percentage": 35}
                ]
            }
        ]
    })
}

pub fn generated_survey() -> Script {
    Script::Reply(tool_call("generate_survey", survey_payload()))
}

pub fn focus_group_payload() -> Value {
    json!({
        "title": "Meal Kit Conversations",
        "abstract": "Convenience wins, price worries.",
        "audience": "Busy Parents",
        "participantCount": 7,
        "themes": [
            {
                "topic": "Weeknight Relief",
                "sentiment": "positive",
                "summary": "Kits remove planning stress.",
                "quotes": [
                    {"text": "I stopped dreading 5pm.", "attribution": "Dana, 38"},
                    {"text": "The kids actually eat it.", "attribution": "Luis, 42"}
                ]
            },
            {
                "topic": "Packaging Waste",
                "sentiment": "negative",
                "summary": "Too much plastic.",
                "quotes": [
                    {"text": "So many little bags.", "attribution": "Kim, 35"},
                    {"text": "My recycling bin overflows.", "attribution": "Ade, 40"}
                ]
            },
            {
                "topic": "Value For Money",
                "sentiment": "mixed",
                "summary": "Worth it some weeks.",
                "quotes": [
                    {"text": "Cheaper than takeout, pricier than groceries.", "attribution": "Sara, 33"},
                    {"text": "I pause it when money is tight.", "attribution": "Ben, 45"}
                ]
            }
        ]
    })
}

pub fn config() -> ResearchConfig {
    ResearchConfig::default().with_deadline(Duration::from_secs(2))
}

pub fn pipeline(client: &Arc<ScriptedClient>) -> ResearchPipeline {
    ResearchPipeline::new(client.clone(), config())
}
