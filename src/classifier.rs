//! Methodology Classifier
//!
//! Maps a query (plus the prior artifact on follow-ups) to a
//! [`MethodologySelection`]. The backend is offered one `select_*` tool per
//! methodology and `request_clarification`; the first invocation wins.
//!
//! Any failure (timeout, transport error, no tool chosen, unknown tool)
//! silently becomes a default survey. Clarification only happens when the
//! backend explicitly asks for it.

use std::collections::BTreeSet;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use research_llm::{LlmClient, ToolCallResult};

use crate::config::ResearchConfig;
use crate::deadline::TurnDeadline;
use crate::error::{PipelineError, Result, Stage};
use crate::methodology::Methodology;
use crate::payload::{count_field, str_field, string_list};
use crate::schemas::{self, CLARIFICATION_TOOL};
use crate::selection::{
    ClarificationRequest, FollowUpAction, MethodologySelection, ResearchParameters, ResearchQuery,
};

const CLASSIFIER_SYSTEM_PROMPT: &str = include_str!("prompts/classifier_system.md");

static QUICK_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)#(survey|focus-group|comparison)\b").expect("static regex")
});

static VERSUS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b([\w'-]+(?:\s+[\w'-]+)?)\s+(?:vs\.?|versus)\s+([\w'-]+(?:\s+[\w'-]+)?)")
        .expect("static regex")
});

static COMPARE_AND: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bcompar(?:e|ing)\s+([\w'-]+(?:\s+[\w'-]+)?)\s+(?:and|with|to)\s+([\w'-]+(?:\s+[\w'-]+)?)")
        .expect("static regex")
});

static MENTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"@([\w-]+)").expect("static regex"));

/// Words trimmed from the edges of a captured segment name
const EDGE_WORDS: &[&str] = &[
    "how", "do", "does", "what", "why", "when", "the", "on", "about", "for", "in", "feel", "think",
    "regarding", "toward", "towards", "with", "and",
];

/// Segments the request appears to name, passed to the backend as a hint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentHint {
    pub segments: Vec<String>,
}

impl SegmentHint {
    /// Look for "X vs Y", "X versus Y", "compare X and Y", or two @mentions
    pub fn scan(text: &str) -> Option<Self> {
        let pair = COMPARE_AND
            .captures(text)
            .or_else(|| VERSUS.captures(text))
            .and_then(|caps| {
                let left = clean_segment(caps.get(1)?.as_str())?;
                let right = clean_segment(caps.get(2)?.as_str())?;
                Some(vec![left, right])
            });
        if let Some(segments) = pair {
            return Some(Self { segments });
        }

        let mut seen = BTreeSet::new();
        let mentions: Vec<String> = MENTION
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .filter(|m| seen.insert(m.to_lowercase()))
            .collect();
        (mentions.len() >= 2).then_some(Self { segments: mentions })
    }
}

fn clean_segment(raw: &str) -> Option<String> {
    let words: Vec<&str> = raw.split_whitespace().collect();
    let start = words
        .iter()
        .position(|w| !EDGE_WORDS.contains(&w.to_lowercase().as_str()))?;
    let end = words
        .iter()
        .rposition(|w| !EDGE_WORDS.contains(&w.to_lowercase().as_str()))?;
    Some(words[start..=end].join(" "))
}

/// Methodology forced by a `#tag`, with the tag removed from the query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickStart {
    pub methodology: Methodology,
    pub query: String,
}

/// Detect a quick-start tag; the first tag in the text decides
pub fn detect_quick_tag(text: &str) -> Option<QuickStart> {
    let tag = QUICK_TAG.captures(text)?.get(1)?.as_str().to_lowercase();
    let methodology = Methodology::ALL
        .into_iter()
        .find(|m| m.quick_tag().is_some_and(|t| t[1..] == tag))?;
    let stripped = QUICK_TAG.replace_all(text, " ");
    Some(QuickStart {
        methodology,
        query: stripped.split_whitespace().collect::<Vec<_>>().join(" "),
    })
}

pub struct MethodologyClassifier {
    client: Arc<dyn LlmClient>,
    config: ResearchConfig,
}

impl MethodologyClassifier {
    pub fn new(client: Arc<dyn LlmClient>, config: ResearchConfig) -> Self {
        Self { client, config }
    }

    /// Classify a query; never fails
    pub async fn classify(&self, query: ResearchQuery<'_>, deadline: &TurnDeadline) -> MethodologySelection {
        match self.try_classify(query, deadline).await {
            Ok(selection) => {
                tracing::info!(
                    methodology = ?selection.methodology(),
                    clarification = selection.is_clarification(),
                    "Classified query"
                );
                selection
            }
            Err(e) => {
                tracing::warn!(error = %e, "Classification failed, defaulting to survey");
                MethodologySelection::default_survey(query.text, &self.config.default_audience)
            }
        }
    }

    /// Selection for a quick-start tag; no backend involved
    pub fn quick_start(&self, quick: &QuickStart) -> MethodologySelection {
        let mut parameters = ResearchParameters::new(self.config.default_audience.clone(), quick.query.clone());
        if quick.methodology != Methodology::FocusGroup {
            if let Some(hint) = SegmentHint::scan(&quick.query) {
                parameters = parameters.with_segments(hint.segments);
            }
        }
        MethodologySelection::Methodology {
            methodology: quick.methodology,
            parameters,
            follow_up: FollowUpAction::New,
        }
    }

    async fn try_classify(&self, query: ResearchQuery<'_>, deadline: &TurnDeadline) -> Result<MethodologySelection> {
        let hint = SegmentHint::scan(query.text);
        let prompt = user_prompt(query, hint.as_ref());
        let tools = schemas::classification_tools();

        tracing::debug!(
            provider = self.client.provider_name(),
            model = self.client.model_name(),
            hint = ?hint,
            follow_up = query.prior.is_some(),
            "Classifying query"
        );

        let calls = deadline
            .race(
                Stage::Classification,
                self.client
                    .chat_with_tools(CLASSIFIER_SYSTEM_PROMPT, &prompt, &tools),
            )
            .await?;

        let first = calls
            .first()
            .ok_or_else(|| PipelineError::Classification("backend chose no tool".to_string()))?;
        if calls.len() > 1 {
            tracing::debug!(count = calls.len(), chosen = %first.tool_name, "Multiple tool calls, using the first");
        }

        parse_invocation(first, query.text, &self.config.default_audience)
    }
}

/// Turn a classification tool call into a selection
pub fn parse_invocation(call: &ToolCallResult, query: &str, default_audience: &str) -> Result<MethodologySelection> {
    let args = &call.arguments;

    if call.tool_name == CLARIFICATION_TOOL {
        let missing_info = str_field(args, "missingInfo")
            .ok_or_else(|| PipelineError::Classification("clarification without missingInfo".to_string()))?;
        return Ok(MethodologySelection::Clarification(ClarificationRequest {
            missing_info,
            suggestions: args.get("suggestions").map(string_list).unwrap_or_default(),
        }));
    }

    let methodology = Methodology::from_selection_tool(&call.tool_name)
        .ok_or_else(|| PipelineError::Classification(format!("unknown tool '{}'", call.tool_name)))?;

    let mut seen = BTreeSet::new();
    let segments: Vec<String> = args
        .get("segments")
        .map(string_list)
        .unwrap_or_default()
        .into_iter()
        .filter(|s| seen.insert(s.clone()))
        .collect();

    let mut parameters = ResearchParameters::new(
        str_field(args, "audience").unwrap_or_else(|| default_audience.to_string()),
        str_field(args, "researchQuestion").unwrap_or_else(|| query.trim().to_string()),
    )
    .with_segments(segments);
    if let Some(n) = count_field(args, "sampleSize") {
        parameters = parameters.with_sample_size(n);
    }

    Ok(MethodologySelection::Methodology {
        methodology,
        parameters,
        follow_up: str_field(args, "followUpAction")
            .map(|s| FollowUpAction::parse_lenient(&s))
            .unwrap_or_default(),
    })
}

fn user_prompt(query: ResearchQuery<'_>, hint: Option<&SegmentHint>) -> String {
    let mut prompt = format!("Research request: {}\n", query.text.trim());

    if let Some(hint) = hint {
        prompt.push_str(&format!(
            "\nHint: the request appears to compare these segments: {}. Pass them as `segments` if that reading is right.\n",
            hint.segments.join(", ")
        ));
    }

    if let Some(prior) = query.prior {
        let summary = prior.summary_for_follow_up();
        prompt.push_str(&format!(
            "\nThis is a follow-up to a previous study titled \"{}\" ({:?}, id {}). Decide whether to update it or start a new one.\n",
            summary.title, summary.methodology_type, summary.id
        ));
        match serde_json::to_string_pretty(prior) {
            Ok(json) => prompt.push_str(&format!("\nPrevious study:\n```json\n{}\n```\n", json)),
            Err(e) => tracing::warn!(error = %e, "Could not serialize prior artifact for classifier"),
        }
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call(tool: &str, arguments: serde_json::Value) -> ToolCallResult {
        ToolCallResult {
            tool_name: tool.to_string(),
            arguments,
        }
    }

    #[test]
    fn test_versus_hint() {
        let hint = SegmentHint::scan("coffee habits Gen Z vs Boomers").unwrap();
        assert_eq!(hint.segments, vec!["Gen Z", "Boomers"]);
        let hint = SegmentHint::scan("How do renters versus homeowners feel about solar").unwrap();
        assert_eq!(hint.segments, vec!["renters", "homeowners"]);
    }

    #[test]
    fn test_compare_hint() {
        let hint = SegmentHint::scan("Compare students and retirees on budgeting apps").unwrap();
        assert_eq!(hint.segments, vec!["students", "retirees"]);
    }

    #[test]
    fn test_mention_hint_needs_two_distinct() {
        assert!(SegmentHint::scan("ask @gamers about latency").is_none());
        assert!(SegmentHint::scan("ask @gamers and @Gamers").is_none());
        let hint = SegmentHint::scan("ask @gamers and @streamers about latency").unwrap();
        assert_eq!(hint.segments, vec!["gamers", "streamers"]);
    }

    #[test]
    fn test_no_hint_for_plain_topic() {
        assert!(SegmentHint::scan("coffee").is_none());
    }

    #[test]
    fn test_quick_tag_detection() {
        let quick = detect_quick_tag("#Focus-Group  why do people skip breakfast").unwrap();
        assert_eq!(quick.methodology, Methodology::FocusGroup);
        assert_eq!(quick.query, "why do people skip breakfast");
        assert_eq!(detect_quick_tag("meal kits #survey").unwrap().methodology, Methodology::Survey);
        assert!(detect_quick_tag("#heatmap of features").is_none());
        assert!(detect_quick_tag("no tags here").is_none());
    }

    #[test]
    fn test_parse_selection_call() {
        let sel = parse_invocation(
            &call(
                "select_survey",
                json!({
                    "audience": "Remote Workers",
                    "researchQuestion": "How do remote workers take coffee breaks?",
                    "segments": ["Parents", "Non-parents", "Parents"],
                    "sampleSize": "300",
                    "followUpAction": "update"
                }),
            ),
            "coffee breaks",
            "General Population",
        )
        .unwrap();
        let params = sel.parameters().unwrap();
        assert_eq!(sel.methodology(), Some(Methodology::Survey));
        assert_eq!(params.audience, "Remote Workers");
        assert_eq!(params.segments, vec!["Parents", "Non-parents"]);
        assert_eq!(params.sample_size, Some(300));
        assert_eq!(sel.follow_up(), FollowUpAction::Update);
    }

    #[test]
    fn test_parse_fills_defaults() {
        let sel = parse_invocation(&call("select_focus_group", json!({})), " coffee ", "General Population").unwrap();
        let params = sel.parameters().unwrap();
        assert_eq!(params.audience, "General Population");
        assert_eq!(params.research_question, "coffee");
        assert_eq!(sel.follow_up(), FollowUpAction::New);
    }

    #[test]
    fn test_parse_clarification() {
        let sel = parse_invocation(
            &call(CLARIFICATION_TOOL, json!({"missingInfo": "Which product?", "suggestions": "Phones, Laptops"})),
            "it",
            "General Population",
        )
        .unwrap();
        let clarification = sel.as_clarification().unwrap();
        assert_eq!(clarification.suggestions, vec!["Phones", "Laptops"]);
    }

    #[test]
    fn test_parse_rejects_unknown_tool_and_empty_clarification() {
        assert!(parse_invocation(&call("select_poll", json!({})), "q", "GP").is_err());
        assert!(parse_invocation(&call(CLARIFICATION_TOOL, json!({})), "q", "GP").is_err());
    }

    #[test]
    fn test_prompt_mentions_hint() {
        let hint = SegmentHint::scan("cats vs dogs").unwrap();
        let prompt = user_prompt(ResearchQuery::new("cats vs dogs"), Some(&hint));
        assert!(prompt.contains("cats, dogs"));
        assert!(!prompt.contains("follow-up"));
    }
}
