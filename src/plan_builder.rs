//! Study Plan Builder
//!
//! Deterministic Rust code that turns a chosen methodology and its
//! parameters into the confirmation summary shown before execution.
//! No AI involved: titles come from keyword extraction, bullets and
//! runtime labels from a static table.

use serde::{Deserialize, Serialize};

use crate::methodology::Methodology;
use crate::selection::{MethodologySelection, ResearchParameters};

/// Human-readable summary of what is about to run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyPlan {
    pub title: String,
    pub methodology_id: String,
    pub methodology_name: String,
    #[serde(default)]
    pub variant_id: Option<String>,
    pub setup_bullets: Vec<String>,
    pub expected_runtime_label: String,
}

/// Leading words dropped before title extraction
const FILLER: &[&str] = &[
    "what", "whats", "what's", "how", "why", "when", "where", "which", "who", "do", "does", "did",
    "is", "are", "was", "were", "would", "should", "could", "can", "will", "tell", "me", "please",
    "i", "i'd", "we", "want", "need", "to", "know", "find", "out", "help", "understand", "let's",
    "lets", "about", "the", "a", "an",
];

const STOPWORDS: &[&str] = &[
    "the", "and", "for", "with", "about", "think", "feel", "feels", "people", "their", "they",
    "them", "this", "that", "these", "those", "from", "into", "what", "how", "why", "who", "does",
    "are", "our", "your", "you", "would", "should", "could", "toward", "towards", "regarding",
    "versus", "compare", "comparing", "between", "more", "most", "much", "many", "some", "any",
    "like", "really", "have", "has", "was", "were", "will", "can", "its", "it's",
];

struct PlanTemplate {
    setup_bullets: &'static [&'static str],
    runtime_label: &'static str,
}

fn template(methodology: Methodology, segmented: bool) -> PlanTemplate {
    match (methodology, segmented) {
        (Methodology::Survey, false) => PlanTemplate {
            setup_bullets: &[
                "3 closed-ended questions",
                "Simulated respondents from your audience",
                "Percentage breakdown per answer option",
            ],
            runtime_label: "About 30 seconds",
        },
        (Methodology::Survey, true) => PlanTemplate {
            setup_bullets: &[
                "3 closed-ended questions asked of every segment",
                "Equal sample per segment",
                "Side-by-side percentages per segment",
            ],
            runtime_label: "About 40 seconds",
        },
        (Methodology::FocusGroup, _) => PlanTemplate {
            setup_bullets: &[
                "Moderated discussion with 6-10 simulated participants",
                "3-4 recurring themes with sentiment",
                "Representative verbatim quotes",
            ],
            runtime_label: "About 45 seconds",
        },
        (Methodology::Comparison, _) => PlanTemplate {
            setup_bullets: &[
                "One shared questionnaire",
                "Results fanned out per segment",
                "Side-by-side segment comparison",
            ],
            runtime_label: "About 40 seconds",
        },
        (Methodology::Heatmap, _) => PlanTemplate {
            setup_bullets: &[
                "Attribute ratings across the audience",
                "Intensity scores per attribute",
                "Grid view of strongest and weakest attributes",
            ],
            runtime_label: "About 30 seconds",
        },
        (Methodology::Sentiment, _) => PlanTemplate {
            setup_bullets: &[
                "Reaction questions on the topic",
                "Positive, neutral and negative split",
                "Drivers behind each sentiment",
            ],
            runtime_label: "About 30 seconds",
        },
    }
}

/// Study plan builder - pure business logic
pub struct StudyPlanBuilder;

impl StudyPlanBuilder {
    /// Build the plan for a methodology selection; clarifications have none
    pub fn from_selection(selection: &MethodologySelection) -> Option<StudyPlan> {
        match selection {
            MethodologySelection::Methodology {
                methodology,
                parameters,
                ..
            } => Some(Self::build(*methodology, parameters)),
            MethodologySelection::Clarification(_) => None,
        }
    }

    pub fn build(methodology: Methodology, parameters: &ResearchParameters) -> StudyPlan {
        let segmented =
            methodology == Methodology::Survey && parameters.comparison_segments().is_some();
        let template = template(methodology, segmented);

        StudyPlan {
            title: Self::title(methodology, parameters),
            methodology_id: methodology.id().to_string(),
            methodology_name: methodology.name().to_string(),
            variant_id: segmented.then(|| "segmented".to_string()),
            setup_bullets: template
                .setup_bullets
                .iter()
                .map(|b| b.to_string())
                .collect(),
            expected_runtime_label: template.runtime_label.to_string(),
        }
    }

    /// `"{Audience} {Three Key Terms}"`, or `"{Audience} {Methodology}"`
    pub fn title(methodology: Methodology, parameters: &ResearchParameters) -> String {
        let audience = clean_audience_label(&parameters.audience);
        let terms: Vec<String> = key_terms(&parameters.research_question)
            .into_iter()
            .take(3)
            .map(|t| title_case(&t))
            .collect();

        let prefix = if audience.is_empty() {
            "General Population".to_string()
        } else {
            audience
        };

        if terms.is_empty() {
            format!("{} {}", prefix, methodology.name())
        } else {
            format!("{} {}", prefix, terms.join(" "))
        }
    }
}

/// Strip a leading `@`, turn hyphens into spaces, title-case every word
pub fn clean_audience_label(raw: &str) -> String {
    raw.trim()
        .trim_start_matches('@')
        .replace(['-', '_'], " ")
        .split_whitespace()
        .map(title_case)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Lowercased content words of a question, leading filler removed
pub(crate) fn key_terms(text: &str) -> Vec<String> {
    let tokens: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric() && c != '\'')
        .map(|t| t.trim_matches('\'').to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();

    let start = tokens
        .iter()
        .position(|t| !FILLER.contains(&t.as_str()))
        .unwrap_or(tokens.len());

    tokens[start..]
        .iter()
        .filter(|t| t.chars().count() > 2 && !STOPWORDS.contains(&t.as_str()))
        .cloned()
        .collect()
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
