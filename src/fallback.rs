//! Fallback Synthesizer
//!
//! Offline generator used whenever the backend cannot deliver: timeouts,
//! errors, unusable payloads, and quick-start tags. Output uses exactly the
//! same [`Artifact`] shape as a generated result. Text comes from a fixed
//! content bank rendered through Handlebars with the query as context;
//! numbers are fixed per option with deterministic per-segment offsets.

use chrono::Utc;
use handlebars::Handlebars;
use serde_json::{json, Value};

use crate::artifact::{
    Artifact, Audience, CanonicalOption, QualitativeTheme, QuestionResult, Quote, Sentiment,
};
use crate::config::ResearchConfig;
use crate::executor::ExecutionRequest;
use crate::methodology::{Methodology, MethodologyType};

/// Lower bound on per-segment respondents for synthesized surveys
const MIN_SAMPLE_SIZE: u32 = 100;

/// Longest topic excerpt interpolated into templates
const TOPIC_MAX_CHARS: usize = 80;

struct QuestionTemplate {
    title: &'static str,
    text: &'static str,
    options: &'static [(&'static str, f64)],
}

const SURVEY_BANK: [QuestionTemplate; 3] = [
    QuestionTemplate {
        title: "Awareness",
        text: "How familiar are you with {{topic}}?",
        options: &[
            ("Very familiar", 22.0),
            ("Somewhat familiar", 38.0),
            ("Heard of it only", 25.0),
            ("Not familiar at all", 15.0),
        ],
    },
    QuestionTemplate {
        title: "Interest Level",
        text: "How interested are you in {{topic}}?",
        options: &[
            ("Very interested", 18.0),
            ("Somewhat interested", 34.0),
            ("Neutral", 24.0),
            ("Not very interested", 14.0),
            ("Not at all interested", 10.0),
        ],
    },
    QuestionTemplate {
        title: "Key Driver",
        text: "What matters most to you when it comes to {{topic}}?",
        options: &[
            ("Price", 31.0),
            ("Quality", 27.0),
            ("Convenience", 19.0),
            ("Brand reputation", 13.0),
            ("Recommendations", 10.0),
        ],
    },
];

struct ThemeTemplate {
    topic: &'static str,
    sentiment: Sentiment,
    summary: &'static str,
    quotes: &'static [(&'static str, &'static str)],
}

const FOCUS_GROUP_BANK: [ThemeTemplate; 3] = [
    ThemeTemplate {
        topic: "First Impressions",
        sentiment: Sentiment::Mixed,
        summary: "{{audience}} participants reacted to {{topic}} with curiosity tempered by caution.",
        quotes: &[
            ("Honestly my first thought about {{topic}} was 'why not', then I started asking questions.", "Maya, 29"),
            ("It sounds good on paper. I'd want to see it work for someone like me first.", "Derek, 44"),
        ],
    },
    ThemeTemplate {
        topic: "Everyday Practicality",
        sentiment: Sentiment::Positive,
        summary: "Most of the group could picture {{topic}} fitting into a normal week without much effort.",
        quotes: &[
            ("If it saves me ten minutes a day I'm in.", "Priya, 35"),
            ("I can see myself using it on busy days more than anything.", "Tom, 52"),
            ("It fits how I already do things, which matters a lot.", "Alicia, 23"),
        ],
    },
    ThemeTemplate {
        topic: "Cost Concerns",
        sentiment: Sentiment::Negative,
        summary: "Price came up repeatedly as the main reason to hold back on {{topic}}.",
        quotes: &[
            ("The moment it costs more than what I have now, I'm out.", "Sam, 38"),
            ("I'd need a trial before paying anything for {{topic}}.", "Rosa, 61"),
        ],
    },
];

const SURVEY_ABSTRACT: &str = "Simulated {{methodology}} of {{respondents}} {{audience}} respondents on \"{{query}}\". Figures are illustrative estimates.";
const SEGMENTED_ABSTRACT: &str = "Simulated {{methodology}} comparing {{segments}} on \"{{query}}\", {{per_segment}} respondents per segment. Figures are illustrative estimates.";
const FOCUS_GROUP_ABSTRACT: &str = "Simulated focus group with {{participants}} {{audience}} participants discussing \"{{query}}\". Themes and quotes are illustrative.";

/// Deterministic offline artifact generator
pub struct FallbackSynthesizer {
    handlebars: Handlebars<'static>,
    config: ResearchConfig,
}

impl FallbackSynthesizer {
    pub fn new(config: ResearchConfig) -> Self {
        let mut handlebars = Handlebars::new();
        handlebars.register_escape_fn(handlebars::no_escape);
        Self { handlebars, config }
    }

    /// Always returns a structurally valid artifact; never touches the network
    pub fn synthesize(&self, request: &ExecutionRequest) -> Artifact {
        let audience_name = if request.parameters.audience.trim().is_empty() {
            self.config.default_audience.clone()
        } else {
            request.parameters.audience.trim().to_string()
        };
        let context = json!({
            "topic": topic_of(request),
            "query": excerpt(request.query.trim(), TOPIC_MAX_CHARS),
            "audience": audience_name,
            "methodology": request.methodology.name().to_lowercase(),
        });

        match request.methodology.methodology_type() {
            MethodologyType::Qualitative => self.focus_group(request, &audience_name, context),
            MethodologyType::Quantitative => self.survey(request, &audience_name, context),
        }
    }

    fn survey(&self, request: &ExecutionRequest, audience: &str, mut context: Value) -> Artifact {
        let per_segment = request
            .parameters
            .sample_size
            .unwrap_or(self.config.default_sample_size)
            .max(MIN_SAMPLE_SIZE);
        let segments = segments_for(request, audience);
        let respondent_count = per_segment.saturating_mul(segments.len().max(1) as u32);

        let questions = SURVEY_BANK
            .iter()
            .enumerate()
            .map(|(i, template)| QuestionResult {
                id: format!("q{}", i + 1),
                title: template.title.to_string(),
                question_text: self.render(template.text, &context),
                respondent_count,
                options: synthesize_options(template.options, &segments),
                segments: segments.clone(),
            })
            .collect();

        context["respondents"] = json!(respondent_count);
        context["per_segment"] = json!(per_segment);
        context["segments"] = json!(segments.join(", "));
        let summary = if segments.is_empty() {
            self.render(SURVEY_ABSTRACT, &context)
        } else {
            self.render(SEGMENTED_ABSTRACT, &context)
        };

        Artifact {
            id: request.artifact_id,
            title: request.study_plan.title.clone(),
            methodology_type: MethodologyType::Quantitative,
            audience: Audience::named(audience),
            respondent_count,
            summary,
            questions,
            themes: Vec::new(),
            study_plan: request.study_plan.clone(),
            created_at: Utc::now(),
        }
    }

    fn focus_group(&self, request: &ExecutionRequest, audience: &str, mut context: Value) -> Artifact {
        let participants = self.config.default_participant_count;
        context["participants"] = json!(participants);

        let themes = FOCUS_GROUP_BANK
            .iter()
            .enumerate()
            .map(|(i, template)| QualitativeTheme {
                id: format!("t{}", i + 1),
                topic: template.topic.to_string(),
                sentiment: template.sentiment,
                summary: self.render(template.summary, &context),
                quotes: template
                    .quotes
                    .iter()
                    .map(|(text, attribution)| Quote {
                        text: self.render(text, &context),
                        attribution: attribution.to_string(),
                    })
                    .collect(),
            })
            .collect();

        Artifact {
            id: request.artifact_id,
            title: request.study_plan.title.clone(),
            methodology_type: MethodologyType::Qualitative,
            audience: Audience::named(audience),
            respondent_count: participants,
            summary: self.render(FOCUS_GROUP_ABSTRACT, &context),
            questions: Vec::new(),
            themes,
            study_plan: request.study_plan.clone(),
            created_at: Utc::now(),
        }
    }

    /// Render a bank template; a render failure yields the raw template text
    fn render(&self, template: &str, context: &Value) -> String {
        match self.handlebars.render_template(template, context) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "Fallback template failed to render");
                template.to_string()
            }
        }
    }
}

/// Segment columns for a synthesized survey
///
/// Surveys split only with two or more segments. The legacy comparison
/// always has columns, falling back to the audience alone.
fn segments_for(request: &ExecutionRequest, audience: &str) -> Vec<String> {
    match (request.methodology, request.parameters.comparison_segments()) {
        (Methodology::FocusGroup, _) => Vec::new(),
        (_, Some(segments)) => segments.to_vec(),
        (Methodology::Comparison, None) => vec![audience.to_string()],
        (_, None) => Vec::new(),
    }
}

fn synthesize_options(bank: &[(&str, f64)], segments: &[String]) -> Vec<CanonicalOption> {
    bank.iter()
        .enumerate()
        .map(|(j, (label, base))| {
            if segments.is_empty() {
                CanonicalOption::single(*label, *base)
            } else {
                CanonicalOption {
                    label: label.to_string(),
                    values: segments
                        .iter()
                        .enumerate()
                        .map(|(i, segment)| (segment.clone(), segment_offset(*base, i, j)))
                        .collect(),
                }
            }
        })
        .collect()
}

/// Fixed small shift so segments differ without randomness
fn segment_offset(base: f64, segment: usize, option: usize) -> f64 {
    let shift = ((segment * 7 + option * 3) % 9) as f64 - 4.0;
    ((base + shift).clamp(0.0, 100.0) * 10.0).round() / 10.0
}

fn topic_of(request: &ExecutionRequest) -> String {
    let question = request.parameters.research_question.trim();
    let raw = if question.is_empty() {
        request.query.trim()
    } else {
        question
    };
    let topic = raw.trim_end_matches(['?', '.', '!']).trim();
    if topic.is_empty() {
        "this topic".to_string()
    } else {
        excerpt(topic, TOPIC_MAX_CHARS)
    }
}

fn excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", text[..idx].trim_end()),
        None => text.to_string(),
    }
}
