//! Research Executor
//!
//! Issues one schema-forced generation call per turn and turns the tool
//! payload into an [`Artifact`]. Dispatch is on [`ExecutionPath`]:
//!
//! | Path             | Tool                        | Notes                                 |
//! |------------------|-----------------------------|---------------------------------------|
//! | Survey           | `generate_survey`           | heatmap and sentiment land here too   |
//! | Survey, segments | `generate_segment_survey`   | schema built from the segment list    |
//! | FocusGroup       | `generate_focus_group`      |                                       |
//! | LegacyComparison | `generate_survey` + fan-out | one survey perturbed per segment      |
//!
//! [`ResearchExecutor::execute`] never fails. Timeout, backend error, or
//! an unusable payload all end in the [`FallbackSynthesizer`].

use std::sync::Arc;

use chrono::Utc;
use rand::Rng;
use research_llm::{LlmClient, ToolDefinition};
use serde_json::Value;
use uuid::Uuid;

use crate::artifact::{
    Artifact, Audience, CanonicalOption, QualitativeTheme, QuestionResult, Quote, Sentiment,
};
use crate::config::ResearchConfig;
use crate::deadline::TurnDeadline;
use crate::error::{PipelineError, Result, Stage};
use crate::fallback::FallbackSynthesizer;
use crate::methodology::{ExecutionPath, Methodology, MethodologyType};
use crate::normalizer::{normalize_comparison_options, normalize_options};
use crate::payload::{coerce_array, coerce_options, count_field, parse_embedded_json, str_field};
use crate::plan_builder::{StudyPlan, StudyPlanBuilder};
use crate::schemas;
use crate::selection::ResearchParameters;

const GENERATION_SYSTEM_PROMPT: &str = include_str!("prompts/generation_system.md");

/// Everything the executor needs for one turn
#[derive(Debug, Clone)]
pub struct ExecutionRequest {
    pub methodology: Methodology,
    pub parameters: ResearchParameters,
    /// Original query text, quick-start tags removed
    pub query: String,
    /// Prior id for an update follow-up, otherwise fresh
    pub artifact_id: Uuid,
    pub study_plan: StudyPlan,
}

impl ExecutionRequest {
    pub fn new(
        methodology: Methodology,
        parameters: ResearchParameters,
        query: impl Into<String>,
        artifact_id: Uuid,
    ) -> Self {
        let study_plan = StudyPlanBuilder::build(methodology, &parameters);
        Self {
            methodology,
            parameters,
            query: query.into(),
            artifact_id,
            study_plan,
        }
    }
}

/// Which path produced an artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactSource {
    Generated,
    Fallback,
}

#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    pub artifact: Artifact,
    pub source: ArtifactSource,
}

impl ExecutionOutcome {
    pub fn fell_back(&self) -> bool {
        self.source == ArtifactSource::Fallback
    }
}

pub struct ResearchExecutor {
    client: Arc<dyn LlmClient>,
    config: ResearchConfig,
    fallback: FallbackSynthesizer,
}

impl ResearchExecutor {
    pub fn new(client: Arc<dyn LlmClient>, config: ResearchConfig) -> Self {
        let fallback = FallbackSynthesizer::new(config.clone());
        Self {
            client,
            config,
            fallback,
        }
    }

    /// Generate an artifact, falling back to offline synthesis on any failure
    pub async fn execute(&self, request: &ExecutionRequest, deadline: &TurnDeadline) -> ExecutionOutcome {
        match self.generate(request, deadline).await {
            Ok(artifact) => {
                tracing::info!(
                    methodology = %request.methodology,
                    questions = artifact.questions.len(),
                    themes = artifact.themes.len(),
                    "Generated artifact"
                );
                ExecutionOutcome {
                    artifact,
                    source: ArtifactSource::Generated,
                }
            }
            Err(e) => {
                tracing::warn!(
                    methodology = %request.methodology,
                    error = %e,
                    timed_out = e.is_timeout(),
                    "Generation failed, using fallback synthesizer"
                );
                self.synthesize_offline(request)
            }
        }
    }

    /// Offline artifact without touching the backend
    pub fn synthesize_offline(&self, request: &ExecutionRequest) -> ExecutionOutcome {
        ExecutionOutcome {
            artifact: self.fallback.synthesize(request),
            source: ArtifactSource::Fallback,
        }
    }

    async fn generate(&self, request: &ExecutionRequest, deadline: &TurnDeadline) -> Result<Artifact> {
        let artifact = match request.methodology.execution_path() {
            ExecutionPath::Survey => match request.parameters.comparison_segments() {
                Some(segments) => self.segment_survey(request, segments, deadline).await?,
                None => self.survey(request, deadline).await?,
            },
            ExecutionPath::FocusGroup => self.focus_group(request, deadline).await?,
            ExecutionPath::LegacyComparison => self.legacy_comparison(request, deadline).await?,
        };

        artifact
            .validate()
            .map_err(|v| PipelineError::Malformed(v.to_string()))?;
        Ok(artifact)
    }

    async fn survey(&self, request: &ExecutionRequest, deadline: &TurnDeadline) -> Result<Artifact> {
        let tool = schemas::survey_tool();
        let payload = self.call_tool(&tool, &survey_prompt(request, None), deadline).await?;
        self.survey_artifact(request, &payload, None)
    }

    async fn segment_survey(
        &self,
        request: &ExecutionRequest,
        segments: &[String],
        deadline: &TurnDeadline,
    ) -> Result<Artifact> {
        let tool = schemas::segment_survey_tool(segments);
        let payload = self
            .call_tool(&tool, &survey_prompt(request, Some(segments)), deadline)
            .await?;
        self.survey_artifact(request, &payload, Some(segments))
    }

    async fn focus_group(&self, request: &ExecutionRequest, deadline: &TurnDeadline) -> Result<Artifact> {
        let tool = schemas::focus_group_tool();
        let payload = self
            .call_tool(&tool, &focus_group_prompt(request), deadline)
            .await?;
        self.focus_group_artifact(request, &payload)
    }

    /// One single-audience survey, then a perturbed copy per segment
    async fn legacy_comparison(&self, request: &ExecutionRequest, deadline: &TurnDeadline) -> Result<Artifact> {
        let segments = match request.parameters.comparison_segments() {
            Some(segments) => segments.to_vec(),
            None => vec![self.audience_name(&request.parameters)],
        };

        let base = self.survey(request, deadline).await?;
        let mut rng = rand::thread_rng();
        Ok(fan_out_artifact(
            base,
            &segments,
            self.config.comparison_spread,
            &mut rng,
        ))
    }

    async fn call_tool(&self, tool: &ToolDefinition, user_prompt: &str, deadline: &TurnDeadline) -> Result<Value> {
        tracing::debug!(
            tool = %tool.name,
            provider = self.client.provider_name(),
            model = self.client.model_name(),
            remaining_ms = deadline.remaining().as_millis() as u64,
            "Requesting generation"
        );

        let result = deadline
            .race(
                Stage::Generation,
                self.client
                    .chat_with_tool(GENERATION_SYSTEM_PROMPT, user_prompt, tool),
            )
            .await?;

        if result.tool_name != tool.name {
            tracing::warn!(expected = %tool.name, got = %result.tool_name, "Backend answered with a different tool");
        }

        let payload = match result.arguments {
            // Whole payload encoded as a string
            Value::String(text) => parse_embedded_json(&text)
                .map_err(|e| PipelineError::Malformed(format!("tool arguments: {}", e)))?,
            other => other,
        };
        if !payload.is_object() {
            return Err(PipelineError::Malformed(format!(
                "{} returned a non-object payload",
                tool.name
            )));
        }

        report_schema_violations(tool, &payload);
        Ok(payload)
    }

    fn survey_artifact(
        &self,
        request: &ExecutionRequest,
        payload: &Value,
        segments: Option<&[String]>,
    ) -> Result<Artifact> {
        let per_segment = count_field(payload, "sampleSize")
            .or(request.parameters.sample_size)
            .unwrap_or(self.config.default_sample_size);
        let segment_count = segments.map_or(1, |s| s.len()) as u32;
        let respondent_count = per_segment.saturating_mul(segment_count);

        let raw_questions = coerce_array(payload.get("questions").unwrap_or(&Value::Null));
        let questions: Vec<QuestionResult> = raw_questions
            .iter()
            .enumerate()
            .filter_map(|(i, raw)| extract_question(i, raw, segments, respondent_count))
            .collect();

        if questions.is_empty() {
            return Err(PipelineError::Malformed("no usable questions".to_string()));
        }
        if questions.len() != raw_questions.len() {
            tracing::warn!(
                kept = questions.len(),
                received = raw_questions.len(),
                "Dropped questions without usable options"
            );
        }

        Ok(Artifact {
            id: request.artifact_id,
            title: str_field(payload, "title").unwrap_or_else(|| request.study_plan.title.clone()),
            methodology_type: MethodologyType::Quantitative,
            audience: Audience::named(&self.audience_name(&request.parameters)),
            respondent_count,
            summary: str_field(payload, "abstract").unwrap_or_default(),
            questions,
            themes: Vec::new(),
            study_plan: request.study_plan.clone(),
            created_at: Utc::now(),
        })
    }

    fn focus_group_artifact(&self, request: &ExecutionRequest, payload: &Value) -> Result<Artifact> {
        let themes: Vec<QualitativeTheme> = coerce_array(payload.get("themes").unwrap_or(&Value::Null))
            .iter()
            .enumerate()
            .filter_map(|(i, raw)| extract_theme(i, raw))
            .collect();

        if themes.is_empty() {
            return Err(PipelineError::Malformed("no usable themes".to_string()));
        }

        Ok(Artifact {
            id: request.artifact_id,
            title: str_field(payload, "title").unwrap_or_else(|| request.study_plan.title.clone()),
            methodology_type: MethodologyType::Qualitative,
            audience: Audience::named(&self.audience_name(&request.parameters)),
            respondent_count: count_field(payload, "participantCount")
                .unwrap_or(self.config.default_participant_count),
            summary: str_field(payload, "abstract").unwrap_or_default(),
            questions: Vec::new(),
            themes,
            study_plan: request.study_plan.clone(),
            created_at: Utc::now(),
        })
    }

    fn audience_name(&self, parameters: &ResearchParameters) -> String {
        let audience = parameters.audience.trim();
        if audience.is_empty() {
            self.config.default_audience.clone()
        } else {
            audience.to_string()
        }
    }
}

fn extract_question(
    index: usize,
    raw: &Value,
    segments: Option<&[String]>,
    respondent_count: u32,
) -> Option<QuestionResult> {
    let options_raw = coerce_options(raw.get("options").unwrap_or(&Value::Null));
    let options = match segments {
        Some(segments) => normalize_comparison_options(&options_raw, segments),
        None => normalize_options(&options_raw),
    };
    if options.is_empty() {
        return None;
    }

    let question_text = str_field(raw, "questionText")
        .or_else(|| str_field(raw, "question"))
        .or_else(|| str_field(raw, "text"));
    let title = str_field(raw, "title")
        .or_else(|| question_text.clone())
        .unwrap_or_else(|| format!("Question {}", index + 1));

    Some(QuestionResult {
        id: format!("q{}", index + 1),
        question_text: question_text.unwrap_or_else(|| title.clone()),
        title,
        respondent_count,
        options,
        segments: segments.map(<[String]>::to_vec).unwrap_or_default(),
    })
}

fn extract_theme(index: usize, raw: &Value) -> Option<QualitativeTheme> {
    let topic = str_field(raw, "topic").or_else(|| str_field(raw, "title"))?;
    let quotes = coerce_array(raw.get("quotes").unwrap_or(&Value::Null))
        .iter()
        .filter_map(|q| match q {
            Value::String(text) if !text.trim().is_empty() => Some(Quote {
                text: text.trim().to_string(),
                attribution: "Participant".to_string(),
            }),
            Value::Object(_) => Some(Quote {
                text: str_field(q, "text").or_else(|| str_field(q, "quote"))?,
                attribution: str_field(q, "attribution").unwrap_or_else(|| "Participant".to_string()),
            }),
            _ => None,
        })
        .collect();

    Some(QualitativeTheme {
        id: format!("t{}", index + 1),
        topic,
        sentiment: str_field(raw, "sentiment")
            .map(|s| Sentiment::parse_lenient(&s))
            .unwrap_or(Sentiment::Neutral),
        summary: str_field(raw, "summary").unwrap_or_default(),
        quotes,
    })
}

/// Spread a single-audience artifact across segment columns
fn fan_out_artifact(mut artifact: Artifact, segments: &[String], spread: f64, rng: &mut impl Rng) -> Artifact {
    for question in &mut artifact.questions {
        question.options = fan_out_options(&question.options, segments, spread, rng);
        question.segments = segments.to_vec();
        question.respondent_count = question
            .respondent_count
            .saturating_mul(segments.len().max(1) as u32);
    }
    artifact.respondent_count = artifact
        .respondent_count
        .saturating_mul(segments.len().max(1) as u32);
    artifact
}

/// Copy each option's base value to every segment, perturbing all but the first
///
/// Perturbation is uniform in `[-spread, +spread]` points; results are
/// clamped to `[0, 100]` and rounded to one decimal.
pub fn fan_out_options(
    base: &[CanonicalOption],
    segments: &[String],
    spread: f64,
    rng: &mut impl Rng,
) -> Vec<CanonicalOption> {
    let spread = if spread.is_finite() { spread.abs() } else { 0.0 };
    base.iter()
        .map(|option| {
            let value = option.value();
            let values = segments
                .iter()
                .enumerate()
                .map(|(i, segment)| {
                    let shifted = if i == 0 {
                        value
                    } else {
                        value + rng.gen_range(-spread..=spread)
                    };
                    (segment.clone(), round1(shifted.clamp(0.0, 100.0)))
                })
                .collect();
            CanonicalOption {
                label: option.label.clone(),
                values,
            }
        })
        .collect()
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Log schema violations; extraction continues regardless
fn report_schema_violations(tool: &ToolDefinition, payload: &Value) {
    match jsonschema::validator_for(&tool.parameters) {
        Ok(validator) => {
            let errors: Vec<String> = validator
                .iter_errors(payload)
                .map(|e| format!("{}: {}", e.instance_path, e))
                .collect();
            if let Some(first) = errors.first() {
                tracing::warn!(
                    tool = %tool.name,
                    violations = errors.len(),
                    first = %first,
                    "Tool payload does not match schema"
                );
            }
        }
        Err(e) => tracing::warn!(tool = %tool.name, error = %e, "Invalid tool schema"),
    }
}

fn survey_prompt(request: &ExecutionRequest, segments: Option<&[String]>) -> String {
    let params = &request.parameters;
    let mut prompt = format!(
        "Audience: {}\nResearch question: {}\nOriginal request: {}\n",
        params.audience,
        params.research_question,
        request.query.trim()
    );
    if let Some(n) = params.sample_size {
        prompt.push_str(&format!("Sample size per segment: {}\n", n));
    }
    match segments {
        Some(segments) => prompt.push_str(&format!(
            "\nWrite {} closed-ended questions. For every option give the percentage of each segment choosing it, using these exact keys: {}.\n",
            schemas::SURVEY_QUESTION_COUNT,
            segments.join(", ")
        )),
        None => prompt.push_str(&format!(
            "\nWrite {} closed-ended questions with 3-6 options each and the percentage choosing each option.\n",
            schemas::SURVEY_QUESTION_COUNT
        )),
    }
    if request.methodology != Methodology::Survey && request.methodology != Methodology::Comparison {
        prompt.push_str(&format!(
            "Frame the questions to support a {} view.\n",
            request.methodology.name().to_lowercase()
        ));
    }
    prompt
}

fn focus_group_prompt(request: &ExecutionRequest) -> String {
    format!(
        "Audience: {}\nResearch question: {}\nOriginal request: {}\n\nSummarize a moderated focus group as 3-4 themes, each with 2-3 participant quotes.\n",
        request.parameters.audience,
        request.parameters.research_question,
        request.query.trim()
    )
}
