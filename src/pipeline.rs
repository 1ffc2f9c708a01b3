//! Research Orchestration Pipeline
//!
//! One turn: classify, plan, execute under a shared deadline, normalize or
//! fall back. [`ResearchPipeline::run_research`] always returns a valid
//! [`Artifact`]; [`ResearchPipeline::run_turn`] additionally surfaces
//! clarification requests to callers that can show them.

use std::sync::Arc;

use research_llm::LlmClient;
use uuid::Uuid;

use crate::artifact::Artifact;
use crate::classifier::{detect_quick_tag, MethodologyClassifier};
use crate::config::ResearchConfig;
use crate::deadline::TurnDeadline;
use crate::error::{PipelineError, Result};
use crate::executor::{ExecutionRequest, ResearchExecutor};
use crate::methodology::Methodology;
use crate::process_steps::process_steps;
use crate::selection::{
    ClarificationRequest, FollowUpAction, MethodologySelection, ResearchParameters, ResearchQuery,
};
use crate::turn::{TurnPhase, TurnTracker};

/// A completed turn with everything the presentation layer renders
#[derive(Debug, Clone)]
pub struct ResearchTurn {
    pub artifact: Artifact,
    /// The selection that was executed
    pub selection: MethodologySelection,
    pub process_steps: &'static [&'static str],
    pub fell_back: bool,
    pub phases: Vec<TurnPhase>,
}

#[derive(Debug, Clone)]
pub enum TurnOutcome {
    Clarification(ClarificationRequest),
    Completed(Box<ResearchTurn>),
}

impl TurnOutcome {
    pub fn artifact(&self) -> Option<&Artifact> {
        match self {
            TurnOutcome::Completed(turn) => Some(&turn.artifact),
            TurnOutcome::Clarification(_) => None,
        }
    }
}

pub struct ResearchPipeline {
    classifier: MethodologyClassifier,
    executor: ResearchExecutor,
    config: ResearchConfig,
}

impl ResearchPipeline {
    pub fn new(client: Arc<dyn LlmClient>, config: ResearchConfig) -> Self {
        Self {
            classifier: MethodologyClassifier::new(client.clone(), config.clone()),
            executor: ResearchExecutor::new(client, config.clone()),
            config,
        }
    }

    /// Pipeline with config and backend taken from the environment
    pub fn from_env() -> Result<Self> {
        let config = ResearchConfig::from_env();
        let client = research_llm::create_llm_client().map_err(|e| PipelineError::Config(e.to_string()))?;
        Ok(Self::new(client, config))
    }

    pub fn config(&self) -> &ResearchConfig {
        &self.config
    }

    /// Run one turn, acting on a default survey if clarification was requested
    pub async fn run_research(&self, query: &str, prior: Option<&Artifact>) -> Artifact {
        match self.turn(query, prior, true).await {
            TurnOutcome::Completed(turn) => turn.artifact,
            TurnOutcome::Clarification(_) => {
                // Unreachable when acting on clarifications; stay total anyway
                let request = ExecutionRequest::new(
                    Methodology::Survey,
                    ResearchParameters::new(self.config.default_audience.clone(), query.trim()),
                    query.trim(),
                    Uuid::new_v4(),
                );
                self.executor.synthesize_offline(&request).artifact
            }
        }
    }

    /// Run one turn, returning a clarification request if the backend chose one
    pub async fn run_turn(&self, query: &str, prior: Option<&Artifact>) -> TurnOutcome {
        self.turn(query, prior, false).await
    }

    async fn turn(&self, query: &str, prior: Option<&Artifact>, act_on_clarification: bool) -> TurnOutcome {
        let deadline = TurnDeadline::start(self.config.deadline);
        let mut tracker = TurnTracker::new();

        let (selection, query_text, offline) = match detect_quick_tag(query) {
            Some(quick) => {
                tracing::info!(methodology = %quick.methodology, "Quick-start tag, skipping backend");
                (self.classifier.quick_start(&quick), quick.query, true)
            }
            None => {
                tracker.advance(TurnPhase::Classifying);
                let selection = self
                    .classifier
                    .classify(ResearchQuery { text: query, prior }, &deadline)
                    .await;

                match selection {
                    MethodologySelection::Clarification(request) => {
                        tracker.advance(TurnPhase::Clarifying);
                        if !act_on_clarification {
                            tracker.advance(TurnPhase::Complete);
                            tracing::info!(missing = %request.missing_info, "Turn ended with clarification");
                            return TurnOutcome::Clarification(request);
                        }
                        tracing::info!(missing = %request.missing_info, "Clarification requested, running default survey instead");
                        (
                            MethodologySelection::default_survey(query, &self.config.default_audience),
                            query.trim().to_string(),
                            false,
                        )
                    }
                    selection => (selection, query.trim().to_string(), false),
                }
            }
        };

        let (methodology, parameters, follow_up) = match &selection {
            MethodologySelection::Methodology {
                methodology,
                parameters,
                follow_up,
            } => (*methodology, parameters.clone(), *follow_up),
            MethodologySelection::Clarification(request) => return TurnOutcome::Clarification(request.clone()),
        };

        tracker.advance(TurnPhase::Planning);
        let artifact_id = match (follow_up, prior) {
            (FollowUpAction::Update, Some(prior)) => prior.id,
            _ => Uuid::new_v4(),
        };
        let request = ExecutionRequest::new(methodology, parameters, query_text, artifact_id);
        tracing::info!(
            methodology = %methodology,
            title = %request.study_plan.title,
            follow_up = ?follow_up,
            "Study plan ready"
        );

        tracker.advance(TurnPhase::Executing);
        let outcome = if offline {
            self.executor.synthesize_offline(&request)
        } else {
            self.executor.execute(&request, &deadline).await
        };

        tracker.advance(if outcome.fell_back() {
            TurnPhase::FallingBack
        } else {
            TurnPhase::Normalizing
        });
        tracker.advance(TurnPhase::Complete);

        tracing::info!(
            path = ?tracker.path(),
            remaining_ms = deadline.remaining().as_millis() as u64,
            "Turn complete"
        );

        TurnOutcome::Completed(Box::new(ResearchTurn {
            artifact: outcome.artifact,
            selection,
            process_steps: process_steps(methodology),
            fell_back: tracker.fell_back(),
            phases: tracker.path().to_vec(),
        }))
    }
}
