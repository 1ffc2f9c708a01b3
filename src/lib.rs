//! Synthetic Research - research orchestration pipeline
//!
//! Turns a free-text research question into a synthetic research artifact
//! (survey, focus group, or segment comparison) using a text-generation
//! backend, and still returns a valid artifact when that backend fails.
//!
//! ## Flow
//!
//! ```text
//! query -> Classifier -> Plan Builder -> Executor (deadline) -> Normalizer  -> Artifact
//!                                                           \-> Fallback    -/
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use synthetic_research::ResearchPipeline;
//!
//! # async fn demo() -> synthetic_research::Result<()> {
//! let pipeline = ResearchPipeline::from_env()?;
//! let artifact = pipeline.run_research("coffee", None).await;
//! println!("{}", artifact.title);
//! # Ok(())
//! # }
//! ```

// Core error handling
pub mod error;

pub mod config;
pub mod telemetry;

// Canonical data model
pub mod artifact;
pub mod methodology;
pub mod selection;

// Pure components
pub mod normalizer;
pub mod payload;
pub mod plan_builder;
pub mod process_steps;
pub mod schemas;

// Backend-facing components
pub mod classifier;
pub mod deadline;
pub mod executor;
pub mod fallback;

// Orchestration
pub mod pipeline;
pub mod turn;

pub use artifact::{Artifact, ArtifactViolation, Audience, CanonicalOption, QualitativeTheme, QuestionResult};
pub use config::ResearchConfig;
pub use error::{PipelineError, Result};
pub use methodology::{Methodology, MethodologyType};
pub use pipeline::{ResearchPipeline, ResearchTurn, TurnOutcome};
pub use plan_builder::{StudyPlan, StudyPlanBuilder};
pub use selection::{ClarificationRequest, MethodologySelection, ResearchParameters, ResearchQuery};

// Re-export the backend abstraction so callers need only one dependency
pub use research_llm::{LlmClient, ToolCallResult, ToolDefinition, UnconfiguredClient};
