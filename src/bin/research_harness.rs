//! Research Harness CLI
//!
//! Runs one research turn against the configured backend and prints the
//! result as JSON.
//!
//! Usage:
//!   cargo run --features cli --bin research_harness -- "coffee"
//!
//! Examples:
//!   # Quick-start focus group, no backend call or API key needed
//!   cargo run --features cli --bin research_harness -- "#focus-group meal kits"
//!
//!   # Offline synthesizer only
//!   cargo run --features cli --bin research_harness -- --offline "coffee"
//!
//!   # Follow up on a saved artifact, showing clarification requests
//!   cargo run --features cli --bin research_harness -- \
//!     --prior last.json --turn "same but only parents"
//!
//!   # Tighter deadline, print the study plan only
//!   cargo run --features cli --bin research_harness -- \
//!     --deadline-secs 3 --show plan "gen z vs boomers on streaming"

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use synthetic_research::classifier::detect_quick_tag;
use synthetic_research::process_steps::process_steps_for_key;
use synthetic_research::telemetry::init_tracing;
use synthetic_research::{Artifact, LlmClient, ResearchConfig, ResearchPipeline, TurnOutcome, UnconfiguredClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Show {
    Artifact,
    Plan,
    Steps,
}

/// Run one synthetic research turn
#[derive(Parser, Debug)]
#[command(name = "research_harness")]
#[command(about = "Run one research turn and print the artifact as JSON")]
struct Args {
    /// Research question
    query: String,

    /// Prior artifact JSON file for a follow-up
    #[arg(long, short = 'p')]
    prior: Option<PathBuf>,

    /// Per-turn deadline override in seconds
    #[arg(long, env = "RESEARCH_DEADLINE_SECS")]
    deadline_secs: Option<f64>,

    /// What to print
    #[arg(long, short = 's', value_enum, default_value = "artifact")]
    show: Show,

    /// Surface clarification requests instead of running a default survey
    #[arg(long)]
    turn: bool,

    /// Skip the backend and use the offline synthesizer
    #[arg(long)]
    offline: bool,
}

/// Quick-start tags never reach the backend, so a missing key is not fatal for them
fn llm_client(args: &Args) -> Result<Arc<dyn LlmClient>> {
    if args.offline {
        return Ok(Arc::new(UnconfiguredClient::new("--offline")));
    }
    match research_llm::create_llm_client() {
        Ok(client) => Ok(client),
        Err(e) if detect_quick_tag(&args.query).is_some() => {
            tracing::info!(error = %e, "No LLM provider configured, quick-start runs offline");
            Ok(Arc::new(UnconfiguredClient::new(e.to_string())))
        }
        Err(e) => Err(e.context("creating LLM client")),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args = Args::parse();

    let mut config = ResearchConfig::from_env();
    if let Some(secs) = args.deadline_secs.filter(|s| s.is_finite() && *s > 0.0) {
        config = config.with_deadline(Duration::from_secs_f64(secs));
    }

    let pipeline = ResearchPipeline::new(llm_client(&args)?, config);

    let prior: Option<Artifact> = match &args.prior {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            Some(serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?)
        }
        None => None,
    };

    let artifact = if args.turn {
        match pipeline.run_turn(&args.query, prior.as_ref()).await {
            TurnOutcome::Clarification(request) => {
                println!("{}", serde_json::to_string_pretty(&request)?);
                return Ok(());
            }
            TurnOutcome::Completed(turn) => {
                if turn.fell_back {
                    eprintln!("note: backend unavailable, showing offline result");
                }
                turn.artifact
            }
        }
    } else {
        pipeline.run_research(&args.query, prior.as_ref()).await
    };

    let output = match args.show {
        Show::Artifact => serde_json::to_string_pretty(&artifact)?,
        Show::Plan => serde_json::to_string_pretty(&artifact.study_plan)?,
        Show::Steps => serde_json::to_string_pretty(process_steps_for_key(
            &artifact.study_plan.methodology_id,
        ))?,
    };
    println!("{}", output);
    Ok(())
}
