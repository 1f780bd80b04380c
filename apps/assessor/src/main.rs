mod agents;
mod config;
mod documents;
mod errors;
mod llm_client;
mod models;
mod report;
mod routes;
mod scoring;
mod state;
mod workflow;

#[cfg(test)]
mod test_support;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::errors::ConfigError;
use crate::llm_client::build_provider;
use crate::report::Report;
use crate::routes::build_router;
use crate::scoring::ScoringWeights;
use crate::state::AppState;
use crate::workflow::AssessmentWorkflow;

#[derive(Debug, Parser)]
#[command(name = "assessor", version, about = "Assess a CV against a job description with LLM agents")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run one assessment and write the JSON result.
    Assess {
        /// CV file (.txt, .md, .json, .pdf, .docx)
        #[arg(long)]
        cv: PathBuf,
        /// Job description file
        #[arg(long)]
        job: PathBuf,
        #[arg(long, default_value = "reports/assessment_result.json")]
        out: PathBuf,
        #[command(flatten)]
        weights: WeightArgs,
    },
    /// Start the HTTP API.
    Serve {
        #[arg(long)]
        port: Option<u16>,
        #[command(flatten)]
        weights: WeightArgs,
    },
}

/// Per-run overrides of the configured scoring weights.
#[derive(Debug, Clone, Copy, Default, Args)]
struct WeightArgs {
    #[arg(long)]
    skills_weight: Option<f64>,
    #[arg(long)]
    experience_weight: Option<f64>,
    #[arg(long)]
    culture_weight: Option<f64>,
}

impl WeightArgs {
    /// Layers the given flags over `base` and validates the combined weights.
    fn resolve(self, base: ScoringWeights) -> Result<ScoringWeights, ConfigError> {
        ScoringWeights::new(
            self.skills_weight.unwrap_or(base.skills_weight),
            self.experience_weight.unwrap_or(base.experience_weight),
            self.culture_weight.unwrap_or(base.culture_weight),
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::from_env().context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let weights = match &cli.command {
        Command::Assess { weights, .. } | Command::Serve { weights, .. } => *weights,
    };
    config.weights = weights.resolve(config.weights).context("Invalid scoring weights")?;

    let provider = build_provider(&config.provider).context("Failed to initialize LLM client")?;
    info!(
        "LLM client initialized (provider: {}, model: {})",
        config.provider.kind,
        provider.model()
    );

    let workflow = AssessmentWorkflow::new(provider, config.workflow_config())
        .context("Invalid workflow configuration")?;

    match cli.command {
        Command::Assess { cv, job, out, .. } => assess(&workflow, &cv, &job, &out).await,
        Command::Serve { port, .. } => {
            if let Some(port) = port {
                config.port = port;
            }
            serve(workflow, config).await
        }
    }
}

async fn assess(workflow: &AssessmentWorkflow, cv: &Path, job: &Path, out: &Path) -> Result<()> {
    let result = workflow.run(cv, job).await.context("Assessment failed")?;

    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(&result).context("Failed to serialize assessment")?;
    tokio::fs::write(out, json)
        .await
        .with_context(|| format!("Failed to write {}", out.display()))?;
    info!("Assessment written to {}", out.display());

    println!("{}", Report::new(&result, workflow.config().weights));
    println!("\nFull results saved to: {}", out.display());
    Ok(())
}

async fn serve(workflow: AssessmentWorkflow, config: Config) -> Result<()> {
    info!("Starting assessor API v{}", env!("CARGO_PKG_VERSION"));

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    let state = AppState {
        config,
        workflow: Arc::new(workflow),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    info!("Listening on {addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assess_arguments_parse() {
        let cli = Cli::try_parse_from([
            "assessor",
            "assess",
            "--cv",
            "cv.pdf",
            "--job",
            "job.txt",
            "--culture-weight",
            "0.3",
        ])
        .unwrap();
        match cli.command {
            Command::Assess { cv, out, weights, .. } => {
                assert_eq!(cv, PathBuf::from("cv.pdf"));
                assert_eq!(out, PathBuf::from("reports/assessment_result.json"));
                assert_eq!(weights.culture_weight, Some(0.3));
                assert_eq!(weights.skills_weight, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_assess_requires_both_documents() {
        assert!(Cli::try_parse_from(["assessor", "assess", "--cv", "cv.txt"]).is_err());
    }

    #[test]
    fn test_weight_overrides_only_touch_given_fields() {
        let weights = WeightArgs {
            skills_weight: Some(0.5),
            experience_weight: Some(0.3),
            culture_weight: None,
        }
        .resolve(ScoringWeights::default())
        .unwrap();
        assert_eq!(weights.skills_weight, 0.5);
        assert_eq!(weights.experience_weight, 0.3);
        assert_eq!(weights.culture_weight, 0.2);
    }

    #[test]
    fn test_overrides_can_repair_env_weights() {
        let env = ScoringWeights {
            skills_weight: 0.6,
            experience_weight: 0.4,
            culture_weight: 0.2,
        };
        assert!(env.validate().is_err());
        let weights = WeightArgs {
            skills_weight: Some(0.4),
            experience_weight: None,
            culture_weight: None,
        }
        .resolve(env)
        .unwrap();
        assert_eq!(weights, ScoringWeights::default());
    }

    #[test]
    fn test_invalid_combined_weights_are_rejected() {
        let err = WeightArgs {
            skills_weight: None,
            experience_weight: None,
            culture_weight: Some(0.5),
        }
        .resolve(ScoringWeights::default())
        .unwrap_err();
        assert!(matches!(err, ConfigError::WeightsDoNotSumToOne { .. }));
    }
}
