//! Workflow engine: runs the assessment graph one barrier group at a time.
//!
//! Members of a group run concurrently in a `JoinSet`. Their deltas are merged
//! on the engine task as they complete. The first failure aborts the rest of
//! the group and ends the run with `WorkflowError { stage, cause }`.

use std::any::Any;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::{Id, JoinSet};
use tracing::{debug, error, info, warn};

use crate::agents::{
    AgentContext, CultureFitAssessor, CvParser, ExperienceEvaluator, FinalScorer, JobAnalyzer, ScoringInput,
    SkillsMatcher,
};
use crate::documents::load_document;
use crate::errors::{ConfigError, StageError, WorkflowError};
use crate::llm_client::ModelProvider;
use crate::models::{AssessmentResult, CandidateProfile, JobRequirements};
use crate::scoring::ScoringWeights;

pub mod graph;
pub mod state;

pub use graph::{AssessmentGraph, GraphError, Slot, Stage};
pub use state::{StateDelta, Status, WorkflowState};

pub const DEFAULT_STAGE_TIMEOUT: Duration = Duration::from_secs(300);

/// Everything the workflow needs besides the model provider.
#[derive(Debug, Clone, Copy)]
pub struct WorkflowConfig {
    pub weights: ScoringWeights,
    /// Upper bound on a single model call, retries included.
    pub stage_timeout: Duration,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            stage_timeout: DEFAULT_STAGE_TIMEOUT,
        }
    }
}

/// What a stage task needs, snapshotted from the state before it is spawned.
enum StageInput {
    Documents { cv_path: PathBuf, job_path: PathBuf },
    CvText(Arc<str>),
    JobText(Arc<str>),
    Comparison {
        profile: Arc<CandidateProfile>,
        job: Arc<JobRequirements>,
    },
    Scoring(ScoringInput),
}

struct Agents {
    cv_parser: CvParser,
    job_analyzer: JobAnalyzer,
    skills_matcher: SkillsMatcher,
    experience_evaluator: ExperienceEvaluator,
    culture_fit: CultureFitAssessor,
    final_scorer: FinalScorer,
}

impl Agents {
    async fn execute(&self, stage: Stage, input: StageInput) -> Result<StateDelta, StageError> {
        match (stage, input) {
            (Stage::Loading, StageInput::Documents { cv_path, job_path }) => {
                let (cv_text, job_text) = tokio::try_join!(load_document(&cv_path), load_document(&job_path))?;
                info!(
                    "Loaded documents: CV {} characters, job description {} characters",
                    cv_text.len(),
                    job_text.len()
                );
                Ok(StateDelta::Documents {
                    cv_text: cv_text.into(),
                    job_text: job_text.into(),
                })
            }
            (Stage::Parsing, StageInput::CvText(text)) => {
                Ok(StateDelta::CvData(Arc::new(self.cv_parser.parse(&text).await?)))
            }
            (Stage::Analyzing, StageInput::JobText(text)) => Ok(StateDelta::JobDescription(Arc::new(
                self.job_analyzer.analyze(&text).await?,
            ))),
            (Stage::Matching, StageInput::Comparison { profile, job }) => Ok(StateDelta::SkillMatch(Arc::new(
                self.skills_matcher.match_skills(&profile, &job).await?,
            ))),
            (Stage::Evaluating, StageInput::Comparison { profile, job }) => Ok(StateDelta::ExperienceEvaluation(
                Arc::new(self.experience_evaluator.evaluate(&profile, &job).await?),
            )),
            (Stage::Assessing, StageInput::Comparison { profile, job }) => Ok(StateDelta::CultureFit(Arc::new(
                self.culture_fit.assess(&profile, &job).await?,
            ))),
            (Stage::Scoring, StageInput::Scoring(input)) => {
                Ok(StateDelta::Assessment(Box::new(self.final_scorer.score(input).await?)))
            }
            (stage, _) => Err(StageError::MissingInput(stage.agent_name())),
        }
    }
}

/// Snapshots the slots `stage` reads. The graph guarantees they are filled.
fn gather_input(stage: Stage, state: &WorkflowState) -> Result<StageInput, StageError> {
    Ok(match stage {
        Stage::Loading => StageInput::Documents {
            cv_path: state.cv_file_path.clone(),
            job_path: state.job_description_path.clone(),
        },
        Stage::Parsing => StageInput::CvText(state.cv_text()?),
        Stage::Analyzing => StageInput::JobText(state.job_text()?),
        Stage::Matching | Stage::Evaluating | Stage::Assessing => StageInput::Comparison {
            profile: state.cv_data()?,
            job: state.job_description()?,
        },
        Stage::Scoring => StageInput::Scoring(ScoringInput {
            cv_data: state.cv_data()?,
            job_description: state.job_description()?,
            skill_match: state.skill_match()?,
            experience_evaluation: state.experience_evaluation()?,
            culture_fit: state.culture_fit()?,
        }),
    })
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Runs CV assessments. Cheap to share; each `run` gets its own state.
pub struct AssessmentWorkflow {
    agents: Arc<Agents>,
    graph: AssessmentGraph,
    config: WorkflowConfig,
}

impl AssessmentWorkflow {
    /// Validates the weights and the stage graph, then wires the agents to `provider`.
    pub fn new(provider: Arc<dyn ModelProvider>, config: WorkflowConfig) -> Result<Self, ConfigError> {
        config.weights.validate()?;
        let graph = AssessmentGraph::standard()?;
        let ctx = AgentContext::new(provider, config.stage_timeout);

        let agents = Agents {
            cv_parser: CvParser::new(ctx.clone()),
            job_analyzer: JobAnalyzer::new(ctx.clone()),
            skills_matcher: SkillsMatcher::new(ctx.clone()),
            experience_evaluator: ExperienceEvaluator::new(ctx.clone()),
            culture_fit: CultureFitAssessor::new(ctx.clone()),
            final_scorer: FinalScorer::new(ctx, config.weights),
        };

        Ok(Self {
            agents: Arc::new(agents),
            graph,
            config,
        })
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Assesses the CV at `cv_file_path` against the job description at `job_description_path`.
    pub async fn run(
        &self,
        cv_file_path: impl Into<PathBuf>,
        job_description_path: impl Into<PathBuf>,
    ) -> Result<AssessmentResult, WorkflowError> {
        let mut state = WorkflowState::new(cv_file_path.into(), job_description_path.into());
        self.run_state(&mut state).await
    }

    /// Like `run`, but drives a caller-owned state so its status history can be inspected.
    pub async fn run_state(&self, state: &mut WorkflowState) -> Result<AssessmentResult, WorkflowError> {
        let started = Instant::now();
        info!(
            "Starting assessment: cv={} job={}",
            state.cv_file_path.display(),
            state.job_description_path.display()
        );

        for group in self.graph.barrier_groups() {
            if let Err(err) = self.run_group(group, state).await {
                error!("Workflow failed at {}: {}", err.stage, err.cause);
                if let Err(e) = state.transition(Status::Failed(err.stage)) {
                    warn!("Could not record failure status: {e}");
                }
                return Err(err);
            }
        }

        state
            .transition(Status::Done)
            .map_err(|cause| WorkflowError::new(Stage::Scoring, cause))?;
        let result = state
            .take_result()
            .ok_or_else(|| WorkflowError::new(Stage::Scoring, StageError::MissingInput(Slot::AssessmentResult.as_str())))?;

        info!(
            "Assessment complete in {:.1}s: {} ({:.3})",
            started.elapsed().as_secs_f64(),
            result.recommendation,
            result.overall_score
        );
        debug!(
            "Status history: {}",
            state.history().iter().map(|s| s.to_string()).collect::<Vec<_>>().join(" -> ")
        );
        Ok(result)
    }

    async fn run_group(&self, group: &[Stage], state: &mut WorkflowState) -> Result<(), WorkflowError> {
        let first = group.first().copied().unwrap_or(Stage::Loading);
        state
            .transition(Status::Running(group.to_vec()))
            .map_err(|cause| WorkflowError::new(first, cause))?;

        let mut tasks = JoinSet::new();
        let mut stage_of: HashMap<Id, Stage> = HashMap::new();

        for &stage in group {
            let input = gather_input(stage, state).map_err(|cause| WorkflowError::new(stage, cause))?;
            let agents = Arc::clone(&self.agents);
            info!("{stage} started");
            let handle = tasks.spawn(async move {
                let started = Instant::now();
                let result = agents.execute(stage, input).await;
                if result.is_ok() {
                    info!("{stage} completed in {}ms", started.elapsed().as_millis());
                }
                result
            });
            stage_of.insert(handle.id(), stage);
        }

        while let Some(joined) = tasks.join_next_with_id().await {
            let outcome = match joined {
                Ok((id, result)) => (id, result),
                Err(join_error) => {
                    let id = join_error.id();
                    let cause = if join_error.is_panic() {
                        StageError::Panicked(panic_message(join_error.into_panic()))
                    } else {
                        StageError::Panicked("task was cancelled".to_string())
                    };
                    (id, Err(cause))
                }
            };
            let (id, result) = outcome;
            let stage = stage_of.get(&id).copied().unwrap_or(first);

            let declared = self.graph.node(stage).map(|n| n.writes).unwrap_or_default();
            let merged = result.and_then(|delta| {
                if let Some(slot) = delta.slots().iter().copied().find(|s| !declared.contains(s)) {
                    return Err(StageError::UndeclaredWrite(slot.as_str()));
                }
                state.merge(delta)
            });

            match merged {
                Ok(()) => {}
                Err(cause) => {
                    // Siblings still in flight are cancelled; nothing they produce is merged.
                    tasks.abort_all();
                    return Err(WorkflowError::new(stage, cause));
                }
            }
        }
        Ok(())
    }
}
