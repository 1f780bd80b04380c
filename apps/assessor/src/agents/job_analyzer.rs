//! Job Analyzer: extracts structured requirements from a raw job description.

use tracing::info;

use super::prompts::{JOB_ANALYZER_PROMPT_TEMPLATE, JOB_ANALYZER_SYSTEM};
use super::{extraction_system, fill_template, AgentContext};
use crate::errors::StageError;
use crate::models::JobRequirements;
use crate::workflow::Stage;

pub struct JobAnalyzer {
    ctx: AgentContext,
}

impl JobAnalyzer {
    pub fn new(ctx: AgentContext) -> Self {
        Self { ctx }
    }

    pub async fn analyze(&self, job_text: &str) -> Result<JobRequirements, StageError> {
        info!("Analyzing job description ({} characters)", job_text.len());
        let prompt = fill_template(JOB_ANALYZER_PROMPT_TEMPLATE, &[("job_text", job_text)]);
        let job: JobRequirements = self
            .ctx
            .invoke_structured(Stage::Analyzing, &extraction_system(JOB_ANALYZER_SYSTEM), &prompt)
            .await?;
        info!(
            "Analyzed job '{}': {} required skills, {} preferred skills",
            job.title,
            job.required_skills.len(),
            job.preferred_skills.len()
        );
        Ok(job)
    }
}
