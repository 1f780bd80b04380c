//! CV Parser: extracts a structured candidate profile from raw CV text.

use tracing::info;

use super::prompts::{CV_PARSER_PROMPT_TEMPLATE, CV_PARSER_SYSTEM};
use super::{extraction_system, fill_template, AgentContext};
use crate::errors::StageError;
use crate::models::CandidateProfile;
use crate::workflow::Stage;

pub struct CvParser {
    ctx: AgentContext,
}

impl CvParser {
    pub fn new(ctx: AgentContext) -> Self {
        Self { ctx }
    }

    pub async fn parse(&self, cv_text: &str) -> Result<CandidateProfile, StageError> {
        info!("Parsing CV text ({} characters)", cv_text.len());
        let prompt = fill_template(CV_PARSER_PROMPT_TEMPLATE, &[("cv_text", cv_text)]);
        let profile: CandidateProfile = self
            .ctx
            .invoke_structured(Stage::Parsing, &extraction_system(CV_PARSER_SYSTEM), &prompt)
            .await?;
        info!(
            "Parsed CV for {}: {} skills, {} roles",
            profile.display_name(),
            profile.skills.len(),
            profile.experience.len()
        );
        Ok(profile)
    }
}
