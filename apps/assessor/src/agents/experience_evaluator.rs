//! Experience Evaluator: judges how relevant the candidate's work history is to the role.

use tracing::info;

use super::prompts::{EXPERIENCE_EVALUATOR_PROMPT_TEMPLATE, EXPERIENCE_EVALUATOR_SYSTEM};
use super::{bullet_list, fill_template, AgentContext};
use crate::errors::StageError;
use crate::models::{CandidateProfile, ExperienceEvaluation, JobRequirements};
use crate::workflow::Stage;

const MAX_ACHIEVEMENTS_PER_ROLE: usize = 3;
const MAX_RESPONSIBILITIES: usize = 5;

pub struct ExperienceEvaluator {
    ctx: AgentContext,
}

impl ExperienceEvaluator {
    pub fn new(ctx: AgentContext) -> Self {
        Self { ctx }
    }

    pub async fn evaluate(
        &self,
        profile: &CandidateProfile,
        job: &JobRequirements,
    ) -> Result<ExperienceEvaluation, StageError> {
        let listed_years = listed_years(profile);
        info!(
            "Evaluating experience: {} roles, {:.1} listed years",
            profile.experience.len(),
            listed_years
        );

        let job_context = format_job_context(job);
        let years = format!("{listed_years:.1}");
        let experience = format_experience(profile);
        let prompt = fill_template(
            EXPERIENCE_EVALUATOR_PROMPT_TEMPLATE,
            &[
                ("job_title", job.title.as_str()),
                ("job_context", job_context.as_str()),
                ("listed_years", years.as_str()),
                ("candidate_experience", experience.as_str()),
            ],
        );

        let evaluation: ExperienceEvaluation = self
            .ctx
            .invoke_structured(Stage::Evaluating, EXPERIENCE_EVALUATOR_SYSTEM, &prompt)
            .await?;

        info!(
            "Experience evaluation: {}, {:.1} relevant years, score {:.2}",
            evaluation.level, evaluation.relevant_years, evaluation.score
        );
        Ok(evaluation)
    }
}

/// Sum of listed role durations in years.
pub fn listed_years(profile: &CandidateProfile) -> f64 {
    profile.listed_months() as f64 / 12.0
}

fn format_job_context(job: &JobRequirements) -> String {
    let mut sections = Vec::new();
    if !job.responsibilities.is_empty() {
        sections.push(format!(
            "RESPONSIBILITIES:\n{}",
            bullet_list(job.responsibilities.iter().take(MAX_RESPONSIBILITIES), "")
        ));
    }
    if !job.must_have.is_empty() {
        sections.push(format!("REQUIRED EXPERIENCE:\n{}", bullet_list(&job.must_have, "")));
    }
    if !job.nice_to_have.is_empty() {
        sections.push(format!("PREFERRED EXPERIENCE:\n{}", bullet_list(&job.nice_to_have, "")));
    }
    if sections.is_empty() {
        "No job context available".to_string()
    } else {
        sections.join("\n\n")
    }
}

fn format_experience(profile: &CandidateProfile) -> String {
    if profile.experience.is_empty() {
        return "No work experience listed".to_string();
    }
    profile
        .experience
        .iter()
        .map(|exp| {
            let mut block = exp.describe();
            if !exp.achievements.is_empty() {
                block.push('\n');
                block.push_str(&bullet_list(
                    exp.achievements.iter().take(MAX_ACHIEVEMENTS_PER_ROLE),
                    "",
                ));
            }
            block
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::models::ExperienceLevel;
    use crate::test_support::{ScriptedProvider, CV_REPLY, EXPERIENCE_REPLY};

    #[test]
    fn test_listed_years_from_durations() {
        let profile: CandidateProfile = serde_json::from_str(CV_REPLY).unwrap();
        assert_eq!(listed_years(&profile), 6.0);
    }

    #[test]
    fn test_job_context_without_details() {
        let job: JobRequirements = serde_json::from_str(r#"{"title": "Engineer"}"#).unwrap();
        assert_eq!(format_job_context(&job), "No job context available");
    }

    #[test]
    fn test_experience_lists_achievements_under_role() {
        let profile: CandidateProfile = serde_json::from_str(CV_REPLY).unwrap();
        let text = format_experience(&profile);
        assert!(text.starts_with("Senior Engineer at Analytical Engines"));
        assert!(text.contains("  - Led a team of 5"));
    }

    #[tokio::test]
    async fn test_evaluate_parses_level() {
        let profile: CandidateProfile = serde_json::from_str(CV_REPLY).unwrap();
        let job: JobRequirements = serde_json::from_str(r#"{"title": "Engineer"}"#).unwrap();
        let provider = ScriptedProvider::new().reply("experience_evaluator", EXPERIENCE_REPLY);
        let evaluator = ExperienceEvaluator::new(AgentContext::new(Arc::new(provider), Duration::from_secs(5)));

        let evaluation = evaluator.evaluate(&profile, &job).await.unwrap();
        assert_eq!(evaluation.level, ExperienceLevel::Senior);
        assert_eq!(evaluation.score, 0.75);
    }
}
