//! Culture Fit: assesses soft skills and leadership against the role.

use tracing::info;

use super::prompts::{CULTURE_FIT_PROMPT_TEMPLATE, CULTURE_FIT_SYSTEM};
use super::{bullet_list, comma_list, fill_template, AgentContext};
use crate::errors::StageError;
use crate::models::{CandidateProfile, CultureFitAssessment, JobRequirements};
use crate::workflow::Stage;

pub const NO_LEADERSHIP_REQUIREMENT: &str = "None - this is an individual contributor role";

const MAX_ROLES_IN_PROMPT: usize = 3;

pub struct CultureFitAssessor {
    ctx: AgentContext,
}

impl CultureFitAssessor {
    pub fn new(ctx: AgentContext) -> Self {
        Self { ctx }
    }

    pub async fn assess(
        &self,
        profile: &CandidateProfile,
        job: &JobRequirements,
    ) -> Result<CultureFitAssessment, StageError> {
        info!(
            "Assessing culture fit (leadership required: {})",
            job.has_leadership_requirement()
        );

        let responsibilities = bullet_list(&job.responsibilities, "Not specified");
        let leadership = leadership_requirements(job);
        let soft_skills = bullet_list(&job.soft_skills, "Not specified");
        let certifications = comma_list(&profile.certifications, "None");
        let languages = comma_list(&profile.languages, "None");
        let experience = format_experience(profile);
        let prompt = fill_template(
            CULTURE_FIT_PROMPT_TEMPLATE,
            &[
                ("job_title", job.title.as_str()),
                ("company", job.company.as_deref().unwrap_or("Not specified")),
                ("responsibilities", responsibilities.as_str()),
                ("leadership", leadership.as_str()),
                ("soft_skills", soft_skills.as_str()),
                ("candidate_name", profile.display_name()),
                ("summary", profile.summary.as_deref().unwrap_or("Not provided")),
                ("certifications", certifications.as_str()),
                ("languages", languages.as_str()),
                ("candidate_experience", experience.as_str()),
            ],
        );

        let assessment: CultureFitAssessment = self
            .ctx
            .invoke_structured(Stage::Assessing, CULTURE_FIT_SYSTEM, &prompt)
            .await?;

        info!(
            "Culture fit score: {:.2} ({} soft skills identified)",
            assessment.score,
            assessment.soft_skills.len()
        );
        Ok(assessment)
    }
}

fn leadership_requirements(job: &JobRequirements) -> String {
    if job.has_leadership_requirement() {
        bullet_list(&job.leadership, NO_LEADERSHIP_REQUIREMENT)
    } else {
        NO_LEADERSHIP_REQUIREMENT.to_string()
    }
}

fn format_experience(profile: &CandidateProfile) -> String {
    if profile.experience.is_empty() {
        return "No work experience listed".to_string();
    }
    profile
        .experience
        .iter()
        .take(MAX_ROLES_IN_PROMPT)
        .map(|exp| {
            let header = format!("{} at {}", exp.title, exp.employer);
            if exp.achievements.is_empty() {
                header
            } else {
                format!("{header}\n{}", bullet_list(exp.achievements.iter().take(3), ""))
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::test_support::{ScriptedProvider, CULTURE_REPLY, CV_REPLY};

    #[test]
    fn test_individual_contributor_role_is_noted() {
        let job: JobRequirements = serde_json::from_str(r#"{"title": "IC", "leadership": []}"#).unwrap();
        assert_eq!(leadership_requirements(&job), NO_LEADERSHIP_REQUIREMENT);
    }

    #[test]
    fn test_leadership_requirements_listed() {
        let job: JobRequirements =
            serde_json::from_str(r#"{"title": "Lead", "leadership": ["Manage 4 engineers"]}"#).unwrap();
        assert_eq!(leadership_requirements(&job), "  - Manage 4 engineers");
    }

    #[tokio::test]
    async fn test_assess_returns_score() {
        let profile: CandidateProfile = serde_json::from_str(CV_REPLY).unwrap();
        let job: JobRequirements = serde_json::from_str(r#"{"title": "Engineer"}"#).unwrap();
        let provider = ScriptedProvider::new().reply("culture_fit", CULTURE_REPLY);
        let assessor = CultureFitAssessor::new(AgentContext::new(Arc::new(provider), Duration::from_secs(5)));

        let assessment = assessor.assess(&profile, &job).await.unwrap();
        assert_eq!(assessment.score, 0.8);
        assert_eq!(assessment.leadership_indicators, vec!["Led a team of 5"]);
    }
}
