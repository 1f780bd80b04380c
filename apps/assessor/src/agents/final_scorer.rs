//! Final Scorer: combines the three comparison scores into the assessment result.
//!
//! The overall score and recommendation are computed here and never delegated
//! to the model. The model only writes the narrative (strengths, concerns,
//! summary); if that call fails the numeric result is still returned, with a
//! placeholder summary and a warning.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};

use super::prompts::{FINAL_SCORER_PROMPT_TEMPLATE, FINAL_SCORER_SYSTEM};
use super::{comma_list, fill_template, truncate, AgentContext};
use crate::errors::StageError;
use crate::models::{
    check_not_blank, AssessmentResult, CandidateProfile, CultureFitAssessment, ExperienceEvaluation,
    JobRequirements, Recommendation, SkillMatchResult, Validate,
};
use crate::scoring::{compute_overall_score, recommend, ComponentScores, ScoringWeights};
use crate::workflow::Stage;

pub const SUMMARY_UNAVAILABLE: &str = "Summary unavailable: narrative generation failed (see warnings).";

const MAX_LIST_ITEMS: usize = 10;
const MAX_ANALYSIS_CHARS: usize = 200;

/// Everything the final scorer reads from the workflow state.
#[derive(Debug, Clone)]
pub struct ScoringInput {
    pub cv_data: Arc<CandidateProfile>,
    pub job_description: Arc<JobRequirements>,
    pub skill_match: Arc<SkillMatchResult>,
    pub experience_evaluation: Arc<ExperienceEvaluation>,
    pub culture_fit: Arc<CultureFitAssessment>,
}

#[derive(Debug, Deserialize)]
struct Narrative {
    #[serde(default)]
    strengths: Vec<String>,
    #[serde(default)]
    concerns: Vec<String>,
    summary: String,
}

impl Validate for Narrative {
    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        check_not_blank("summary", &self.summary, &mut errors);
        errors
    }
}

pub struct FinalScorer {
    ctx: AgentContext,
    weights: ScoringWeights,
}

impl FinalScorer {
    pub fn new(ctx: AgentContext, weights: ScoringWeights) -> Self {
        Self { ctx, weights }
    }

    pub async fn score(&self, input: ScoringInput) -> Result<AssessmentResult, StageError> {
        let components = ComponentScores {
            skills: input.skill_match.score,
            experience: input.experience_evaluation.score,
            culture: input.culture_fit.score,
        };
        let overall_score = compute_overall_score(&components, &self.weights)?;
        let recommendation = recommend(overall_score);
        info!(
            "Overall score {:.3} ({}) from skills={:.2} experience={:.2} culture={:.2}",
            overall_score, recommendation, components.skills, components.experience, components.culture
        );

        let prompt = narrative_prompt(&input, overall_score, recommendation);
        let mut warnings = Vec::new();
        let narrative = match self
            .ctx
            .invoke_structured::<Narrative>(Stage::Scoring, FINAL_SCORER_SYSTEM, &prompt)
            .await
        {
            Ok(narrative) => narrative,
            Err(e) => {
                warn!("Narrative generation failed, returning scores without summary: {e}");
                warnings.push(format!("Summary generation failed: {e}"));
                Narrative {
                    strengths: Vec::new(),
                    concerns: Vec::new(),
                    summary: SUMMARY_UNAVAILABLE.to_string(),
                }
            }
        };

        Ok(AssessmentResult {
            cv_data: Arc::unwrap_or_clone(input.cv_data),
            job_description: Arc::unwrap_or_clone(input.job_description),
            skill_match: Arc::unwrap_or_clone(input.skill_match),
            experience_evaluation: Arc::unwrap_or_clone(input.experience_evaluation),
            culture_fit: Arc::unwrap_or_clone(input.culture_fit),
            overall_score,
            recommendation,
            strengths: narrative.strengths,
            concerns: narrative.concerns,
            summary: narrative.summary,
            assessed_at: Utc::now(),
            warnings,
        })
    }
}

fn narrative_prompt(input: &ScoringInput, overall_score: f64, recommendation: Recommendation) -> String {
    let skills = &input.skill_match;
    let experience = &input.experience_evaluation;
    let culture = &input.culture_fit;

    let overall = format!("{overall_score:.2}");
    let skills_score = format!("{:.2}", skills.score);
    let experience_score = format!("{:.2}", experience.score);
    let level = experience.level.to_string();
    let relevant_years = format!("{:.1}", experience.relevant_years);
    let culture_score = format!("{:.2}", culture.score);
    let matched = comma_list(skills.matched_skills.iter().take(MAX_LIST_ITEMS), "none");
    let missing = comma_list(skills.missing_skills.iter().take(MAX_LIST_ITEMS), "none");
    let soft_skills = comma_list(culture.soft_skills.iter().take(MAX_LIST_ITEMS), "none");
    let skills_analysis = truncate(&skills.gap_analysis, MAX_ANALYSIS_CHARS);
    let experience_analysis = truncate(&experience.analysis, MAX_ANALYSIS_CHARS);
    let culture_notes = truncate(&culture.collaboration_notes, MAX_ANALYSIS_CHARS);

    fill_template(
        FINAL_SCORER_PROMPT_TEMPLATE,
        &[
            ("job_title", input.job_description.title.as_str()),
            ("overall_score", overall.as_str()),
            ("recommendation", recommendation.as_str()),
            ("skills_score", skills_score.as_str()),
            ("experience_score", experience_score.as_str()),
            ("level", level.as_str()),
            ("relevant_years", relevant_years.as_str()),
            ("culture_score", culture_score.as_str()),
            ("matched", matched.as_str()),
            ("missing", missing.as_str()),
            ("soft_skills", soft_skills.as_str()),
            ("skills_analysis", skills_analysis.as_str()),
            ("experience_analysis", experience_analysis.as_str()),
            ("culture_notes", culture_notes.as_str()),
            ("candidate_name", input.cv_data.display_name()),
        ],
    )
}
