//! Skills Matcher: compares candidate skills to the job's skill requirements.
//!
//! The exact-name overlap between required skills and CV skills is computed
//! here, given to the model as fact, and reconciled with the model's answer:
//! a skill listed verbatim is always matched, and a skill the model matched or
//! flagged as transferable is never reported missing.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::info;

use super::prompts::{SKILLS_MATCHER_PROMPT_TEMPLATE, SKILLS_MATCHER_SYSTEM};
use super::{bullet_list, comma_list, fill_template, AgentContext};
use crate::errors::StageError;
use crate::models::{CandidateProfile, JobRequirements, Skill, SkillMatchResult};
use crate::workflow::Stage;

/// Roles shown to the model; older roles add little to a skills comparison.
const MAX_ROLES_IN_PROMPT: usize = 5;
const MAX_ACHIEVEMENTS_PER_ROLE: usize = 3;

/// Exact-name overlap between the job's required skills and the CV.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkillOverlap {
    pub matched: Vec<String>,
    pub missing: Vec<String>,
}

/// Case- and whitespace-insensitive key for a skill name.
pub fn normalize_skill(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

pub fn compute_overlap(profile: &CandidateProfile, job: &JobRequirements) -> SkillOverlap {
    let candidate: HashSet<String> = profile.skills.iter().map(|s| normalize_skill(&s.name)).collect();
    let (matched, missing): (Vec<&Skill>, Vec<&Skill>) = job
        .required_skills
        .iter()
        .partition(|s| candidate.contains(&normalize_skill(&s.name)));

    SkillOverlap {
        matched: matched.into_iter().map(|s| s.name.clone()).collect(),
        missing: missing.into_iter().map(|s| s.name.clone()).collect(),
    }
}

/// Sorted, de-duplicated by normalized name. A name the job lists is reported in
/// the job's spelling; otherwise the first spelling seen wins.
fn unique_sorted<'a>(
    names: impl IntoIterator<Item = &'a String>,
    canonical: &HashMap<String, String>,
) -> BTreeMap<String, String> {
    let mut set = BTreeMap::new();
    for name in names {
        let key = normalize_skill(name);
        if key.is_empty() {
            continue;
        }
        let spelling = canonical.get(&key).map_or_else(|| name.trim(), String::as_str);
        let spelling = spelling.to_string();
        set.entry(key).or_insert(spelling);
    }
    set
}

/// Merges the model's answer with the deterministic overlap.
pub fn reconcile(model: SkillMatchResult, overlap: &SkillOverlap) -> SkillMatchResult {
    let canonical: HashMap<String, String> = overlap
        .matched
        .iter()
        .chain(overlap.missing.iter())
        .map(|name| (normalize_skill(name), name.trim().to_string()))
        .collect();

    let matched = unique_sorted(
        overlap.matched.iter().chain(model.matched_skills.iter()),
        &canonical,
    );

    let mut transferable = unique_sorted(model.transferable_skills.iter(), &canonical);
    transferable.retain(|key, _| !matched.contains_key(key));

    let mut missing = unique_sorted(
        overlap.missing.iter().chain(model.missing_skills.iter()),
        &canonical,
    );
    missing.retain(|key, _| !matched.contains_key(key) && !transferable.contains_key(key));

    SkillMatchResult {
        matched_skills: matched.into_values().collect(),
        missing_skills: missing.into_values().collect(),
        transferable_skills: transferable.into_values().collect(),
        gap_analysis: model.gap_analysis,
        score: model.score,
    }
}

pub struct SkillsMatcher {
    ctx: AgentContext,
}

impl SkillsMatcher {
    pub fn new(ctx: AgentContext) -> Self {
        Self { ctx }
    }

    pub async fn match_skills(
        &self,
        profile: &CandidateProfile,
        job: &JobRequirements,
    ) -> Result<SkillMatchResult, StageError> {
        let overlap = compute_overlap(profile, job);
        info!(
            "Matching skills: {} of {} required skills listed verbatim",
            overlap.matched.len(),
            job.required_skills.len()
        );

        let requirements = format_requirements(job);
        let matched = comma_list(&overlap.matched, "none");
        let missing = comma_list(&overlap.missing, "none");
        let education = bullet_list(profile.education.iter().map(|e| e.describe()), "None listed");
        let skills = comma_list(profile.skills.iter().map(Skill::describe), "None listed");
        let experience = format_experience(profile);
        let prompt = fill_template(
            SKILLS_MATCHER_PROMPT_TEMPLATE,
            &[
                ("job_requirements", requirements.as_str()),
                ("overlap_matched", matched.as_str()),
                ("overlap_missing", missing.as_str()),
                ("candidate_education", education.as_str()),
                ("candidate_skills", skills.as_str()),
                ("candidate_experience", experience.as_str()),
            ],
        );

        let answer: SkillMatchResult = self
            .ctx
            .invoke_structured(Stage::Matching, SKILLS_MATCHER_SYSTEM, &prompt)
            .await?;
        let result = reconcile(answer, &overlap);

        info!(
            "Skill match score: {:.2} ({} matched, {} missing, {} transferable)",
            result.score,
            result.matched_skills.len(),
            result.missing_skills.len(),
            result.transferable_skills.len()
        );
        Ok(result)
    }
}

fn format_requirements(job: &JobRequirements) -> String {
    let mut sections = Vec::new();
    if !job.required_skills.is_empty() {
        sections.push(format!(
            "REQUIRED SKILLS:\n{}",
            bullet_list(job.required_skills.iter().map(Skill::describe), "")
        ));
    }
    if !job.preferred_skills.is_empty() {
        sections.push(format!(
            "PREFERRED SKILLS:\n{}",
            bullet_list(job.preferred_skills.iter().map(Skill::describe), "")
        ));
    }
    if !job.education.is_empty() {
        sections.push(format!("EDUCATION:\n{}", bullet_list(&job.education, "")));
    }
    if sections.is_empty() {
        "No specific requirements listed".to_string()
    } else {
        sections.join("\n\n")
    }
}

fn format_experience(profile: &CandidateProfile) -> String {
    if profile.experience.is_empty() {
        return "No work experience listed".to_string();
    }
    let mut lines = Vec::new();
    for exp in profile.experience.iter().take(MAX_ROLES_IN_PROMPT) {
        lines.push(format!("- {}", exp.describe()));
        for achievement in exp.achievements.iter().take(MAX_ACHIEVEMENTS_PER_ROLE) {
            lines.push(format!("    * {achievement}"));
        }
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::test_support::{ScriptedProvider, CV_REPLY, JOB_REPLY, SKILLS_REPLY};

    fn fixtures() -> (CandidateProfile, JobRequirements) {
        let profile = serde_json::from_str(CV_REPLY).unwrap();
        let job = serde_json::from_str(crate::llm_client::strip_json_fences(JOB_REPLY)).unwrap();
        (profile, job)
    }

    fn model_answer(matched: &[&str], missing: &[&str], transferable: &[&str]) -> SkillMatchResult {
        let owned = |v: &[&str]| v.iter().map(|s| s.to_string()).collect();
        SkillMatchResult {
            matched_skills: owned(matched),
            missing_skills: owned(missing),
            transferable_skills: owned(transferable),
            gap_analysis: "analysis".into(),
            score: 0.6,
        }
    }

    #[test]
    fn test_normalize_skill_ignores_case_and_spacing() {
        assert_eq!(normalize_skill("  Machine   Learning "), "machine learning");
        assert_eq!(normalize_skill("PostgreSQL"), normalize_skill("postgresql"));
    }

    #[test]
    fn test_overlap_is_case_insensitive() {
        let (profile, job) = fixtures();
        let overlap = compute_overlap(&profile, &job);
        assert_eq!(overlap.matched, vec!["Rust", "PostgreSQL"]);
        assert_eq!(overlap.missing, vec!["Kafka"]);
    }

    #[test]
    fn test_reconcile_unions_matches() {
        let overlap = SkillOverlap {
            matched: vec!["Rust".into()],
            missing: vec!["Kafka".into(), "SQL".into()],
        };
        let result = reconcile(model_answer(&["sql"], &[], &[]), &overlap);
        assert_eq!(result.matched_skills, vec!["Rust", "SQL"]);
        assert_eq!(result.missing_skills, vec!["Kafka"]);
    }

    #[test]
    fn test_reconcile_drops_missing_that_are_transferable() {
        let overlap = SkillOverlap {
            matched: vec![],
            missing: vec!["Kafka".into()],
        };
        let result = reconcile(model_answer(&[], &["Kafka"], &["kafka"]), &overlap);
        assert!(result.missing_skills.is_empty());
        assert_eq!(result.transferable_skills, vec!["Kafka"]);
    }

    #[test]
    fn test_reconcile_never_reports_verbatim_skill_missing() {
        let overlap = SkillOverlap {
            matched: vec!["Rust".into()],
            missing: vec![],
        };
        let result = reconcile(model_answer(&[], &["rust", "Go"], &["Rust"]), &overlap);
        assert_eq!(result.matched_skills, vec!["Rust"]);
        assert_eq!(result.missing_skills, vec!["Go"]);
        assert!(result.transferable_skills.is_empty());
    }

    #[test]
    fn test_reconcile_reports_job_spelling_for_model_matches() {
        let overlap = SkillOverlap {
            matched: vec![],
            missing: vec!["PostgreSQL".into(), "Machine Learning".into()],
        };
        let result = reconcile(model_answer(&["postgresql"], &[], &["machine  learning"]), &overlap);
        assert_eq!(result.matched_skills, vec!["PostgreSQL"]);
        assert_eq!(result.transferable_skills, vec!["Machine Learning"]);
        assert!(result.missing_skills.is_empty());
    }

    #[test]
    fn test_reconcile_output_is_sorted_and_unique() {
        let result = reconcile(
            model_answer(&["Zig", "Ada", "ada"], &[], &[]),
            &SkillOverlap::default(),
        );
        assert_eq!(result.matched_skills, vec!["Ada", "Zig"]);
    }

    #[tokio::test]
    async fn test_match_skills_keeps_model_score_and_merges_overlap() {
        let (profile, job) = fixtures();
        let provider = ScriptedProvider::new().reply("skills_matcher", SKILLS_REPLY);
        let matcher = SkillsMatcher::new(AgentContext::new(Arc::new(provider), Duration::from_secs(5)));

        let result = matcher.match_skills(&profile, &job).await.unwrap();
        assert_eq!(result.score, 0.785);
        assert_eq!(result.matched_skills, vec!["PostgreSQL", "Rust"]);
        assert_eq!(result.missing_skills, vec!["Kafka"]);
        assert_eq!(result.transferable_skills, vec!["RabbitMQ"]);
    }
}
