//! Human-readable assessment report printed by the CLI.

use std::fmt;

use crate::models::{AssessmentResult, Recommendation};
use crate::scoring::{bucket_range, ScoringWeights};

const RULE: &str = "================================================================================";
const MAX_LISTED_SKILLS: usize = 10;

pub struct Report<'a> {
    result: &'a AssessmentResult,
    weights: ScoringWeights,
}

impl<'a> Report<'a> {
    pub fn new(result: &'a AssessmentResult, weights: ScoringWeights) -> Self {
        Self { result, weights }
    }
}

fn pct(score: f64) -> String {
    format!("{:.2}%", score * 100.0)
}

fn label(recommendation: Recommendation) -> String {
    recommendation.as_str().replace('_', " ").to_uppercase()
}

fn write_capped(f: &mut fmt::Formatter<'_>, marker: &str, items: &[String]) -> fmt::Result {
    for item in items.iter().take(MAX_LISTED_SKILLS) {
        writeln!(f, "  {marker} {item}")?;
    }
    if items.len() > MAX_LISTED_SKILLS {
        writeln!(f, "  ... and {} more", items.len() - MAX_LISTED_SKILLS)?;
    }
    Ok(())
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.result;
        let skills = &r.skill_match;
        let exp = &r.experience_evaluation;
        let culture = &r.culture_fit;

        writeln!(f, "{RULE}\nDETAILED AGENT ANALYSIS\n{RULE}")?;

        writeln!(f, "\n--- 1. SKILLS MATCH ---")?;
        writeln!(f, "Score: {}", pct(skills.score))?;
        writeln!(f, "\nMatched Skills ({}):", skills.matched_skills.len())?;
        write_capped(f, "+", &skills.matched_skills)?;
        writeln!(f, "\nMissing Skills ({}):", skills.missing_skills.len())?;
        write_capped(f, "-", &skills.missing_skills)?;
        if !skills.transferable_skills.is_empty() {
            writeln!(f, "\nTransferable Skills ({}):", skills.transferable_skills.len())?;
            write_capped(f, "~", &skills.transferable_skills)?;
        }
        writeln!(f, "\nSkill Gap Analysis:\n{}", skills.gap_analysis)?;

        writeln!(f, "\n--- 2. EXPERIENCE ---")?;
        writeln!(f, "Score: {}", pct(exp.score))?;
        writeln!(f, "Experience Level: {}", exp.level)?;
        writeln!(f, "Total Years: {}", exp.total_years)?;
        writeln!(f, "Relevant Years: {}", exp.relevant_years)?;
        if !exp.relevant_roles.is_empty() {
            writeln!(f, "\nRelevant Roles:")?;
            for role in &exp.relevant_roles {
                writeln!(f, "  - {role}")?;
            }
        }
        if !exp.key_achievements.is_empty() {
            writeln!(f, "\nKey Achievements:")?;
            for achievement in exp.key_achievements.iter().take(5) {
                writeln!(f, "  - {achievement}")?;
            }
        }
        writeln!(f, "\nExperience Analysis:\n{}", exp.analysis)?;

        writeln!(f, "\n--- 3. CULTURE FIT ---")?;
        writeln!(f, "Score: {}", pct(culture.score))?;
        if !culture.soft_skills.is_empty() {
            writeln!(f, "\nSoft Skills Identified:")?;
            for skill in &culture.soft_skills {
                writeln!(f, "  - {skill}")?;
            }
        }
        if !culture.leadership_indicators.is_empty() {
            writeln!(f, "\nLeadership Indicators:")?;
            for indicator in &culture.leadership_indicators {
                writeln!(f, "  - {indicator}")?;
            }
        }
        writeln!(f, "\nCulture Fit Notes:\n{}", culture.collaboration_notes)?;

        writeln!(f, "\n{RULE}\nFINAL RECOMMENDATION\n{RULE}")?;
        writeln!(f, "\n--- Strengths ---")?;
        for (i, strength) in r.strengths.iter().enumerate() {
            writeln!(f, "{}. {strength}", i + 1)?;
        }
        writeln!(f, "\n--- Concerns ---")?;
        for (i, concern) in r.concerns.iter().enumerate() {
            writeln!(f, "{}. {concern}", i + 1)?;
        }
        writeln!(f, "\n--- Executive Summary ---\n{}", r.summary)?;
        if !r.warnings.is_empty() {
            writeln!(f, "\n--- Warnings ---")?;
            for warning in &r.warnings {
                writeln!(f, "! {warning}")?;
            }
        }

        writeln!(f, "\n{RULE}\nASSESSMENT COMPLETE\n{RULE}")?;
        writeln!(f, "\nCandidate: {}", r.cv_data.display_name())?;
        writeln!(f, "Position: {}", r.job_description.title)?;
        writeln!(f, "Overall Score: {}", pct(r.overall_score))?;
        writeln!(f, "Recommendation: {}", label(r.recommendation))?;

        writeln!(f, "\n--- Recommendation Scale ---")?;
        for bucket in Recommendation::ALL {
            let (low, high) = bucket_range(bucket);
            let marker = if bucket == r.recommendation { ">" } else { " " };
            writeln!(
                f,
                "{marker} {:<13} ({:>3.0}-{:.0}%): {}",
                label(bucket),
                low * 100.0,
                high * 100.0,
                bucket.guidance()
            )?;
        }

        writeln!(f, "\n{RULE}\nSCORE BREAKDOWN\n{RULE}")?;
        writeln!(
            f,
            "Skills Match: {} (Weight: {:.0}%)",
            pct(skills.score),
            self.weights.skills_weight * 100.0
        )?;
        writeln!(
            f,
            "Experience: {} (Weight: {:.0}%)",
            pct(exp.score),
            self.weights.experience_weight * 100.0
        )?;
        write!(
            f,
            "Culture Fit: {} (Weight: {:.0}%)",
            pct(culture.score),
            self.weights.culture_weight * 100.0
        )
    }
}
