use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{check_non_negative, check_unit_score, CandidateProfile, JobRequirements, Validate};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillMatchResult {
    #[serde(default)]
    pub matched_skills: Vec<String>,
    #[serde(default)]
    pub missing_skills: Vec<String>,
    /// Related skills that partially cover a requirement.
    #[serde(default)]
    pub transferable_skills: Vec<String>,
    pub gap_analysis: String,
    pub score: f64,
}

impl Validate for SkillMatchResult {
    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        check_unit_score("score", self.score, &mut errors);
        errors
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceLevel {
    Junior,
    #[serde(alias = "mid_level", alias = "mid-level")]
    Mid,
    Senior,
    #[serde(alias = "executive", alias = "lead/executive")]
    Lead,
}

impl fmt::Display for ExperienceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExperienceLevel::Junior => "junior",
            ExperienceLevel::Mid => "mid",
            ExperienceLevel::Senior => "senior",
            ExperienceLevel::Lead => "lead",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperienceEvaluation {
    pub total_years: f64,
    pub relevant_years: f64,
    pub level: ExperienceLevel,
    #[serde(default)]
    pub relevant_roles: Vec<String>,
    #[serde(default)]
    pub key_achievements: Vec<String>,
    pub analysis: String,
    pub score: f64,
}

impl Validate for ExperienceEvaluation {
    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        check_non_negative("total_years", self.total_years, &mut errors);
        check_non_negative("relevant_years", self.relevant_years, &mut errors);
        check_unit_score("score", self.score, &mut errors);
        errors
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CultureFitAssessment {
    #[serde(default)]
    pub soft_skills: Vec<String>,
    #[serde(default)]
    pub leadership_indicators: Vec<String>,
    pub collaboration_notes: String,
    pub score: f64,
}

impl Validate for CultureFitAssessment {
    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        check_unit_score("score", self.score, &mut errors);
        errors
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    StrongMatch,
    GoodMatch,
    WeakMatch,
    NoMatch,
}

impl Recommendation {
    /// All buckets from best to worst, as shown on the report's scale.
    pub const ALL: [Recommendation; 4] = [
        Recommendation::StrongMatch,
        Recommendation::GoodMatch,
        Recommendation::WeakMatch,
        Recommendation::NoMatch,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Recommendation::StrongMatch => "strong_match",
            Recommendation::GoodMatch => "good_match",
            Recommendation::WeakMatch => "weak_match",
            Recommendation::NoMatch => "no_match",
        }
    }

    pub fn guidance(self) -> &'static str {
        match self {
            Recommendation::StrongMatch => "Highly qualified, proceed to interview",
            Recommendation::GoodMatch => "Qualified with some gaps, interview recommended",
            Recommendation::WeakMatch => "Significant gaps, interview only if no better candidates",
            Recommendation::NoMatch => "Not qualified for this role",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The final, immutable output of one assessment run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentResult {
    pub cv_data: CandidateProfile,
    pub job_description: JobRequirements,
    pub skill_match: SkillMatchResult,
    pub experience_evaluation: ExperienceEvaluation,
    pub culture_fit: CultureFitAssessment,
    pub overall_score: f64,
    pub recommendation: Recommendation,
    pub strengths: Vec<String>,
    pub concerns: Vec<String>,
    pub summary: String,
    pub assessed_at: DateTime<Utc>,
    /// Non-fatal problems, e.g. the narrative summary could not be generated.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_experience_level_accepts_lead_aliases() {
        for raw in ["\"lead\"", "\"executive\"", "\"lead/executive\""] {
            let level: ExperienceLevel = serde_json::from_str(raw).unwrap();
            assert_eq!(level, ExperienceLevel::Lead);
        }
        assert_eq!(serde_json::to_string(&ExperienceLevel::Lead).unwrap(), "\"lead\"");
    }

    #[test]
    fn test_unknown_experience_level_is_rejected() {
        assert!(serde_json::from_str::<ExperienceLevel>("\"principal\"").is_err());
    }

    #[test]
    fn test_skill_match_score_out_of_range_fails_validation() {
        let result: SkillMatchResult =
            serde_json::from_str(r#"{"gap_analysis": "none", "score": 1.5}"#).unwrap();
        assert_eq!(result.validate().len(), 1);
    }

    #[test]
    fn test_skill_match_requires_score() {
        assert!(serde_json::from_str::<SkillMatchResult>(r#"{"gap_analysis": "none"}"#).is_err());
    }

    #[test]
    fn test_negative_years_fail_validation() {
        let json = r#"{
            "total_years": -1, "relevant_years": 2, "level": "mid",
            "analysis": "ok", "score": 0.5
        }"#;
        let eval: ExperienceEvaluation = serde_json::from_str(json).unwrap();
        assert_eq!(
            eval.validate(),
            vec!["total_years must be a non-negative number (got -1)".to_string()]
        );
    }

    #[test]
    fn test_recommendation_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&Recommendation::GoodMatch).unwrap(),
            "\"good_match\""
        );
        assert_eq!(Recommendation::NoMatch.to_string(), "no_match");
    }
}
