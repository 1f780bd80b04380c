pub mod assessment;
pub mod job;
pub mod profile;

pub use assessment::{
    AssessmentResult, CultureFitAssessment, ExperienceEvaluation, ExperienceLevel, Recommendation,
    SkillMatchResult,
};
pub use job::JobRequirements;
pub use profile::{CandidateProfile, Skill};

/// Post-deserialization checks for records produced by a model.
///
/// Serde enforces shape and required fields; `validate` enforces value rules
/// (non-empty names, unit-interval scores). Returns every broken rule, so an
/// empty list means the record is valid.
pub trait Validate {
    fn validate(&self) -> Vec<String>;
}

pub(crate) fn check_not_blank(field: &str, value: &str, errors: &mut Vec<String>) {
    if value.trim().is_empty() {
        errors.push(format!("{field} must not be empty"));
    }
}

pub(crate) fn check_unit_score(field: &str, value: f64, errors: &mut Vec<String>) {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        errors.push(format!("{field} must be within [0.0, 1.0] (got {value})"));
    }
}

pub(crate) fn check_non_negative(field: &str, value: f64, errors: &mut Vec<String>) {
    if !value.is_finite() || value < 0.0 {
        errors.push(format!("{field} must be a non-negative number (got {value})"));
    }
}
