use serde::{Deserialize, Serialize};

use super::{check_not_blank, profile::Skill, Validate};

/// Structured requirements extracted from a job description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRequirements {
    pub title: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    /// Required experience statements, in the order the posting lists them.
    #[serde(default)]
    pub must_have: Vec<String>,
    #[serde(default)]
    pub nice_to_have: Vec<String>,
    #[serde(default)]
    pub required_skills: Vec<Skill>,
    #[serde(default)]
    pub preferred_skills: Vec<Skill>,
    #[serde(default)]
    pub responsibilities: Vec<String>,
    #[serde(default)]
    pub education: Vec<String>,
    /// Empty for individual-contributor roles.
    #[serde(default)]
    pub leadership: Vec<String>,
    #[serde(default)]
    pub soft_skills: Vec<String>,
    #[serde(default)]
    pub salary_range: Option<String>,
}

impl JobRequirements {
    pub fn has_leadership_requirement(&self) -> bool {
        self.leadership.iter().any(|l| !l.trim().is_empty())
    }
}

impl Validate for JobRequirements {
    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        check_not_blank("title", &self.title, &mut errors);
        for (i, skill) in self.required_skills.iter().enumerate() {
            skill.collect_errors(&format!("required_skills[{i}]"), &mut errors);
        }
        for (i, skill) in self.preferred_skills.iter().enumerate() {
            skill.collect_errors(&format!("preferred_skills[{i}]"), &mut errors);
        }
        errors
    }
}
