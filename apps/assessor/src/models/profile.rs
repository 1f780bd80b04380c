use serde::{Deserialize, Serialize};

use super::{check_non_negative, check_not_blank, Validate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Proficiency {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl Proficiency {
    pub fn as_str(self) -> &'static str {
        match self {
            Proficiency::Beginner => "beginner",
            Proficiency::Intermediate => "intermediate",
            Proficiency::Advanced => "advanced",
            Proficiency::Expert => "expert",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    #[serde(default)]
    pub proficiency: Option<Proficiency>,
    #[serde(default)]
    pub years_experience: Option<f64>,
    #[serde(default)]
    pub category: Option<String>,
}

impl Skill {
    /// One-line rendering used in prompts, e.g. `Rust (expert, 5 years)`.
    pub fn describe(&self) -> String {
        let mut details = Vec::new();
        if let Some(level) = self.proficiency {
            details.push(level.as_str().to_string());
        }
        if let Some(years) = self.years_experience {
            details.push(format!("{years} years"));
        }
        if details.is_empty() {
            self.name.clone()
        } else {
            format!("{} ({})", self.name, details.join(", "))
        }
    }

    pub(crate) fn collect_errors(&self, field: &str, errors: &mut Vec<String>) {
        check_not_blank(&format!("{field}.name"), &self.name, errors);
        if let Some(years) = self.years_experience {
            check_non_negative(&format!("{field}.years_experience"), years, errors);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactInfo {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    pub title: String,
    pub employer: String,
    #[serde(default)]
    pub start_date: Option<String>,
    /// `None` for a current position.
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub duration_months: Option<u32>,
    #[serde(default)]
    pub achievements: Vec<String>,
}

impl Experience {
    pub fn describe(&self) -> String {
        let period = match (&self.start_date, &self.end_date) {
            (Some(start), Some(end)) => format!("{start} - {end}"),
            (Some(start), None) => format!("{start} - Present"),
            _ => "dates not listed".to_string(),
        };
        let duration = self
            .duration_months
            .map(|m| format!(", {m} months"))
            .unwrap_or_default();
        format!("{} at {} ({period}{duration})", self.title, self.employer)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Education {
    pub institution: String,
    pub degree: String,
    #[serde(default)]
    pub field_of_study: Option<String>,
    #[serde(default)]
    pub graduation_year: Option<i32>,
    #[serde(default)]
    pub gpa: Option<f64>,
}

impl Education {
    pub fn describe(&self) -> String {
        let mut line = self.degree.clone();
        if let Some(field) = &self.field_of_study {
            line.push_str(&format!(" in {field}"));
        }
        line.push_str(&format!(" from {}", self.institution));
        if let Some(year) = self.graduation_year {
            line.push_str(&format!(" ({year})"));
        }
        line
    }
}

/// Longest plausible single role: a 60-year career.
pub const MAX_ROLE_MONTHS: u32 = 720;

/// Structured candidate profile extracted from a CV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateProfile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub contact: ContactInfo,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub skills: Vec<Skill>,
    #[serde(default)]
    pub experience: Vec<Experience>,
    #[serde(default)]
    pub education: Vec<Education>,
    #[serde(default)]
    pub certifications: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
}

impl CandidateProfile {
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or("Unnamed candidate")
    }

    /// Sum of the listed role durations. Overlapping roles are counted twice.
    pub fn listed_months(&self) -> u64 {
        self.experience
            .iter()
            .filter_map(|e| e.duration_months)
            .map(u64::from)
            .sum()
    }
}

impl Validate for CandidateProfile {
    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        for (i, skill) in self.skills.iter().enumerate() {
            skill.collect_errors(&format!("skills[{i}]"), &mut errors);
        }
        for (i, exp) in self.experience.iter().enumerate() {
            check_not_blank(&format!("experience[{i}].title"), &exp.title, &mut errors);
            check_not_blank(&format!("experience[{i}].employer"), &exp.employer, &mut errors);
            if let Some(months) = exp.duration_months.filter(|m| *m > MAX_ROLE_MONTHS) {
                errors.push(format!(
                    "experience[{i}].duration_months must be at most {MAX_ROLE_MONTHS} (got {months})"
                ));
            }
        }
        for (i, edu) in self.education.iter().enumerate() {
            check_not_blank(&format!("education[{i}].institution"), &edu.institution, &mut errors);
        }
        errors
    }
}
