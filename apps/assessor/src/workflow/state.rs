use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use super::graph::{Slot, Stage};
use crate::errors::StageError;
use crate::models::{
    AssessmentResult, CandidateProfile, CultureFitAssessment, ExperienceEvaluation, JobRequirements,
    SkillMatchResult,
};

/// Where a run is. `Done` and `Failed` are terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Pending,
    Running(Vec<Stage>),
    Done,
    Failed(Stage),
}

impl Status {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Done | Status::Failed(_))
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Pending => f.write_str("PENDING"),
            Status::Running(stages) => {
                let names: Vec<&str> = stages.iter().map(|s| s.as_str()).collect();
                f.write_str(&names.join(" | "))
            }
            Status::Done => f.write_str("DONE"),
            Status::Failed(stage) => write!(f, "FAILED({stage})"),
        }
    }
}

/// The update a stage hands back to the engine.
#[derive(Debug)]
pub enum StateDelta {
    Documents { cv_text: Arc<str>, job_text: Arc<str> },
    CvData(Arc<CandidateProfile>),
    JobDescription(Arc<JobRequirements>),
    SkillMatch(Arc<SkillMatchResult>),
    ExperienceEvaluation(Arc<ExperienceEvaluation>),
    CultureFit(Arc<CultureFitAssessment>),
    Assessment(Box<AssessmentResult>),
}

impl StateDelta {
    pub fn slots(&self) -> &'static [Slot] {
        match self {
            StateDelta::Documents { .. } => &[Slot::CvText, Slot::JobText],
            StateDelta::CvData(_) => &[Slot::CvData],
            StateDelta::JobDescription(_) => &[Slot::JobDescription],
            StateDelta::SkillMatch(_) => &[Slot::SkillMatch],
            StateDelta::ExperienceEvaluation(_) => &[Slot::ExperienceEvaluation],
            StateDelta::CultureFit(_) => &[Slot::CultureFit],
            StateDelta::Assessment(_) => &[Slot::AssessmentResult],
        }
    }
}

/// Accumulator threaded through one run. Every slot is written at most once.
#[derive(Debug)]
pub struct WorkflowState {
    pub cv_file_path: PathBuf,
    pub job_description_path: PathBuf,
    cv_text: Option<Arc<str>>,
    job_text: Option<Arc<str>>,
    cv_data: Option<Arc<CandidateProfile>>,
    job_description: Option<Arc<JobRequirements>>,
    skill_match: Option<Arc<SkillMatchResult>>,
    experience_evaluation: Option<Arc<ExperienceEvaluation>>,
    culture_fit: Option<Arc<CultureFitAssessment>>,
    assessment_result: Option<AssessmentResult>,
    status: Status,
    history: Vec<Status>,
}

fn require<T: Clone>(slot: Slot, value: &Option<T>) -> Result<T, StageError> {
    value.clone().ok_or(StageError::MissingInput(slot.as_str()))
}

impl WorkflowState {
    pub fn new(cv_file_path: PathBuf, job_description_path: PathBuf) -> Self {
        Self {
            cv_file_path,
            job_description_path,
            cv_text: None,
            job_text: None,
            cv_data: None,
            job_description: None,
            skill_match: None,
            experience_evaluation: None,
            culture_fit: None,
            assessment_result: None,
            status: Status::Pending,
            history: vec![Status::Pending],
        }
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    /// Every status the run has been in, oldest first.
    pub fn history(&self) -> &[Status] {
        &self.history
    }

    pub fn transition(&mut self, next: Status) -> Result<(), StageError> {
        if self.status.is_terminal() || next == Status::Pending {
            return Err(StageError::InvalidTransition {
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next.clone();
        self.history.push(next);
        Ok(())
    }

    pub fn is_filled(&self, slot: Slot) -> bool {
        match slot {
            Slot::CvText => self.cv_text.is_some(),
            Slot::JobText => self.job_text.is_some(),
            Slot::CvData => self.cv_data.is_some(),
            Slot::JobDescription => self.job_description.is_some(),
            Slot::SkillMatch => self.skill_match.is_some(),
            Slot::ExperienceEvaluation => self.experience_evaluation.is_some(),
            Slot::CultureFit => self.culture_fit.is_some(),
            Slot::AssessmentResult => self.assessment_result.is_some(),
        }
    }

    /// Union-merges a delta. Refuses to overwrite a filled slot, leaving the state untouched.
    pub fn merge(&mut self, delta: StateDelta) -> Result<(), StageError> {
        if let Some(slot) = delta.slots().iter().find(|s| self.is_filled(**s)) {
            return Err(StageError::StateConflict(slot.as_str()));
        }
        match delta {
            StateDelta::Documents { cv_text, job_text } => {
                self.cv_text = Some(cv_text);
                self.job_text = Some(job_text);
            }
            StateDelta::CvData(v) => self.cv_data = Some(v),
            StateDelta::JobDescription(v) => self.job_description = Some(v),
            StateDelta::SkillMatch(v) => self.skill_match = Some(v),
            StateDelta::ExperienceEvaluation(v) => self.experience_evaluation = Some(v),
            StateDelta::CultureFit(v) => self.culture_fit = Some(v),
            StateDelta::Assessment(v) => self.assessment_result = Some(*v),
        }
        Ok(())
    }

    pub fn cv_text(&self) -> Result<Arc<str>, StageError> {
        require(Slot::CvText, &self.cv_text)
    }

    pub fn job_text(&self) -> Result<Arc<str>, StageError> {
        require(Slot::JobText, &self.job_text)
    }

    pub fn cv_data(&self) -> Result<Arc<CandidateProfile>, StageError> {
        require(Slot::CvData, &self.cv_data)
    }

    pub fn job_description(&self) -> Result<Arc<JobRequirements>, StageError> {
        require(Slot::JobDescription, &self.job_description)
    }

    pub fn skill_match(&self) -> Result<Arc<SkillMatchResult>, StageError> {
        require(Slot::SkillMatch, &self.skill_match)
    }

    pub fn experience_evaluation(&self) -> Result<Arc<ExperienceEvaluation>, StageError> {
        require(Slot::ExperienceEvaluation, &self.experience_evaluation)
    }

    pub fn culture_fit(&self) -> Result<Arc<CultureFitAssessment>, StageError> {
        require(Slot::CultureFit, &self.culture_fit)
    }

    pub fn take_result(&mut self) -> Option<AssessmentResult> {
        self.assessment_result.take()
    }
}
