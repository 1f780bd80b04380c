//! Scripted model provider and canned agent replies shared by the unit tests.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::llm_client::{CompletionRequest, ModelProvider, ProviderError};

pub const CV_REPLY: &str = r#"{
  "name": "Ada Lovelace",
  "contact": {"email": "ada@example.com", "phone": null, "location": "London"},
  "summary": "Backend engineer who likes hard problems",
  "skills": [
    {"name": "Rust", "proficiency": "expert", "years_experience": 6, "category": "systems programming"},
    {"name": "postgresql", "proficiency": "advanced"},
    {"name": "Kubernetes"},
    {"name": "RabbitMQ"}
  ],
  "experience": [
    {"title": "Senior Engineer", "employer": "Analytical Engines", "start_date": "2020-01",
     "duration_months": 48, "achievements": ["Led a team of 5"]},
    {"title": "Engineer", "employer": "Difference Co", "start_date": "2018-01",
     "end_date": "2019-12", "duration_months": 24}
  ],
  "education": [
    {"institution": "University of London", "degree": "BSc", "field_of_study": "Mathematics", "graduation_year": 2017}
  ],
  "certifications": [],
  "languages": ["English"]
}"#;

pub const JOB_REPLY: &str = r#"```json
{
  "title": "Staff Rust Engineer",
  "company": "Acme",
  "must_have": ["5+ years building backend services"],
  "nice_to_have": ["Fintech experience"],
  "required_skills": [{"name": "Rust"}, {"name": "PostgreSQL"}, {"name": "Kafka"}],
  "preferred_skills": [{"name": "Kubernetes"}],
  "responsibilities": ["Design payment services"],
  "education": [],
  "leadership": ["Mentor engineers"],
  "soft_skills": ["Communication"]
}
```"#;

pub const SKILLS_REPLY: &str = r#"{
  "matched_skills": ["Rust"],
  "missing_skills": ["Kafka"],
  "transferable_skills": ["RabbitMQ"],
  "gap_analysis": "Strong Rust and SQL; no Kafka.",
  "score": 0.785
}"#;

pub const EXPERIENCE_REPLY: &str = r#"{
  "total_years": 6,
  "relevant_years": 5,
  "level": "senior",
  "relevant_roles": ["Senior Engineer at Analytical Engines"],
  "key_achievements": ["Led a team of 5"],
  "analysis": "Meets the backend requirement.",
  "score": 0.75
}"#;

pub const CULTURE_REPLY: &str = r#"{
  "soft_skills": ["Mentoring"],
  "leadership_indicators": ["Led a team of 5"],
  "collaboration_notes": "Leadership requirement met.",
  "score": 0.8
}"#;

pub const NARRATIVE_REPLY: &str = r#"{
  "strengths": ["Deep Rust expertise", "Proven team lead"],
  "concerns": ["No Kafka experience"],
  "summary": "A solid candidate with a gap in streaming platforms."
}"#;

enum Reply {
    Text(String),
    Delayed(Duration, String),
    Fail(fn() -> ProviderError),
    Panic(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallEvent {
    Started(&'static str),
    Finished(&'static str),
}

/// In-memory `ModelProvider` that answers by agent name and records call order.
#[derive(Default)]
pub struct ScriptedProvider {
    replies: HashMap<&'static str, Reply>,
    events: Mutex<Vec<CallEvent>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// A provider that answers every agent with a valid canned reply.
    pub fn happy_path() -> Self {
        Self::new()
            .reply("cv_parser", CV_REPLY)
            .reply("job_analyzer", JOB_REPLY)
            .reply("skills_matcher", SKILLS_REPLY)
            .reply("experience_evaluator", EXPERIENCE_REPLY)
            .reply("culture_fit", CULTURE_REPLY)
            .reply("final_scorer", NARRATIVE_REPLY)
    }

    pub fn reply(mut self, agent: &'static str, text: impl Into<String>) -> Self {
        self.replies.insert(agent, Reply::Text(text.into()));
        self
    }

    pub fn reply_after(mut self, agent: &'static str, delay: Duration, text: impl Into<String>) -> Self {
        self.replies.insert(agent, Reply::Delayed(delay, text.into()));
        self
    }

    pub fn fail(mut self, agent: &'static str, error: fn() -> ProviderError) -> Self {
        self.replies.insert(agent, Reply::Fail(error));
        self
    }

    /// The agent's call panics with `message` instead of returning.
    pub fn panic(mut self, agent: &'static str, message: &'static str) -> Self {
        self.replies.insert(agent, Reply::Panic(message));
        self
    }

    pub fn events(&self) -> Vec<CallEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn was_called(&self, agent: &str) -> bool {
        self.events()
            .iter()
            .any(|e| matches!(e, CallEvent::Started(a) if *a == agent))
    }

    pub fn position(&self, event: CallEvent) -> Option<usize> {
        self.events().iter().position(|e| *e == event)
    }

    fn record(&self, event: CallEvent) {
        self.events.lock().unwrap().push(event);
    }
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    fn model(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, ProviderError> {
        self.record(CallEvent::Started(request.agent));
        let result = match self.replies.get(request.agent) {
            Some(Reply::Text(text)) => Ok(text.clone()),
            Some(Reply::Delayed(delay, text)) => {
                tokio::time::sleep(*delay).await;
                Ok(text.clone())
            }
            Some(Reply::Fail(error)) => Err(error()),
            Some(Reply::Panic(message)) => panic!("{message}"),
            None => Err(ProviderError::MalformedResponse(format!(
                "no scripted reply for {}",
                request.agent
            ))),
        };
        self.record(CallEvent::Finished(request.agent));
        result
    }
}

/// Writes a CV and a job description to `dir` and returns their paths.
pub fn write_documents(dir: &tempfile::TempDir) -> (PathBuf, PathBuf) {
    let cv = dir.path().join("cv.txt");
    let job = dir.path().join("job.md");
    std::fs::write(&cv, "Ada Lovelace\nSenior Engineer at Analytical Engines\nRust, PostgreSQL").unwrap();
    std::fs::write(&job, "# Staff Rust Engineer\nRequired: Rust, PostgreSQL, Kafka").unwrap();
    (cv, job)
}
