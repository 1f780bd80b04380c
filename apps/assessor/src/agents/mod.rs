//! Assessment agents. Each agent makes exactly one model call and returns a
//! validated record; none of them keeps state between calls.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::errors::{ExtractionError, StageError};
use crate::llm_client::prompts::{with_json_only, NO_INVENTION_INSTRUCTION};
use crate::llm_client::{strip_json_fences, CompletionRequest, ModelProvider, ProviderError};
use crate::models::Validate;
use crate::workflow::Stage;

pub mod culture_fit;
pub mod cv_parser;
pub mod experience_evaluator;
pub mod final_scorer;
pub mod job_analyzer;
pub mod prompts;
pub mod skills_matcher;

pub use culture_fit::CultureFitAssessor;
pub use cv_parser::CvParser;
pub use experience_evaluator::ExperienceEvaluator;
pub use final_scorer::{FinalScorer, ScoringInput};
pub use job_analyzer::JobAnalyzer;
pub use skills_matcher::SkillsMatcher;

/// What every agent needs to reach the model: the provider and the per-call deadline.
#[derive(Clone)]
pub struct AgentContext {
    provider: Arc<dyn ModelProvider>,
    call_timeout: Duration,
}

impl AgentContext {
    pub fn new(provider: Arc<dyn ModelProvider>, call_timeout: Duration) -> Self {
        Self {
            provider,
            call_timeout,
        }
    }

    /// One bounded model call. Exceeding the deadline is `ProviderError::Timeout`.
    pub async fn complete(&self, stage: Stage, system: &str, prompt: &str) -> Result<String, ProviderError> {
        let request = CompletionRequest {
            agent: stage.agent_name(),
            system,
            prompt,
        };
        match tokio::time::timeout(self.call_timeout, self.provider.complete(&request)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(self.call_timeout)),
        }
    }

    /// Calls the model with a JSON-only system prompt and parses the reply into `T`.
    pub async fn invoke_structured<T>(&self, stage: Stage, system: &str, prompt: &str) -> Result<T, StageError>
    where
        T: DeserializeOwned + Validate,
    {
        let system = with_json_only(system);
        debug!("[{}] prompt: {} characters", stage.agent_name(), prompt.len());
        let raw = self.complete(stage, &system, prompt).await?;
        Ok(parse_structured(stage, &raw)?)
    }
}

/// Strips code fences, deserializes and validates a model reply.
pub fn parse_structured<T>(stage: Stage, raw: &str) -> Result<T, ExtractionError>
where
    T: DeserializeOwned + Validate,
{
    let failed = |validation_errors: Vec<String>| ExtractionError {
        stage,
        raw_response: raw.to_string(),
        validation_errors,
    };

    let value: T = serde_json::from_str(strip_json_fences(raw)).map_err(|e| failed(vec![e.to_string()]))?;
    let errors = value.validate();
    if !errors.is_empty() {
        return Err(failed(errors));
    }
    Ok(value)
}

/// System prompt for agents that extract facts from a document.
pub(crate) fn extraction_system(system: &str) -> String {
    format!("{system} {NO_INVENTION_INSTRUCTION}")
}

/// Renders `items` as an indented bullet list, or `empty` when there are none.
pub(crate) fn bullet_list<I, S>(items: I, empty: &str) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let lines: Vec<String> = items.into_iter().map(|i| format!("  - {}", i.as_ref())).collect();
    if lines.is_empty() {
        empty.to_string()
    } else {
        lines.join("\n")
    }
}

/// Comma-joined list, or `empty` when there are none.
pub(crate) fn comma_list<I, S>(items: I, empty: &str) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let joined = items
        .into_iter()
        .map(|i| i.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(", ");
    if joined.is_empty() {
        empty.to_string()
    } else {
        joined
    }
}

/// Cuts `text` to at most `max_chars` characters on a char boundary, marking the cut.
pub(crate) fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// Substitutes each `{key}` in `template` in a single pass. Braces that do not
/// name a key, including any inside substituted values, are left as written.
pub(crate) fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after.find('}').and_then(|close| {
            let key = &after[..close];
            values
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v, close))
        });
        match value {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
