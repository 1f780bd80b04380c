use std::sync::Arc;

use crate::config::Config;
use crate::workflow::AssessmentWorkflow;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub workflow: Arc<AssessmentWorkflow>,
}
