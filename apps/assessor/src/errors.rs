use std::path::PathBuf;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::llm_client::ProviderError;
use crate::workflow::{GraphError, Stage};

/// Failure to turn a document on disk into plain text.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("File not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Unsupported file format '{extension}' for {}", path.display())]
    UnsupportedExtension { path: PathBuf, extension: String },

    #[error("I/O error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not extract text from {}: {message}", path.display())]
    Corrupt { path: PathBuf, message: String },

    #[error("Document {} contains no text", path.display())]
    Empty { path: PathBuf },
}

/// A model reply that could not be coerced into the agent's output schema.
#[derive(Debug, Error)]
#[error(
    "{} returned output that failed validation: {}",
    stage.agent_name(),
    validation_errors.join("; ")
)]
pub struct ExtractionError {
    pub stage: Stage,
    pub raw_response: String,
    pub validation_errors: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Scoring weights must sum to 1.0 (got {sum})")]
    WeightsDoNotSumToOne { sum: f64 },

    #[error("Scoring weight '{name}' must be a finite non-negative number (got {value})")]
    InvalidWeight { name: &'static str, value: f64 },

    #[error("Required environment variable '{0}' is not set")]
    MissingEnv(String),

    #[error("Invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    #[error("Unsupported LLM provider: {0}")]
    UnsupportedProvider(String),

    #[error("Invalid workflow graph: {0}")]
    Graph(#[from] GraphError),
}

/// Why a single stage failed.
#[derive(Debug, Error)]
pub enum StageError {
    #[error(transparent)]
    Read(#[from] ReadError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Required input '{0}' was not produced before this stage ran")]
    MissingInput(&'static str),

    #[error("State field '{0}' was already written by another stage")]
    StateConflict(&'static str),

    #[error("Stage wrote state field '{0}', which it does not declare")]
    UndeclaredWrite(&'static str),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Stage task panicked: {0}")]
    Panicked(String),
}

/// The terminal error of a workflow run: the stage that failed and why.
#[derive(Debug, Error)]
#[error("Workflow failed at {stage}: {cause}")]
pub struct WorkflowError {
    pub stage: Stage,
    #[source]
    pub cause: StageError,
}

impl WorkflowError {
    pub fn new(stage: Stage, cause: impl Into<StageError>) -> Self {
        Self {
            stage,
            cause: cause.into(),
        }
    }
}

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, stage) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone(), None),
            AppError::Workflow(err) => {
                let (status, code) = match &err.cause {
                    StageError::Read(_) => (StatusCode::UNPROCESSABLE_ENTITY, "READ_ERROR"),
                    StageError::Extraction(_) => (StatusCode::UNPROCESSABLE_ENTITY, "EXTRACTION_ERROR"),
                    StageError::Provider(ProviderError::Timeout(_)) => (StatusCode::GATEWAY_TIMEOUT, "TIMEOUT"),
                    StageError::Provider(_) => (StatusCode::BAD_GATEWAY, "LLM_ERROR"),
                    StageError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR"),
                    _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
                };
                tracing::error!("Assessment failed: {err}");
                (status, code, err.cause.to_string(), Some(err.stage))
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                    None,
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message,
                "stage": stage
            }
        }));

        (status, body).into_response()
    }
}
