use std::path::Path;

use anyhow::Context;
use axum::{
    extract::{Multipart, State},
    Json,
};
use bytes::Bytes;
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::AssessmentResult;
use crate::state::AppState;

const DEFAULT_EXTENSION: &str = "txt";

#[derive(Serialize)]
pub struct AssessmentResponse {
    pub assessment_id: Uuid,
    pub result: AssessmentResult,
}

struct Upload {
    file_name: Option<String>,
    data: Bytes,
}

impl Upload {
    /// The upload's extension, lowercased. Falls back to plain text when absent or odd.
    fn extension(&self) -> String {
        self.file_name
            .as_deref()
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
    }

    /// Writes the upload to a temp file whose suffix keeps the format dispatch intact.
    async fn persist(&self, prefix: &str) -> anyhow::Result<NamedTempFile> {
        let file = tempfile::Builder::new()
            .prefix(prefix)
            .suffix(&format!(".{}", self.extension()))
            .tempfile()
            .context("Failed to create temp file for upload")?;
        tokio::fs::write(file.path(), &self.data)
            .await
            .with_context(|| format!("Failed to write upload to {}", file.path().display()))?;
        Ok(file)
    }
}

fn require_upload(upload: Option<Upload>, field: &str) -> Result<Upload, AppError> {
    match upload {
        None => Err(AppError::Validation(format!("Missing multipart field '{field}'"))),
        Some(u) if u.data.is_empty() => Err(AppError::Validation(format!("Multipart field '{field}' is empty"))),
        Some(u) => Ok(u),
    }
}

/// POST /api/v1/assessments
/// Multipart fields `cv` and `job`; the file name's extension selects the reader.
pub async fn handle_create_assessment(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<AssessmentResponse>, AppError> {
    let mut cv = None;
    let mut job = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;
        let upload = Upload { file_name, data };
        match name.as_str() {
            "cv" => cv = Some(upload),
            "job" => job = Some(upload),
            _ => {}
        }
    }

    let cv = require_upload(cv, "cv")?;
    let job = require_upload(job, "job")?;

    let assessment_id = Uuid::new_v4();
    info!(
        "Assessment {assessment_id}: cv {} bytes (.{}), job {} bytes (.{})",
        cv.data.len(),
        cv.extension(),
        job.data.len(),
        job.extension()
    );

    // Temp files are removed on drop, after the run.
    let cv_file = cv.persist("cv-").await?;
    let job_file = job.persist("job-").await?;

    let result = state.workflow.run(cv_file.path(), job_file.path()).await?;

    Ok(Json(AssessmentResponse {
        assessment_id,
        result,
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        Router,
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::routes::build_router;
    use crate::test_support::*;
    use crate::workflow::AssessmentWorkflow;

    const BOUNDARY: &str = "assessor-test-boundary";

    fn app(provider: ScriptedProvider) -> Router {
        let config = Config::from_lookup(|key| (key == "ANTHROPIC_API_KEY").then(|| "sk-test".to_string())).unwrap();
        let workflow = AssessmentWorkflow::new(Arc::new(provider), config.workflow_config()).unwrap();
        build_router(AppState {
            config,
            workflow: Arc::new(workflow),
        })
    }

    fn multipart_body(parts: &[(&str, &str, &str)]) -> String {
        let mut body = String::new();
        for (name, file_name, content) in parts {
            body.push_str(&format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: text/plain\r\n\r\n{content}\r\n"
            ));
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));
        body
    }

    fn upload_request(parts: &[(&str, &str, &str)]) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/v1/assessments")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(parts)))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_reports_model() {
        let response = app(ScriptedProvider::new())
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "assessor");
        assert_eq!(body["provider"], "anthropic");
    }

    #[tokio::test]
    async fn test_create_assessment_returns_result() {
        let request = upload_request(&[
            ("cv", "cv.txt", "Ada Lovelace\nRust, PostgreSQL"),
            ("job", "job.md", "# Staff Rust Engineer"),
        ]);
        let response = app(ScriptedProvider::happy_path()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert!(body["assessment_id"].is_string());
        assert_eq!(body["result"]["recommendation"], "good_match");
        let overall = body["result"]["overall_score"].as_f64().unwrap();
        assert!((overall - 0.774).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_missing_job_field_is_bad_request() {
        let request = upload_request(&[("cv", "cv.txt", "Ada Lovelace")]);
        let response = app(ScriptedProvider::happy_path()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert!(body["error"]["message"].as_str().unwrap().contains("'job'"));
    }

    #[tokio::test]
    async fn test_extraction_failure_names_stage() {
        let provider = ScriptedProvider::happy_path().reply("job_analyzer", r#"{"company": "Acme"}"#);
        let request = upload_request(&[
            ("cv", "cv.txt", "Ada Lovelace"),
            ("job", "job.txt", "Some job"),
        ]);
        let response = app(provider).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "EXTRACTION_ERROR");
        assert_eq!(body["error"]["stage"], "ANALYZING");
    }

    #[tokio::test]
    async fn test_unsupported_extension_is_read_error() {
        let request = upload_request(&[
            ("cv", "cv.rtf", "Ada Lovelace"),
            ("job", "job.txt", "Some job"),
        ]);
        let response = app(ScriptedProvider::happy_path()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "READ_ERROR");
        assert_eq!(body["error"]["stage"], "LOADING");
    }

    #[test]
    fn test_extension_falls_back_to_text() {
        let upload = |name: Option<&str>| Upload {
            file_name: name.map(str::to_string),
            data: Bytes::from_static(b"x"),
        };
        assert_eq!(upload(Some("CV.PDF")).extension(), "pdf");
        assert_eq!(upload(Some("resume")).extension(), "txt");
        assert_eq!(upload(None).extension(), "txt");
    }
}
