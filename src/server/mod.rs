// HTTP job surface
//
// - Handlers: submit, status polling and artifact downloads
// - Error: JSON error responses

pub mod error;
pub mod handlers;

use axum::routing::{get, post};
use axum::Router;
use tracing::info;

pub use error::{ApiError, ApiResult};

use crate::error::Result;
use crate::jobs::JobOrchestrator;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: JobOrchestrator,
}

impl AppState {
    pub fn new(orchestrator: JobOrchestrator) -> Self {
        Self { orchestrator }
    }
}

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/create", post(handlers::create_job))
        .route("/status/:job_id", get(handlers::get_status))
        .route("/download/:job_id", get(handlers::download_video))
        .route("/download/thumbnail/:job_id", get(handlers::download_thumbnail))
        .route("/download/dub/:job_id/:lang", get(handlers::download_dub))
        .with_state(state)
}

/// Serve the router until the process is stopped.
pub async fn serve(bind: &str, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, create_router(state)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::jobs::{DubbedVersion, JobRegistry, JobStatus, PipelineServices};
    use crate::media::MockMediaProcessorTrait;
    use crate::services::{MockMediaFetcher, MockScriptGenerator, MockSpeechSynthesizer};
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use std::path::PathBuf;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app() -> (Router, JobRegistry) {
        let services = PipelineServices {
            script: Arc::new(MockScriptGenerator::new()),
            media: Arc::new(MockMediaFetcher::new()),
            speech: Arc::new(MockSpeechSynthesizer::new()),
            processor: Arc::new(MockMediaProcessorTrait::new()),
        };
        let registry = JobRegistry::new();
        let orchestrator = JobOrchestrator::new(Config::default(), registry.clone(), services);
        (create_router(AppState::new(orchestrator)), registry)
    }

    async fn completed_job(registry: &JobRegistry, output: PathBuf, thumbnail: Option<PathBuf>) -> String {
        let job = registry.create("test").await;
        for status in [
            JobStatus::GeneratingScript,
            JobStatus::FetchingMedia,
            JobStatus::GeneratingAudio,
            JobStatus::RenderingVideo,
        ] {
            registry.advance(&job.id, status).await.unwrap();
        }
        registry.complete(&job.id, output, thumbnail, 6.0).await.unwrap();
        job.id
    }

    async fn get(router: Router, uri: &str) -> axum::response::Response {
        router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (router, _) = app();
        let response = get(router, "/health").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_unknown_job_status_is_404() {
        let (router, _) = app();
        let response = get(router, "/status/nope").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["error"], "Job not found");
    }

    #[tokio::test]
    async fn test_status_snapshot() {
        let (router, registry) = app();
        let job = registry.create("test").await;
        registry.advance(&job.id, JobStatus::GeneratingScript).await.unwrap();

        let response = get(router, &format!("/status/{}", job.id)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "generating_script");
        assert_eq!(body["progress"], 10);
        assert_eq!(body["prompt"], "test");
    }

    #[tokio::test]
    async fn test_empty_prompt_rejected() {
        let (router, registry) = app();
        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/create")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"prompt": "  "}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(registry.is_empty().await);
    }

    async fn post_create(router: Router, body: &'static str) -> axum::response::Response {
        router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/create")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_malformed_create_body_is_json_400() {
        let (router, registry) = app();

        let response = post_create(router.clone(), r#"{"duration": "short"}"#).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert!(body["error"].as_str().unwrap().contains("prompt"));

        let response = post_create(router, "{not json").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(response).await["error"].is_string());
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_download_before_completion_is_400() {
        let (router, registry) = app();
        let job = registry.create("test").await;

        let response = get(router.clone(), &format!("/download/{}", job.id)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "Video not ready");

        let response = get(router, "/download/unknown").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_download_completed_video() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("job.mp4");
        std::fs::write(&output, b"video").unwrap();

        let (router, registry) = app();
        let id = completed_job(&registry, output, None).await;

        let response = get(router.clone(), &format!("/download/{}", id)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "video/mp4");
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "5");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"job.mp4\""
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"video");

        // No thumbnail was recorded
        let response = get(router, &format!("/download/thumbnail/{}", id)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_missing_file_on_disk_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let (router, registry) = app();
        let id = completed_job(
            &registry,
            dir.path().join("gone.mp4"),
            Some(dir.path().join("gone.jpg")),
        )
        .await;

        let response = get(router.clone(), &format!("/download/{}", id)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let response = get(router, &format!("/download/thumbnail/{}", id)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_dub_lookup_ignores_case() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("job.mp4");
        let dub = dir.path().join("job_hi.mp4");
        std::fs::write(&output, b"video").unwrap();
        std::fs::write(&dub, b"dub").unwrap();

        let (router, registry) = app();
        let id = completed_job(&registry, output, None).await;
        registry
            .push_dub(&id, DubbedVersion { lang: "Hindi".to_string(), path: dub })
            .await
            .unwrap();

        let response = get(router.clone(), &format!("/download/dub/{}/HINDI", id)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"job_hi.mp4\""
        );

        let response = get(router.clone(), &format!("/download/dub/{}/french", id)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let response = get(router, "/download/dub/unknown/hindi").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
