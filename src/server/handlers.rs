//! Request handlers for the job surface.

use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use std::path::Path as FsPath;
use tokio_util::io::ReaderStream;
use tracing::{debug, error};

use crate::jobs::{Job, JobRequest, JobStatus};
use super::error::{ApiError, ApiResult};
use super::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct CreateJobResponse {
    pub job_id: String,
}

/// Liveness probe.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Queue a job; the pipeline runs in the background.
pub async fn create_job(
    State(state): State<AppState>,
    payload: Result<Json<JobRequest>, JsonRejection>,
) -> ApiResult<Json<CreateJobResponse>> {
    let Json(request) = payload.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
    if request.prompt.trim().is_empty() {
        return Err(ApiError::bad_request("Prompt is required"));
    }

    let job_id = state.orchestrator.submit(request).await;
    Ok(Json(CreateJobResponse { job_id }))
}

pub async fn get_status(State(state): State<AppState>, Path(job_id): Path<String>) -> ApiResult<Json<Job>> {
    state
        .orchestrator
        .registry()
        .get(&job_id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Job not found"))
}

pub async fn download_video(State(state): State<AppState>, Path(job_id): Path<String>) -> ApiResult<Response> {
    let job = state.orchestrator.registry().get(&job_id).await;
    let output_path = job
        .filter(|job| job.status == JobStatus::Completed)
        .and_then(|job| job.output_path)
        .ok_or_else(|| ApiError::bad_request("Video not ready"))?;

    serve_file(&output_path).await
}

pub async fn download_thumbnail(State(state): State<AppState>, Path(job_id): Path<String>) -> ApiResult<Response> {
    let job = state.orchestrator.registry().get(&job_id).await;
    let thumbnail_path = job
        .and_then(|job| job.thumbnail_path)
        .ok_or_else(|| ApiError::bad_request("Thumbnail not ready"))?;

    serve_file(&thumbnail_path).await
}

pub async fn download_dub(
    State(state): State<AppState>,
    Path((job_id, lang)): Path<(String, String)>,
) -> ApiResult<Response> {
    let job = state
        .orchestrator
        .registry()
        .get(&job_id)
        .await
        .ok_or_else(|| ApiError::not_found("Dub not found"))?;

    let dub = job
        .find_dub(&lang)
        .ok_or_else(|| ApiError::not_found("File not found"))?;

    serve_file(&dub.path).await
}

fn content_type(path: &FsPath) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("mp4") => "video/mp4",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        _ => "application/octet-stream",
    }
}

/// Stream a file as an attachment after resolving it to an absolute path.
async fn serve_file(path: &FsPath) -> ApiResult<Response> {
    let absolute = tokio::fs::canonicalize(path)
        .await
        .map_err(|_| ApiError::not_found("File not found on server"))?;

    let file = tokio::fs::File::open(&absolute).await.map_err(|e| {
        error!("Failed to open {}: {}", absolute.display(), e);
        ApiError::internal(e.to_string())
    })?;
    let length = file.metadata().await.map_err(|e| ApiError::internal(e.to_string()))?.len();

    let file_name = absolute
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "download".to_string());
    debug!("Serving {} ({} bytes)", absolute.display(), length);

    Ok((
        [
            (header::CONTENT_TYPE, content_type(&absolute).to_string()),
            (header::CONTENT_LENGTH, length.to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", file_name)),
        ],
        Body::from_stream(ReaderStream::new(file)),
    )
        .into_response())
}
