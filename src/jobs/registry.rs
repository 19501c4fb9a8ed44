//! In-memory job table shared between workers and status readers.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{Result, ReelsmithError};
use crate::segment::Segment;
use super::job::{DubbedVersion, Job, JobStatus};

/// Process-lifetime job store.
///
/// Each job is written only by the worker running it; readers get cloned
/// snapshots. Jobs are never evicted.
#[derive(Debug, Clone, Default)]
pub struct JobRegistry {
    jobs: Arc<RwLock<HashMap<String, Job>>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a queued job under a fresh id.
    pub async fn create(&self, prompt: &str) -> Job {
        let job = Job::new(Uuid::new_v4().to_string(), prompt);
        self.jobs.write().await.insert(job.id.clone(), job.clone());
        job
    }

    pub async fn get(&self, id: &str) -> Option<Job> {
        self.jobs.read().await.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }

    /// Apply `f` to the job under the write lock.
    pub async fn update<F, R>(&self, id: &str, f: F) -> Result<R>
    where
        F: FnOnce(&mut Job) -> R,
    {
        let mut jobs = self.jobs.write().await;
        let job = jobs
            .get_mut(id)
            .ok_or_else(|| ReelsmithError::JobNotFound(id.to_string()))?;
        Ok(f(job))
    }

    pub async fn advance(&self, id: &str, status: JobStatus) -> Result<()> {
        self.update(id, |job| job.advance(status)).await?
    }

    pub async fn fail(&self, id: &str, error: impl Into<String>) -> Result<()> {
        let error = error.into();
        self.update(id, |job| job.fail(error)).await?
    }

    pub async fn complete(
        &self,
        id: &str,
        output_path: PathBuf,
        thumbnail_path: Option<PathBuf>,
        duration: f64,
    ) -> Result<()> {
        self.update(id, |job| job.complete(output_path, thumbnail_path, duration))
            .await?
    }

    pub async fn set_script(&self, id: &str, script: Vec<Segment>) -> Result<()> {
        self.update(id, |job| job.set_script(script)).await
    }

    pub async fn push_dub(&self, id: &str, dub: DubbedVersion) -> Result<()> {
        self.update(id, |job| job.push_dub(dub)).await
    }

    /// Poll until the job reaches a terminal state.
    pub async fn wait_for_terminal(&self, id: &str, interval: Duration) -> Result<Job> {
        loop {
            let job = self
                .get(id)
                .await
                .ok_or_else(|| ReelsmithError::JobNotFound(id.to_string()))?;
            if job.is_terminal() {
                return Ok(job);
            }
            tokio::time::sleep(interval).await;
        }
    }
}
