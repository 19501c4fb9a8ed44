//! Job records and their status state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::error::{Result, ReelsmithError};
use crate::segment::{Orientation, ScriptLength, Segment};

/// Job processing status.
///
/// The success path is strictly ordered; `Failed` is reachable from any
/// non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Queued,
    GeneratingScript,
    FetchingMedia,
    GeneratingAudio,
    RenderingVideo,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::GeneratingScript => "generating_script",
            JobStatus::FetchingMedia => "fetching_media",
            JobStatus::GeneratingAudio => "generating_audio",
            JobStatus::RenderingVideo => "rendering_video",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Progress reported on entering this state.
    pub fn progress(&self) -> Option<u8> {
        match self {
            JobStatus::Queued => Some(0),
            JobStatus::GeneratingScript => Some(10),
            JobStatus::FetchingMedia => Some(30),
            JobStatus::GeneratingAudio => Some(50),
            JobStatus::RenderingVideo => Some(70),
            JobStatus::Completed => Some(100),
            // Failure keeps whatever progress was reached
            JobStatus::Failed => None,
        }
    }

    fn next(&self) -> Option<JobStatus> {
        match self {
            JobStatus::Queued => Some(JobStatus::GeneratingScript),
            JobStatus::GeneratingScript => Some(JobStatus::FetchingMedia),
            JobStatus::FetchingMedia => Some(JobStatus::GeneratingAudio),
            JobStatus::GeneratingAudio => Some(JobStatus::RenderingVideo),
            JobStatus::RenderingVideo => Some(JobStatus::Completed),
            JobStatus::Completed | JobStatus::Failed => None,
        }
    }

    pub fn can_transition_to(&self, to: JobStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        to == JobStatus::Failed || self.next() == Some(to)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A finished dub of the primary video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DubbedVersion {
    /// Language name, matched case-insensitively on download
    pub lang: String,
    pub path: PathBuf,
}

fn default_mood() -> String {
    "random".to_string()
}

fn default_true() -> bool {
    true
}

/// Parameters of one video request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRequest {
    pub prompt: String,
    #[serde(default)]
    pub duration: ScriptLength,
    /// Narration voice; empty uses the configured default
    #[serde(default)]
    pub voice_id: String,
    #[serde(default)]
    pub orientation: Orientation,
    #[serde(default = "default_mood")]
    pub mood: String,
    #[serde(default = "default_true")]
    pub background_music: bool,
}

impl JobRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            duration: ScriptLength::default(),
            voice_id: String::new(),
            orientation: Orientation::default(),
            mood: default_mood(),
            background_music: true,
        }
    }
}

/// Snapshot of one job, as served to status polling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub status: JobStatus,
    /// Progress percentage (0-100)
    pub progress: u8,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<Vec<Segment>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_path: Option<PathBuf>,
    /// Rendered length of the primary video in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default)]
    pub dubbed_versions: Vec<DubbedVersion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn new(id: impl Into<String>, prompt: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            status: JobStatus::Queued,
            progress: 0,
            prompt: prompt.into(),
            script: None,
            output_path: None,
            thumbnail_path: None,
            duration: None,
            dubbed_versions: Vec::new(),
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move to `status`, refusing anything but the next step or failure.
    pub fn advance(&mut self, status: JobStatus) -> Result<()> {
        if !self.status.can_transition_to(status) {
            return Err(ReelsmithError::InvalidTransition {
                from: self.status.to_string(),
                to: status.to_string(),
            });
        }

        self.status = status;
        if let Some(progress) = status.progress() {
            self.progress = progress;
        }
        self.touch();
        Ok(())
    }

    pub fn fail(&mut self, error: impl Into<String>) -> Result<()> {
        self.advance(JobStatus::Failed)?;
        self.error = Some(error.into());
        Ok(())
    }

    /// Record the primary artifact and finish the job.
    pub fn complete(&mut self, output_path: PathBuf, thumbnail_path: Option<PathBuf>, duration: f64) -> Result<()> {
        self.advance(JobStatus::Completed)?;
        self.output_path = Some(output_path);
        self.thumbnail_path = thumbnail_path;
        self.duration = Some(duration);
        Ok(())
    }

    pub fn set_script(&mut self, script: Vec<Segment>) {
        self.script = Some(script);
        self.touch();
    }

    pub fn push_dub(&mut self, dub: DubbedVersion) {
        self.dubbed_versions.push(dub);
        self.touch();
    }

    /// Dub whose language matches `lang`, ignoring case.
    pub fn find_dub(&self, lang: &str) -> Option<&DubbedVersion> {
        self.dubbed_versions
            .iter()
            .find(|dub| dub.lang.eq_ignore_ascii_case(lang))
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_path_is_monotonic() {
        let mut job = Job::new("job-1", "test");
        let path = [
            (JobStatus::GeneratingScript, 10),
            (JobStatus::FetchingMedia, 30),
            (JobStatus::GeneratingAudio, 50),
            (JobStatus::RenderingVideo, 70),
        ];

        let mut last_progress = job.progress;
        for (status, progress) in path {
            job.advance(status).unwrap();
            assert_eq!(job.progress, progress);
            assert!(job.progress > last_progress);
            last_progress = job.progress;
        }

        job.complete(PathBuf::from("out.mp4"), None, 6.0).unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.progress, 100);
        assert!(job.is_terminal());
    }

    #[test]
    fn test_no_skipping_or_going_back() {
        let mut job = Job::new("job-1", "test");
        assert!(job.advance(JobStatus::RenderingVideo).is_err());

        job.advance(JobStatus::GeneratingScript).unwrap();
        job.advance(JobStatus::FetchingMedia).unwrap();
        let err = job.advance(JobStatus::GeneratingScript).unwrap_err();
        assert!(matches!(err, ReelsmithError::InvalidTransition { .. }));
        assert_eq!(job.status, JobStatus::FetchingMedia);
    }

    #[test]
    fn test_failed_reachable_from_any_active_state() {
        for status in [
            JobStatus::Queued,
            JobStatus::GeneratingScript,
            JobStatus::FetchingMedia,
            JobStatus::GeneratingAudio,
            JobStatus::RenderingVideo,
        ] {
            assert!(status.can_transition_to(JobStatus::Failed), "{}", status);
        }

        let mut job = Job::new("job-1", "test");
        job.advance(JobStatus::GeneratingScript).unwrap();
        job.fail("Groq down").unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.progress, 10);
        assert_eq!(job.error.as_deref(), Some("Groq down"));
    }

    #[test]
    fn test_completed_never_flips_to_failed() {
        let mut job = Job::new("job-1", "test");
        for status in [
            JobStatus::GeneratingScript,
            JobStatus::FetchingMedia,
            JobStatus::GeneratingAudio,
            JobStatus::RenderingVideo,
        ] {
            job.advance(status).unwrap();
        }
        job.complete(PathBuf::from("out.mp4"), None, 3.0).unwrap();

        assert!(job.fail("late dub error").is_err());
        assert_eq!(job.status, JobStatus::Completed);
        assert!(job.error.is_none());
    }

    #[test]
    fn test_status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&JobStatus::GeneratingScript).unwrap(),
            "\"generating_script\""
        );
        let job = Job::new("abc", "test");
        let json = serde_json::to_value(&job).unwrap();
        assert_eq!(json["status"], "queued");
        assert_eq!(json["dubbed_versions"], serde_json::json!([]));
        assert!(json.get("output_path").is_none());
    }

    #[test]
    fn test_request_defaults() {
        let request: JobRequest = serde_json::from_str(r#"{"prompt": "test"}"#).unwrap();
        assert_eq!(request, JobRequest::new("test"));
        assert_eq!(request.duration.segment_count(), 5);
        assert!(request.voice_id.is_empty());
        assert!(request.background_music);

        let request: JobRequest = serde_json::from_str(
            r#"{"prompt": "p", "duration": "long", "orientation": "portrait", "background_music": false}"#,
        )
        .unwrap();
        assert_eq!(request.duration, ScriptLength::Long);
        assert_eq!(request.orientation, Orientation::Portrait);
        assert!(!request.background_music);
    }

    #[test]
    fn test_find_dub_ignores_case() {
        let mut job = Job::new("abc", "test");
        job.push_dub(DubbedVersion { lang: "Hindi".to_string(), path: PathBuf::from("abc_hi.mp4") });
        assert!(job.find_dub("hindi").is_some());
        assert!(job.find_dub("HINDI").is_some());
        assert!(job.find_dub("french").is_none());
    }
}
