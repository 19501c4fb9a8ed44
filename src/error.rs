use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReelsmithError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Script generation error: {0}")]
    Generation(String),

    #[error("Media fetch error: {0}")]
    Fetch(String),

    #[error("Speech synthesis error: {0}")]
    Synthesis(String),

    #[error("Probe failed: {message}")]
    Probe {
        message: String,
        stderr: Option<String>,
    },

    #[error("Render failed: {message}")]
    Render {
        message: String,
        stderr: Option<String>,
    },

    #[error("No segment has both media and audio; nothing to render")]
    EmptyTimeline,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Invalid job transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },
}

impl ReelsmithError {
    pub fn probe(message: impl Into<String>, stderr: Option<String>) -> Self {
        Self::Probe {
            message: message.into(),
            stderr,
        }
    }

    pub fn render(message: impl Into<String>, stderr: Option<String>) -> Self {
        Self::Render {
            message: message.into(),
            stderr,
        }
    }

    /// Backend diagnostics captured with a probe or render failure.
    pub fn backend_stderr(&self) -> Option<&str> {
        match self {
            Self::Probe { stderr, .. } | Self::Render { stderr, .. } => stderr.as_deref(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ReelsmithError>;
