use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::SpeechConfig;
use crate::error::{Result, ReelsmithError};
use super::cache::{commit_partial, discard_partial, partial_path};
use super::SpeechSynthesizer;

/// Speech synthesis through the `edge-tts` command line tool.
pub struct EdgeTtsSynthesizer {
    config: SpeechConfig,
    download_dir: PathBuf,
}

/// Speaking rate for a voice; Hindi voices read slightly slower.
pub fn speech_rate(voice_id: &str) -> &'static str {
    if voice_id.contains("hi-IN") { "-5%" } else { "+0%" }
}

/// Cache file name derived from the text and the voice.
pub fn cache_file_name(text: &str, voice_id: &str) -> String {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    voice_id.hash(&mut hasher);
    format!("{:016x}.mp3", hasher.finish())
}

impl EdgeTtsSynthesizer {
    pub fn new(config: SpeechConfig, download_dir: &Path) -> Self {
        Self {
            config,
            download_dir: download_dir.to_path_buf(),
        }
    }

    pub fn output_path(&self, text: &str, voice_id: &str) -> PathBuf {
        self.download_dir.join(cache_file_name(text, voice_id))
    }
}

#[async_trait]
impl SpeechSynthesizer for EdgeTtsSynthesizer {
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<PathBuf> {
        if text.trim().is_empty() {
            return Err(ReelsmithError::Synthesis("Cannot synthesize empty text".to_string()));
        }

        let output_path = self.output_path(text, voice_id);
        if output_path.exists() {
            debug!("Reusing cached narration {}", output_path.display());
            return Ok(output_path);
        }

        tokio::fs::create_dir_all(&self.download_dir).await?;
        let partial = partial_path(&output_path);

        let output = match Command::new(&self.config.binary_path)
            .arg("--voice")
            .arg(voice_id)
            // `=` form so a negative rate is not read as a flag
            .arg(format!("--rate={}", speech_rate(voice_id)))
            .arg("--text")
            .arg(text)
            .arg("--write-media")
            .arg(&partial)
            .output()
            .await
        {
            Ok(output) => output,
            Err(e) => {
                discard_partial(&partial).await;
                return Err(ReelsmithError::Synthesis(format!(
                    "Failed to run {}: {}",
                    self.config.binary_path, e
                )));
            }
        };

        if !output.status.success() {
            discard_partial(&partial).await;
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ReelsmithError::Synthesis(format!(
                "edge-tts exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        if !partial.is_file() {
            return Err(ReelsmithError::Synthesis(format!(
                "edge-tts produced no file at {}",
                partial.display()
            )));
        }
        commit_partial(&partial, &output_path).await?;

        info!("Synthesized narration with {}: {}", voice_id, output_path.display());
        Ok(output_path)
    }
}
