// External collaborators of the pipeline
//
// Each service sits behind a trait so the orchestrator can run against
// mocks in tests:
// - Script: LLM script writing and translation (Groq)
// - Media: stock video search with an AI image fallback (Pexels, Pollinations)
// - Speech: text-to-speech through the edge-tts CLI
// - Cache: complete-or-absent writes for downloaded and synthesized files

pub mod cache;
pub mod edge_tts;
pub mod groq;
pub mod pexels;
pub mod script;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use script::*;

use crate::config::{MediaConfig, ScriptConfig, SpeechConfig};
use crate::error::Result;
use crate::segment::{Orientation, ScriptSegment};

/// Script writing and translation
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ScriptGenerator: Send + Sync {
    /// Write roughly `segment_count` narration segments for `prompt`
    async fn generate(
        &self,
        prompt: &str,
        segment_count: usize,
        language: NarrationLanguage,
    ) -> Result<Vec<ScriptSegment>>;

    /// Translate each segment's text, keeping image queries untouched
    async fn translate(&self, segments: &[ScriptSegment], target_language: &str) -> Result<Vec<ScriptSegment>>;
}

/// Visual media retrieval
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Local media file for `query`, or `None` when nothing could be found
    async fn fetch(&self, query: &str, orientation: Orientation) -> Result<Option<PathBuf>>;
}

/// Narration audio
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Local audio file speaking `text` in `voice_id`; same input, same file
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<PathBuf>;
}

/// Factory for the production service implementations
pub struct ServiceFactory;

impl ServiceFactory {
    pub fn create_script_generator(config: ScriptConfig) -> Arc<dyn ScriptGenerator> {
        Arc::new(groq::GroqScriptGenerator::new(config))
    }

    pub fn create_media_fetcher(config: MediaConfig, download_dir: &Path) -> Arc<dyn MediaFetcher> {
        Arc::new(pexels::PexelsMediaFetcher::new(config, download_dir))
    }

    pub fn create_speech_synthesizer(config: SpeechConfig, download_dir: &Path) -> Arc<dyn SpeechSynthesizer> {
        Arc::new(edge_tts::EdgeTtsSynthesizer::new(config, download_dir))
    }
}
