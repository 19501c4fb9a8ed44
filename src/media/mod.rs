// Media backend abstraction
//
// Everything that touches ffmpeg/ffprobe goes through this trait:
// - Commands: argument builders and process execution
// - Probe: ffprobe JSON parsing
// - Processor: the ffmpeg-backed implementation

pub mod commands;
pub mod probe;
pub mod processor;

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

pub use commands::*;
pub use probe::*;
pub use processor::*;

use crate::assembly::CompositionGraph;
use crate::config::RenderConfig;
use crate::error::Result;

/// Main trait for media backend operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaProcessorTrait: Send + Sync {
    /// Probe a media file for duration and raster size
    async fn probe(&self, path: &Path) -> Result<MediaInfo>;

    /// Render a composed graph into a single output file
    async fn render(&self, graph: &CompositionGraph, output_path: &Path) -> Result<()>;

    /// Write one frame at `timestamp`, passed through `filter`, as a still image
    async fn extract_frame(
        &self,
        video_path: &Path,
        timestamp: f64,
        filter: &str,
        output_path: &Path,
    ) -> Result<()>;

    /// Check if the media backend is available
    fn check_availability(&self) -> Result<()>;

    /// Get media backend version information
    async fn get_version_info(&self) -> Result<String>;
}

/// Factory for creating media processor instances
pub struct MediaProcessorFactory;

impl MediaProcessorFactory {
    /// Create the default media processor implementation (FFmpeg-based)
    pub fn create_processor(config: RenderConfig) -> Arc<dyn MediaProcessorTrait> {
        Arc::new(processor::MediaProcessorImpl::new(config))
    }
}
