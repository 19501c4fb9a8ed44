//! Title thumbnails cut from the middle of a rendered video.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::assembly::caption::{drawtext_text, wrap_text, FontSelection};
use crate::assembly::layout::{thumbnail_chars_per_line, thumbnail_font_size};
use crate::error::{Result, ReelsmithError};
use crate::media::MediaProcessorTrait;

/// Line advance as a multiple of the font size.
const LINE_SPACING: f64 = 1.2;

/// Scrim, then the wrapped title as a vertically centered block.
pub fn thumbnail_filter(title: &str, width: u32, height: u32, font: &FontSelection) -> String {
    let font_size = thumbnail_font_size(height);
    let lines = wrap_text(title, thumbnail_chars_per_line(width, height));
    let advance = font_size as f64 * LINE_SPACING;

    let mut filters = vec![
        format!("scale={}:{}", width, height),
        "drawbox=x=0:y=0:w=iw:h=ih:color=black@0.4:t=fill".to_string(),
    ];

    let mut line_center = (height as f64 - lines.len() as f64 * advance) / 2.0;
    for line in &lines {
        filters.push(format!(
            "drawtext=text={}:{}:fontsize={}:fontcolor=white:borderw=3:bordercolor=black:\
             x=(w-text_w)/2:y={:.1}-text_h/2",
            drawtext_text(std::slice::from_ref(line)),
            font.filter_option(),
            font_size,
            line_center
        ));
        line_center += advance;
    }

    filters.join(",")
}

/// Best-effort thumbnail generation.
pub struct ThumbnailExtractor {
    processor: Arc<dyn MediaProcessorTrait>,
    font: FontSelection,
}

impl ThumbnailExtractor {
    pub fn new(processor: Arc<dyn MediaProcessorTrait>, font: FontSelection) -> Self {
        Self { processor, font }
    }

    /// Write a thumbnail for `video_path` to `output_path`.
    ///
    /// Returns `None` instead of an error; callers must cope without one.
    pub async fn generate(&self, video_path: &Path, title: &str, output_path: &Path) -> Option<PathBuf> {
        match self.try_generate(video_path, title, output_path).await {
            Ok(path) => {
                info!("Thumbnail written: {}", path.display());
                Some(path)
            }
            Err(e) => {
                warn!("Thumbnail generation failed for {}: {}", video_path.display(), e);
                None
            }
        }
    }

    async fn try_generate(&self, video_path: &Path, title: &str, output_path: &Path) -> Result<PathBuf> {
        let info = self.processor.probe(video_path).await?;
        let (Some(width), Some(height)) = (info.width, info.height) else {
            return Err(ReelsmithError::probe(
                format!("No video stream in {}", video_path.display()),
                None,
            ));
        };

        let timestamp = info.duration / 2.0;
        let filter = thumbnail_filter(title, width, height, &self.font);

        self.processor
            .extract_frame(video_path, timestamp, &filter, output_path)
            .await?;

        if !output_path.is_file() {
            return Err(ReelsmithError::FileNotFound(output_path.display().to_string()));
        }
        Ok(output_path.to_path_buf())
    }
}
