//! Timing and layout resolution for one segment.

use std::path::Path;

use crate::error::Result;
use crate::media::MediaProcessorTrait;
use crate::segment::Orientation;

/// Horizontal margin kept free of caption text on each side (pixels).
const CAPTION_MARGIN: u32 = 100;

/// Reference font size the caption character budget is derived from.
const CAPTION_WRAP_FONT_SIZE: u32 = 60;

/// Title font size on thumbnails as a fraction of frame height.
const THUMBNAIL_FONT_RATIO: f64 = 0.10;

/// Raster and caption geometry for one orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLayout {
    pub orientation: Orientation,
    pub width: u32,
    pub height: u32,
}

impl FrameLayout {
    pub fn for_orientation(orientation: Orientation) -> Self {
        let (width, height) = orientation.dimensions();
        Self {
            orientation,
            width,
            height,
        }
    }

    /// In-video caption size. Portrait frames are narrower, so captions get
    /// a larger size relative to width but a smaller share of height.
    pub fn caption_font_size(&self) -> u32 {
        match self.orientation {
            Orientation::Landscape => 50,
            Orientation::Portrait => 60,
        }
    }

    /// Greedy-wrap budget for in-video captions.
    pub fn caption_chars_per_line(&self) -> usize {
        let usable = self.width.saturating_sub(2 * CAPTION_MARGIN);
        ((usable / (CAPTION_WRAP_FONT_SIZE / 2)) as usize).max(1)
    }
}

/// Thumbnail title size for a frame of the given height.
pub fn thumbnail_font_size(height: u32) -> u32 {
    ((height as f64 * THUMBNAIL_FONT_RATIO) as u32).max(1)
}

/// Thumbnail title wrap budget; portrait frames get a narrower threshold.
pub fn thumbnail_chars_per_line(width: u32, height: u32) -> usize {
    if width < height { 10 } else { 15 }
}

/// A segment's frame layout plus its on-screen time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedLayout {
    pub frame: FrameLayout,
    /// Seconds on screen; always the probed narration length
    pub duration: f64,
}

/// Probe the narration and pair its duration with the frame layout.
///
/// The audio drives timing: the visual is later looped or cut to match.
pub async fn resolve_layout(
    processor: &dyn MediaProcessorTrait,
    audio_path: &Path,
    frame: FrameLayout,
) -> Result<ResolvedLayout> {
    let info = processor.probe(audio_path).await?;
    Ok(ResolvedLayout {
        frame,
        duration: info.duration,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReelsmithError;
    use crate::media::{MediaInfo, MockMediaProcessorTrait};

    #[test]
    fn test_caption_geometry() {
        let landscape = FrameLayout::for_orientation(Orientation::Landscape);
        assert_eq!((landscape.width, landscape.height), (1920, 1080));
        assert_eq!(landscape.caption_chars_per_line(), 57);
        assert_eq!(landscape.caption_font_size(), 50);

        let portrait = FrameLayout::for_orientation(Orientation::Portrait);
        assert_eq!((portrait.width, portrait.height), (1080, 1920));
        assert_eq!(portrait.caption_chars_per_line(), 29);
        assert!(portrait.caption_chars_per_line() < landscape.caption_chars_per_line());
    }

    #[test]
    fn test_thumbnail_geometry() {
        assert_eq!(thumbnail_font_size(1080), 108);
        assert_eq!(thumbnail_chars_per_line(1920, 1080), 15);
        assert_eq!(thumbnail_chars_per_line(1080, 1920), 10);
    }

    #[tokio::test]
    async fn test_resolve_uses_audio_duration() {
        let mut processor = MockMediaProcessorTrait::new();
        processor.expect_probe().returning(|_| {
            Ok(MediaInfo { duration: 4.25, width: None, height: None, has_audio: true })
        });

        let frame = FrameLayout::for_orientation(Orientation::Portrait);
        let resolved = resolve_layout(&processor, Path::new("voice.mp3"), frame).await.unwrap();
        assert_eq!(resolved.duration, 4.25);
        assert_eq!(resolved.frame, frame);
    }

    #[tokio::test]
    async fn test_resolve_propagates_probe_error() {
        let mut processor = MockMediaProcessorTrait::new();
        processor
            .expect_probe()
            .returning(|_| Err(ReelsmithError::probe("corrupt", Some("moov atom not found".into()))));

        let frame = FrameLayout::for_orientation(Orientation::Landscape);
        let err = resolve_layout(&processor, Path::new("bad.mp3"), frame).await.unwrap_err();
        assert_eq!(err.backend_stderr(), Some("moov atom not found"));
    }
}
