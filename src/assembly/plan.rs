//! Per-segment render plans: the ordered visual stages plus the narration reference.

use std::path::{Path, PathBuf};

use super::caption::{drawtext_text, wrap_text, FontSelection};
use super::layout::ResolvedLayout;
use super::timeline::GraphInput;

/// Caption burned into a segment.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionOverlay {
    pub lines: Vec<String>,
    pub font: FontSelection,
    pub font_size: u32,
}

impl CaptionOverlay {
    /// drawtext anchored on the bottom quarter, centered, outlined, boxed.
    pub fn filter(&self) -> String {
        format!(
            "drawtext=text={}:{}:fontsize={}:fontcolor=white:borderw=3:bordercolor=black:\
             x=(w-text_w)/2:y=h-h/4:box=1:boxcolor=black@0.5:boxborderw=10",
            drawtext_text(&self.lines),
            self.font.filter_option(),
            self.font_size
        )
    }
}

/// One visual transform, in the order they are applied.
#[derive(Debug, Clone, PartialEq)]
pub enum VisualStage {
    /// Loop short media and cut long media to exactly `duration`
    LoopTrim { duration: f64 },
    /// Scale preserving aspect ratio until the raster is fully covered
    ScaleCover { width: u32, height: u32 },
    /// Cut the overflow from the center
    CenterCrop { width: u32, height: u32 },
    /// Normalize sample aspect ratio to 1:1
    SquarePixels,
    FadeIn { duration: f64 },
    FadeOut { start: f64, duration: f64 },
    Caption(CaptionOverlay),
}

impl VisualStage {
    pub fn filter(&self) -> String {
        match self {
            VisualStage::LoopTrim { duration } => {
                format!("trim=duration={:.3},setpts=PTS-STARTPTS", duration)
            }
            VisualStage::ScaleCover { width, height } => {
                format!("scale={}:{}:force_original_aspect_ratio=increase", width, height)
            }
            VisualStage::CenterCrop { width, height } => format!("crop={}:{}", width, height),
            VisualStage::SquarePixels => "setsar=1/1".to_string(),
            VisualStage::FadeIn { duration } => format!("fade=t=in:st=0:d={:.3}", duration),
            VisualStage::FadeOut { start, duration } => {
                format!("fade=t=out:st={:.3}:d={:.3}", start, duration)
            }
            VisualStage::Caption(caption) => caption.filter(),
        }
    }
}

/// Everything needed to composite one segment.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentRenderPlan {
    /// Position in the original script
    pub index: usize,
    /// Seconds on screen, equal to the probed narration length
    pub duration: f64,
    pub media_path: PathBuf,
    pub audio_path: PathBuf,
    pub stages: Vec<VisualStage>,
    pub caption_lines: Vec<String>,
    pub crop_target: (u32, u32),
}

impl SegmentRenderPlan {
    /// The visual stages as one comma-separated filter chain.
    pub fn visual_chain(&self) -> String {
        self.stages
            .iter()
            .map(VisualStage::filter)
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Source media opened looping, capped at the segment duration.
    pub fn media_input(&self) -> GraphInput {
        GraphInput::looped(&self.media_path, self.duration)
    }

    /// Narration passed through untouched.
    pub fn audio_input(&self) -> GraphInput {
        GraphInput::plain(&self.audio_path)
    }
}

/// Turns resolved segments into render plans.
#[derive(Debug, Clone)]
pub struct RenderPlanBuilder {
    fade_duration: f64,
    font: FontSelection,
}

impl RenderPlanBuilder {
    pub fn new(fade_duration: f64, font: FontSelection) -> Self {
        Self {
            fade_duration,
            font,
        }
    }

    pub fn build(
        &self,
        index: usize,
        text: &str,
        media_path: &Path,
        audio_path: &Path,
        layout: &ResolvedLayout,
    ) -> SegmentRenderPlan {
        let frame = layout.frame;
        let duration = layout.duration;
        let caption_lines = wrap_text(text, frame.caption_chars_per_line());

        let mut stages = vec![
            VisualStage::LoopTrim { duration },
            VisualStage::ScaleCover { width: frame.width, height: frame.height },
            VisualStage::CenterCrop { width: frame.width, height: frame.height },
            VisualStage::SquarePixels,
            VisualStage::FadeIn { duration: self.fade_duration },
            VisualStage::FadeOut {
                start: (duration - self.fade_duration).max(0.0),
                duration: self.fade_duration,
            },
        ];

        if !caption_lines.is_empty() {
            stages.push(VisualStage::Caption(CaptionOverlay {
                lines: caption_lines.clone(),
                font: self.font.clone(),
                font_size: frame.caption_font_size(),
            }));
        }

        SegmentRenderPlan {
            index,
            duration,
            media_path: media_path.to_path_buf(),
            audio_path: audio_path.to_path_buf(),
            stages,
            caption_lines,
            crop_target: (frame.width, frame.height),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::layout::FrameLayout;
    use crate::segment::Orientation;

    fn layout(orientation: Orientation, duration: f64) -> ResolvedLayout {
        ResolvedLayout {
            frame: FrameLayout::for_orientation(orientation),
            duration,
        }
    }

    fn builder() -> RenderPlanBuilder {
        RenderPlanBuilder::new(0.5, FontSelection::Family("Sans".to_string()))
    }

    #[test]
    fn test_stage_order() {
        let plan = builder().build(
            0,
            "Taj Mahal is a symbol of love.",
            Path::new("vid_1.mp4"),
            Path::new("a.mp3"),
            &layout(Orientation::Landscape, 3.0),
        );

        let kinds: Vec<&str> = plan
            .stages
            .iter()
            .map(|s| match s {
                VisualStage::LoopTrim { .. } => "loop",
                VisualStage::ScaleCover { .. } => "scale",
                VisualStage::CenterCrop { .. } => "crop",
                VisualStage::SquarePixels => "sar",
                VisualStage::FadeIn { .. } => "fade-in",
                VisualStage::FadeOut { .. } => "fade-out",
                VisualStage::Caption(_) => "caption",
            })
            .collect();
        assert_eq!(kinds, vec!["loop", "scale", "crop", "sar", "fade-in", "fade-out", "caption"]);
        assert_eq!(plan.crop_target, (1920, 1080));
        assert_eq!(plan.duration, 3.0);
    }

    #[test]
    fn test_fade_out_ends_on_last_frame() {
        let plan = builder().build(
            0,
            "text",
            Path::new("m.mp4"),
            Path::new("a.mp3"),
            &layout(Orientation::Portrait, 4.5),
        );
        assert!(plan.stages.contains(&VisualStage::FadeOut { start: 4.0, duration: 0.5 }));
        assert!(plan.visual_chain().contains("fade=t=out:st=4.000:d=0.500"));
    }

    #[test]
    fn test_visual_chain_filters() {
        let plan = builder().build(
            2,
            "Hello: world",
            Path::new("m.mp4"),
            Path::new("a.mp3"),
            &layout(Orientation::Portrait, 3.0),
        );
        let chain = plan.visual_chain();

        assert!(chain.starts_with(
            "trim=duration=3.000,setpts=PTS-STARTPTS,scale=1080:1920:force_original_aspect_ratio=increase,\
             crop=1080:1920,setsar=1/1,fade=t=in:st=0:d=0.500"
        ));
        assert!(chain.contains("drawtext=text=Hello\\\\: world:font=Sans:fontsize=60"));
        assert!(chain.contains("y=h-h/4"));
        assert!(chain.contains("boxcolor=black@0.5"));
    }

    #[test]
    fn test_empty_text_has_no_caption() {
        let plan = builder().build(
            0,
            "  ",
            Path::new("m.mp4"),
            Path::new("a.mp3"),
            &layout(Orientation::Landscape, 2.0),
        );
        assert!(plan.caption_lines.is_empty());
        assert!(!plan.stages.iter().any(|s| matches!(s, VisualStage::Caption(_))));
    }

    #[test]
    fn test_media_input_loops_to_duration() {
        let plan = builder().build(
            0,
            "x",
            Path::new("m.jpg"),
            Path::new("a.mp3"),
            &layout(Orientation::Landscape, 2.5),
        );
        assert_eq!(plan.media_input().options, vec!["-stream_loop", "-1", "-t", "2.500"]);
        assert!(plan.audio_input().options.is_empty());
    }
}
