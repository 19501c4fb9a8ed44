//! Timeline composition: concatenation, background music and branding.

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Result, ReelsmithError};
use super::plan::SegmentRenderPlan;

/// One `-i` input together with the options that must precede it.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphInput {
    pub options: Vec<String>,
    pub path: PathBuf,
}

impl GraphInput {
    pub fn plain(path: impl AsRef<Path>) -> Self {
        Self {
            options: Vec::new(),
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Input looped indefinitely and read for exactly `duration` seconds.
    pub fn looped(path: impl AsRef<Path>, duration: f64) -> Self {
        Self {
            options: vec![
                "-stream_loop".to_string(),
                "-1".to_string(),
                "-t".to_string(),
                format!("{:.3}", duration),
            ],
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Input looped with no length cap; something downstream must cut it.
    pub fn looped_forever(path: impl AsRef<Path>) -> Self {
        Self {
            options: vec!["-stream_loop".to_string(), "-1".to_string()],
            path: path.as_ref().to_path_buf(),
        }
    }
}

/// A complete ffmpeg filter graph with its inputs and output labels.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositionGraph {
    pub inputs: Vec<GraphInput>,
    pub filter_complex: String,
    pub video_label: String,
    pub audio_label: String,
    /// Sum of segment durations; the voice track length
    pub duration: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundMusic {
    pub path: PathBuf,
    /// Linear amplitude factor
    pub volume: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Branding {
    pub path: PathBuf,
    /// Target logo width in pixels; height follows the aspect ratio
    pub width: u32,
    /// Distance from the top and right edges
    pub padding: u32,
}

/// Joins segment plans into one timeline and layers music and branding on top.
#[derive(Debug, Clone, Default)]
pub struct TimelineCompositor {
    music: Option<BackgroundMusic>,
    branding: Option<Branding>,
}

impl TimelineCompositor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_music(mut self, music: Option<BackgroundMusic>) -> Self {
        self.music = music;
        self
    }

    pub fn with_branding(mut self, branding: Option<Branding>) -> Self {
        self.branding = branding;
        self
    }

    /// Compose plans in script order.
    ///
    /// Captions are already part of each plan's chain; music and branding
    /// apply to the concatenated result.
    pub fn compose(&self, plans: &[SegmentRenderPlan]) -> Result<CompositionGraph> {
        if plans.is_empty() {
            return Err(ReelsmithError::EmptyTimeline);
        }

        let mut inputs = Vec::with_capacity(plans.len() * 2 + 2);
        let mut filters = Vec::new();
        let mut concat_pads = String::new();

        for plan in plans {
            let video_input = inputs.len();
            inputs.push(plan.media_input());
            let audio_input = inputs.len();
            inputs.push(plan.audio_input());

            let label = format!("v{}", plan.index);
            filters.push(format!("[{}:v]{}[{}]", video_input, plan.visual_chain(), label));
            // Video and audio pads alternate so each segment stays paired
            concat_pads.push_str(&format!("[{}][{}:a]", label, audio_input));
        }

        filters.push(format!(
            "{}concat=n={}:v=1:a=1[vcat][acat]",
            concat_pads,
            plans.len()
        ));

        let mut video_label = "vcat".to_string();
        let mut audio_label = "acat".to_string();

        if let Some(music) = &self.music {
            let music_input = inputs.len();
            inputs.push(GraphInput::looped_forever(&music.path));
            filters.push(format!("[{}:a]volume={:.3}[bgm]", music_input, music.volume));
            // duration=first keeps the mix as long as the voice; normalize=0 keeps the voice at full level
            filters.push(format!(
                "[{}][bgm]amix=inputs=2:duration=first:dropout_transition=0:normalize=0[amix]",
                audio_label
            ));
            audio_label = "amix".to_string();
        }

        if let Some(branding) = &self.branding {
            let logo_input = inputs.len();
            inputs.push(GraphInput::plain(&branding.path));
            filters.push(format!("[{}:v]scale={}:-1[logo]", logo_input, branding.width));
            filters.push(format!(
                "[{}][logo]overlay=W-w-{}:{}[vbrand]",
                video_label, branding.padding, branding.padding
            ));
            video_label = "vbrand".to_string();
        }

        let duration = plans.iter().map(|p| p.duration).sum();
        debug!("Composed {} segment(s), {:.3}s total", plans.len(), duration);

        Ok(CompositionGraph {
            inputs,
            filter_complex: filters.join(";"),
            video_label,
            audio_label,
            duration,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::caption::FontSelection;
    use crate::assembly::layout::{FrameLayout, ResolvedLayout};
    use crate::assembly::plan::RenderPlanBuilder;
    use crate::segment::Orientation;

    fn plan(index: usize, duration: f64) -> SegmentRenderPlan {
        let builder = RenderPlanBuilder::new(0.5, FontSelection::Family("Sans".to_string()));
        let layout = ResolvedLayout {
            frame: FrameLayout::for_orientation(Orientation::Landscape),
            duration,
        };
        builder.build(
            index,
            "caption",
            Path::new(&format!("media_{}.mp4", index)),
            Path::new(&format!("voice_{}.mp3", index)),
            &layout,
        )
    }

    #[test]
    fn test_empty_timeline_fails() {
        let err = TimelineCompositor::new().compose(&[]).unwrap_err();
        assert!(matches!(err, ReelsmithError::EmptyTimeline));
    }

    #[test]
    fn test_concat_pairs_segments_in_order() {
        // Segment 1 was dropped upstream; indices keep their gap
        let graph = TimelineCompositor::new()
            .compose(&[plan(0, 3.0), plan(2, 2.5)])
            .unwrap();

        assert_eq!(graph.inputs.len(), 4);
        assert_eq!(graph.inputs[0].path, PathBuf::from("media_0.mp4"));
        assert_eq!(graph.inputs[1].path, PathBuf::from("voice_0.mp3"));
        assert_eq!(graph.inputs[2].path, PathBuf::from("media_2.mp4"));
        assert_eq!(graph.inputs[3].path, PathBuf::from("voice_2.mp3"));

        assert!(graph.filter_complex.starts_with("[0:v]trim=duration=3.000"));
        assert!(graph.filter_complex.contains("[2:v]trim=duration=2.500"));
        assert!(graph
            .filter_complex
            .ends_with("[v0][1:a][v2][3:a]concat=n=2:v=1:a=1[vcat][acat]"));
        assert_eq!(graph.video_label, "vcat");
        assert_eq!(graph.audio_label, "acat");
        assert_eq!(graph.duration, 5.5);
    }

    #[test]
    fn test_music_mixed_to_voice_length() {
        let graph = TimelineCompositor::new()
            .with_music(Some(BackgroundMusic {
                path: PathBuf::from("music/calm/track.mp3"),
                volume: 0.1,
            }))
            .compose(&[plan(0, 3.0)])
            .unwrap();

        let music = &graph.inputs[2];
        assert_eq!(music.options, vec!["-stream_loop", "-1"]);
        assert!(graph.filter_complex.contains("[2:a]volume=0.100[bgm]"));
        assert!(graph
            .filter_complex
            .contains("[acat][bgm]amix=inputs=2:duration=first:dropout_transition=0:normalize=0[amix]"));
        assert_eq!(graph.audio_label, "amix");
        assert_eq!(graph.duration, 3.0);
    }

    #[test]
    fn test_branding_overlay_top_right() {
        let graph = TimelineCompositor::new()
            .with_music(Some(BackgroundMusic { path: PathBuf::from("m.mp3"), volume: 0.1 }))
            .with_branding(Some(Branding {
                path: PathBuf::from("logo.png"),
                width: 288,
                padding: 20,
            }))
            .compose(&[plan(0, 3.0)])
            .unwrap();

        assert_eq!(graph.inputs[3].path, PathBuf::from("logo.png"));
        assert!(graph.filter_complex.contains("[3:v]scale=288:-1[logo]"));
        assert!(graph.filter_complex.contains("[vcat][logo]overlay=W-w-20:20[vbrand]"));
        assert_eq!(graph.video_label, "vbrand");
        assert_eq!(graph.audio_label, "amix");
    }
}
