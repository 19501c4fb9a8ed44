// Video assembly pipeline
//
// Segments flow through these stages, leaves first:
// - Layout: narration timing and frame geometry
// - Caption: wrapping, escaping and font selection
// - Plan: the per-segment visual stage sequence
// - Timeline: concatenation plus music and branding
// - Music: background track selection

pub mod caption;
pub mod layout;
pub mod music;
pub mod plan;
pub mod timeline;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

pub use caption::FontSelection;
pub use layout::{FrameLayout, ResolvedLayout};
pub use plan::{RenderPlanBuilder, SegmentRenderPlan, VisualStage};
pub use timeline::{BackgroundMusic, Branding, CompositionGraph, GraphInput, TimelineCompositor};

use crate::config::{PathsConfig, RenderConfig};
use crate::error::Result;
use crate::media::MediaProcessorTrait;
use crate::segment::{Orientation, Segment};

/// Per-call assembly choices.
#[derive(Debug, Clone, Default)]
pub struct AssemblyOptions {
    pub orientation: Orientation,
    /// Music subfolder to prefer; `None` or "random" uses the whole pool
    pub mood: Option<String>,
    pub background_music: bool,
}

/// Outcome of one successful assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct AssemblyReport {
    pub output_path: PathBuf,
    /// Sum of the rendered segments' narration lengths
    pub duration: f64,
    pub segments_rendered: usize,
    pub segments_skipped: usize,
}

/// Turns a segment list into one rendered video.
pub struct VideoAssembler {
    processor: Arc<dyn MediaProcessorTrait>,
    render: RenderConfig,
    paths: PathsConfig,
}

impl VideoAssembler {
    pub fn new(processor: Arc<dyn MediaProcessorTrait>, render: RenderConfig, paths: PathsConfig) -> Self {
        Self {
            processor,
            render,
            paths,
        }
    }

    /// Resolve and plan every segment that has both media and audio.
    ///
    /// Returns the plans in script order and the number of segments skipped.
    pub async fn plan(
        &self,
        segments: &[Segment],
        orientation: Orientation,
    ) -> Result<(Vec<SegmentRenderPlan>, usize)> {
        let frame = FrameLayout::for_orientation(orientation);
        let font = FontSelection::resolve(&self.paths.font_candidates, &self.paths.fallback_font_family);
        let builder = RenderPlanBuilder::new(self.render.fade_duration, font);

        let mut plans = Vec::with_capacity(segments.len());
        let mut skipped = 0;

        for (index, segment) in segments.iter().enumerate() {
            let Some((media, audio)) = segment.renderable() else {
                warn!("Skipping segment {} with missing media or audio", index);
                skipped += 1;
                continue;
            };

            let layout = layout::resolve_layout(self.processor.as_ref(), audio, frame).await?;
            plans.push(builder.build(index, &segment.text, media, audio, &layout));
        }

        Ok((plans, skipped))
    }

    /// Build the full composition graph without rendering it.
    pub async fn compose(&self, segments: &[Segment], options: &AssemblyOptions) -> Result<(CompositionGraph, usize)> {
        let (plans, skipped) = self.plan(segments, options.orientation).await?;

        let music = if options.background_music {
            music::select_background_music(&self.paths.music_dir, options.mood.as_deref()).map(|path| {
                BackgroundMusic {
                    path,
                    volume: self.render.music_volume,
                }
            })
        } else {
            None
        };

        let branding = self.branding(options.orientation);

        let graph = TimelineCompositor::new()
            .with_music(music)
            .with_branding(branding)
            .compose(&plans)?;

        Ok((graph, skipped))
    }

    /// Assemble `segments` into `output_path`.
    pub async fn assemble(
        &self,
        segments: &[Segment],
        output_path: &Path,
        options: &AssemblyOptions,
    ) -> Result<AssemblyReport> {
        let (graph, skipped) = self.compose(segments, options).await?;
        let rendered = segments.len() - skipped;

        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        info!(
            "Assembling {} segment(s) ({} skipped) into {}",
            rendered,
            skipped,
            output_path.display()
        );
        self.processor.render(&graph, output_path).await?;

        Ok(AssemblyReport {
            output_path: output_path.to_path_buf(),
            duration: graph.duration,
            segments_rendered: rendered,
            segments_skipped: skipped,
        })
    }

    fn branding(&self, orientation: Orientation) -> Option<Branding> {
        if !self.paths.logo_path.is_file() {
            return None;
        }

        let (width, _) = orientation.dimensions();
        Some(Branding {
            path: self.paths.logo_path.clone(),
            width: (width as f64 * self.render.logo_width_ratio).round() as u32,
            padding: self.render.logo_padding,
        })
    }
}
