//! Per-job pipeline: script, media, narration, render, thumbnail, dub.

use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::assembly::{AssemblyOptions, FontSelection, VideoAssembler};
use crate::config::Config;
use crate::error::{Result, ReelsmithError};
use crate::media::{MediaProcessorFactory, MediaProcessorTrait};
use crate::segment::{ScriptSegment, Segment};
use crate::services::{
    generate_or_placeholder, translate_or_original, MediaFetcher, NarrationLanguage, ScriptGenerator,
    ServiceFactory, SpeechSynthesizer,
};
use crate::thumbnail::ThumbnailExtractor;
use super::job::{DubbedVersion, JobRequest, JobStatus};
use super::registry::JobRegistry;

/// The external collaborators one pipeline run needs.
#[derive(Clone)]
pub struct PipelineServices {
    pub script: Arc<dyn ScriptGenerator>,
    pub media: Arc<dyn MediaFetcher>,
    pub speech: Arc<dyn SpeechSynthesizer>,
    pub processor: Arc<dyn MediaProcessorTrait>,
}

impl PipelineServices {
    /// Production implementations built from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            script: ServiceFactory::create_script_generator(config.script.clone()),
            media: ServiceFactory::create_media_fetcher(config.media.clone(), &config.paths.download_dir),
            speech: ServiceFactory::create_speech_synthesizer(config.speech.clone(), &config.paths.download_dir),
            processor: MediaProcessorFactory::create_processor(config.render.clone()),
        }
    }
}

/// What happened to the secondary dub pass.
///
/// The orchestrator logs and drops this; it never touches the job status.
#[derive(Debug, Clone, PartialEq)]
pub enum DubOutcome {
    Dubbed(DubbedVersion),
    /// The job's voice is not eligible for dubbing
    Skipped,
    Failed(String),
}

/// Runs jobs in the background and records their progress in the registry.
#[derive(Clone)]
pub struct JobOrchestrator {
    config: Arc<Config>,
    registry: JobRegistry,
    services: PipelineServices,
    assembler: Arc<VideoAssembler>,
    thumbnails: Arc<ThumbnailExtractor>,
}

impl JobOrchestrator {
    pub fn new(config: Config, registry: JobRegistry, services: PipelineServices) -> Self {
        let assembler = VideoAssembler::new(
            services.processor.clone(),
            config.render.clone(),
            config.paths.clone(),
        );
        let font = FontSelection::resolve(&config.paths.font_candidates, &config.paths.fallback_font_family);
        let thumbnails = ThumbnailExtractor::new(services.processor.clone(), font);

        Self {
            config: Arc::new(config),
            registry,
            services,
            assembler: Arc::new(assembler),
            thumbnails: Arc::new(thumbnails),
        }
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    /// Queue a job and start it on its own task. Returns the job id at once.
    pub async fn submit(&self, request: JobRequest) -> String {
        let job = self.registry.create(&request.prompt).await;
        let id = job.id.clone();
        info!(job_id = %id, "Job queued: {}", request.prompt);

        let orchestrator = self.clone();
        let task_id = id.clone();
        tokio::spawn(async move {
            orchestrator.process(&task_id, &request).await;
        });

        id
    }

    /// Run one job to the end on the current task.
    pub async fn process(&self, id: &str, request: &JobRequest) {
        info!(
            job_id = %id,
            "Job started: {} ({:?}, {}, {})",
            request.prompt, request.duration, request.orientation, request.mood
        );

        let segments = match self.run_primary(id, request).await {
            Ok(segments) => segments,
            Err(e) => {
                error!(job_id = %id, "Job failed: {}", e);
                if let Err(record_err) = self.registry.fail(id, e.to_string()).await {
                    error!(job_id = %id, "Failed to record job failure: {}", record_err);
                }
                return;
            }
        };

        match self.run_dub(id, &segments, request).await {
            DubOutcome::Dubbed(dub) => info!(job_id = %id, "Dubbing complete: {}", dub.path.display()),
            DubOutcome::Skipped => debug!(job_id = %id, "Dubbing not applicable to voice {}", self.voice(request)),
            DubOutcome::Failed(reason) => warn!(job_id = %id, "Dubbing failed: {}", reason),
        }
    }

    /// The request's voice, or the configured default when none was given.
    fn voice<'a>(&'a self, request: &'a JobRequest) -> &'a str {
        let voice = request.voice_id.trim();
        if voice.is_empty() {
            &self.config.speech.default_voice
        } else {
            voice
        }
    }

    fn output_path(&self, id: &str, suffix: Option<&str>) -> PathBuf {
        let name = match suffix {
            Some(suffix) => format!("{}_{}.mp4", id, suffix),
            None => format!("{}.mp4", id),
        };
        self.config.paths.output_dir.join(name)
    }

    fn assembly_options(request: &JobRequest) -> AssemblyOptions {
        AssemblyOptions {
            orientation: request.orientation,
            mood: Some(request.mood.clone()),
            background_music: request.background_music,
        }
    }

    /// Script through thumbnail. Any error here fails the job.
    async fn run_primary(&self, id: &str, request: &JobRequest) -> Result<Vec<Segment>> {
        self.registry.advance(id, JobStatus::GeneratingScript).await?;
        let voice = self.voice(request);
        let language = NarrationLanguage::from_voice(voice);
        let script = generate_or_placeholder(
            self.services.script.as_ref(),
            &request.prompt,
            request.duration.segment_count(),
            language,
        )
        .await;
        let mut segments: Vec<Segment> = script.into_iter().map(Segment::from).collect();
        self.registry.set_script(id, segments.clone()).await?;

        self.registry.advance(id, JobStatus::FetchingMedia).await?;
        for segment in &mut segments {
            segment.media_path = match self.services.media.fetch(&segment.image_query, request.orientation).await {
                Ok(path) => path,
                Err(e) => {
                    warn!(job_id = %id, "Media fetch for '{}' failed: {}", segment.image_query, e);
                    None
                }
            };
        }
        self.registry.set_script(id, segments.clone()).await?;

        self.registry.advance(id, JobStatus::GeneratingAudio).await?;
        for segment in &mut segments {
            let audio = self.services.speech.synthesize(&segment.text, voice).await?;
            segment.audio_path = Some(audio);
        }
        self.registry.set_script(id, segments.clone()).await?;

        self.registry.advance(id, JobStatus::RenderingVideo).await?;
        let output_path = self.output_path(id, None);
        let report = self
            .assembler
            .assemble(&segments, &output_path, &Self::assembly_options(request))
            .await?;

        let thumbnail_path = self.config.paths.output_dir.join(format!("{}.jpg", id));
        let thumbnail = self
            .thumbnails
            .generate(&report.output_path, &request.prompt, &thumbnail_path)
            .await;

        self.registry
            .complete(id, report.output_path, thumbnail, report.duration)
            .await?;
        info!(job_id = %id, "Job completed ({:.2}s)", report.duration);

        Ok(segments)
    }

    /// Best-effort dub of a completed job.
    pub async fn run_dub(&self, id: &str, segments: &[Segment], request: &JobRequest) -> DubOutcome {
        if !self.config.dubbing.applies_to(self.voice(request)) {
            return DubOutcome::Skipped;
        }

        info!(job_id = %id, "Auto-dubbing to {}", self.config.dubbing.language);
        let dub = match self.dub(id, segments, request).await {
            Ok(dub) => dub,
            Err(e) => return DubOutcome::Failed(e.to_string()),
        };

        match self.registry.push_dub(id, dub.clone()).await {
            Ok(()) => DubOutcome::Dubbed(dub),
            Err(e) => DubOutcome::Failed(e.to_string()),
        }
    }

    async fn dub(&self, id: &str, segments: &[Segment], request: &JobRequest) -> Result<DubbedVersion> {
        let dubbing = &self.config.dubbing;
        let script: Vec<ScriptSegment> = segments.iter().map(ScriptSegment::from).collect();

        let translation = translate_or_original(self.services.script.as_ref(), &script, &dubbing.language).await;
        if !translation.is_translated() {
            return Err(ReelsmithError::Generation(format!(
                "No {} translation available",
                dubbing.language
            )));
        }

        let mut dubbed = Vec::with_capacity(segments.len());
        for (translated, original) in translation.into_segments().into_iter().zip(segments) {
            // Media is reused as is; segments without it would be skipped anyway
            let audio_path = match original.media_path {
                Some(_) => Some(self.services.speech.synthesize(&translated.text, &dubbing.voice).await?),
                None => None,
            };
            dubbed.push(Segment {
                text: translated.text,
                image_query: translated.image_query,
                media_path: original.media_path.clone(),
                audio_path,
            });
        }

        let output_path = self.output_path(id, Some(&dubbing.language_code));
        let report = self
            .assembler
            .assemble(&dubbed, &output_path, &Self::assembly_options(request))
            .await?;

        Ok(DubbedVersion {
            lang: dubbing.language.clone(),
            path: report.output_path,
        })
    }
}
