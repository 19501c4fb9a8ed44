//! Reelsmith - Prompt-to-Video Pipeline
//!
//! This is the main entry point for the Reelsmith application, which turns a
//! prompt into a narrated, captioned video using an LLM, stock media,
//! edge-tts and ffmpeg.

use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn, Level};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use reelsmith::assembly::{AssemblyOptions, FontSelection, VideoAssembler};
use reelsmith::cli::{Args, Commands};
use reelsmith::config::Config;
use reelsmith::jobs::{JobOrchestrator, JobRegistry, JobRequest, JobStatus, PipelineServices};
use reelsmith::media::MediaProcessorFactory;
use reelsmith::segment::{Orientation, ScriptLength, Segment};
use reelsmith::server::{self, AppState};
use reelsmith::thumbnail::ThumbnailExtractor;

const DEFAULT_CONFIG_FILE: &str = "reelsmith.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // Secrets may live in .env
    dotenvy::dotenv().ok();

    // Parse command line arguments
    let args = Args::parse();

    // Setup logging to both console and file
    setup_logging(args.verbose)?;

    // Load configuration
    let mut config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if Path::new(DEFAULT_CONFIG_FILE).exists() {
                info!("Found {} in current directory, loading...", DEFAULT_CONFIG_FILE);
                Config::from_file(DEFAULT_CONFIG_FILE)?
            } else {
                Config::default()
            }
        }
    };
    config.apply_env_overrides();

    match args.command {
        Commands::Serve { bind } => {
            config.ensure_directories()?;
            let bind = bind.unwrap_or_else(|| config.server.bind.clone());

            let services = PipelineServices::from_config(&config);
            if let Err(e) = services.processor.check_availability() {
                warn!("Media backend unavailable, renders will fail: {}", e);
            }

            let orchestrator = JobOrchestrator::new(config, JobRegistry::new(), services);
            server::serve(&bind, AppState::new(orchestrator)).await?;
        }
        Commands::Create { prompt, duration, voice, orientation, mood, no_music } => {
            config.ensure_directories()?;
            let request = JobRequest {
                prompt,
                duration: duration.parse::<ScriptLength>()?,
                voice_id: voice.unwrap_or_default(),
                orientation: orientation.parse::<Orientation>()?,
                mood,
                background_music: !no_music,
            };
            create_video(config, request).await?;
        }
        Commands::Assemble { script, output, orientation, mood, no_music } => {
            info!("Assembling segments from: {}", script.display());

            let content = std::fs::read_to_string(&script)?;
            let segments: Vec<Segment> = serde_json::from_str(&content)?;
            let options = AssemblyOptions {
                orientation: orientation.parse::<Orientation>()?,
                mood,
                background_music: !no_music,
            };

            let processor = MediaProcessorFactory::create_processor(config.render.clone());
            processor.check_availability()?;
            let assembler = VideoAssembler::new(processor, config.render.clone(), config.paths.clone());
            let report = assembler.assemble(&segments, &output, &options).await?;

            println!(
                "Rendered {} segment(s), {} skipped, {:.2}s -> {}",
                report.segments_rendered,
                report.segments_skipped,
                report.duration,
                report.output_path.display()
            );
        }
        Commands::Thumbnail { video, title, output } => {
            info!("Generating thumbnail for: {}", video.display());

            let processor = MediaProcessorFactory::create_processor(config.render.clone());
            let font = FontSelection::resolve(&config.paths.font_candidates, &config.paths.fallback_font_family);
            let extractor = ThumbnailExtractor::new(processor, font);

            match extractor.generate(&video, &title, &output).await {
                Some(path) => println!("Thumbnail written to {}", path.display()),
                None => anyhow::bail!("Thumbnail generation failed for {}", video.display()),
            }
        }
        Commands::InitConfig { output } => {
            Config::default().save_to_file(&output)?;
            println!("Default configuration written to {}", output.display());
        }
        Commands::Check => {
            let processor = MediaProcessorFactory::create_processor(config.render.clone());
            processor.check_availability()?;
            println!("{}", processor.get_version_info().await?);
        }
    }

    Ok(())
}

/// Run one job in-process, showing progress until it and its dub finish
async fn create_video(config: Config, request: JobRequest) -> Result<()> {
    let services = PipelineServices::from_config(&config);
    let registry = JobRegistry::new();
    let orchestrator = JobOrchestrator::new(config, registry.clone(), services);

    let job = registry.create(&request.prompt).await;
    let id = job.id.clone();

    let worker = {
        let orchestrator = orchestrator.clone();
        let id = id.clone();
        tokio::spawn(async move { orchestrator.process(&id, &request).await })
    };

    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% {msg}")?
            .progress_chars("#>-"),
    );

    loop {
        if let Some(job) = registry.get(&id).await {
            pb.set_position(job.progress as u64);
            pb.set_message(job.status.to_string());
            if job.is_terminal() {
                break;
            }
        }
        tokio::time::sleep(Duration::from_millis(250)).await;
    }
    pb.finish();

    // Dubbing continues after the job is marked completed
    worker.await?;

    let job = registry
        .get(&id)
        .await
        .ok_or_else(|| anyhow::anyhow!("Job {} disappeared", id))?;
    println!("{}", serde_json::to_string_pretty(&job)?);

    if job.status == JobStatus::Failed {
        anyhow::bail!("Job failed: {}", job.error.unwrap_or_default());
    }
    Ok(())
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<()> {
    // Create log directory
    let app_dir = std::env::current_dir()?.join(".reelsmith");
    let log_dir = app_dir.join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(&log_dir, "reelsmith.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(guard);

    // Determine log level
    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    // Create console layer
    let console_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    // Create file layer
    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false); // No ANSI colors in file

    // Setup layered subscriber
    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer);

    subscriber
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!(
        "Logging initialized - console: {}, file: {}",
        log_level,
        log_dir.join("reelsmith.log").display()
    );

    Ok(())
}
