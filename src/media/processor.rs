use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, error, info, warn};

use crate::assembly::CompositionGraph;
use crate::config::RenderConfig;
use crate::error::{Result, ReelsmithError};
use super::{MediaCommand, MediaCommandBuilder, MediaInfo, MediaProcessorTrait, parse_probe_output};

/// Concrete implementation of media processor (FFmpeg-based)
pub struct MediaProcessorImpl {
    config: RenderConfig,
    command_builder: MediaCommandBuilder,
}

impl MediaProcessorImpl {
    /// Create a new media processor implementation
    pub fn new(config: RenderConfig) -> Self {
        let command_builder = MediaCommandBuilder::new(&config.ffmpeg_path, &config.ffprobe_path);

        Self {
            config,
            command_builder,
        }
    }

    /// Build the single ffmpeg invocation for a composed graph.
    ///
    /// Output contract: H.264 video, AAC audio, yuv420p, cut to the shorter track.
    pub fn render_command(&self, graph: &CompositionGraph, output_path: &Path) -> MediaCommand {
        let mut command = self.command_builder.custom("Video render").overwrite();

        for input in &graph.inputs {
            command = command.input_with(&input.options, &input.path);
        }

        command = command
            .filter_complex(&graph.filter_complex)
            .map(format!("[{}]", graph.video_label))
            .map(format!("[{}]", graph.audio_label))
            .video_codec("libx264")
            .audio_codec("aac")
            .pixel_format("yuv420p")
            .shortest();

        // Add user-specified additional options
        for option in &self.config.extra_options {
            command = command.arg(option);
        }

        command.output(output_path)
    }
}

/// Location of the persisted ffmpeg diagnostics for a failed render.
pub fn diagnostics_path(output_path: &Path) -> PathBuf {
    let mut path = output_path.as_os_str().to_owned();
    path.push(".ffmpeg.log");
    PathBuf::from(path)
}

#[async_trait]
impl MediaProcessorTrait for MediaProcessorImpl {
    async fn probe(&self, path: &Path) -> Result<MediaInfo> {
        if !path.exists() {
            return Err(ReelsmithError::probe(
                format!("Media file not found: {}", path.display()),
                None,
            ));
        }

        let raw = self.command_builder.probe(path).execute_capture().await?;
        let info = parse_probe_output(&raw)?;

        debug!("Probed {}: {:.3}s", path.display(), info.duration);
        Ok(info)
    }

    async fn render(&self, graph: &CompositionGraph, output_path: &Path) -> Result<()> {
        info!(
            "Rendering {} input(s) to {} ({:.2}s expected)",
            graph.inputs.len(),
            output_path.display(),
            graph.duration
        );

        let command = self.render_command(graph, output_path);

        if let Err(e) = command.execute().await {
            if let Some(stderr) = e.backend_stderr() {
                error!("FFmpeg error:\n{}", stderr);

                let log_path = diagnostics_path(output_path);
                if let Err(write_err) = tokio::fs::write(&log_path, stderr).await {
                    warn!("Failed to persist ffmpeg diagnostics to {}: {}", log_path.display(), write_err);
                }
            }
            return Err(e);
        }

        info!("Render completed: {}", output_path.display());
        Ok(())
    }

    async fn extract_frame(
        &self,
        video_path: &Path,
        timestamp: f64,
        filter: &str,
        output_path: &Path,
    ) -> Result<()> {
        debug!("Extracting frame at {:.3}s from {}", timestamp, video_path.display());

        self.command_builder
            .extract_frame(video_path, timestamp, filter, output_path)
            .execute()
            .await
    }

    /// Check if media processor is available
    fn check_availability(&self) -> Result<()> {
        let output = Command::new(&self.config.ffmpeg_path)
            .arg("-version")
            .output()
            .map_err(|e| ReelsmithError::Config(format!("FFmpeg not found: {}", e)))?;

        if output.status.success() {
            info!("FFmpeg is available");
            Ok(())
        } else {
            Err(ReelsmithError::Config("FFmpeg version check failed".to_string()))
        }
    }

    /// Get media processor version information
    async fn get_version_info(&self) -> Result<String> {
        let command = self.command_builder.version_check();
        let stdout = command.execute_capture().await?;

        let version_info = String::from_utf8_lossy(&stdout);
        // The first line carries the version
        let first_line = version_info.lines().next().unwrap_or("Unknown version");
        Ok(first_line.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::GraphInput;

    #[test]
    fn test_render_command_contract() {
        let config = RenderConfig {
            extra_options: vec!["-preset".to_string(), "fast".to_string()],
            ..RenderConfig::default()
        };
        let processor = MediaProcessorImpl::new(config);
        let graph = CompositionGraph {
            inputs: vec![
                GraphInput::looped("vid_1.mp4", 3.0),
                GraphInput::plain("voice.mp3"),
            ],
            filter_complex: "[0:v]null[v0];[v0][1:a]concat=n=1:v=1:a=1[vcat][acat]".to_string(),
            video_label: "vcat".to_string(),
            audio_label: "acat".to_string(),
            duration: 3.0,
        };

        let cmd = processor.render_command(&graph, Path::new("out.mp4"));
        let args = cmd.args.join(" ");

        assert!(args.starts_with("-y -stream_loop -1 -t 3.000 -i vid_1.mp4 -i voice.mp3"));
        assert!(args.contains("-map [vcat] -map [acat]"));
        assert!(args.contains("-c:v libx264 -c:a aac -pix_fmt yuv420p -shortest"));
        assert!(args.ends_with("-preset fast out.mp4"));
    }

    #[test]
    fn test_diagnostics_path_appends_suffix() {
        assert_eq!(
            diagnostics_path(Path::new("static/output/abc.mp4")),
            PathBuf::from("static/output/abc.mp4.ffmpeg.log")
        );
    }
}
