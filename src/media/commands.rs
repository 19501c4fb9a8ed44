use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::error::{Result, ReelsmithError};

/// Abstract media processing command representation
#[derive(Debug, Clone)]
pub struct MediaCommand {
    pub binary_path: String,
    pub args: Vec<String>,
    pub description: String,
}

impl MediaCommand {
    /// Create a new media processing command
    pub fn new<S1: Into<String>, S2: Into<String>>(binary_path: S1, description: S2) -> Self {
        Self {
            binary_path: binary_path.into(),
            args: Vec::new(),
            description: description.into(),
        }
    }

    /// Add an argument
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(|s| s.into()));
        self
    }

    /// Add input file
    pub fn input<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg("-i").arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Add input file preceded by input-scoped options (e.g. `-stream_loop -1`)
    pub fn input_with<P: AsRef<Path>>(self, options: &[String], path: P) -> Self {
        self.args(options.iter().cloned()).input(path)
    }

    /// Add output file
    pub fn output<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Force overwrite output
    pub fn overwrite(self) -> Self {
        self.arg("-y")
    }

    /// Quieter backend logging; errors still reach stderr
    pub fn log_level<S: Into<String>>(self, level: S) -> Self {
        self.arg("-v").arg(level)
    }

    /// Seek before decoding
    pub fn seek(self, seconds: f64) -> Self {
        self.arg("-ss").arg(format!("{:.3}", seconds))
    }

    /// Set video codec
    pub fn video_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:v").arg(codec)
    }

    /// Set audio codec
    pub fn audio_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:a").arg(codec)
    }

    /// Set pixel format
    pub fn pixel_format<S: Into<String>>(self, format: S) -> Self {
        self.arg("-pix_fmt").arg(format)
    }

    /// Add video filter
    pub fn video_filter<S: Into<String>>(self, filter: S) -> Self {
        self.arg("-vf").arg(filter)
    }

    /// Add a complete filter graph
    pub fn filter_complex<S: Into<String>>(self, graph: S) -> Self {
        self.arg("-filter_complex").arg(graph)
    }

    /// Map a stream or filter graph label into the output
    pub fn map<S: Into<String>>(self, label: S) -> Self {
        self.arg("-map").arg(label)
    }

    /// Stop writing when the shortest output stream ends
    pub fn shortest(self) -> Self {
        self.arg("-shortest")
    }

    /// Write exactly one video frame
    pub fn single_frame(self) -> Self {
        self.arg("-frames:v").arg("1")
    }

    /// Execute the command, failing with the backend's stderr on a non-zero exit
    pub async fn execute(&self) -> Result<()> {
        let output = self.run().await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(ReelsmithError::render(
                format!("{} failed ({})", self.description, output.status),
                Some(stderr),
            ));
        }

        Ok(())
    }

    /// Execute the command and return its stdout
    pub async fn execute_capture(&self) -> Result<Vec<u8>> {
        let output = self.run().await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(ReelsmithError::probe(
                format!("{} failed ({})", self.description, output.status),
                Some(stderr),
            ));
        }

        Ok(output.stdout)
    }

    async fn run(&self) -> Result<std::process::Output> {
        debug!("Executing media processing command: {} {:?}", self.binary_path, self.args);
        debug!("Description: {}", self.description);

        Command::new(&self.binary_path)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                ReelsmithError::render(
                    format!("Failed to execute {}: {}", self.binary_path, e),
                    None,
                )
            })
    }
}

/// Builder for the commands the pipeline issues
pub struct MediaCommandBuilder {
    ffmpeg_path: String,
    ffprobe_path: String,
}

impl MediaCommandBuilder {
    /// Create a new command builder
    pub fn new<S1: Into<String>, S2: Into<String>>(ffmpeg_path: S1, ffprobe_path: S2) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            ffprobe_path: ffprobe_path.into(),
        }
    }

    /// Build ffprobe command emitting format and stream info as JSON
    pub fn probe<P: AsRef<Path>>(&self, path: P) -> MediaCommand {
        MediaCommand::new(&self.ffprobe_path, "Media probe")
            .log_level("error")
            .args(["-print_format", "json", "-show_format", "-show_streams"])
            .output(path)
    }

    /// Build single-frame still extraction command
    pub fn extract_frame<P: AsRef<Path>>(
        &self,
        video_path: P,
        timestamp: f64,
        filter: &str,
        output_path: P,
    ) -> MediaCommand {
        MediaCommand::new(&self.ffmpeg_path, "Frame extraction")
            .overwrite()
            .log_level("error")
            .seek(timestamp)
            .input(video_path)
            .single_frame()
            .video_filter(filter)
            .arg("-q:v")
            .arg("2")
            .output(output_path)
    }

    /// Build version check command
    pub fn version_check(&self) -> MediaCommand {
        MediaCommand::new(&self.ffmpeg_path, "Version check").arg("-version")
    }

    /// Build custom ffmpeg command
    pub fn custom<S: Into<String>>(&self, description: S) -> MediaCommand {
        MediaCommand::new(&self.ffmpeg_path, description.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_command_args() {
        let builder = MediaCommandBuilder::new("ffmpeg", "ffprobe");
        let cmd = builder.probe("clip.mp3");
        assert_eq!(cmd.binary_path, "ffprobe");
        assert_eq!(cmd.args.last().map(String::as_str), Some("clip.mp3"));
        assert!(cmd.args.contains(&"-show_format".to_string()));
    }

    #[test]
    fn test_extract_frame_seeks_before_input() {
        let builder = MediaCommandBuilder::new("ffmpeg", "ffprobe");
        let cmd = builder.extract_frame("out.mp4", 3.0, "null", "thumb.jpg");
        let seek = cmd.args.iter().position(|a| a == "-ss").unwrap();
        let input = cmd.args.iter().position(|a| a == "-i").unwrap();
        assert!(seek < input);
        assert_eq!(cmd.args[seek + 1], "3.000");
        assert!(cmd.args.windows(2).any(|w| w == ["-frames:v", "1"]));
    }

    #[tokio::test]
    async fn test_missing_binary_is_render_error() {
        let cmd = MediaCommand::new("/nonexistent/ffmpeg-binary", "Nothing");
        match cmd.execute().await {
            Err(ReelsmithError::Render { stderr, .. }) => assert!(stderr.is_none()),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
