use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP job server
    Serve {
        /// Address to listen on (overrides the config file)
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Create one video from a prompt and wait for it
    Create {
        /// Topic, question or full script
        #[arg(short, long)]
        prompt: String,

        /// Script length: short, medium or long
        #[arg(short, long, default_value = "short")]
        duration: String,

        /// Narration voice (defaults to speech.default_voice from the config)
        #[arg(long)]
        voice: Option<String>,

        /// Frame orientation: landscape or portrait
        #[arg(short, long, default_value = "landscape")]
        orientation: String,

        /// Background music mood (subfolder of the music directory)
        #[arg(short, long, default_value = "random")]
        mood: String,

        /// Disable background music
        #[arg(long)]
        no_music: bool,
    },

    /// Assemble a video from already resolved segments
    Assemble {
        /// JSON array of segments with media_path and audio_path
        #[arg(short, long)]
        script: PathBuf,

        /// Output video file
        #[arg(short, long)]
        output: PathBuf,

        /// Frame orientation: landscape or portrait
        #[arg(long, default_value = "landscape")]
        orientation: String,

        /// Background music mood
        #[arg(short, long)]
        mood: Option<String>,

        /// Disable background music
        #[arg(long)]
        no_music: bool,
    },

    /// Generate a title thumbnail for a video
    Thumbnail {
        /// Input video file
        #[arg(short, long)]
        video: PathBuf,

        /// Title drawn on the frame
        #[arg(short, long)]
        title: String,

        /// Output image file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Write the default configuration to a file
    InitConfig {
        /// Output configuration file
        #[arg(short, long, default_value = "reelsmith.toml")]
        output: PathBuf,
    },

    /// Check that ffmpeg is available
    Check,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_defaults() {
        let args = Args::parse_from(["reelsmith", "create", "--prompt", "Facts about cars"]);
        match args.command {
            Commands::Create { prompt, duration, voice, orientation, mood, no_music } => {
                assert_eq!(prompt, "Facts about cars");
                assert_eq!(duration, "short");
                assert_eq!(voice, None);
                assert_eq!(orientation, "landscape");
                assert_eq!(mood, "random");
                assert!(!no_music);
            }
            _ => panic!("expected create"),
        }
    }

    #[test]
    fn test_global_flags() {
        let args = Args::parse_from(["reelsmith", "-v", "--config", "custom.toml", "serve", "--bind", "0.0.0.0:8080"]);
        assert!(args.verbose);
        assert_eq!(args.config, Some(PathBuf::from("custom.toml")));
        assert!(matches!(args.command, Commands::Serve { bind: Some(ref b) } if b == "0.0.0.0:8080"));
    }
}
