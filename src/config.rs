use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::error::{Result, ReelsmithError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub paths: PathsConfig,
    pub script: ScriptConfig,
    pub media: MediaConfig,
    pub speech: SpeechConfig,
    pub render: RenderConfig,
    pub dubbing: DubbingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the HTTP job surface listens on
    pub bind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Root for rendered videos, thumbnails and dubs
    pub output_dir: PathBuf,
    /// Cache for downloaded media and synthesized audio
    pub download_dir: PathBuf,
    /// Background music pool; mood-specific subfolders live underneath
    pub music_dir: PathBuf,
    /// Branding overlay, composited only when the file exists
    pub logo_path: PathBuf,
    /// Caption fonts tried in order; the first existing file wins
    pub font_candidates: Vec<PathBuf>,
    /// Fontconfig family used when none of the candidates exist
    pub fallback_font_family: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptConfig {
    /// OpenAI-compatible chat completions base URL
    pub endpoint: String,
    /// LLM model used for script writing and translation
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: f32,
    pub translation_temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Stock video search endpoint
    pub endpoint: String,
    pub api_key: Option<String>,
    /// Number of search hits to choose from
    pub per_page: u32,
    /// AI image generation base URL, used when stock search comes up empty
    pub ai_image_endpoint: String,
    pub ai_image_model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Path to the edge-tts binary
    pub binary_path: String,
    pub default_voice: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Path to ffmpeg binary
    pub ffmpeg_path: String,
    /// Path to ffprobe binary
    pub ffprobe_path: String,
    /// Fade-in and fade-out length per segment (seconds)
    pub fade_duration: f64,
    /// Background music amplitude relative to the voice track
    pub music_volume: f64,
    /// Logo width as a fraction of frame width
    pub logo_width_ratio: f64,
    /// Logo distance from the top-right corner (pixels)
    pub logo_padding: u32,
    /// Additional encoder options appended before the output path
    /// Common options: ["-preset", "medium", "-crf", "23"]
    pub extra_options: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DubbingConfig {
    pub enabled: bool,
    /// Human-readable language name, also the dub's lookup key
    pub language: String,
    /// Suffix of the dubbed output file
    pub language_code: String,
    pub voice: String,
    /// Only jobs narrated with a voice containing this prefix get dubbed
    pub source_voice_prefix: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5000".to_string(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("static/output"),
            download_dir: PathBuf::from("static/downloads"),
            music_dir: PathBuf::from("static/music"),
            logo_path: PathBuf::from("static/logo.png"),
            font_candidates: vec![
                PathBuf::from("static/fonts/mangal.ttf"),
                PathBuf::from("static/fonts/NotoSansDevanagari-Regular.ttf"),
                PathBuf::from("static/fonts/arial.ttf"),
                PathBuf::from("/usr/share/fonts/truetype/noto/NotoSansDevanagari-Regular.ttf"),
                PathBuf::from("/usr/share/fonts/noto/NotoSansDevanagari-Regular.ttf"),
                PathBuf::from("/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf"),
                PathBuf::from("C:/Windows/Fonts/mangal.ttf"),
                PathBuf::from("C:/Windows/Fonts/arial.ttf"),
            ],
            fallback_font_family: "Sans".to_string(),
        }
    }
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.groq.com/openai/v1".to_string(),
            model: "llama-3.3-70b-versatile".to_string(),
            api_key: None,
            temperature: 0.7,
            translation_temperature: 0.3,
            max_tokens: 8000,
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.pexels.com/videos/search".to_string(),
            api_key: None,
            per_page: 3,
            ai_image_endpoint: "https://image.pollinations.ai/prompt".to_string(),
            ai_image_model: "flux".to_string(),
        }
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            binary_path: "edge-tts".to_string(),
            default_voice: "en-US-GuyNeural".to_string(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            fade_duration: 0.5,
            music_volume: 0.1,
            logo_width_ratio: 0.15,
            logo_padding: 20,
            extra_options: vec![
                // "-preset".to_string(), "medium".to_string(),
                // "-crf".to_string(), "23".to_string(),
            ],
        }
    }
}

impl Default for DubbingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            language: "Hindi".to_string(),
            language_code: "hi".to_string(),
            voice: "hi-IN-SwaraNeural".to_string(),
            source_voice_prefix: "en-".to_string(),
        }
    }
}

impl DubbingConfig {
    /// Whether a job narrated with `voice_id` should get a dubbed version.
    pub fn applies_to(&self, voice_id: &str) -> bool {
        if !self.enabled || !voice_id.contains(&self.source_voice_prefix) {
            return false;
        }
        // Never dub into the language the job is already narrated in
        let locale = self.voice.splitn(3, '-').take(2).collect::<Vec<_>>().join("-");
        !voice_id.contains(&locale)
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ReelsmithError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| ReelsmithError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ReelsmithError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| ReelsmithError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Let secrets and the ffmpeg location come from the environment.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("GROQ_API_KEY") {
            if !key.trim().is_empty() {
                self.script.api_key = Some(key);
            }
        }
        if let Ok(key) = std::env::var("PEXELS_API_KEY") {
            if !key.trim().is_empty() {
                self.media.api_key = Some(key);
            }
        }
        if let Ok(path) = std::env::var("FFMPEG_PATH") {
            if !path.trim().is_empty() {
                self.render.ffmpeg_path = path;
            }
        }
    }

    /// Create the output and cache directories.
    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.paths.output_dir)?;
        std::fs::create_dir_all(&self.paths.download_dir)?;
        Ok(())
    }
}
