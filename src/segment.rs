use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::ReelsmithError;

/// One line of script as produced by the text-generation service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptSegment {
    pub text: String,
    pub image_query: String,
}

/// One unit of narration with the media that backs it.
///
/// Media fetch and speech synthesis fill in `media_path` and `audio_path`;
/// assembly only reads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub text: String,
    pub image_query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_path: Option<PathBuf>,
}

impl Segment {
    pub fn new(text: impl Into<String>, image_query: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            image_query: image_query.into(),
            media_path: None,
            audio_path: None,
        }
    }

    /// Media and audio paths, present only when both enrichments succeeded.
    pub fn renderable(&self) -> Option<(&Path, &Path)> {
        match (&self.media_path, &self.audio_path) {
            (Some(media), Some(audio)) => Some((media.as_path(), audio.as_path())),
            _ => None,
        }
    }
}

impl From<ScriptSegment> for Segment {
    fn from(segment: ScriptSegment) -> Self {
        Segment::new(segment.text, segment.image_query)
    }
}

impl From<&Segment> for ScriptSegment {
    fn from(segment: &Segment) -> Self {
        ScriptSegment {
            text: segment.text.clone(),
            image_query: segment.image_query.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Landscape,
    Portrait,
}

impl Orientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Landscape => "landscape",
            Orientation::Portrait => "portrait",
        }
    }

    /// Target raster (width, height).
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Orientation::Landscape => (1920, 1080),
            Orientation::Portrait => (1080, 1920),
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Orientation {
    type Err = ReelsmithError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "landscape" => Ok(Orientation::Landscape),
            "portrait" => Ok(Orientation::Portrait),
            _ => Err(ReelsmithError::Config(format!(
                "Invalid orientation '{}'. Valid values: landscape, portrait",
                s
            ))),
        }
    }
}

/// Requested video length, expressed as a target number of script segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptLength {
    #[default]
    Short,
    Medium,
    Long,
}

impl ScriptLength {
    pub fn segment_count(&self) -> usize {
        match self {
            ScriptLength::Short => 5,
            ScriptLength::Medium => 10,
            ScriptLength::Long => 20,
        }
    }
}

impl FromStr for ScriptLength {
    type Err = ReelsmithError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "short" => Ok(ScriptLength::Short),
            "medium" => Ok(ScriptLength::Medium),
            "long" => Ok(ScriptLength::Long),
            _ => Err(ReelsmithError::Config(format!(
                "Invalid duration '{}'. Valid values: short, medium, long",
                s
            ))),
        }
    }
}
