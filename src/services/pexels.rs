use async_trait::async_trait;
use rand::seq::IndexedRandom;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::MediaConfig;
use crate::error::{Result, ReelsmithError};
use crate::segment::Orientation;
use super::cache::write_cached;
use super::MediaFetcher;

/// Stock video search with an AI-generated still as fallback.
pub struct PexelsMediaFetcher {
    client: reqwest::Client,
    config: MediaConfig,
    download_dir: PathBuf,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    videos: Vec<PexelsVideo>,
}

#[derive(Debug, Clone, Deserialize)]
struct PexelsVideo {
    id: u64,
    #[serde(default)]
    video_files: Vec<VideoFile>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoFile {
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    pub link: String,
}

/// Rank a rendition against the target raster: exact match first, then
/// anything at least as large, then by width.
pub fn score_video_file(file: &VideoFile, target: (u32, u32)) -> u32 {
    let width = file.width.unwrap_or(0);
    let height = file.height.unwrap_or(0);

    if (width, height) == target {
        100
    } else if width >= target.0 && height >= target.1 {
        50
    } else {
        width
    }
}

/// Highest scoring rendition; ties go to the first listed.
pub fn best_video_file(files: &[VideoFile], target: (u32, u32)) -> Option<&VideoFile> {
    files.iter().rev().max_by_key(|file| score_video_file(file, target))
}

impl PexelsMediaFetcher {
    pub fn new(config: MediaConfig, download_dir: &Path) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            download_dir: download_dir.to_path_buf(),
        }
    }

    async fn search_video(&self, query: &str, orientation: Orientation) -> Result<Option<PathBuf>> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ReelsmithError::Fetch("Pexels API key missing".to_string()))?;

        let per_page = self.config.per_page.to_string();
        let response = self
            .client
            .get(&self.config.endpoint)
            .header("Authorization", api_key)
            .query(&[
                ("query", query),
                ("per_page", per_page.as_str()),
                ("orientation", orientation.as_str()),
                ("size", "medium"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ReelsmithError::Fetch(format!(
                "Video search for '{}' failed: {}",
                query,
                response.status()
            )));
        }

        let search: SearchResponse = response.json().await?;
        let Some(video) = search.videos.choose(&mut rand::rng()).cloned() else {
            return Ok(None);
        };

        let Some(file) = best_video_file(&video.video_files, orientation.dimensions()) else {
            debug!("Video {} has no downloadable renditions", video.id);
            return Ok(None);
        };

        let path = self.download_dir.join(format!("vid_{}.mp4", video.id));
        if path.exists() {
            debug!("Reusing cached video {}", path.display());
            return Ok(Some(path));
        }

        let bytes = self.client.get(&file.link).send().await?.error_for_status()?.bytes().await?;
        write_cached(&path, &bytes).await?;

        info!("Downloaded video for '{}': {}", query, path.display());
        Ok(Some(path))
    }

    fn ai_image_url(&self, prompt: &str, orientation: Orientation, seed: u32) -> Result<reqwest::Url> {
        let mut url = reqwest::Url::parse(&self.config.ai_image_endpoint)
            .map_err(|e| ReelsmithError::Config(format!("Invalid AI image endpoint: {}", e)))?;

        url.path_segments_mut()
            .map_err(|_| ReelsmithError::Config("AI image endpoint cannot take a path".to_string()))?
            .push(prompt);

        let (width, height) = orientation.dimensions();
        url.query_pairs_mut()
            .append_pair("width", &width.to_string())
            .append_pair("height", &height.to_string())
            .append_pair("model", &self.config.ai_image_model)
            .append_pair("seed", &seed.to_string())
            .append_pair("nologo", "true");

        Ok(url)
    }

    async fn generate_ai_image(&self, prompt: &str, orientation: Orientation) -> Result<PathBuf> {
        let seed: u32 = rand::random_range(1..=99_999);
        let suffix: u32 = rand::random_range(100..=999);
        let url = self.ai_image_url(prompt, orientation, seed)?;

        info!("Generating AI image for '{}'", prompt);
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(ReelsmithError::Fetch(format!(
                "AI image generation failed: {}",
                response.status()
            )));
        }

        let bytes = response.bytes().await?;
        let path = self.download_dir.join(format!("ai_{}_{}.jpg", seed, suffix));
        write_cached(&path, &bytes).await?;

        Ok(path)
    }
}

#[async_trait]
impl MediaFetcher for PexelsMediaFetcher {
    async fn fetch(&self, query: &str, orientation: Orientation) -> Result<Option<PathBuf>> {
        match self.search_video(query, orientation).await {
            Ok(Some(path)) => return Ok(Some(path)),
            Ok(None) => info!("No videos found for '{}', trying AI image", query),
            Err(e) => warn!("Video search for '{}' failed, trying AI image: {}", query, e),
        }

        match self.generate_ai_image(query, orientation).await {
            Ok(path) => Ok(Some(path)),
            Err(e) => {
                warn!("No media for '{}': {}", query, e);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(width: u32, height: u32, link: &str) -> VideoFile {
        VideoFile {
            width: Some(width),
            height: Some(height),
            link: link.to_string(),
        }
    }

    #[test]
    fn test_scoring_prefers_exact_then_larger() {
        let target = (1920, 1080);
        assert_eq!(score_video_file(&file(1920, 1080, "a"), target), 100);
        assert_eq!(score_video_file(&file(3840, 2160, "b"), target), 50);
        assert_eq!(score_video_file(&file(1280, 720, "c"), target), 1280);

        let files = vec![file(3840, 2160, "4k"), file(2560, 1440, "qhd"), file(1920, 1080, "fhd")];
        assert_eq!(best_video_file(&files, target).unwrap().link, "fhd");
    }

    #[test]
    fn test_small_widths_beat_oversized_ranks() {
        // Raw width outranks the flat score given to oversized files
        let target = (1080, 1920);
        let files = vec![file(720, 1280, "sd"), file(2160, 3840, "4k")];
        assert_eq!(best_video_file(&files, target).unwrap().link, "sd");
    }

    #[test]
    fn test_ties_keep_first_listed() {
        let files = vec![file(3840, 2160, "first"), file(2560, 1440, "second")];
        assert_eq!(best_video_file(&files, (1920, 1080)).unwrap().link, "first");
        assert!(best_video_file(&[], (1920, 1080)).is_none());
    }

    #[test]
    fn test_ai_image_url() {
        let fetcher = PexelsMediaFetcher::new(MediaConfig::default(), Path::new("downloads"));
        let url = fetcher
            .ai_image_url("taj mahal drone shot", Orientation::Portrait, 42)
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://image.pollinations.ai/prompt/taj%20mahal%20drone%20shot\
             ?width=1080&height=1920&model=flux&seed=42&nologo=true"
        );
    }

    #[test]
    fn test_search_response_tolerates_missing_fields() {
        let search: SearchResponse = serde_json::from_str(r#"{"page": 1}"#).unwrap();
        assert!(search.videos.is_empty());

        let search: SearchResponse =
            serde_json::from_str(r#"{"videos": [{"id": 7, "video_files": [{"link": "x", "width": null}]}]}"#)
                .unwrap();
        assert_eq!(search.videos[0].id, 7);
        assert_eq!(search.videos[0].video_files[0].width, None);
    }
}
