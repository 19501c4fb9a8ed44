//! Background music selection.

use rand::seq::IndexedRandom;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Mood value meaning "no preference".
pub const RANDOM_MOOD: &str = "random";

/// Folder to draw music from: the mood subfolder when it exists and has
/// entries, the whole pool otherwise.
pub fn music_pool(music_dir: &Path, mood: Option<&str>) -> PathBuf {
    if let Some(mood) = mood.filter(|m| !m.is_empty() && !m.eq_ignore_ascii_case(RANDOM_MOOD)) {
        let specific = music_dir.join(mood);
        let has_entries = std::fs::read_dir(&specific)
            .map(|mut entries| entries.next().is_some())
            .unwrap_or(false);

        if has_entries {
            return specific;
        }
        debug!("No music for mood '{}', using the generic pool", mood);
    }

    music_dir.to_path_buf()
}

/// All `.mp3` files under `dir`, recursively, in a stable order.
pub fn collect_music_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("mp3"))
                .unwrap_or(false)
        })
        .map(|e| e.into_path())
        .collect();

    files.sort();
    files
}

/// Pick one track for the mood, or none when the pool is empty.
pub fn select_background_music(music_dir: &Path, mood: Option<&str>) -> Option<PathBuf> {
    let pool = music_pool(music_dir, mood);
    let files = collect_music_files(&pool);

    let choice = files.choose(&mut rand::rng()).cloned();
    if let Some(path) = &choice {
        info!("Adding background music: {}", path.display());
    }
    choice
}
