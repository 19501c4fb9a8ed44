//! Download cache writes.
//!
//! Cached files are reused on existence alone, so a file only appears under
//! its final name once it is complete. Writers fill a `.part` sibling first.

use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::Result;

/// In-progress name for `path`.
pub fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

/// Remove a partial file left by a failed writer.
pub async fn discard_partial(partial: &Path) {
    match tokio::fs::remove_file(partial).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove partial file {}: {}", partial.display(), e),
    }
}

/// Move a finished partial file to its final name.
pub async fn commit_partial(partial: &Path, path: &Path) -> Result<()> {
    if let Err(e) = tokio::fs::rename(partial, path).await {
        discard_partial(partial).await;
        return Err(e.into());
    }
    Ok(())
}

/// Write `bytes` to `path` through a partial file.
pub async fn write_cached(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let partial = partial_path(path);
    if let Err(e) = tokio::fs::write(&partial, bytes).await {
        discard_partial(&partial).await;
        return Err(e.into());
    }

    commit_partial(&partial, path).await
}
