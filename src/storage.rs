//! Uploaded audio file storage.

use crate::error::Result;
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

/// Write uploaded audio bytes into the storage directory under a fresh name,
/// keeping the original extension. Returns the stored path.
pub async fn save_audio_file(
    bytes: &[u8],
    original_name: &str,
    storage_dir: &Path,
) -> Result<PathBuf> {
    tokio::fs::create_dir_all(storage_dir).await?;

    let extension = Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("wav");
    let file_name = format!("meeting-{}.{}", Uuid::new_v4().simple(), extension);
    let path = storage_dir.join(file_name);

    tokio::fs::write(&path, bytes).await?;
    debug!("Stored {} bytes at {}", bytes.len(), path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_keeps_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_audio_file(b"RIFF....", "standup.mp3", dir.path())
            .await
            .unwrap();
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("mp3"));
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"RIFF....");
    }

    #[tokio::test]
    async fn test_save_defaults_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_audio_file(b"data", "noext", dir.path()).await.unwrap();
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("wav"));
    }

    #[tokio::test]
    async fn test_names_are_unique() {
        let dir = tempfile::tempdir().unwrap();
        let a = save_audio_file(b"a", "x.wav", dir.path()).await.unwrap();
        let b = save_audio_file(b"b", "x.wav", dir.path()).await.unwrap();
        assert_ne!(a, b);
    }
}
