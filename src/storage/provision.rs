use crate::storage::ObjectStore;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::info;

/// Makes sure the model artifact exists at `local_path`, downloading
/// `bucket/key` when it does not.
///
/// The download lands in a temp file next to `local_path` and is renamed into
/// place only once complete, so an interrupted fetch never leaves a truncated
/// model behind.
pub fn ensure_model(store: &dyn ObjectStore, bucket: &str, key: &str, local_path: &Path) -> Result<()> {
    if local_path.exists() {
        info!("Model found locally at {}", local_path.display());
        return Ok(());
    }

    info!(
        "Model not found locally. Downloading {} from {} ({})...",
        key,
        bucket,
        store.describe()
    );

    let parent = match local_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)
        .with_context(|| format!("failed to create model directory {}", parent.display()))?;

    let staging = NamedTempFile::new_in(parent)
        .with_context(|| format!("failed to create staging file in {}", parent.display()))?;
    store
        .fetch(bucket, key, staging.path())
        .with_context(|| format!("failed to download model {}/{}", bucket, key))?;
    staging
        .persist(local_path)
        .with_context(|| format!("failed to move model into {}", local_path.display()))?;

    info!("Model downloaded successfully.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LocalObjectStore;
    use tempfile::TempDir;

    #[test]
    fn downloads_when_missing() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("models")).unwrap();
        fs::write(dir.path().join("models/openl3.onnx"), b"model-bytes").unwrap();
        let store = LocalObjectStore::new(dir.path());

        let target = dir.path().join("cache/nested/openl3.onnx");
        ensure_model(&store, "models", "openl3.onnx", &target).unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"model-bytes");
    }

    #[test]
    fn existing_file_is_left_alone() {
        let dir = TempDir::new().unwrap();
        let store = LocalObjectStore::new(dir.path());
        let target = dir.path().join("openl3.onnx");
        fs::write(&target, b"cached").unwrap();

        ensure_model(&store, "models", "missing.onnx", &target).unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"cached");
    }

    #[test]
    fn failed_download_leaves_nothing_behind() {
        let dir = TempDir::new().unwrap();
        let store = LocalObjectStore::new(dir.path().join("store"));
        let cache = dir.path().join("cache");
        let target = cache.join("openl3.onnx");

        assert!(ensure_model(&store, "models", "missing.onnx", &target).is_err());
        assert!(!target.exists());
        assert_eq!(fs::read_dir(&cache).unwrap().count(), 0);
    }
}
