use crate::error::{EmbedError, EmbedResult};
use crate::storage::ObjectStore;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Buckets are subdirectories of `root`; keys are relative paths inside them.
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolves `bucket/key`, refusing anything that could step outside the bucket.
    fn resolve(&self, bucket: &str, key: &str) -> EmbedResult<PathBuf> {
        let key_path = Path::new(key);
        let escapes = key_path
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if bucket.is_empty() || key.is_empty() || escapes || bucket.contains(['/', '\\']) {
            return Err(EmbedError::NotFound(format!("{}/{}", bucket, key)));
        }
        Ok(self.root.join(bucket).join(key_path))
    }
}

impl ObjectStore for LocalObjectStore {
    fn stat(&self, bucket: &str, key: &str) -> EmbedResult<()> {
        let path = self.resolve(bucket, key)?;
        if path.is_file() {
            Ok(())
        } else {
            Err(EmbedError::NotFound(format!("{}/{}", bucket, key)))
        }
    }

    fn fetch(&self, bucket: &str, key: &str, dest: &Path) -> EmbedResult<()> {
        let path = self.resolve(bucket, key)?;
        if !path.is_file() {
            return Err(EmbedError::NotFound(format!("{}/{}", bucket, key)));
        }
        fs::copy(&path, dest).map_err(|e| {
            EmbedError::Storage(format!("copy {} -> {}: {}", path.display(), dest.display(), e))
        })?;
        Ok(())
    }

    fn bucket_exists(&self, bucket: &str) -> EmbedResult<bool> {
        Ok(self.root.join(bucket).is_dir())
    }

    fn describe(&self) -> String {
        format!("local:{}", self.root.display())
    }
}
