//! # Object Storage
//!
//! Audio and the model artifact live in S3-compatible buckets. The pipeline
//! never talks to storage directly: the HTTP layer stats and downloads an
//! object into a staging file, then hands the path to the pipeline.
//!
//! ## Sub-modules
//! *   `http`: Anonymous path-style S3 over HTTP (`{endpoint}/{bucket}/{key}`).
//! *   `local`: Buckets as directories under a root, for development and tests.
//! *   `provision`: Startup download of the model artifact.

pub mod http;
pub mod local;
pub mod provision;

pub use http::HttpObjectStore;
pub use local::LocalObjectStore;
pub use provision::ensure_model;

use crate::error::EmbedResult;
use std::path::Path;

/// Read access to a bucketed object store.
///
/// Calls block; async callers run them on a blocking worker.
pub trait ObjectStore: Send + Sync {
    /// Succeeds when `bucket/key` exists, otherwise `EmbedError::NotFound`.
    fn stat(&self, bucket: &str, key: &str) -> EmbedResult<()>;

    /// Copies `bucket/key` into `dest`, overwriting it.
    fn fetch(&self, bucket: &str, key: &str, dest: &Path) -> EmbedResult<()>;

    /// Whether `bucket` exists.
    fn bucket_exists(&self, bucket: &str) -> EmbedResult<bool>;

    /// Human-readable location, for logs.
    fn describe(&self) -> String;
}
