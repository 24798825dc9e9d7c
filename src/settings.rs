//! # Service Settings
//!
//! Every option is a command-line flag with an environment-variable fallback.
//! Feature-extraction constants are deliberately absent: they live in
//! [`crate::config::FeatureConfig`] and are not tunable.

use crate::storage::{HttpObjectStore, LocalObjectStore, ObjectStore};
use anyhow::{bail, Result};
use clap::{ArgAction, Args};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

/// Where buckets live.
#[derive(Args, Debug, Clone)]
pub struct StorageSettings {
    /// S3-compatible endpoint, `host[:port]`
    #[arg(long, env = "MINIO_ENDPOINT")]
    pub minio_endpoint: Option<String>,

    /// Use https for the storage endpoint
    #[arg(long, env = "MINIO_SECURE", default_value_t = false, action = ArgAction::Set)]
    pub minio_secure: bool,

    /// Serve buckets from subdirectories of this path instead of an endpoint
    #[arg(long, env = "LOCAL_STORE_ROOT")]
    pub local_store_root: Option<PathBuf>,
}

impl StorageSettings {
    pub fn build_store(&self) -> Result<Arc<dyn ObjectStore>> {
        if let Some(root) = &self.local_store_root {
            return Ok(Arc::new(LocalObjectStore::new(root.clone())));
        }
        match &self.minio_endpoint {
            Some(endpoint) => Ok(Arc::new(HttpObjectStore::new(endpoint, self.minio_secure)?)),
            None => bail!("either MINIO_ENDPOINT or LOCAL_STORE_ROOT must be set"),
        }
    }
}

/// Where the model artifact comes from and how it runs.
#[derive(Args, Debug, Clone)]
pub struct ModelSettings {
    /// Bucket holding the model artifact
    #[arg(long, env = "MODEL_BUCKET")]
    pub model_bucket: String,

    /// Object key of the model artifact
    #[arg(long, env = "MODEL_FILE")]
    pub model_file: String,

    /// Local cache path for the model; downloaded when missing
    #[arg(long, env = "MODEL_LOCAL_PATH")]
    pub model_local_path: PathBuf,

    /// Request the CUDA execution provider (needs the `cuda` build feature)
    #[arg(long, env = "USE_GPU", default_value_t = false, action = ArgAction::Set)]
    pub use_gpu: bool,
}

/// Everything `serve` needs.
#[derive(Args, Debug, Clone)]
pub struct ServeSettings {
    /// Bucket that request paths refer to
    #[arg(long, env = "AUDIO_BUCKET")]
    pub audio_bucket: String,

    /// Address the HTTP server listens on
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8000")]
    pub bind_addr: SocketAddr,

    /// Directory for per-request staging files (defaults to the system temp dir)
    #[arg(long, env = "STAGING_DIR")]
    pub staging_dir: Option<PathBuf>,

    #[command(flatten)]
    pub storage: StorageSettings,

    #[command(flatten)]
    pub model: ModelSettings,
}

impl ServeSettings {
    pub fn staging_dir(&self) -> PathBuf {
        self.staging_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}
