//! # HTTP Server
//!
//! Axum front end for the embedding pipeline.
//!
//! ## Endpoints
//!
//! | Path | Description |
//! |------|-------------|
//! | `POST /inference/embeddings` | `{"path": key}` -> `{"embedding": [...], "shape": [512]}` |
//! | `GET /health` | Readiness probe, `{"status": "ok"}` |
//!
//! ## Startup
//!
//! [`startup`] connects to storage, makes sure the model artifact is cached
//! locally and builds the inference engine exactly once. The resulting
//! [`AppState`] is cloned into every handler; the engine inside is shared.

pub mod handlers;
pub mod schemas;

use crate::config::FeatureConfig;
use crate::inference::OnnxEngine;
use crate::pipeline::EmbeddingPipeline;
use crate::settings::ServeSettings;
use crate::storage::{ensure_model, ObjectStore};
use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Shared state passed to all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<EmbeddingPipeline>,
    pub store: Arc<dyn ObjectStore>,
    pub audio_bucket: String,
    pub staging_dir: PathBuf,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/inference/embeddings", post(handlers::embed_audio))
        .route("/health", get(handlers::health))
        .with_state(state)
}

/// Blocking startup: storage check, model provisioning, engine construction.
///
/// Any failure here is fatal; the caller exits non-zero.
pub fn startup(settings: &ServeSettings) -> Result<AppState> {
    let store = settings.storage.build_store()?;

    // A missing audio bucket is worth a warning, not a refusal to start.
    match store.bucket_exists(&settings.audio_bucket) {
        Ok(true) => info!(
            "Storage connected to {} (bucket: {})",
            store.describe(),
            settings.audio_bucket
        ),
        Ok(false) => warn!("Audio bucket '{}' does not exist!", settings.audio_bucket),
        Err(e) => warn!("Could not verify storage connection: {}", e),
    }

    let model = &settings.model;
    ensure_model(
        store.as_ref(),
        &model.model_bucket,
        &model.model_file,
        &model.model_local_path,
    )
    .context("model provisioning failed")?;

    info!("Loading embedding model...");
    let engine = OnnxEngine::new(&model.model_local_path, model.use_gpu, &FeatureConfig::OPENL3)
        .context("failed to load model")?;
    info!("Model loaded successfully.");

    let staging_dir = settings.staging_dir();
    std::fs::create_dir_all(&staging_dir)
        .with_context(|| format!("cannot create staging dir {}", staging_dir.display()))?;

    Ok(AppState {
        pipeline: Arc::new(EmbeddingPipeline::new(Arc::new(engine))),
        store,
        audio_bucket: settings.audio_bucket.clone(),
        staging_dir,
    })
}

/// Runs the server until Ctrl-C / SIGTERM.
pub async fn serve(settings: ServeSettings) -> Result<()> {
    let addr = settings.bind_addr;
    let state = tokio::task::spawn_blocking(move || startup(&settings))
        .await
        .context("startup task panicked")??;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server terminated unexpectedly")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
