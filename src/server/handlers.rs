use crate::error::EmbedError;
use crate::pipeline::Embedding;
use crate::server::schemas::{ApiError, EmbeddingRequest, HealthResponse};
use crate::server::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use std::path::Path;
use tracing::{error, info};

/// Readiness probe.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// `POST /inference/embeddings`
///
/// 1. Check the key exists in the audio bucket (404 otherwise).
/// 2. Stage the object into a temp file.
/// 3. Run the pipeline on it.
///
/// Steps 2 and 3 run together on a blocking worker that owns the staging file,
/// so the file is removed on every exit path, including a dropped request.
pub async fn embed_audio(
    State(state): State<AppState>,
    payload: Result<Json<EmbeddingRequest>, JsonRejection>,
) -> Result<Json<Embedding>, ApiError> {
    let Json(body) = payload.map_err(|rejection| ApiError::unprocessable(rejection.body_text()))?;
    let key = body.path;

    let stat = {
        let store = state.store.clone();
        let bucket = state.audio_bucket.clone();
        let key = key.clone();
        tokio::task::spawn_blocking(move || store.stat(&bucket, &key))
            .await
            .map_err(|e| ApiError::internal(format!("worker failed: {}", e)))?
    };
    match stat {
        Ok(()) => {}
        Err(EmbedError::NotFound(_)) => {
            return Err(ApiError::not_found(format!("Audio file not found: {}", key)));
        }
        Err(e) => {
            error!("Storage check failed for {}: {}", key, e);
            return Err(ApiError::internal(format!("Failed to check audio file: {}", e)));
        }
    }

    let suffix = staging_suffix(&key);
    let job = {
        let state = state.clone();
        let key = key.clone();
        move || -> Result<Embedding, ApiError> {
            let staging = tempfile::Builder::new()
                .prefix("msv2-")
                .suffix(&suffix)
                .tempfile_in(&state.staging_dir)
                .map_err(|e| ApiError::internal(format!("Failed to stage audio file: {}", e)))?;

            state
                .store
                .fetch(&state.audio_bucket, &key, staging.path())
                .map_err(|e| ApiError::internal(format!("Failed to download audio file: {}", e)))?;

            info!("Generating embeddings for {}", key);
            state.pipeline.run(staging.path()).map_err(|e| {
                error!("Inference failed for {}: {}", key, e);
                ApiError::internal(format!("Inference failed: {}", e))
            })
        }
    };

    let embedding = tokio::task::spawn_blocking(job)
        .await
        .map_err(|e| ApiError::internal(format!("worker failed: {}", e)))??;

    Ok(Json(embedding))
}

/// Staging files keep the key's extension so the decoder can use it as a hint.
fn staging_suffix(key: &str) -> String {
    match Path::new(key).extension().and_then(|e| e.to_str()) {
        Some(ext) if !ext.is_empty() => format!(".{}", ext),
        _ => ".wav".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_follows_key_extension() {
        assert_eq!(staging_suffix("clips/a.mp3"), ".mp3");
        assert_eq!(staging_suffix("clips/a.tar.flac"), ".flac");
        assert_eq!(staging_suffix("clips/noext"), ".wav");
    }
}
