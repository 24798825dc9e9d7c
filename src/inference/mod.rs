//! # Inference
//!
//! The embedding model is consumed as an opaque capability: a batch tensor in,
//! one output row per patch out. It is expensive to build, so it is constructed
//! once at startup and handed to the pipeline as an `Arc<dyn InferenceEngine>`.
//!
//! ## Sub-modules
//! *   `onnx`: ONNX Runtime backed engine.
//! *   `aggregate`: mean pooling of per-patch outputs.

pub mod aggregate;
pub mod onnx;

pub use aggregate::mean_pool;
pub use onnx::OnnxEngine;

use crate::error::EmbedResult;
use crate::features::Batch;
use ndarray::Array2;

/// Maps a `(N, mel, time, 1)` batch to an `(N, D)` matrix, row `i` belonging to patch `i`.
///
/// Implementations must be safe to call from many request workers; the ONNX
/// engine serializes calls behind a mutex.
pub trait InferenceEngine: Send + Sync {
    fn infer(&self, batch: &Batch) -> EmbedResult<Array2<f32>>;
}
