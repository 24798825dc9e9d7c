//! msv2-inference: audio in an object-storage bucket in, acoustic embedding out.
//!
//! The interesting part is [`pipeline`]: decode, 1-second log-mel patches,
//! batched inference, mean pooling. Everything else is plumbing around it.

pub mod audio;
pub mod config;
pub mod error;
pub mod features;
pub mod inference;
pub mod pipeline;
pub mod server;
pub mod settings;
pub mod storage;

pub use config::FeatureConfig;
pub use error::{EmbedError, EmbedResult};
pub use pipeline::{Embedding, EmbeddingPipeline};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
