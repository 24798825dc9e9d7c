//! # Audio Handling Module
//!
//! Loading, decoding and resampling raw audio into the mono waveform the
//! feature extractor expects.
//!
//! ## Sub-modules
//! *   `loader`: Symphonia decoding + Rubato resampling to the model sample rate.

pub mod loader;

pub use loader::{load_audio, Waveform};
