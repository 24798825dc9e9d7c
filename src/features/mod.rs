//! # Feature Extraction
//!
//! Turns a 48 kHz waveform into the batch tensor the embedding model consumes.
//!
//! ```text
//! waveform ──> PatchWindower ──(1 s window)──> MelExtractor ──> Patch (128, 199, 1)
//!                                                                   │
//!                                              assemble() <─────────┘
//!                                                  │
//!                                                  v
//!                                         Batch (N, 128, 199, 1)
//! ```
//!
//! ## Sub-modules
//! *   `filterbank`: Slaney mel scale and area-normalized filters.
//! *   `mel`: STFT magnitude, filter bank, log compression.
//! *   `patches`: 1-second windowing and patch layout.
//! *   `batch`: stacking patches into one tensor.

pub mod batch;
pub mod filterbank;
pub mod mel;
pub mod patches;

pub use batch::{assemble, Batch};
pub use mel::{MelExtractor, MelMode, MelSpectrogram};
pub use patches::{Patch, PatchWindower};
