//! Chunked reconstruction pipeline
//!
//! ```text
//! channel ─► planner ─► padded chunks ─► oracle ─► trim ─► loudness match
//!                                                            │
//!            reconstructed channel ◄─ overlap-add ◄─ crossfade
//! ```
//!
//! The coordinator runs this per channel; the ensemble optionally blends the
//! result with a reference afterwards.

pub mod coordinator;
pub mod crossfade;
pub mod ensemble;
pub mod planner;
pub mod reconstructor;

pub use coordinator::{reconstruct_audio, ChunkingOptions, Reconstruction, RunResources};
pub use crossfade::{ChunkPosition, CrossfadeWindow};
pub use ensemble::{blend, match_length, EnsembleSettings};
pub use planner::{
    chunk_samples_for, extract_padded, plan_chunks, ChunkDescriptor, ChunkPlan, OutputGeometry, Seams,
};
pub use reconstructor::{reconstruct_channel, ChunkReport, ReconstructionBuffer, ReconstructionContext};
