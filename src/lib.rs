//! Streaming audio decode and spectrum analysis core for real-time
//! visualizers.
//!
//! A [`Session`](session::Session) turns a compressed audio file into a
//! fixed-rate mono s16 PCM stream (pulled chunk by chunk for playback) and,
//! from the same stream, a perceptually weighted, temporally smoothed
//! spectrum published as atomic snapshots for a rendering loop. A shared
//! playback clock and a cue table support timestamp-keyed event cueing such
//! as lip sync.
//!
//! Device output, input handling and all drawing belong to the embedding
//! application; this crate stops at PCM chunks, snapshots and timestamps.

pub mod audio;
pub mod cue;
pub mod error;
pub mod session;
pub mod spectrum;

pub use cue::{Cue, CueTable};
pub use error::{DecodeError, OpenError, ResamplerInitError, SessionError};
pub use session::{Session, SessionConfig};
pub use spectrum::snapshot::SpectrumSnapshot;
