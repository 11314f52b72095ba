use std::path::PathBuf;
use thiserror::Error;

/// Failures while opening a source file. All of these are fatal at session
/// start; there is no retry path.
#[derive(Debug, Error)]
pub enum OpenError {
    #[error("failed to open {path}: {source}")]
    NotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no audio track in {path}")]
    NoAudioTrack { path: PathBuf },

    #[error("unsupported codec or container: {0}")]
    UnsupportedCodec(#[from] symphonia::core::errors::Error),
}

/// Resampler construction failure (incompatible rate/layout). Fatal at
/// pipeline construction time, never per-frame.
#[derive(Debug, Error)]
#[error("failed to initialize resampler ({src_rate} Hz -> {dst_rate} Hz): {source}")]
pub struct ResamplerInitError {
    pub src_rate: u32,
    pub dst_rate: u32,
    #[source]
    pub source: rubato::ResamplerConstructionError,
}

/// Mid-stream decode failure. Fatal for the current session: the pipeline
/// does not attempt to skip corrupted packets. End of stream is *not* a
/// `DecodeError`; it is signalled as `Ok(None)` from the decoder.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("error reading packet: {0}")]
    Demux(#[source] symphonia::core::errors::Error),

    #[error("error decoding packet: {0}")]
    Codec(#[source] symphonia::core::errors::Error),

    #[error("resampler failed mid-stream: {0}")]
    Resample(#[from] rubato::ResampleError),
}

/// Terminal result of a playback session, surfaced to the session owner.
/// The owner decides whether to end the activity or restart with a new
/// source; the core never terminates the host process.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Open(#[from] OpenError),

    #[error(transparent)]
    ResamplerInit(#[from] ResamplerInitError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("invalid session config: {0}")]
    Config(String),
}
