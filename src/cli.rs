use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "resona", about = "Streaming audio spectrum engine demo player")]
pub struct Cli {
    /// Input audio file (WAV, MP3, FLAC, OGG, AAC)
    pub input: Option<PathBuf>,

    /// Write the decoded mono s16le stream to a raw PCM file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output sample rate in Hz
    #[arg(long, default_value_t = 48000)]
    pub sample_rate: u32,

    /// Samples per playback chunk
    #[arg(long, default_value_t = 384)]
    pub chunk: usize,

    /// Analysis window length (must equal or evenly divide the chunk size)
    #[arg(long, default_value_t = 384)]
    pub window: usize,

    /// Number of spectral bars
    #[arg(long, default_value_t = 128)]
    pub bins: usize,

    /// Spectral smoothing factor (0.0-1.0, higher = steadier bars)
    #[arg(long, default_value_t = 0.8)]
    pub smoothing: f32,

    /// Envelope floor decay (0.0-1.0, close to 1 = slow-tracking floor)
    #[arg(long, default_value_t = 0.99)]
    pub floor_decay: f32,

    /// Cue table TOML file for timestamp-keyed events
    #[arg(long)]
    pub cues: Option<PathBuf>,

    /// Config file (default: resona.toml, then the platform config dir)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}
