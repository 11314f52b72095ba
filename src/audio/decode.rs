use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::units::TimeBase;

use crate::error::{DecodeError, OpenError};

/// One decoder output unit: interleaved f32 samples in the source layout,
/// plus the presentation timestamp of the packet it came from.
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    pub samples: Vec<f32>,
    pub channels: usize,
    pub pts: Option<u64>,
}

/// Pull-based streaming decoder over the first audio track of a container.
pub struct AudioDecoder {
    format: Box<dyn FormatReader>,
    decoder: Box<dyn symphonia::core::codecs::Decoder>,
    track_id: u32,
    sample_rate: u32,
    channels: usize,
    time_base: Option<TimeBase>,
}

impl AudioDecoder {
    /// Probe the container and set up decoding for its first audio track.
    pub fn open(path: &Path) -> Result<Self, OpenError> {
        let file = std::fs::File::open(path).map_err(|source| OpenError::NotFound {
            path: path.to_path_buf(),
            source,
        })?;

        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe().format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )?;

        let format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| OpenError::NoAudioTrack {
                path: path.to_path_buf(),
            })?;

        let track_id = track.id;
        let channels = track.codec_params.channels.map_or(1, |c| c.count());
        let sample_rate = track.codec_params.sample_rate.ok_or_else(|| {
            OpenError::UnsupportedCodec(SymphoniaError::Unsupported("unknown sample rate"))
        })?;
        let time_base = track.codec_params.time_base;

        let decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())?;

        log::info!(
            "Opened {}: {} ch @ {} Hz (track {})",
            path.display(),
            channels,
            sample_rate,
            track_id
        );

        Ok(Self {
            format,
            decoder,
            track_id,
            sample_rate,
            channels,
            time_base,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn time_base(&self) -> Option<TimeBase> {
        self.time_base
    }

    /// Decode the next frame of the selected track.
    ///
    /// `Ok(None)` signals end of stream, a normal terminal condition. Any
    /// `Err` is fatal for the session; corrupted packets are not skipped.
    pub fn next_frame(&mut self) -> Result<Option<DecodedFrame>, DecodeError> {
        loop {
            let packet = match self.format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    return Ok(None);
                }
                Err(SymphoniaError::ResetRequired) => return Ok(None),
                Err(e) => return Err(DecodeError::Demux(e)),
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            let pts = packet.ts();
            let decoded = self.decoder.decode(&packet).map_err(DecodeError::Codec)?;

            let spec = *decoded.spec();
            let num_frames = decoded.frames();
            if num_frames == 0 {
                continue;
            }

            let mut sample_buf = SampleBuffer::<f32>::new(num_frames as u64, spec);
            sample_buf.copy_interleaved_ref(decoded);

            return Ok(Some(DecodedFrame {
                samples: sample_buf.samples().to_vec(),
                channels: spec.channels.count(),
                pts: Some(pts),
            }));
        }
    }
}
