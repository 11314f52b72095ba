use std::path::Path;

use super::chunk::SampleSource;
use super::clock::PlaybackClock;
use super::decode::AudioDecoder;
use super::resample::MonoResampler;
use crate::error::{DecodeError, SessionError};

/// Decoder and resampler wired together behind the [`SampleSource`] seam.
///
/// Each block corresponds to one decoded frame's worth of resampled output;
/// the playback clock is advanced as a side effect of every decode. At
/// decoder end of stream the resampler is drained once so its internal
/// delay is not lost.
pub struct DecodeSource {
    decoder: AudioDecoder,
    resampler: MonoResampler,
    clock: PlaybackClock,
    drained: bool,
}

impl DecodeSource {
    pub fn open(
        path: &Path,
        target_rate: u32,
        clock: PlaybackClock,
    ) -> Result<Self, SessionError> {
        let decoder = AudioDecoder::open(path)?;
        let resampler = MonoResampler::new(decoder.sample_rate(), target_rate)?;
        Ok(Self {
            decoder,
            resampler,
            clock,
            drained: false,
        })
    }
}

impl SampleSource for DecodeSource {
    fn next_block(&mut self) -> Result<Option<Vec<i16>>, DecodeError> {
        if self.drained {
            return Ok(None);
        }

        match self.decoder.next_frame()? {
            Some(frame) => {
                self.clock
                    .on_frame_decoded(frame.pts, self.decoder.time_base());
                Ok(Some(self.resampler.convert(&frame)?))
            }
            None => {
                self.drained = true;
                let tail = self.resampler.finish()?;
                if tail.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(tail))
                }
            }
        }
    }
}
