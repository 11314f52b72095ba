use rubato::{
    calculate_cutoff, Resampler, SincFixedIn, SincInterpolationParameters,
    SincInterpolationType, WindowFunction,
};

use super::decode::DecodedFrame;
use crate::error::{DecodeError, ResamplerInitError};

const CHUNK_FRAMES: usize = 1024;

/// Converts decoded frames of any rate/channel layout into a continuous
/// mono s16 stream at a fixed target rate.
///
/// The sinc resampler is stateful: fractional input/output skew carries
/// across calls, so chained calls produce one correctly time-aligned stream
/// rather than independently rounded fragments. Callers must use the length
/// of each returned chunk; it is not a fixed ratio of the input length.
pub struct MonoResampler {
    inner: Option<SincFixedIn<f32>>,
    pending: Vec<f32>,
    ratio: f64,
    in_frames: u64,
    out_frames: u64,
    skip: usize,
}

impl MonoResampler {
    pub fn new(src_rate: u32, dst_rate: u32) -> Result<Self, ResamplerInitError> {
        let inner = if src_rate == dst_rate {
            None
        } else {
            let ratio = dst_rate as f64 / src_rate as f64;
            let sinc_len = 256;
            let window = WindowFunction::BlackmanHarris2;
            let params = SincInterpolationParameters {
                sinc_len,
                f_cutoff: calculate_cutoff(sinc_len, window),
                interpolation: SincInterpolationType::Linear,
                oversampling_factor: 128,
                window,
            };
            let r = SincFixedIn::<f32>::new(ratio, 2.0, params, CHUNK_FRAMES, 1).map_err(
                |source| ResamplerInitError {
                    src_rate,
                    dst_rate,
                    source,
                },
            )?;
            Some(r)
        };

        let skip = inner.as_ref().map_or(0, |r| r.output_delay());

        Ok(Self {
            inner,
            pending: Vec::new(),
            ratio: dst_rate as f64 / src_rate as f64,
            in_frames: 0,
            out_frames: 0,
            skip,
        })
    }

    /// Down-mix one decoded frame to mono and resample whatever full input
    /// chunks are available. Output may be empty while input accumulates.
    pub fn convert(&mut self, frame: &DecodedFrame) -> Result<Vec<i16>, DecodeError> {
        let mono = downmix(&frame.samples, frame.channels);
        self.in_frames += mono.len() as u64;

        let Some(resampler) = self.inner.as_mut() else {
            self.out_frames += mono.len() as u64;
            return Ok(mono.iter().map(|&s| to_i16(s)).collect());
        };

        self.pending.extend_from_slice(&mono);

        let mut out = Vec::new();
        loop {
            let need = resampler.input_frames_next();
            if self.pending.len() < need {
                break;
            }
            let blocks = [self.pending.drain(..need).collect::<Vec<f32>>()];
            let processed = resampler.process(&blocks[..], None)?;
            append_skipping(&mut out, &processed[0], &mut self.skip);
        }
        self.out_frames += out.len() as u64;
        Ok(out)
    }

    /// Drain the staging buffer and the resampler's internal delay at end
    /// of stream, truncated so the total output length lands on
    /// `round(total_input * dst_rate / src_rate)`.
    pub fn finish(&mut self) -> Result<Vec<i16>, DecodeError> {
        let Some(resampler) = self.inner.as_mut() else {
            return Ok(Vec::new());
        };

        let expected = (self.in_frames as f64 * self.ratio).round() as u64;
        let mut out = Vec::new();

        if !self.pending.is_empty() {
            let blocks = [std::mem::take(&mut self.pending)];
            let processed = resampler.process_partial(Some(&blocks[..]), None)?;
            append_skipping(&mut out, &processed[0], &mut self.skip);
        }

        // The filter delay means the last samples are still inside the
        // resampler; flush zero-padded chunks until the stream is whole.
        while self.out_frames + (out.len() as u64) < expected {
            let processed = resampler.process_partial::<Vec<f32>>(None, None)?;
            let before = out.len();
            append_skipping(&mut out, &processed[0], &mut self.skip);
            if out.len() == before {
                break;
            }
        }

        let remaining = expected.saturating_sub(self.out_frames) as usize;
        out.truncate(remaining);
        self.out_frames += out.len() as u64;
        Ok(out)
    }

    /// Total mono frames produced so far across `convert` and `finish`.
    pub fn output_frames(&self) -> u64 {
        self.out_frames
    }
}

fn append_skipping(out: &mut Vec<i16>, block: &[f32], skip: &mut usize) {
    let drop = (*skip).min(block.len());
    *skip -= drop;
    out.extend(block[drop..].iter().map(|&s| to_i16(s)));
}

fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

fn to_i16(s: f32) -> i16 {
    (s.clamp(-1.0, 1.0) * 32767.0) as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(samples: Vec<f32>, channels: usize) -> DecodedFrame {
        DecodedFrame {
            samples,
            channels,
            pts: None,
        }
    }

    #[test]
    fn passthrough_when_rates_match() {
        let mut r = MonoResampler::new(48_000, 48_000).unwrap();
        let out = r.convert(&frame(vec![0.5, -0.5, 0.25, -0.25], 2)).unwrap();
        // Stereo downmix: (0.5 + -0.5)/2 and (0.25 + -0.25)/2
        assert_eq!(out, vec![0, 0]);
        assert!(r.finish().unwrap().is_empty());
    }

    #[test]
    fn mono_passthrough_preserves_amplitude() {
        let mut r = MonoResampler::new(44_100, 44_100).unwrap();
        let out = r.convert(&frame(vec![1.0, -1.0, 0.0], 1)).unwrap();
        assert_eq!(out, vec![32767, -32767, 0]);
    }

    #[test]
    fn total_length_converges_to_ratio() {
        let mut r = MonoResampler::new(44_100, 48_000).unwrap();
        let mut total_in = 0u64;
        // Irregular burst sizes, like a real decoder.
        for n in [1152usize, 577, 2304, 1000, 1152, 63] {
            let samples = vec![0.1f32; n];
            total_in += n as u64;
            r.convert(&frame(samples, 1)).unwrap();
        }
        r.finish().unwrap();
        let expected = (total_in as f64 * 48_000.0 / 44_100.0).round() as i64;
        let got = r.output_frames() as i64;
        assert!(
            (got - expected).abs() <= 1,
            "expected ~{expected} frames, got {got}"
        );
    }

    #[test]
    fn downsampling_length_converges() {
        let mut r = MonoResampler::new(48_000, 24_000).unwrap();
        let mut total_in = 0u64;
        for _ in 0..20 {
            total_in += 960;
            r.convert(&frame(vec![0.0f32; 960], 1)).unwrap();
        }
        r.finish().unwrap();
        let expected = (total_in / 2) as i64;
        let got = r.output_frames() as i64;
        assert!((got - expected).abs() <= 1);
    }

    #[test]
    fn clamps_out_of_range_samples() {
        assert_eq!(to_i16(2.0), 32767);
        assert_eq!(to_i16(-2.0), -32767);
    }
}
