use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

use super::weighting::WeightCurve;

/// Lower/upper clamp for weighted bin values, in dB.
pub const DB_FLOOR: f32 = 0.0;
pub const DB_CEILING: f32 = 150.0;

/// Raw weighted magnitude spectrum for one analysis window. Recomputed from
/// scratch every window; carries no state across windows.
pub type SpectrumFrame = Vec<f32>;

/// Computes a perceptually weighted magnitude-in-dB spectrum from fixed
/// length blocks of mono s16 samples.
pub struct SpectralAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    scratch: Vec<Complex<f32>>,
    weights: WeightCurve,
    window_len: usize,
    bins: usize,
}

impl SpectralAnalyzer {
    /// `window_len` is the per-session analysis window N; the output keeps
    /// `bins` frequency bins, capped at the N/2 + 1 a real-input transform
    /// yields.
    pub fn new(window_len: usize, bins: usize, weights: WeightCurve) -> Self {
        let bins = bins.min(window_len / 2 + 1);
        debug_assert_eq!(weights.len(), bins);

        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(window_len);

        Self {
            fft,
            scratch: vec![Complex::new(0.0, 0.0); window_len],
            weights,
            window_len,
            bins,
        }
    }

    pub fn window_len(&self) -> usize {
        self.window_len
    }

    pub fn bins(&self) -> usize {
        self.bins
    }

    /// Analyze exactly one window of samples.
    ///
    /// Panics in debug builds if `block` is not `window_len` samples;
    /// callers only ever hand over full windows (partial windows at stream
    /// end are dropped, never analyzed).
    pub fn analyze(&mut self, block: &[i16]) -> SpectrumFrame {
        debug_assert_eq!(block.len(), self.window_len);

        for (slot, &sample) in self.scratch.iter_mut().zip(block) {
            *slot = Complex::new(sample as f32, 0.0);
        }
        self.fft.process(&mut self.scratch);

        (0..self.bins)
            .map(|i| {
                let z = self.scratch[i];
                let power = z.re * z.re + z.im * z.im;
                // Zero magnitude maps to the clamp floor, not -inf.
                let db = if power > 0.0 { 10.0 * power.log10() } else { DB_FLOOR };
                (db + self.weights.at(i)).clamp(DB_FLOOR, DB_CEILING)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectrum::weighting::{WeightCurve, DEFAULT_ANCHORS};

    const N: usize = 256;
    const BINS: usize = 128;

    fn analyzer() -> SpectralAnalyzer {
        SpectralAnalyzer::new(N, BINS, WeightCurve::new(BINS, &DEFAULT_ANCHORS))
    }

    fn sine_block(cycles_per_window: usize, amplitude: f32) -> Vec<i16> {
        (0..N)
            .map(|i| {
                let phase = 2.0 * std::f32::consts::PI * cycles_per_window as f32 * i as f32
                    / N as f32;
                (phase.sin() * amplitude) as i16
            })
            .collect()
    }

    #[test]
    fn bin_count_is_truncated_to_real_spectrum() {
        let a = analyzer();
        assert_eq!(a.bins(), BINS);
        let small =
            SpectralAnalyzer::new(64, 128, WeightCurve::new(33, &DEFAULT_ANCHORS));
        assert_eq!(small.bins(), 33);
    }

    #[test]
    fn silence_maps_to_clamp_floor_plus_weight() {
        let mut a = analyzer();
        let frame = a.analyze(&vec![0i16; N]);
        assert_eq!(frame.len(), BINS);
        for (i, &v) in frame.iter().enumerate() {
            assert!(v.is_finite());
            let expected = (DB_FLOOR + WeightCurve::new(BINS, &DEFAULT_ANCHORS).at(i))
                .clamp(DB_FLOOR, DB_CEILING);
            assert!((v - expected).abs() < 1e-6, "bin {i}");
        }
    }

    #[test]
    fn pure_tone_peaks_at_its_bin() {
        let mut a = analyzer();
        // 12 cycles per 256-sample window lands exactly on bin 12.
        let frame = a.analyze(&sine_block(12, 12_000.0));
        let peak = frame
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak, 12);
        // A bin-exact tone concentrates energy: far bins sit way below.
        assert!(frame[12] > frame[60] + 30.0);
    }

    #[test]
    fn values_stay_in_clamp_range() {
        let mut a = analyzer();
        let loud: Vec<i16> = (0..N).map(|i| if i % 2 == 0 { 32767 } else { -32768 }).collect();
        for v in a.analyze(&loud) {
            assert!((DB_FLOOR..=DB_CEILING).contains(&v));
        }
    }
}
