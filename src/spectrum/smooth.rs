use super::analyzer::SpectrumFrame;
use super::snapshot::SpectrumSnapshot;

/// Guards the normalization against division by zero on silent or constant
/// input.
const EPSILON: f32 = 1e-5;

/// Per-bin exponential smoothing plus the adaptive min/max envelope used to
/// auto-normalize bar heights regardless of absolute loudness.
///
/// `max_val` only ever rises: visual contrast tightens over a long session
/// rather than pumping when a loud passage ends. `min_val` decays toward
/// the quietest recent bin so the floor tracks ambient level slowly.
pub struct Smoother {
    smoothed: Vec<f32>,
    /// EMA weight on the previous value; higher = slower, steadier bars.
    alpha: f32,
    /// Decay of the running minimum toward the current frame's minimum.
    beta: f32,
    max_val: f32,
    min_val: f32,
    windows: u64,
}

impl Smoother {
    pub fn new(bins: usize, alpha: f32, beta: f32) -> Self {
        Self {
            smoothed: vec![0.0; bins],
            alpha,
            beta,
            max_val: 0.0,
            min_val: 0.0,
            windows: 0,
        }
    }

    /// Fold one raw spectrum frame into the smoothed state and envelope.
    pub fn update(&mut self, raw: &SpectrumFrame) {
        debug_assert_eq!(raw.len(), self.smoothed.len());

        let mut frame_min = f32::INFINITY;
        for (s, &r) in self.smoothed.iter_mut().zip(raw) {
            *s = self.alpha * *s + (1.0 - self.alpha) * r;
            if *s > self.max_val {
                self.max_val = *s;
            }
            if *s < frame_min {
                frame_min = *s;
            }
        }

        if frame_min.is_finite() {
            self.min_val = self.beta * self.min_val + (1.0 - self.beta) * frame_min;
        }
        self.windows += 1;
    }

    pub fn max_val(&self) -> f32 {
        self.max_val
    }

    pub fn min_val(&self) -> f32 {
        self.min_val
    }

    pub fn windows(&self) -> u64 {
        self.windows
    }

    /// Normalized bar height for one bin.
    #[inline]
    fn normalized(&self, bin: usize) -> f32 {
        let range = self.max_val - self.min_val + EPSILON;
        ((self.smoothed[bin] - self.min_val) / range).clamp(0.0, 1.0)
    }

    /// Build a complete snapshot of the current normalized spectrum.
    pub fn snapshot(&self) -> SpectrumSnapshot {
        SpectrumSnapshot {
            bars: (0..self.smoothed.len()).map(|i| self.normalized(i)).collect(),
            window_index: self.windows,
        }
    }
}
