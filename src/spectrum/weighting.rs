/// Number of perceptual anchor points the curve is built from.
pub const ANCHOR_COUNT: usize = 16;

/// Additive dB corrections modelling a human loudness curve: flat through
/// the low bins, rising toward the high bins where the raw magnitudes of
/// musical content fall off.
pub const DEFAULT_ANCHORS: [f32; ANCHOR_COUNT] = [
    0.0, 3.0, 6.0, 8.0, 9.0, 9.0, 10.0, 12.0, 14.0, 17.0, 20.0, 24.0, 28.0, 32.0, 36.0, 40.0,
];

/// Fixed per-bin additive dB corrections, built once at session start by
/// linearly interpolating anchor values spaced evenly across the bin range.
/// Immutable after construction; not adaptive.
#[derive(Debug, Clone)]
pub struct WeightCurve {
    weights: Vec<f32>,
}

impl WeightCurve {
    pub fn new(bins: usize, anchors: &[f32; ANCHOR_COUNT]) -> Self {
        let weights = match bins {
            0 => Vec::new(),
            1 => vec![anchors[0]],
            _ => (0..bins)
                .map(|bin| {
                    // Map the bin onto the anchor axis and lerp between the
                    // two surrounding anchors.
                    let pos = bin as f32 * (ANCHOR_COUNT - 1) as f32 / (bins - 1) as f32;
                    let lo = pos.floor() as usize;
                    let hi = (lo + 1).min(ANCHOR_COUNT - 1);
                    let t = pos - lo as f32;
                    anchors[lo] * (1.0 - t) + anchors[hi] * t
                })
                .collect(),
        };
        Self { weights }
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    #[inline]
    pub fn at(&self, bin: usize) -> f32 {
        self.weights[bin]
    }
}
