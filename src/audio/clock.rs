use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use symphonia::core::units::TimeBase;

/// Shared playback position, updated once per decoded frame and readable
/// from any thread.
///
/// The value reflects the most recently *decoded* frame, not the most
/// recently played sample; callers needing tight sync must account for the
/// queued-but-unplayed backlog as latency.
#[derive(Clone, Default)]
pub struct PlaybackClock {
    // f64 seconds stored as raw bits so the position can be shared
    // without a lock.
    seconds_bits: Arc<AtomicU64>,
}

impl PlaybackClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the position of a freshly decoded frame. Frames without a
    /// pts or stream time base leave the clock untouched, so the position
    /// never jumps backward to zero mid-stream.
    pub fn on_frame_decoded(&self, pts: Option<u64>, time_base: Option<TimeBase>) {
        let (Some(pts), Some(tb)) = (pts, time_base) else {
            return;
        };
        let time = tb.calc_time(pts);
        let seconds = time.seconds as f64 + time.frac;
        self.seconds_bits.store(seconds.to_bits(), Ordering::Relaxed);
    }

    /// Current position in seconds; 0.0 before the first decoded frame.
    pub fn seconds(&self) -> f64 {
        f64::from_bits(self.seconds_bits.load(Ordering::Relaxed))
    }
}
