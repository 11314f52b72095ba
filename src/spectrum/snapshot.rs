use std::sync::{Arc, Mutex};

/// Immutable, internally consistent view of the normalized spectrum,
/// refreshed once per fully analyzed window.
#[derive(Debug, Clone)]
pub struct SpectrumSnapshot {
    /// Normalized bar heights in [0, 1], one per bin.
    pub bars: Vec<f32>,
    /// Count of analysis windows folded in so far (0 = nothing published).
    pub window_index: u64,
}

impl SpectrumSnapshot {
    pub fn empty(bins: usize) -> Self {
        Self {
            bars: vec![0.0; bins],
            window_index: 0,
        }
    }
}

/// Publish-by-replace cell for spectrum snapshots.
///
/// The analysis worker builds a complete snapshot and swaps it in; readers
/// always see either the previous or the new snapshot, never a partially
/// updated one. The lock is held only for the pointer swap/clone, so the
/// reading (render) path never waits on analysis work.
pub struct SnapshotCell {
    current: Mutex<Arc<SpectrumSnapshot>>,
}

impl SnapshotCell {
    pub fn new(bins: usize) -> Self {
        Self {
            current: Mutex::new(Arc::new(SpectrumSnapshot::empty(bins))),
        }
    }

    pub fn publish(&self, snapshot: SpectrumSnapshot) {
        // A poisoned lock only ever guards a fully formed Arc, so recover
        // rather than propagate the panic into the audio or render path.
        *self.current.lock().unwrap_or_else(|e| e.into_inner()) = Arc::new(snapshot);
    }

    pub fn load(&self) -> Arc<SpectrumSnapshot> {
        self.current.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}
