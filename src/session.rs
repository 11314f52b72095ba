use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::audio::chunk::{ChunkBuffer, SampleSource};
use crate::audio::clock::PlaybackClock;
use crate::audio::pipeline::DecodeSource;
use crate::error::SessionError;
use crate::spectrum::analyzer::SpectralAnalyzer;
use crate::spectrum::smooth::Smoother;
use crate::spectrum::snapshot::SnapshotCell;
use crate::spectrum::weighting::{WeightCurve, ANCHOR_COUNT, DEFAULT_ANCHORS};

/// Chunks buffered between the worker and the consumer before the worker
/// parks on send.
const CHANNEL_DEPTH: usize = 4;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Fixed output rate of the mono s16 stream.
    pub target_sample_rate: u32,
    /// Samples per consumer pull.
    pub chunk_samples: usize,
    /// Analysis window length; must equal or evenly divide `chunk_samples`
    /// so one PCM queue serves both playback and analysis.
    pub window_samples: usize,
    /// Spectral bins kept (capped at `window_samples / 2 + 1`).
    pub bins: usize,
    /// EMA weight on the previous smoothed value (alpha).
    pub smoothing: f32,
    /// Decay of the envelope floor toward the current minimum (beta).
    pub floor_decay: f32,
    /// Perceptual weighting anchors, interpolated across the bin range.
    pub anchors: [f32; ANCHOR_COUNT],
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            target_sample_rate: 48_000,
            chunk_samples: 384,
            window_samples: 384,
            bins: 128,
            smoothing: 0.8,
            floor_decay: 0.99,
            anchors: DEFAULT_ANCHORS,
        }
    }
}

impl SessionConfig {
    fn validate(&self) -> Result<(), SessionError> {
        if self.chunk_samples == 0 || self.window_samples == 0 {
            return Err(SessionError::Config(
                "chunk_samples and window_samples must be positive".into(),
            ));
        }
        if self.chunk_samples % self.window_samples != 0 {
            return Err(SessionError::Config(format!(
                "window_samples ({}) must equal or evenly divide chunk_samples ({})",
                self.window_samples, self.chunk_samples
            )));
        }
        if !(0.0..1.0).contains(&self.smoothing) || !(0.0..1.0).contains(&self.floor_decay) {
            return Err(SessionError::Config(
                "smoothing and floor_decay must be in [0, 1)".into(),
            ));
        }
        Ok(())
    }
}

/// A playback session: one worker thread driving decode → resample →
/// chunk delivery and, per analysis window, spectrum → smoothing →
/// snapshot publication.
///
/// The consumer pulls PCM chunks with [`next_chunk`](Session::next_chunk)
/// while independently reading the spectrum snapshot and the playback
/// clock from other threads.
pub struct Session {
    rx: Option<Receiver<Vec<i16>>>,
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<Result<(), SessionError>>>,
    clock: PlaybackClock,
    spectrum: Arc<SnapshotCell>,
    chunk_samples: usize,
}

impl Session {
    /// Open `path` and start the decode/analysis worker. Open and
    /// resampler-init failures surface here, before any thread is spawned.
    pub fn start(path: &Path, config: SessionConfig) -> Result<Self, SessionError> {
        config.validate()?;
        let clock = PlaybackClock::new();
        let source = DecodeSource::open(path, config.target_sample_rate, clock.clone())?;
        Ok(Self::start_from_source(source, config, clock))
    }

    fn start_from_source<S>(source: S, config: SessionConfig, clock: PlaybackClock) -> Self
    where
        S: SampleSource + Send + 'static,
    {
        let bins = config.bins.min(config.window_samples / 2 + 1);
        let weights = WeightCurve::new(bins, &config.anchors);
        let analyzer = SpectralAnalyzer::new(config.window_samples, bins, weights);
        let smoother = Smoother::new(bins, config.smoothing, config.floor_decay);
        let spectrum = Arc::new(SnapshotCell::new(bins));
        let stop = Arc::new(AtomicBool::new(false));
        let (tx, rx) = sync_channel(CHANNEL_DEPTH);

        let worker = {
            let buffer = ChunkBuffer::new(source);
            let stop = stop.clone();
            let spectrum = spectrum.clone();
            let chunk_samples = config.chunk_samples;
            std::thread::spawn(move || {
                run_worker(buffer, tx, stop, analyzer, smoother, spectrum, chunk_samples)
            })
        };

        Self {
            rx: Some(rx),
            stop,
            worker: Some(worker),
            clock,
            spectrum,
            chunk_samples: config.chunk_samples,
        }
    }

    /// Pull the next PCM chunk. A chunk shorter than the configured pull
    /// size, or `None`, signals end of stream (or a stopped/failed worker;
    /// [`finish`](Session::finish) tells the difference).
    pub fn next_chunk(&mut self) -> Option<Vec<i16>> {
        self.rx.as_ref()?.recv().ok()
    }

    pub fn chunk_samples(&self) -> usize {
        self.chunk_samples
    }

    /// Shared playback position handle.
    pub fn clock(&self) -> PlaybackClock {
        self.clock.clone()
    }

    /// Shared spectrum snapshot handle for the rendering side.
    pub fn spectrum(&self) -> Arc<SnapshotCell> {
        self.spectrum.clone()
    }

    /// Signal stop, let the in-flight decode finish, join the worker and
    /// surface its terminal result.
    pub fn stop(mut self) -> Result<(), SessionError> {
        self.shutdown()
    }

    /// Join the worker after the stream ended naturally. Equivalent to
    /// [`stop`](Session::stop); a separate name for the normal path.
    pub fn finish(self) -> Result<(), SessionError> {
        self.stop()
    }

    fn shutdown(&mut self) -> Result<(), SessionError> {
        self.stop.store(true, Ordering::Relaxed);
        // Dropping the receiver unparks a worker blocked on send.
        self.rx.take();
        match self.worker.take() {
            Some(handle) => match handle.join() {
                Ok(result) => result,
                Err(_) => {
                    log::error!("session worker panicked");
                    Ok(())
                }
            },
            None => Ok(()),
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            log::warn!("session ended with error on drop: {e}");
        }
    }
}

fn run_worker<S: SampleSource>(
    mut buffer: ChunkBuffer<S>,
    tx: SyncSender<Vec<i16>>,
    stop: Arc<AtomicBool>,
    mut analyzer: SpectralAnalyzer,
    mut smoother: Smoother,
    spectrum: Arc<SnapshotCell>,
    chunk_samples: usize,
) -> Result<(), SessionError> {
    loop {
        if stop.load(Ordering::Relaxed) {
            return Ok(());
        }

        let chunk = buffer.pull(chunk_samples)?;
        if chunk.is_empty() {
            log::debug!("end of stream after {} windows", smoother.windows());
            return Ok(());
        }
        let last = chunk.len() < chunk_samples;

        // Deliver for playback first, then tap the same block for analysis.
        let analysis = chunk.clone();
        if tx.send(chunk).is_err() {
            // Consumer went away; nothing left to do.
            return Ok(());
        }

        // Only full windows are analyzed; a trailing partial window at
        // stream end is dropped rather than published.
        for window in analysis.chunks_exact(analyzer.window_len()) {
            let frame = analyzer.analyze(window);
            smoother.update(&frame);
            spectrum.publish(smoother.snapshot());
        }

        if last {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DecodeError, OpenError};

    /// Serves a prepared sample stream in fixed-size bursts.
    struct BurstSource {
        samples: Vec<i16>,
        pos: usize,
        burst: usize,
    }

    impl BurstSource {
        fn new(samples: Vec<i16>, burst: usize) -> Self {
            Self {
                samples,
                pos: 0,
                burst,
            }
        }
    }

    impl SampleSource for BurstSource {
        fn next_block(&mut self) -> Result<Option<Vec<i16>>, DecodeError> {
            if self.pos >= self.samples.len() {
                return Ok(None);
            }
            let end = (self.pos + self.burst).min(self.samples.len());
            let block = self.samples[self.pos..end].to_vec();
            self.pos = end;
            Ok(Some(block))
        }
    }

    /// Never ends, never errors.
    struct EndlessSource;

    impl SampleSource for EndlessSource {
        fn next_block(&mut self) -> Result<Option<Vec<i16>>, DecodeError> {
            Ok(Some(vec![0i16; 512]))
        }
    }

    /// Fails after a couple of good bursts.
    struct CorruptSource {
        remaining: usize,
    }

    impl SampleSource for CorruptSource {
        fn next_block(&mut self) -> Result<Option<Vec<i16>>, DecodeError> {
            if self.remaining == 0 {
                return Err(DecodeError::Demux(
                    symphonia::core::errors::Error::Unsupported("corrupt packet"),
                ));
            }
            self.remaining -= 1;
            Ok(Some(vec![0i16; 300]))
        }
    }

    fn sine_stream(freq_bin: usize, window: usize, windows: usize, amplitude: f32) -> Vec<i16> {
        let total = window * windows;
        (0..total)
            .map(|i| {
                let phase =
                    2.0 * std::f32::consts::PI * freq_bin as f32 * i as f32 / window as f32;
                (phase.sin() * amplitude) as i16
            })
            .collect()
    }

    fn test_config(chunk: usize, window: usize) -> SessionConfig {
        SessionConfig {
            chunk_samples: chunk,
            window_samples: window,
            smoothing: 0.6,
            floor_decay: 0.9,
            ..SessionConfig::default()
        }
    }

    #[test]
    fn rejects_window_not_dividing_chunk() {
        let cfg = test_config(384, 256);
        assert!(cfg.validate().is_err());
        assert!(test_config(512, 256).validate().is_ok());
    }

    #[test]
    fn delivers_stream_unchanged_and_in_order() {
        let input = sine_stream(5, 256, 20, 8_000.0);
        let source = BurstSource::new(input.clone(), 777);
        let mut session =
            Session::start_from_source(source, test_config(256, 256), PlaybackClock::new());

        let mut collected = Vec::new();
        while let Some(chunk) = session.next_chunk() {
            collected.extend(chunk);
        }
        assert_eq!(collected, input);
        session.finish().unwrap();
    }

    #[test]
    fn sine_peak_bin_converges_toward_one() {
        // 5 cycles per 256-sample window: energy lands exactly on bin 5,
        // continuous in phase across window boundaries.
        let input = sine_stream(5, 256, 60, 12_000.0);
        let source = BurstSource::new(input, 1024);
        let mut session =
            Session::start_from_source(source, test_config(256, 256), PlaybackClock::new());
        let spectrum = session.spectrum();

        while session.next_chunk().is_some() {}
        session.finish().unwrap();

        let snap = spectrum.load();
        assert!(snap.window_index >= 50);
        let peak = snap
            .bars
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak, 5);
        assert!(snap.bars[5] > 0.9, "peak bar {}", snap.bars[5]);
        for &bar in &snap.bars {
            assert!((0.0..=1.0).contains(&bar));
        }
    }

    #[test]
    fn stop_interrupts_an_endless_stream() {
        let mut session = Session::start_from_source(
            EndlessSource,
            test_config(256, 256),
            PlaybackClock::new(),
        );
        assert!(session.next_chunk().is_some());
        assert!(session.next_chunk().is_some());
        session.stop().unwrap();
    }

    #[test]
    fn decode_error_surfaces_at_finish() {
        let source = CorruptSource { remaining: 2 };
        let mut session =
            Session::start_from_source(source, test_config(256, 256), PlaybackClock::new());
        while session.next_chunk().is_some() {}
        match session.finish() {
            Err(SessionError::Decode(_)) => {}
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[test]
    fn missing_input_fails_at_start_as_not_found() {
        let path = std::env::temp_dir().join("resona_no_such_input.wav");
        let _ = std::fs::remove_file(&path);
        match Session::start(&path, SessionConfig::default()) {
            Err(SessionError::Open(OpenError::NotFound { .. })) => {}
            other => panic!("expected not-found error, got {:?}", other.err()),
        }
    }

    #[test]
    fn non_audio_input_fails_at_start_as_unsupported() {
        let path = std::env::temp_dir().join("resona_not_audio.wav");
        std::fs::write(&path, b"just some text, nothing a demuxer would recognize\n").unwrap();
        match Session::start(&path, SessionConfig::default()) {
            Err(SessionError::Open(OpenError::UnsupportedCodec(_))) => {}
            other => panic!("expected unsupported-codec error, got {:?}", other.err()),
        }
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn decodes_a_real_wav_end_to_end() {
        let path = std::env::temp_dir().join("resona_session_e2e.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 44_100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let src_frames = 13_230; // 0.3 s
        {
            let mut writer = hound::WavWriter::create(&path, spec).unwrap();
            for i in 0..src_frames {
                let t = i as f32 / 44_100.0;
                let s = ((2.0 * std::f32::consts::PI * 440.0 * t).sin() * 10_000.0) as i16;
                writer.write_sample(s).unwrap();
                writer.write_sample(s).unwrap();
            }
            writer.finalize().unwrap();
        }

        let mut session = Session::start(&path, SessionConfig::default()).unwrap();
        let clock = session.clock();
        let spectrum = session.spectrum();

        let mut total = 0usize;
        while let Some(chunk) = session.next_chunk() {
            total += chunk.len();
        }
        session.finish().unwrap();

        let expected = (src_frames as f64 * 48_000.0 / 44_100.0).round() as i64;
        assert!(
            (total as i64 - expected).abs() <= 2,
            "expected ~{expected} samples, got {total}"
        );
        assert!(clock.seconds() > 0.1, "clock at {}", clock.seconds());
        let snap = spectrum.load();
        assert!(snap.window_index > 0);
        for &bar in &snap.bars {
            assert!((0.0..=1.0).contains(&bar));
        }

        let _ = std::fs::remove_file(&path);
    }
}
