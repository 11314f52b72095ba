mod cli;
mod config;

use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;

use cli::Cli;
use resona::{CueTable, Session, SessionConfig};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let mut cli = Cli::parse();

    // Load config: explicit --config path, or auto-detect resona.toml / global config
    let config_path = cli.config.clone().or_else(|| {
        let local = std::path::PathBuf::from("resona.toml");
        if local.exists() {
            return Some(local);
        }
        if let Some(config_dir) = dirs::config_dir() {
            let platform = config_dir.join("resona").join("config.toml");
            if platform.exists() {
                return Some(platform);
            }
        }
        None
    });
    if let Some(ref path) = config_path {
        if let Some(cfg) = config::load_config(path) {
            log::info!("Loaded config from {}", path.display());
            // Merge: config values apply only when CLI is at its default
            if cli.sample_rate == 48000 { cli.sample_rate = cfg.audio.sample_rate; }
            if cli.chunk == 384 { cli.chunk = cfg.audio.chunk; }
            if cli.window == 384 { cli.window = cfg.audio.window; }
            if cli.bins == 128 { cli.bins = cfg.audio.bins; }
            if cli.smoothing == 0.8 { cli.smoothing = cfg.audio.smoothing; }
            if cli.floor_decay == 0.99 { cli.floor_decay = cfg.audio.floor_decay; }
        } else {
            log::warn!("Failed to load config from {}", path.display());
        }
    }

    let input = cli.input.as_ref().context("Input audio file is required")?;
    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }

    let cues = match cli.cues {
        Some(ref path) => {
            let table = CueTable::load(path)?;
            log::info!("Loaded {} cues from {}", table.len(), path.display());
            table
        }
        None => CueTable::default(),
    };

    log::info!("resona - streaming audio spectrum engine");
    log::info!("Input: {}", input.display());
    log::info!(
        "Stream: mono s16 @ {} Hz, chunk {} / window {} / {} bins",
        cli.sample_rate,
        cli.chunk,
        cli.window,
        cli.bins
    );

    let session_config = SessionConfig {
        target_sample_rate: cli.sample_rate,
        chunk_samples: cli.chunk,
        window_samples: cli.window,
        bins: cli.bins,
        smoothing: cli.smoothing,
        floor_decay: cli.floor_decay,
        ..SessionConfig::default()
    };

    let mut session = Session::start(input, session_config)?;
    let clock = session.clock();
    let spectrum = session.spectrum();

    let mut sink = match cli.output {
        Some(ref path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            log::info!("Writing raw PCM to {}", path.display());
            Some(std::io::BufWriter::new(file))
        }
        None => None,
    };

    let mut total_samples = 0u64;
    let mut chunks = 0u64;
    let mut active_event: Option<String> = None;

    while let Some(chunk) = session.next_chunk() {
        total_samples += chunk.len() as u64;
        chunks += 1;

        if let Some(ref mut out) = sink {
            let mut bytes = Vec::with_capacity(chunk.len() * 2);
            for s in &chunk {
                bytes.extend_from_slice(&s.to_le_bytes());
            }
            out.write_all(&bytes).context("Failed to write PCM output")?;
        }

        let position = clock.seconds();
        if let Some(cue) = cues.event_at(position) {
            if active_event.as_deref() != Some(cue.event.as_str()) {
                log::info!("[{position:7.2}s] cue -> {}", cue.event);
                active_event = Some(cue.event.clone());
            }
        }

        // Roughly twice a second at the default chunk size.
        if chunks % 64 == 0 {
            let snap = spectrum.load();
            let (peak_bin, peak) = snap
                .bars
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
                .map(|(i, &v)| (i, v))
                .unwrap_or((0, 0.0));
            log::info!(
                "[{position:7.2}s] window {} peak bar {peak_bin} = {peak:.2}",
                snap.window_index
            );
        }
    }

    if let Some(ref mut out) = sink {
        out.flush().context("Failed to flush PCM output")?;
    }

    session.finish().context("Playback session failed")?;

    let seconds = total_samples as f64 / cli.sample_rate as f64;
    log::info!("Done: {total_samples} samples ({seconds:.1}s) in {chunks} chunks");
    Ok(())
}
