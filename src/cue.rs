use serde::Deserialize;
use std::path::Path;

use anyhow::{Context, Result};

/// One timed event, e.g. a lip-sync mouth shape keyed to the playback
/// position.
#[derive(Debug, Clone, Deserialize)]
pub struct Cue {
    /// Playback position in seconds.
    pub time: f64,
    pub event: String,
}

/// A table of cues ordered by ascending timestamp, owned by the session
/// owner and queried against the playback clock.
#[derive(Debug, Clone, Default)]
pub struct CueTable {
    cues: Vec<Cue>,
}

#[derive(Deserialize)]
struct CueFile {
    #[serde(default)]
    cues: Vec<Cue>,
}

impl CueTable {
    pub fn new(mut cues: Vec<Cue>) -> Self {
        cues.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { cues }
    }

    /// Load a cue table from a TOML file with `[[cues]]` entries.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read cue file {}", path.display()))?;
        let file: CueFile = toml::from_str(&content)
            .with_context(|| format!("failed to parse cue file {}", path.display()))?;
        Ok(Self::new(file.cues))
    }

    /// The active cue at `seconds`: the last entry whose timestamp does not
    /// exceed the position, or `None` before the first cue.
    pub fn event_at(&self, seconds: f64) -> Option<&Cue> {
        let idx = self.cues.partition_point(|c| c.time <= seconds);
        if idx == 0 {
            None
        } else {
            Some(&self.cues[idx - 1])
        }
    }

    pub fn len(&self) -> usize {
        self.cues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }
}
