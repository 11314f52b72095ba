use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub audio: AudioConfig,
}

#[derive(Debug, Deserialize)]
pub struct AudioConfig {
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    #[serde(default = "default_chunk")]
    pub chunk: usize,
    #[serde(default = "default_window")]
    pub window: usize,
    #[serde(default = "default_bins")]
    pub bins: usize,
    #[serde(default = "default_smoothing")]
    pub smoothing: f32,
    #[serde(default = "default_floor_decay")]
    pub floor_decay: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            chunk: default_chunk(),
            window: default_window(),
            bins: default_bins(),
            smoothing: default_smoothing(),
            floor_decay: default_floor_decay(),
        }
    }
}

fn default_sample_rate() -> u32 { 48000 }
fn default_chunk() -> usize { 384 }
fn default_window() -> usize { 384 }
fn default_bins() -> usize { 128 }
fn default_smoothing() -> f32 { 0.8 }
fn default_floor_decay() -> f32 { 0.99 }

pub fn load_config(path: &PathBuf) -> Option<Config> {
    let content = std::fs::read_to_string(path).ok()?;
    toml::from_str(&content).ok()
}
