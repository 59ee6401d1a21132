use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, SpectrumError};
use crate::fft::is_power_of_two;
use crate::spectrum::LoudnessMode;
use crate::window::WindowFunction;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Everything an analyzer session is built from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    #[serde(default)]
    pub loudness_mode: LoudnessMode,
    #[serde(default)]
    pub window_function: WindowFunction,
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub include_spectrogram: bool,
    #[serde(default)]
    pub probes: Vec<f32>,
    #[serde(default = "default_render_fps")]
    pub render_fps: u32,
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<()> {
        if self.buffer_size < 2 || !is_power_of_two(self.buffer_size) {
            return Err(SpectrumError::size(
                self.buffer_size,
                "buffer size must be a power of two of at least 2",
            ));
        }
        if self.sample_rate == 0 {
            return Err(SpectrumError::size(0, "sample rate must be positive"));
        }
        Ok(())
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            buffer_size: default_buffer_size(),
            sample_rate: default_sample_rate(),
            loudness_mode: LoudnessMode::default(),
            window_function: WindowFunction::default(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            include_spectrogram: false,
            probes: Vec::new(),
            render_fps: default_render_fps(),
        }
    }
}

pub fn default_buffer_size() -> usize { 1024 }
pub fn default_sample_rate() -> u32 { 44100 }
pub fn default_render_fps() -> u32 { 60 }

/// `spectrolite.toml` in the working directory, then
/// `~/.config/spectrolite/config.toml`, then the platform config dir.
pub fn discover_config_path() -> Option<PathBuf> {
    let local = PathBuf::from("spectrolite.toml");
    if local.exists() {
        return Some(local);
    }
    if let Some(home) = dirs::home_dir() {
        let xdg = home.join(".config").join("spectrolite").join("config.toml");
        if xdg.exists() {
            return Some(xdg);
        }
    }
    if let Some(config_dir) = dirs::config_dir() {
        let platform = config_dir.join("spectrolite").join("config.toml");
        if platform.exists() {
            return Some(platform);
        }
    }
    None
}

pub fn load_config(path: &Path) -> Option<Config> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            log::warn!("Cannot read config {}: {}", path.display(), err);
            return None;
        }
    };
    parse_config(&content)
        .map_err(|err| log::warn!("Invalid config {}: {}", path.display(), err))
        .ok()
}

pub fn parse_config(content: &str) -> std::result::Result<Config, toml::de::Error> {
    toml::from_str(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let cfg = parse_config("").unwrap();
        assert_eq!(cfg.analysis, AnalysisConfig::default());
        assert_eq!(cfg.analysis.buffer_size, 1024);
        assert_eq!(cfg.analysis.window_function, WindowFunction::Hanning);
        assert_eq!(cfg.output.render_fps, 60);
        assert!(cfg.output.probes.is_empty());
    }

    #[test]
    fn parses_analysis_section() {
        let cfg = parse_config(
            r#"
            [analysis]
            buffer_size = 2048
            loudness_mode = "decibel"
            window_function = "hamming"

            [output]
            probes = [440.0, 1000.0]
            "#,
        )
        .unwrap();
        assert_eq!(cfg.analysis.buffer_size, 2048);
        assert_eq!(cfg.analysis.sample_rate, 44100);
        assert_eq!(cfg.analysis.loudness_mode, LoudnessMode::Decibel);
        assert_eq!(cfg.analysis.window_function, WindowFunction::Hamming);
        assert_eq!(cfg.output.probes, vec![440.0, 1000.0]);
    }

    #[test]
    fn rejects_unknown_window() {
        assert!(parse_config("[analysis]\nwindow_function = \"kaiser\"").is_err());
    }

    #[test]
    fn validate_checks_sizes() {
        let mut cfg = AnalysisConfig::default();
        assert!(cfg.validate().is_ok());
        cfg.buffer_size = 1000;
        assert!(matches!(cfg.validate(), Err(SpectrumError::InvalidSize { size: 1000, .. })));
        cfg.buffer_size = 1;
        assert!(cfg.validate().is_err());
        cfg.buffer_size = 512;
        cfg.sample_rate = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn missing_file_yields_none() {
        assert!(load_config(Path::new("/nonexistent/spectrolite.toml")).is_none());
    }
}
