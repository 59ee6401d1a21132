//! JSON analysis report.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::audio::analysis::StreamStats;
use crate::audio::frames::frame_time;
use crate::config::AnalysisConfig;
use crate::spectrum::history::SpectrogramHistory;
use crate::spectrum::lookup::{correlation_power, power_near};
use crate::spectrum::{LoudnessMode, Spectrum};

#[derive(Debug, Serialize)]
pub struct Report {
    pub input: String,
    pub sample_rate: u32,
    pub duration_secs: f32,
    pub analysis: AnalysisConfig,
    pub frequency_step_hz: f32,
    pub frames: Vec<FrameSummary>,
    /// Frame the probes were measured on.
    pub probe_frame: Option<usize>,
    pub probes: Vec<ProbeResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<StreamStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spectrogram: Option<SpectrogramDump>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameSummary {
    pub index: usize,
    pub time_secs: f32,
    /// `None` for a silent frame.
    pub peak_hz: Option<f32>,
    pub peak_db: Option<f32>,
    pub max_power: f32,
    pub avg_power: f32,
}

impl FrameSummary {
    pub fn new(index: usize, spectrum: &Spectrum) -> Self {
        let peak = spectrum.peak_bin().map(|i| &spectrum.bins[i]);
        Self {
            index,
            time_secs: frame_time(index, spectrum.buffer_size, spectrum.sample_rate),
            peak_hz: peak.map(|b| b.frequency_hz),
            peak_db: peak.map(|b| b.db),
            max_power: spectrum.max_power,
            avg_power: spectrum.avg_power,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeResult {
    pub hz: f32,
    /// Two-bin average around `hz`; `None` outside the analyzed band.
    pub power_near: Option<f32>,
    pub correlation_power: f64,
}

impl ProbeResult {
    /// Probe `hz` against an analyzed spectrum and the raw frame behind it.
    pub fn measure(spectrum: &Spectrum, frame: &[f32], hz: f32) -> Self {
        let power_near = match power_near(spectrum, hz) {
            Ok(power) => Some(power),
            Err(err) => {
                log::debug!("Probe {}: {}", hz, err);
                None
            }
        };
        Self {
            hz,
            power_near,
            correlation_power: correlation_power(frame, spectrum.sample_rate, hz),
        }
    }
}

/// History columns, newest first, each `bins` values from low to high
/// frequency.
#[derive(Debug, Serialize)]
pub struct SpectrogramDump {
    pub mode: LoudnessMode,
    pub frames: usize,
    pub bins: usize,
    pub columns: Vec<Vec<f32>>,
}

impl From<&SpectrogramHistory> for SpectrogramDump {
    fn from(history: &SpectrogramHistory) -> Self {
        Self {
            mode: history.mode(),
            frames: history.len(),
            bins: history.bins(),
            columns: history.to_matrix(),
        }
    }
}

/// Index of the frame with the highest `max_power`, first one on ties.
pub fn loudest_frame(spectra: &[Spectrum]) -> Option<usize> {
    spectra
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f32)>, (i, s)| match best {
            Some((_, power)) if power >= s.max_power => best,
            _ => Some((i, s.max_power)),
        })
        .map(|(i, _)| i)
}

pub fn write_report(path: &Path, report: &Report) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create report file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, report).context("Failed to serialize report")?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
