//! Per-frame spectrum values and the structures built on them.

pub mod analyzer;
pub mod handoff;
pub mod history;
pub mod lookup;

use serde::{Deserialize, Serialize};

/// Floor substituted for the dB value of a silent bin wherever a finite
/// number is required.
pub const SILENCE_DB: f32 = -200.0;

/// Bin spacing in Hz.
pub fn freq_step(sample_rate: u32, buffer_size: usize) -> f32 {
    sample_rate as f32 / buffer_size as f32
}

/// Which derived value feeds the spectrogram and loudness views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LoudnessMode {
    #[default]
    Power,
    #[serde(alias = "db")]
    #[value(alias = "db")]
    Decibel,
}

impl LoudnessMode {
    pub fn value(self, bin: &SpectrumBin) -> f32 {
        match self {
            LoudnessMode::Power => bin.power,
            LoudnessMode::Decibel => bin.db_or(SILENCE_DB),
        }
    }

    /// Value a bin of pure silence maps to.
    pub fn silence(self) -> f32 {
        match self {
            LoudnessMode::Power => 0.0,
            LoudnessMode::Decibel => SILENCE_DB,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpectrumBin {
    /// `re² + im²` of the half-spectrum component.
    pub power: f32,
    /// `2·sqrt(power)`
    pub magnitude: f32,
    /// `atan2(im, re)` in radians.
    pub phase: f32,
    /// `10·log10(power)`; negative infinity for a silent bin.
    pub db: f32,
    pub frequency_hz: f32,
}

impl SpectrumBin {
    pub fn is_silent(&self) -> bool {
        self.power == 0.0
    }

    /// dB value, or `floor` when the bin is silent. Quiet but non-silent
    /// bins keep their real value even below `floor`.
    pub fn db_or(&self, floor: f32) -> f32 {
        if self.is_silent() {
            floor
        } else {
            self.db
        }
    }
}

/// `buffer_size / 2` bins from one analyzed frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    pub bins: Vec<SpectrumBin>,
    pub max_power: f32,
    pub avg_power: f32,
    pub sample_rate: u32,
    pub buffer_size: usize,
}

impl Spectrum {
    /// A silent spectrum with bin frequencies filled in.
    pub fn silent(buffer_size: usize, sample_rate: u32) -> Self {
        let step = freq_step(sample_rate, buffer_size);
        let bins = (0..buffer_size / 2)
            .map(|i| SpectrumBin {
                db: f32::NEG_INFINITY,
                frequency_hz: i as f32 * step,
                ..SpectrumBin::default()
            })
            .collect();
        Self {
            bins,
            max_power: 0.0,
            avg_power: 0.0,
            sample_rate,
            buffer_size,
        }
    }

    pub fn bins(&self) -> &[SpectrumBin] {
        &self.bins
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn freq_step(&self) -> f32 {
        freq_step(self.sample_rate, self.buffer_size)
    }

    /// Index of the loudest bin; `None` when every bin is silent.
    pub fn peak_bin(&self) -> Option<usize> {
        if self.max_power <= 0.0 {
            return None;
        }
        self.bins
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.power.total_cmp(&b.power))
            .map(|(i, _)| i)
    }

    pub fn magnitudes(&self) -> Vec<f32> {
        self.bins.iter().map(|b| b.magnitude).collect()
    }

    pub fn phases(&self) -> Vec<f32> {
        self.bins.iter().map(|b| b.phase).collect()
    }

    /// Per-bin values under `mode`, lowest frequency first.
    pub fn values(&self, mode: LoudnessMode) -> impl Iterator<Item = f32> + '_ {
        self.bins.iter().map(move |b| mode.value(b))
    }
}
