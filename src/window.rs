//! Window functions applied before the transform to taper frame edges.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpectrumError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum WindowFunction {
    /// No tapering.
    Rectangular,
    /// Triangular: linear ramp up to n/2, then back down.
    Bartlett,
    /// `0.54 - 0.46·cos(2πi/(n-1))`
    Hamming,
    /// `0.5 - 0.5·cos(2πi/(n-1))`
    #[default]
    Hanning,
}

impl WindowFunction {
    pub const ALL: [WindowFunction; 4] = [
        WindowFunction::Rectangular,
        WindowFunction::Bartlett,
        WindowFunction::Hamming,
        WindowFunction::Hanning,
    ];

    pub fn name(self) -> &'static str {
        match self {
            WindowFunction::Rectangular => "Rectangular",
            WindowFunction::Bartlett => "Bartlett",
            WindowFunction::Hamming => "Hamming",
            WindowFunction::Hanning => "Hanning",
        }
    }
}

impl std::fmt::Display for WindowFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

pub fn names() -> impl Iterator<Item = &'static str> {
    WindowFunction::ALL.iter().map(|w| w.name())
}

fn check_len(kind: WindowFunction, len: usize) -> Result<()> {
    if kind != WindowFunction::Rectangular && len < 2 {
        return Err(SpectrumError::size(len, "window needs at least 2 samples"));
    }
    Ok(())
}

/// Weight of sample `index` in a window of `len` samples.
///
/// Callers must ensure `len >= 2` for every kind except `Rectangular`.
pub fn coefficient(kind: WindowFunction, index: usize, len: usize) -> f32 {
    match kind {
        WindowFunction::Rectangular => 1.0,
        WindowFunction::Bartlett => {
            let pivot = len / 2;
            let ramp = pivot as f32;
            if index < pivot {
                index as f32 / ramp
            } else {
                1.0 - (index - pivot) as f32 / ramp
            }
        }
        WindowFunction::Hamming => {
            (0.54 - 0.46 * (2.0 * PI * index as f64 / (len - 1) as f64).cos()) as f32
        }
        WindowFunction::Hanning => {
            (0.50 - 0.50 * (2.0 * PI * index as f64 / (len - 1) as f64).cos()) as f32
        }
    }
}

pub fn coefficients(kind: WindowFunction, len: usize) -> Result<Vec<f32>> {
    check_len(kind, len)?;
    Ok((0..len).map(|i| coefficient(kind, i, len)).collect())
}

/// Multiply `samples` by the window in place.
pub fn apply_window(kind: WindowFunction, samples: &mut [f32]) -> Result<()> {
    check_len(kind, samples.len())?;
    if kind == WindowFunction::Rectangular {
        return Ok(());
    }
    let len = samples.len();
    for (i, s) in samples.iter_mut().enumerate() {
        *s *= coefficient(kind, i, len);
    }
    Ok(())
}
