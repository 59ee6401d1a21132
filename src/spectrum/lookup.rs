//! Point queries by frequency.

use std::f64::consts::PI;

use super::Spectrum;
use crate::error::{Result, SpectrumError};

/// Power near `hz`: the mean of the two bins whose frequencies bracket it,
/// `bins[i].hz <= hz < bins[i + 1].hz`.
///
/// Frequencies below zero or at/above the last bin have no bracket and
/// yield [`SpectrumError::LookupNotFound`].
pub fn power_near(spectrum: &Spectrum, hz: f32) -> Result<f32> {
    spectrum
        .bins
        .windows(2)
        .find(|pair| pair[0].frequency_hz <= hz && hz < pair[1].frequency_hz)
        .map(|pair| (pair[0].power + pair[1].power) / 2.0)
        .ok_or_else(|| SpectrumError::LookupNotFound {
            hz,
            max_hz: spectrum.bins.last().map_or(0.0, |b| b.frequency_hz),
        })
}

/// Single-frequency DFT power of `samples` at `hz`:
/// `(Σ cos(wt)·x[t])² + (Σ sin(wt)·x[t])²` with `w = 2π·hz / sample_rate`.
///
/// Independent of the FFT path and not limited to bin centres. Accumulates
/// in `f64`. A zero `sample_rate` has no defined frequency axis and yields 0.
pub fn correlation_power(samples: &[f32], sample_rate: u32, hz: f32) -> f64 {
    if sample_rate == 0 {
        return 0.0;
    }
    let dw = 2.0 * PI * hz as f64 / sample_rate as f64;
    let mut w = 0.0f64;
    let mut sum_re = 0.0f64;
    let mut sum_im = 0.0f64;
    for &x in samples {
        sum_re += w.cos() * x as f64;
        sum_im -= w.sin() * x as f64;
        w += dw;
    }
    sum_re * sum_re + sum_im * sum_im
}
