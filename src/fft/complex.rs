use std::f64::consts::PI;

use super::{bits_needed, is_power_of_two, BitReversalTable};
use crate::error::{Result, SpectrumError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// `X[k] = Σ x[j]·exp(-2πi·jk/n)`, unscaled.
    Forward,
    /// Conjugate kernel, scaled by `1/n`.
    Inverse,
}

/// Two parallel arrays of equal length holding real and imaginary parts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComplexSequence {
    pub re: Vec<f32>,
    pub im: Vec<f32>,
}

impl ComplexSequence {
    pub fn zeros(len: usize) -> Self {
        Self {
            re: vec![0.0; len],
            im: vec![0.0; len],
        }
    }

    pub fn len(&self) -> usize {
        self.re.len()
    }

    pub fn is_empty(&self) -> bool {
        self.re.is_empty()
    }

    /// Squared magnitude of element `k`.
    pub fn power(&self, k: usize) -> f32 {
        self.re[k] * self.re[k] + self.im[k] * self.im[k]
    }
}

/// Iterative radix-2 Cooley-Tukey transform over power-of-two lengths.
///
/// Data is bit-reverse copied into the output arrays, then combined in
/// butterfly passes over block sizes 2, 4, … n. Twiddles inside a block come
/// from the three-term recurrence `t[k+1] = 2cos(δ)·t[k] − t[k−1]`, seeded
/// once per pass, instead of a `sin`/`cos` call per butterfly.
///
/// The recurrence state is carried in `f64` while samples stay `f32`. Kept
/// in `f32`, the rounding of `cos(δ)` alone detunes the rotation enough to
/// reach ~1e-1 rad of phase error at the end of a 4096-point block; in `f64`
/// the twiddle error stays below 1e-11 and the overall error is that of the
/// `f32` butterflies, around 1e-6 relative to the signal norm at n = 4096.
#[derive(Debug, Clone, Copy)]
pub struct ComplexFft<'t> {
    table: &'t BitReversalTable,
}

impl ComplexFft<'static> {
    /// Transform backed by the process-wide bit-reversal table.
    pub fn new() -> Self {
        Self {
            table: BitReversalTable::shared(),
        }
    }
}

impl Default for ComplexFft<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'t> ComplexFft<'t> {
    pub fn with_table(table: &'t BitReversalTable) -> Self {
        Self { table }
    }

    /// Allocating form of [`transform_into`](Self::transform_into).
    /// A missing `imag_in` is treated as all zeros.
    pub fn transform(
        &self,
        direction: Direction,
        real_in: &[f32],
        imag_in: Option<&[f32]>,
    ) -> Result<ComplexSequence> {
        let mut out = ComplexSequence::zeros(real_in.len());
        self.transform_into(direction, real_in, imag_in, &mut out.re, &mut out.im)?;
        Ok(out)
    }

    pub fn transform_into(
        &self,
        direction: Direction,
        real_in: &[f32],
        imag_in: Option<&[f32]>,
        real_out: &mut [f32],
        imag_out: &mut [f32],
    ) -> Result<()> {
        let n = real_in.len();
        if !is_power_of_two(n) {
            return Err(SpectrumError::size(n, "transform size must be a power of two"));
        }
        if let Some(imag) = imag_in {
            if imag.len() != n {
                return Err(SpectrumError::shape("imaginary input", n, imag.len()));
            }
        }
        if real_out.len() != n {
            return Err(SpectrumError::shape("real output", n, real_out.len()));
        }
        if imag_out.len() != n {
            return Err(SpectrumError::shape("imaginary output", n, imag_out.len()));
        }

        let bits = bits_needed(n);
        for i in 0..n {
            let j = self.table.reverse(i, bits);
            real_out[j] = real_in[i];
            imag_out[j] = imag_in.map_or(0.0, |imag| imag[i]);
        }

        let angle_numerator = match direction {
            Direction::Forward => -2.0 * PI,
            Direction::Inverse => 2.0 * PI,
        };

        let mut block_end = 1;
        let mut block_size = 2;
        while block_size <= n {
            let delta = angle_numerator / block_size as f64;

            let sm2 = (-2.0 * delta).sin();
            let sm1 = (-delta).sin();
            let cm2 = (-2.0 * delta).cos();
            let cm1 = (-delta).cos();
            let w = 2.0 * cm1;

            for start in (0..n).step_by(block_size) {
                let (mut ar1, mut ar2) = (cm1, cm2);
                let (mut ai1, mut ai2) = (sm1, sm2);

                for j in start..start + block_end {
                    let ar0 = w * ar1 - ar2;
                    ar2 = ar1;
                    ar1 = ar0;

                    let ai0 = w * ai1 - ai2;
                    ai2 = ai1;
                    ai1 = ai0;

                    let (ar, ai) = (ar0 as f32, ai0 as f32);
                    let k = j + block_end;
                    let tr = ar * real_out[k] - ai * imag_out[k];
                    let ti = ar * imag_out[k] + ai * real_out[k];

                    real_out[k] = real_out[j] - tr;
                    imag_out[k] = imag_out[j] - ti;
                    real_out[j] += tr;
                    imag_out[j] += ti;
                }
            }

            block_end = block_size;
            block_size <<= 1;
        }

        if direction == Direction::Inverse {
            let denom = n as f32;
            for (re, im) in real_out.iter_mut().zip(imag_out.iter_mut()) {
                *re /= denom;
                *im /= denom;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rustfft::{num_complex::Complex, FftPlanner};

    /// Deterministic uniform noise in [-1, 1).
    pub(crate) fn noise(len: usize, seed: u64) -> Vec<f32> {
        let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (0..len)
            .map(|_| {
                state = state
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                ((state >> 40) as f32 / (1u64 << 24) as f32) * 2.0 - 1.0
            })
            .collect()
    }

    fn assert_close(actual: f32, expected: f32, tol: f32) {
        assert!(
            (actual - expected).abs() <= tol * (1.0 + expected.abs()),
            "{actual} vs {expected}"
        );
    }

    #[test]
    fn dc_signal_lands_in_bin_zero() {
        let out = ComplexFft::new()
            .transform(Direction::Forward, &[1.0; 8], None)
            .unwrap();
        assert!((out.re[0] - 8.0).abs() < 1e-5);
        for k in 1..8 {
            assert!(out.power(k) < 1e-10);
        }
    }

    #[test]
    fn forward_then_inverse_round_trips() {
        let fft = ComplexFft::new();
        for bits in 0..=10 {
            let n = 1 << bits;
            let re = noise(n, bits as u64);
            let im = noise(n, 100 + bits as u64);
            let spec = fft.transform(Direction::Forward, &re, Some(&im)).unwrap();
            let back = fft
                .transform(Direction::Inverse, &spec.re, Some(&spec.im))
                .unwrap();
            for i in 0..n {
                assert!((back.re[i] - re[i]).abs() < 1e-4, "n={n} i={i}");
                assert!((back.im[i] - im[i]).abs() < 1e-4, "n={n} i={i}");
            }
        }
    }

    #[test]
    fn matches_rustfft_forward() {
        let mut planner = FftPlanner::<f32>::new();
        for n in [2usize, 16, 256, 4096] {
            let re = noise(n, 7);
            let im = noise(n, 8);
            let ours = ComplexFft::new()
                .transform(Direction::Forward, &re, Some(&im))
                .unwrap();

            let mut reference: Vec<Complex<f32>> =
                re.iter().zip(&im).map(|(&r, &i)| Complex::new(r, i)).collect();
            planner.plan_fft_forward(n).process(&mut reference);

            for k in 0..n {
                assert_close(ours.re[k], reference[k].re, 1e-3);
                assert_close(ours.im[k], reference[k].im, 1e-3);
            }
        }
    }

    #[test]
    fn sine_at_bin_two_has_mirrored_peaks() {
        let n = 16;
        let signal: Vec<f32> = (0..n)
            .map(|i| (2.0 * std::f32::consts::PI * 2.0 * i as f32 / n as f32).sin())
            .collect();
        let out = ComplexFft::new()
            .transform(Direction::Forward, &signal, None)
            .unwrap();
        assert!(out.power(2).sqrt() > 7.9);
        assert!(out.power(14).sqrt() > 7.9);
        // forward convention puts -n/2·i in bin k for sin
        assert!(out.im[2] < -7.9);
        for k in [0, 1, 3, 4, 5, 8, 12, 13, 15] {
            assert!(out.power(k).sqrt() < 1e-4);
        }
    }

    #[test]
    fn explicit_table_gives_same_result() {
        let table = BitReversalTable::new();
        let re = noise(64, 3);
        let a = ComplexFft::with_table(&table)
            .transform(Direction::Forward, &re, None)
            .unwrap();
        let b = ComplexFft::new()
            .transform(Direction::Forward, &re, None)
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_non_power_of_two() {
        let err = ComplexFft::new()
            .transform(Direction::Forward, &[0.0; 12], None)
            .unwrap_err();
        assert!(matches!(err, SpectrumError::InvalidSize { size: 12, .. }));

        let err = ComplexFft::new()
            .transform(Direction::Forward, &[], None)
            .unwrap_err();
        assert!(matches!(err, SpectrumError::InvalidSize { size: 0, .. }));
    }

    #[test]
    fn rejects_mismatched_imaginary_input() {
        let err = ComplexFft::new()
            .transform(Direction::Forward, &[0.0; 8], Some(&[0.0; 4]))
            .unwrap_err();
        assert_eq!(err, SpectrumError::shape("imaginary input", 8, 4));
    }
}
