//! Real-input FFT of length n via one complex FFT of length n/2.
//!
//! Even samples go into the real part and odd samples into the imaginary
//! part of a half-length sequence `z`. With `Z = FFT(z)` the even and odd
//! sub-spectra are recovered through conjugate symmetry
//!
//! ```text
//! E[k] = (Z[k] + conj Z[h-k]) / 2
//! O[k] = (Z[k] - conj Z[h-k]) / 2i
//! X[k] = E[k] + W^k O[k],   W = exp(-2πi/n), h = n/2
//! ```
//!
//! and each loop step fills bins `k` and `h - k` together. Bins 0, h/2 and h
//! fall outside the loop.

use std::f64::consts::PI;

use super::{is_power_of_two, ComplexFft, ComplexSequence, Direction};
use crate::error::{Result, SpectrumError};

#[derive(Debug, Clone)]
pub struct RealFft {
    size: usize,
    fft: ComplexFft<'static>,
    packed_re: Vec<f32>,
    packed_im: Vec<f32>,
    z_re: Vec<f32>,
    z_im: Vec<f32>,
}

impl RealFft {
    pub fn new(size: usize) -> Result<Self> {
        if size < 2 || !is_power_of_two(size) {
            return Err(SpectrumError::size(
                size,
                "real transform size must be a power of two of at least 2",
            ));
        }
        let half = size / 2;
        Ok(Self {
            size,
            fft: ComplexFft::new(),
            packed_re: vec![0.0; half],
            packed_im: vec![0.0; half],
            z_re: vec![0.0; half],
            z_im: vec![0.0; half],
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of output bins, `size / 2 + 1`.
    pub fn output_len(&self) -> usize {
        self.size / 2 + 1
    }

    /// Half-spectrum of `input` into `re_out`/`im_out`, each `size/2 + 1` long.
    /// Bins 0 and `size/2` are purely real.
    pub fn process(&mut self, input: &[f32], re_out: &mut [f32], im_out: &mut [f32]) -> Result<()> {
        let n = self.size;
        let half = n / 2;
        if input.len() != n {
            return Err(SpectrumError::shape("real transform input", n, input.len()));
        }
        if re_out.len() != half + 1 {
            return Err(SpectrumError::shape("real output", half + 1, re_out.len()));
        }
        if im_out.len() != half + 1 {
            return Err(SpectrumError::shape("imaginary output", half + 1, im_out.len()));
        }

        for (i, pair) in input.chunks_exact(2).enumerate() {
            self.packed_re[i] = pair[0];
            self.packed_im[i] = pair[1];
        }

        self.fft.transform_into(
            Direction::Forward,
            &self.packed_re,
            Some(&self.packed_im),
            &mut self.z_re,
            &mut self.z_im,
        )?;

        let (z_re, z_im) = (&self.z_re, &self.z_im);

        let theta = PI / half as f64;
        let wtemp = (0.5 * theta).sin();
        let wpr = -2.0 * wtemp * wtemp;
        let wpi = theta.sin();
        let mut wr = 1.0 + wpr;
        let mut wi = wpi;

        for i in 1..half / 2 {
            let i3 = half - i;

            let h1r = 0.5 * (z_re[i] + z_re[i3]);
            let h1i = 0.5 * (z_im[i] - z_im[i3]);
            let h2r = 0.5 * (z_im[i] + z_im[i3]);
            let h2i = -0.5 * (z_re[i] - z_re[i3]);

            let (c, s) = (wr as f32, wi as f32);
            re_out[i] = h1r + c * h2r + s * h2i;
            im_out[i] = h1i + c * h2i - s * h2r;
            re_out[i3] = h1r - c * h2r - s * h2i;
            im_out[i3] = -h1i + c * h2i - s * h2r;

            let prev = wr;
            wr = wr * wpr - wi * wpi + wr;
            wi = wi * wpr + prev * wpi + wi;
        }

        if half >= 2 {
            let mid = half / 2;
            re_out[mid] = z_re[mid];
            im_out[mid] = -z_im[mid];
        }

        re_out[0] = z_re[0] + z_im[0];
        im_out[0] = 0.0;
        re_out[half] = z_re[0] - z_im[0];
        im_out[half] = 0.0;

        Ok(())
    }
}

/// One-shot real transform; `input.len()` must be a power of two ≥ 2.
pub fn real_transform(input: &[f32]) -> Result<ComplexSequence> {
    let mut fft = RealFft::new(input.len())?;
    let mut out = ComplexSequence::zeros(fft.output_len());
    fft.process(input, &mut out.re, &mut out.im)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fft::complex::tests::noise;
    use rustfft::{num_complex::Complex, FftPlanner};

    #[test]
    fn matches_full_complex_transform() {
        let full = ComplexFft::new();
        for bits in 1..=11 {
            let n = 1usize << bits;
            let signal = noise(n, 40 + bits as u64);
            let half = real_transform(&signal).unwrap();
            let reference = full.transform(Direction::Forward, &signal, None).unwrap();

            assert_eq!(half.len(), n / 2 + 1);
            let scale = (n as f32).sqrt();
            for k in 0..=n / 2 {
                assert!(
                    (half.re[k] - reference.re[k]).abs() < 1e-4 * scale,
                    "n={n} k={k} re {} vs {}",
                    half.re[k],
                    reference.re[k]
                );
                assert!(
                    (half.im[k] - reference.im[k]).abs() < 1e-4 * scale,
                    "n={n} k={k} im {} vs {}",
                    half.im[k],
                    reference.im[k]
                );
            }
        }
    }

    #[test]
    fn matches_rustfft() {
        let n = 1024;
        let signal = noise(n, 5);
        let ours = real_transform(&signal).unwrap();

        let mut buffer: Vec<Complex<f32>> = signal.iter().map(|&s| Complex::new(s, 0.0)).collect();
        FftPlanner::<f32>::new().plan_fft_forward(n).process(&mut buffer);

        for k in 0..=n / 2 {
            assert!((ours.re[k] - buffer[k].re).abs() < 3e-3, "k={k}");
            assert!((ours.im[k] - buffer[k].im).abs() < 3e-3, "k={k}");
        }
    }

    #[test]
    fn edge_bins_are_real() {
        // DC of 1 plus alternating Nyquist component of 0.5
        let signal: Vec<f32> = (0..8)
            .map(|i| 1.0 + if i % 2 == 0 { 0.5 } else { -0.5 })
            .collect();
        let out = real_transform(&signal).unwrap();
        assert!((out.re[0] - 8.0).abs() < 1e-5);
        assert!((out.re[4] - 4.0).abs() < 1e-5);
        assert_eq!(out.im[0], 0.0);
        assert_eq!(out.im[4], 0.0);
        for k in 1..4 {
            assert!(out.power(k) < 1e-10);
        }
    }

    #[test]
    fn two_point_transform() {
        let out = real_transform(&[3.0, 1.0]).unwrap();
        assert_eq!(out.re, vec![4.0, 2.0]);
        assert_eq!(out.im, vec![0.0, 0.0]);
    }

    #[test]
    fn rejects_bad_sizes() {
        assert!(matches!(RealFft::new(1), Err(SpectrumError::InvalidSize { size: 1, .. })));
        assert!(matches!(RealFft::new(6), Err(SpectrumError::InvalidSize { size: 6, .. })));

        let mut fft = RealFft::new(8).unwrap();
        let mut re = vec![0.0; 5];
        let mut im = vec![0.0; 5];
        let err = fft.process(&[0.0; 4], &mut re, &mut im).unwrap_err();
        assert_eq!(err, SpectrumError::shape("real transform input", 8, 4));

        let mut short = vec![0.0; 4];
        assert!(fft.process(&[0.0; 8], &mut short, &mut im).is_err());
    }
}
