use super::{freq_step, lookup, Spectrum, SpectrumBin};
use crate::config::AnalysisConfig;
use crate::error::{Result, SpectrumError};
use crate::fft::{ComplexFft, Direction, RealFft};
use crate::window;

/// Windowed real FFT over fixed-size frames, plus the derived per-bin table.
///
/// Owns every buffer it touches; `analyze` allocates nothing after
/// construction. The raw samples of the latest frame are kept for
/// single-frequency correlation queries.
#[derive(Debug, Clone)]
pub struct SpectrumAnalyzer {
    config: AnalysisConfig,
    window: Vec<f32>,
    scratch: Vec<f32>,
    fft: RealFft,
    re: Vec<f32>,
    im: Vec<f32>,
    last_frame: Vec<f32>,
    spectrum: Spectrum,
    synth: Synthesis,
}

#[derive(Debug, Clone)]
struct Synthesis {
    fft: ComplexFft<'static>,
    spec_re: Vec<f32>,
    spec_im: Vec<f32>,
    out_re: Vec<f32>,
    out_im: Vec<f32>,
}

impl SpectrumAnalyzer {
    pub fn new(config: &AnalysisConfig) -> Result<Self> {
        config.validate()?;
        let n = config.buffer_size;
        let fft = RealFft::new(n)?;
        let bins_out = fft.output_len();

        log::debug!(
            "Analyzer: {} samples @ {}Hz, {} window, {:?} loudness",
            n,
            config.sample_rate,
            config.window_function,
            config.loudness_mode
        );

        Ok(Self {
            config: *config,
            window: window::coefficients(config.window_function, n)?,
            scratch: vec![0.0; n],
            fft,
            re: vec![0.0; bins_out],
            im: vec![0.0; bins_out],
            last_frame: vec![0.0; n],
            spectrum: Spectrum::silent(n, config.sample_rate),
            synth: Synthesis {
                fft: ComplexFft::new(),
                spec_re: vec![0.0; n],
                spec_im: vec![0.0; n],
                out_re: vec![0.0; n],
                out_im: vec![0.0; n],
            },
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Most recently computed spectrum (silent before the first frame).
    pub fn spectrum(&self) -> &Spectrum {
        &self.spectrum
    }

    /// Raw samples of the most recently analyzed frame, before windowing.
    pub fn last_frame(&self) -> &[f32] {
        &self.last_frame
    }

    pub fn freq_step(&self) -> f32 {
        freq_step(self.config.sample_rate, self.config.buffer_size)
    }

    pub fn analyze(&mut self, frame: &[f32]) -> Result<&Spectrum> {
        let n = self.config.buffer_size;
        if frame.len() != n {
            return Err(SpectrumError::shape("sample frame", n, frame.len()));
        }

        self.last_frame.copy_from_slice(frame);
        self.scratch.copy_from_slice(frame);
        for (s, w) in self.scratch.iter_mut().zip(&self.window) {
            *s *= w;
        }

        self.fft.process(&self.scratch, &mut self.re, &mut self.im)?;

        let step = self.freq_step();
        let mut total_power = 0.0f32;
        let mut max_power = 0.0f32;
        for (i, bin) in self.spectrum.bins.iter_mut().enumerate() {
            let (re, im) = (self.re[i], self.im[i]);
            let power = re * re + im * im;
            total_power += power;
            max_power = max_power.max(power);

            *bin = SpectrumBin {
                power,
                magnitude: 2.0 * power.sqrt(),
                phase: im.atan2(re),
                // log10(0) is -inf, the silence marker
                db: 10.0 * power.log10(),
                frequency_hz: i as f32 * step,
            };
        }
        self.spectrum.max_power = max_power;
        self.spectrum.avg_power = total_power / self.spectrum.bins.len() as f32;

        log::trace!(
            "Analyzed frame: max_power={:.4e}, avg_power={:.4e}",
            max_power,
            self.spectrum.avg_power
        );

        Ok(&self.spectrum)
    }

    /// Single-frequency DFT power of the last analyzed frame.
    pub fn correlation_power(&self, hz: f32) -> f64 {
        lookup::correlation_power(&self.last_frame, self.config.sample_rate, hz)
    }

    /// Overlap-add the windowed real parts `m·cos(φ)` of the analyzed half
    /// into `dest[offset..offset + buffer_size]`. Slots above the half are
    /// zero. No inverse transform is involved; see
    /// [`resynthesize`](Self::resynthesize) for that.
    pub fn synthesize(
        &mut self,
        magnitude: &[f32],
        phase: &[f32],
        dest: &mut [f32],
        offset: usize,
    ) -> Result<()> {
        let (n, half) = self.check_synthesis_shapes(magnitude, phase, dest, offset)?;

        for (i, s) in self.scratch.iter_mut().enumerate() {
            *s = if i < half {
                magnitude[i] * phase[i].cos()
            } else {
                0.0
            };
        }
        for (s, w) in self.scratch.iter_mut().zip(&self.window) {
            *s *= w;
        }
        for (d, s) in dest[offset..offset + n].iter_mut().zip(&self.scratch) {
            *d += s;
        }
        Ok(())
    }

    /// Inverse-transform overlap-add. Rebuilds the conjugate-symmetric
    /// spectrum `X[k] = m[k]/2 · e^{iφ[k]}` (undoing the factor of two in
    /// `magnitude`), runs the inverse FFT, windows the real result and adds
    /// it into `dest[offset..offset + buffer_size]`.
    ///
    /// The Nyquist bin is not part of a [`Spectrum`] and comes back as zero.
    pub fn resynthesize(
        &mut self,
        magnitude: &[f32],
        phase: &[f32],
        dest: &mut [f32],
        offset: usize,
    ) -> Result<()> {
        let (n, half) = self.check_synthesis_shapes(magnitude, phase, dest, offset)?;
        let synth = &mut self.synth;

        synth.spec_re.fill(0.0);
        synth.spec_im.fill(0.0);
        for k in 0..half {
            let amp = 0.5 * magnitude[k];
            let (sin, cos) = phase[k].sin_cos();
            synth.spec_re[k] = amp * cos;
            synth.spec_im[k] = amp * sin;
            if k > 0 {
                synth.spec_re[n - k] = amp * cos;
                synth.spec_im[n - k] = -amp * sin;
            }
        }

        synth.fft.transform_into(
            Direction::Inverse,
            &synth.spec_re,
            Some(&synth.spec_im),
            &mut synth.out_re,
            &mut synth.out_im,
        )?;

        for ((d, s), w) in dest[offset..offset + n]
            .iter_mut()
            .zip(&synth.out_re)
            .zip(&self.window)
        {
            *d += s * w;
        }
        Ok(())
    }

    fn check_synthesis_shapes(
        &self,
        magnitude: &[f32],
        phase: &[f32],
        dest: &[f32],
        offset: usize,
    ) -> Result<(usize, usize)> {
        let n = self.config.buffer_size;
        let half = n / 2;
        if magnitude.len() != half {
            return Err(SpectrumError::shape("magnitude", half, magnitude.len()));
        }
        if phase.len() != half {
            return Err(SpectrumError::shape("phase", half, phase.len()));
        }
        match offset.checked_add(n) {
            Some(end) if end <= dest.len() => Ok((n, half)),
            end => Err(SpectrumError::shape(
                "synthesis destination",
                end.unwrap_or(usize::MAX),
                dest.len(),
            )),
        }
    }
}
