use super::{LoudnessMode, Spectrum};
use crate::error::{Result, SpectrumError};

/// Rolling `frames × bins` matrix of per-frame spectrum values.
///
/// Age 0 is always the most recent push; once full, each push overwrites the
/// oldest column. Columns live in one contiguous block addressed through a
/// modular write index, so a push costs O(bins) rather than a shift of the
/// whole matrix. Capacity is fixed; a new shape needs a new history.
#[derive(Debug, Clone)]
pub struct SpectrogramHistory {
    cells: Vec<f32>,
    frames: usize,
    bins: usize,
    head: usize,
    len: usize,
    mode: LoudnessMode,
}

impl SpectrogramHistory {
    pub fn new(frames: usize, bins: usize, mode: LoudnessMode) -> Result<Self> {
        if frames == 0 {
            return Err(SpectrumError::size(frames, "history needs at least one frame"));
        }
        if bins == 0 {
            return Err(SpectrumError::size(bins, "history needs at least one bin"));
        }
        log::debug!("Spectrogram history: {} frames x {} bins ({:?})", frames, bins, mode);
        Ok(Self {
            cells: vec![mode.silence(); frames * bins],
            frames,
            bins,
            head: 0,
            len: 0,
            mode,
        })
    }

    /// Square history of `buffer_size / 2` frames by `buffer_size / 2` bins.
    pub fn for_buffer_size(buffer_size: usize, mode: LoudnessMode) -> Result<Self> {
        Self::new(buffer_size / 2, buffer_size / 2, mode)
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn bins(&self) -> usize {
        self.bins
    }

    pub fn mode(&self) -> LoudnessMode {
        self.mode
    }

    /// Columns pushed so far, capped at `frames`.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.frames
    }

    pub fn push(&mut self, spectrum: &Spectrum) -> Result<()> {
        if spectrum.len() != self.bins {
            return Err(SpectrumError::shape("spectrum bins", self.bins, spectrum.len()));
        }

        let start = self.head * self.bins;
        let column = &mut self.cells[start..start + self.bins];
        for (cell, value) in column.iter_mut().zip(spectrum.values(self.mode)) {
            *cell = value;
        }

        self.head = (self.head + 1) % self.frames;
        self.len = (self.len + 1).min(self.frames);
        Ok(())
    }

    /// Value of `bin` in the column pushed `age` pushes ago. Ages not yet
    /// written hold the mode's silence value.
    pub fn value_at(&self, age: usize, bin: usize) -> Result<f32> {
        if age >= self.frames || bin >= self.bins {
            return Err(self.out_of_range(age, bin));
        }
        Ok(self.cells[self.slot(age) * self.bins + bin])
    }

    pub fn column(&self, age: usize) -> Result<&[f32]> {
        if age >= self.frames {
            return Err(self.out_of_range(age, 0));
        }
        let start = self.slot(age) * self.bins;
        Ok(&self.cells[start..start + self.bins])
    }

    /// Filled columns, newest first.
    pub fn columns(&self) -> impl Iterator<Item = &[f32]> + '_ {
        (0..self.len).map(move |age| {
            let start = self.slot(age) * self.bins;
            &self.cells[start..start + self.bins]
        })
    }

    /// Smallest and largest value over the filled columns.
    pub fn value_range(&self) -> Option<(f32, f32)> {
        self.columns().flatten().fold(None, |acc, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }

    /// Filled columns copied out, newest first.
    pub fn to_matrix(&self) -> Vec<Vec<f32>> {
        self.columns().map(<[f32]>::to_vec).collect()
    }

    fn slot(&self, age: usize) -> usize {
        (self.head + self.frames - 1 - age) % self.frames
    }

    fn out_of_range(&self, age: usize, bin: usize) -> SpectrumError {
        SpectrumError::OutOfRange {
            age,
            bin,
            frames: self.frames,
            bins: self.bins,
        }
    }
}
