use thiserror::Error;

pub type Result<T> = std::result::Result<T, SpectrumError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpectrumError {
    /// Transform size not a power of two, window shorter than two samples,
    /// or a zero-sized history.
    #[error("invalid size {size}: {reason}")]
    InvalidSize { size: usize, reason: &'static str },

    /// An input slice does not match the configured length.
    #[error("{what}: expected length {expected}, got {actual}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// History query outside the configured matrix.
    #[error("history index ({age}, {bin}) outside {frames}x{bins}")]
    OutOfRange {
        age: usize,
        bin: usize,
        frames: usize,
        bins: usize,
    },

    /// Queried frequency has no bracketing pair of bins. Expected outcome,
    /// distinct from a zero-power answer.
    #[error("no bins bracket {hz} Hz (spectrum covers 0..{max_hz} Hz)")]
    LookupNotFound { hz: f32, max_hz: f32 },
}

impl SpectrumError {
    pub(crate) fn shape(what: &'static str, expected: usize, actual: usize) -> Self {
        Self::ShapeMismatch {
            what,
            expected,
            actual,
        }
    }

    pub(crate) fn size(size: usize, reason: &'static str) -> Self {
        Self::InvalidSize { size, reason }
    }
}
