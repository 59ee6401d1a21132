//! Spectral analysis engine: packed real FFT, windowing, per-bin power
//! derivation and a scrolling spectrogram history.

pub mod audio;
pub mod config;
pub mod error;
pub mod fft;
pub mod report;
pub mod spectrum;
pub mod window;

pub use config::AnalysisConfig;
pub use error::{Result, SpectrumError};
pub use fft::{BitReversalTable, ComplexFft, ComplexSequence, Direction, RealFft};
pub use spectrum::analyzer::SpectrumAnalyzer;
pub use spectrum::handoff::{handoff, PolledFrame, SpectrumPublisher, SpectrumSubscriber};
pub use spectrum::history::SpectrogramHistory;
pub use spectrum::{LoudnessMode, Spectrum, SpectrumBin};
pub use window::WindowFunction;
