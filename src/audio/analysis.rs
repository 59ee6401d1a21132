//! Whole-file analysis passes.
//!
//! The batch pass spreads frames over rayon workers, each owning one
//! analyzer. The stream pass runs a capture thread that analyzes frames at
//! the audio rate and hands the newest spectrum to a render loop polling at
//! its own rate, the way a live display would consume it.

use rayon::prelude::*;
use serde::Serialize;
use std::thread;
use std::time::{Duration, Instant};

use super::frames;
use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::spectrum::analyzer::SpectrumAnalyzer;
use crate::spectrum::handoff::{handoff, PolledFrame};
use crate::spectrum::history::SpectrogramHistory;
use crate::spectrum::Spectrum;

/// Analyze every frame of `samples`, in frame order.
///
/// `on_frame` runs once per analyzed frame from whichever worker finished it.
pub fn analyze_batch<F>(
    samples: &[f32],
    config: &AnalysisConfig,
    pad_tail: bool,
    on_frame: F,
) -> Result<Vec<Spectrum>>
where
    F: Fn() + Sync + Send,
{
    config.validate()?;
    let n = config.buffer_size;
    let total = frames::frame_count(samples.len(), n, pad_tail);
    log::info!("Batch analysis: {} frames of {} samples", total, n);

    (0..total)
        .into_par_iter()
        .map_init(
            || SpectrumAnalyzer::new(config),
            |analyzer, index| {
                let analyzer = analyzer.as_mut().map_err(|e| e.clone())?;
                let frame = frames::frame(samples, index, n);
                let spectrum = analyzer.analyze(&frame)?.clone();
                on_frame();
                Ok(spectrum)
            },
        )
        .collect()
}

#[derive(Debug, Clone, Copy)]
pub struct StreamOptions {
    pub pad_tail: bool,
    /// Pace the capture thread at `buffer_size / sample_rate` per frame.
    pub realtime: bool,
    /// Render loop poll rate; 0 polls as fast as possible.
    pub render_fps: u32,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StreamStats {
    pub published: u64,
    pub rendered: u64,
    pub skipped: u64,
}

pub struct StreamOutcome {
    pub history: SpectrogramHistory,
    /// Last frame the render loop saw; its sequence number minus one is the
    /// frame index.
    pub latest: Option<PolledFrame>,
    pub stats: StreamStats,
}

/// Run the capture thread and render loop until every frame is published
/// and the last one has been seen. `on_render` gets each frame the render
/// loop picks up.
pub fn analyze_stream<F>(
    samples: &[f32],
    config: &AnalysisConfig,
    options: StreamOptions,
    mut on_render: F,
) -> Result<StreamOutcome>
where
    F: FnMut(&PolledFrame),
{
    config.validate()?;
    let n = config.buffer_size;
    let mut history = SpectrogramHistory::for_buffer_size(n, config.loudness_mode)?;
    let frame_period = Duration::from_secs_f64(n as f64 / config.sample_rate as f64);
    let poll_interval = match options.render_fps {
        0 => Duration::ZERO,
        fps => Duration::from_secs_f64(1.0 / fps as f64),
    };
    log::info!(
        "Stream analysis: {:.1}ms frames, render loop at {} fps{}",
        frame_period.as_secs_f64() * 1000.0,
        options.render_fps,
        if options.realtime { ", realtime" } else { "" }
    );

    let (publisher, mut subscriber) = handoff();
    let mut stats = StreamStats::default();
    let mut latest: Option<PolledFrame> = None;

    thread::scope(|scope| -> Result<()> {
        let capture = scope.spawn(move || -> Result<u64> {
            let mut analyzer = SpectrumAnalyzer::new(config)?;
            let start = Instant::now();
            for (index, frame) in frames::frames(samples, n, options.pad_tail).enumerate() {
                if options.realtime {
                    let due = frame_period.mul_f64(index as f64);
                    if let Some(wait) = due.checked_sub(start.elapsed()) {
                        thread::sleep(wait);
                    }
                }
                publisher.publish(analyzer.analyze(&frame)?);
            }
            Ok(publisher.published())
        });

        loop {
            if let Some(frame) = subscriber.poll() {
                history.push(&frame.spectrum)?;
                on_render(&frame);
                if frame.skipped > 0 {
                    log::debug!("Render loop missed {} frame(s)", frame.skipped);
                }
                stats.rendered += 1;
                stats.skipped += frame.skipped;
                latest = Some(frame);
            } else if subscriber.is_finished() {
                break;
            }

            if poll_interval.is_zero() {
                thread::yield_now();
            } else {
                thread::sleep(poll_interval);
            }
        }

        stats.published = capture
            .join()
            .unwrap_or_else(|panic| std::panic::resume_unwind(panic))?;
        Ok(())
    })?;

    if stats.skipped > 0 {
        log::warn!(
            "Render loop skipped {} of {} frames",
            stats.skipped,
            stats.published
        );
    }

    Ok(StreamOutcome {
        history,
        latest,
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fft::complex::tests::noise;
    use crate::spectrum::LoudnessMode;
    use crate::window::WindowFunction;
    use std::f32::consts::PI;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn config(buffer_size: usize) -> AnalysisConfig {
        AnalysisConfig {
            buffer_size,
            sample_rate: 8000,
            loudness_mode: LoudnessMode::Power,
            window_function: WindowFunction::Hanning,
        }
    }

    fn tone(hz: f32, len: usize, sample_rate: u32) -> Vec<f32> {
        (0..len)
            .map(|t| (2.0 * PI * hz * t as f32 / sample_rate as f32).sin())
            .collect()
    }

    #[test]
    fn batch_matches_sequential_analysis() {
        let cfg = config(256);
        let samples = noise(256 * 9 + 40, 3);

        let counted = AtomicUsize::new(0);
        let spectra = analyze_batch(&samples, &cfg, false, || {
            counted.fetch_add(1, Ordering::Relaxed);
        })
        .unwrap();
        assert_eq!(spectra.len(), 9);
        assert_eq!(counted.load(Ordering::Relaxed), 9);

        let mut analyzer = SpectrumAnalyzer::new(&cfg).unwrap();
        for (spectrum, frame) in spectra.iter().zip(frames::frames(&samples, 256, false)) {
            assert_eq!(spectrum, analyzer.analyze(&frame).unwrap());
        }
    }

    #[test]
    fn batch_pads_tail_on_request() {
        let cfg = config(64);
        let samples = noise(64 * 2 + 1, 8);
        assert_eq!(analyze_batch(&samples, &cfg, true, || {}).unwrap().len(), 3);
        assert_eq!(analyze_batch(&samples, &cfg, false, || {}).unwrap().len(), 2);
    }

    #[test]
    fn batch_rejects_bad_config() {
        let mut cfg = config(64);
        cfg.buffer_size = 100;
        assert!(analyze_batch(&[0.0; 400], &cfg, false, || {}).is_err());
    }

    #[test]
    fn stream_delivers_final_frame() {
        let cfg = config(128);
        let samples = tone(1000.0, 128 * 20, cfg.sample_rate);
        let mut seen = Vec::new();
        let outcome = analyze_stream(
            &samples,
            &cfg,
            StreamOptions {
                pad_tail: false,
                realtime: false,
                render_fps: 0,
            },
            |frame| seen.push(frame.sequence),
        )
        .unwrap();

        assert_eq!(outcome.stats.published, 20);
        assert_eq!(seen.len() as u64, outcome.stats.rendered);
        assert!(seen.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(outcome.stats.rendered + outcome.stats.skipped, 20);
        assert_eq!(outcome.history.len(), outcome.stats.rendered.min(64) as usize);

        let latest = outcome.latest.unwrap();
        assert_eq!(latest.sequence, 20);
        // 1000 Hz at 62.5 Hz per bin
        assert_eq!(latest.spectrum.peak_bin(), Some(16));
    }

    #[test]
    fn stream_of_short_input_publishes_nothing() {
        let cfg = config(128);
        let outcome = analyze_stream(
            &[0.5; 100],
            &cfg,
            StreamOptions {
                pad_tail: false,
                realtime: false,
                render_fps: 0,
            },
            |_| panic!("nothing to render"),
        )
        .unwrap();
        assert_eq!(outcome.stats, StreamStats::default());
        assert!(outcome.latest.is_none());
        assert!(outcome.history.is_empty());
    }
}
