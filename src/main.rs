mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use cli::Cli;
use spectrolite::audio::analysis::{analyze_batch, analyze_stream, StreamOptions};
use spectrolite::audio::{decode_audio, frames};
use spectrolite::config::{self, default_buffer_size, default_render_fps};
use spectrolite::report::{self, FrameSummary, ProbeResult, Report, SpectrogramDump};
use spectrolite::{AnalysisConfig, LoudnessMode, SpectrogramHistory, WindowFunction};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let mut cli = Cli::parse();

    if cli.list_windows {
        println!("Available window functions:");
        for name in spectrolite::window::names() {
            println!("  {}", name.to_lowercase());
        }
        return Ok(());
    }

    // Explicit --config path, or spectrolite.toml / user config
    let config_path = cli.config.clone().or_else(config::discover_config_path);
    if let Some(ref path) = config_path {
        if let Some(cfg) = config::load_config(path) {
            log::info!("Loaded config from {}", path.display());
            // Config values apply only when the CLI is at its default
            if cli.buffer_size == default_buffer_size() {
                cli.buffer_size = cfg.analysis.buffer_size;
            }
            if cli.window == WindowFunction::default() {
                cli.window = cfg.analysis.window_function;
            }
            if cli.loudness == LoudnessMode::default() {
                cli.loudness = cfg.analysis.loudness_mode;
            }
            if cli.probes.is_empty() {
                cli.probes = cfg.output.probes;
            }
            if !cli.include_spectrogram {
                cli.include_spectrogram = cfg.output.include_spectrogram;
            }
            if cli.render_fps == default_render_fps() {
                cli.render_fps = cfg.output.render_fps;
            }
        }
    }

    let input = cli.input.as_ref().context("Input audio file is required")?;
    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }

    log::info!("spectrolite - spectrum analysis");
    log::info!("Input: {}", input.display());
    log::info!("Output: {}", cli.output.display());

    log::info!("Decoding audio...");
    let audio = decode_audio(input)?;

    let analysis = AnalysisConfig {
        buffer_size: cli.buffer_size,
        sample_rate: audio.sample_rate,
        loudness_mode: cli.loudness,
        window_function: cli.window,
    };
    analysis.validate().context("Invalid analysis settings")?;
    log::info!(
        "Analysis: {} samples/frame, {} window, {:?} spectrogram, {:.2} Hz/bin",
        analysis.buffer_size,
        analysis.window_function,
        analysis.loudness_mode,
        spectrolite::spectrum::freq_step(analysis.sample_rate, analysis.buffer_size)
    );

    let n = analysis.buffer_size;
    let total = frames::frame_count(audio.samples.len(), n, cli.pad_tail);
    if total == 0 {
        anyhow::bail!(
            "Input is shorter than one frame ({} samples < {})",
            audio.samples.len(),
            n
        );
    }

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} frames ({eta} remaining)")?
            .progress_chars("=>-"),
    );

    let mut summaries: Vec<FrameSummary> = Vec::new();
    let (history, probe_frame, stream_stats) = if cli.stream {
        let outcome = analyze_stream(
            &audio.samples,
            &analysis,
            StreamOptions {
                pad_tail: cli.pad_tail,
                realtime: !cli.fast,
                render_fps: cli.render_fps,
            },
            |frame| {
                summaries.push(FrameSummary::new(frame.sequence as usize - 1, &frame.spectrum));
                pb.set_position(frame.sequence);
            },
        )?;
        pb.finish_with_message("Stream complete");
        log::info!(
            "Rendered {} of {} frames",
            outcome.stats.rendered,
            outcome.stats.published
        );

        let probe_frame = outcome
            .latest
            .as_ref()
            .map(|frame| (frame.sequence as usize - 1, frame.spectrum.clone()));
        (outcome.history, probe_frame, Some(outcome.stats))
    } else {
        let spectra = analyze_batch(&audio.samples, &analysis, cli.pad_tail, || pb.inc(1))?;
        pb.finish_with_message("Analysis complete");

        let mut history = SpectrogramHistory::for_buffer_size(n, analysis.loudness_mode)?;
        for (index, spectrum) in spectra.iter().enumerate() {
            history.push(spectrum)?;
            summaries.push(FrameSummary::new(index, spectrum));
        }

        let probe_frame = report::loudest_frame(&spectra).map(|i| (i, spectra[i].clone()));
        (history, probe_frame, None)
    };

    let probes: Vec<ProbeResult> = match &probe_frame {
        Some((index, spectrum)) => {
            let frame = frames::frame(&audio.samples, *index, n);
            cli.probes
                .iter()
                .map(|&hz| ProbeResult::measure(spectrum, &frame, hz))
                .collect()
        }
        None => Vec::new(),
    };
    for probe in &probes {
        match probe.power_near {
            Some(power) => log::info!(
                "Probe {:.1} Hz: power {:.4e}, correlation {:.4e}",
                probe.hz,
                power,
                probe.correlation_power
            ),
            None => log::warn!("Probe {:.1} Hz is outside the analyzed band", probe.hz),
        }
    }

    let report = Report {
        input: input.display().to_string(),
        sample_rate: audio.sample_rate,
        duration_secs: audio.duration(),
        analysis,
        frequency_step_hz: spectrolite::spectrum::freq_step(audio.sample_rate, n),
        frames: summaries,
        probe_frame: probe_frame.map(|(index, _)| index),
        probes,
        stream: stream_stats,
        spectrogram: cli
            .include_spectrogram
            .then(|| SpectrogramDump::from(&history)),
    };

    report::write_report(&cli.output, &report)?;
    log::info!("Report written to {}", cli.output.display());

    Ok(())
}
