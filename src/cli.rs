use clap::Parser;
use std::path::PathBuf;

use spectrolite::{LoudnessMode, WindowFunction};

#[derive(Parser, Debug)]
#[command(name = "spectrolite", about = "Frame-by-frame spectrum analysis of audio files")]
pub struct Cli {
    /// Input audio file (WAV, MP3, FLAC, OGG)
    pub input: Option<PathBuf>,

    /// Output JSON report
    #[arg(short, long, default_value = "spectrum.json")]
    pub output: PathBuf,

    /// Config file (defaults to spectrolite.toml or the user config dir)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Samples per analysis frame (power of two)
    #[arg(short, long, default_value_t = 1024)]
    pub buffer_size: usize,

    /// Window applied to each frame
    #[arg(short, long, value_enum, default_value_t = WindowFunction::Hanning)]
    pub window: WindowFunction,

    /// Values stored in the spectrogram
    #[arg(short, long, value_enum, default_value_t = LoudnessMode::Power)]
    pub loudness: LoudnessMode,

    /// Frequencies to probe, in Hz (comma-separated or repeated)
    #[arg(short, long = "probe", value_name = "HZ", value_delimiter = ',')]
    pub probes: Vec<f32>,

    /// Include the spectrogram history in the report
    #[arg(long)]
    pub include_spectrogram: bool,

    /// Zero-pad the trailing partial frame instead of dropping it
    #[arg(long)]
    pub pad_tail: bool,

    /// Run a paced capture thread feeding a render loop instead of the batch pass
    #[arg(long)]
    pub stream: bool,

    /// Render loop rate in stream mode (0 = unpaced)
    #[arg(long, default_value_t = 60)]
    pub render_fps: u32,

    /// Do not pace the capture thread to the audio rate in stream mode
    #[arg(long)]
    pub fast: bool,

    /// List window functions and exit
    #[arg(long)]
    pub list_windows: bool,
}
