use clap::Parser;
use std::path::PathBuf;

use isoviz::audio::frame::ChannelLayout;
use isoviz::audio::source::SampleFormat;
use isoviz::config::Config;

#[derive(Parser, Debug)]
#[command(name = "isoviz", about = "Isometric audio spectrum waterfall video renderer")]
pub struct Cli {
    /// Raw PCM input file; `-` or omitted reads stdin
    pub input: Option<PathBuf>,

    /// Output video file
    #[arg(short, long, default_value = "waterfall.mp4")]
    pub output: PathBuf,

    /// Config file (default: ./isoviz.toml, then the user config dir)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Video width in pixels
    #[arg(long)]
    pub width: Option<u32>,

    /// Video height in pixels
    #[arg(long)]
    pub height: Option<u32>,

    /// Input sample rate in Hz
    #[arg(long)]
    pub sample_rate: Option<u32>,

    /// Samples per channel analysed per frame
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Input channel count
    #[arg(long)]
    pub channels: Option<usize>,

    /// Input sample encoding
    #[arg(long, value_enum)]
    pub format: Option<SampleFormat>,

    /// Input channels are planar rather than interleaved
    #[arg(long)]
    pub planar: bool,

    /// Number of log-spaced frequency bands
    #[arg(long)]
    pub bands: Option<usize>,

    /// Number of time slices kept in the waterfall
    #[arg(long)]
    pub history: Option<usize>,

    /// Smoothing factor for successive spectra (0.0-1.0)
    #[arg(long)]
    pub smoothing: Option<f32>,

    /// Isometric angle in degrees
    #[arg(long)]
    pub angle: Option<f32>,

    /// TTF font for the status overlay
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// Draw buffer and frame counters (requires --font)
    #[arg(long)]
    pub show_status: bool,

    /// Stop after this many frames
    #[arg(long)]
    pub max_frames: Option<u64>,

    /// FFmpeg video codec
    #[arg(long)]
    pub codec: Option<String>,

    /// FFmpeg pixel format
    #[arg(long)]
    pub pix_fmt: Option<String>,

    /// H.264 CRF quality (0-51, lower = better)
    #[arg(long)]
    pub crf: Option<u32>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    pub print_config: bool,
}

impl Cli {
    /// Flags given on the command line take precedence over the config file.
    pub fn apply_to(&self, cfg: &mut Config) {
        if let Some(v) = self.width { cfg.display.width = v; }
        if let Some(v) = self.height { cfg.display.height = v; }
        if let Some(v) = self.sample_rate { cfg.audio.sample_rate = v; }
        if let Some(v) = self.chunk_size { cfg.audio.chunk_size = v; }
        if let Some(v) = self.channels { cfg.audio.channels = v; }
        if let Some(v) = self.format { cfg.audio.format = v; }
        if self.planar { cfg.audio.layout = ChannelLayout::Planar; }
        if let Some(v) = self.bands { cfg.analysis.num_bands = v; }
        if let Some(v) = self.history { cfg.display.history_length = v; }
        if let Some(v) = self.smoothing { cfg.analysis.smoothing = v; }
        if let Some(v) = self.angle { cfg.projection.angle_degrees = v; }
        if let Some(ref v) = self.codec { cfg.output.codec = v.clone(); }
        if let Some(ref v) = self.pix_fmt { cfg.output.pix_fmt = v.clone(); }
        if let Some(v) = self.crf { cfg.output.crf = v; }
    }

    /// `None` means stdin.
    pub fn input_path(&self) -> Option<&PathBuf> {
        self.input.as_ref().filter(|p| p.as_os_str() != "-")
    }
}
