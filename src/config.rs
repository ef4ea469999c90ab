use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::audio::frame::ChannelLayout;
use crate::audio::source::SampleFormat;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub projection: ProjectionConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AudioConfig {
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    /// Samples per channel per frame.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_channels")]
    pub channels: usize,
    #[serde(default)]
    pub layout: ChannelLayout,
    #[serde(default)]
    pub format: SampleFormat,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_num_bands")]
    pub num_bands: usize,
    #[serde(default = "default_min_frequency")]
    pub min_frequency: f32,
    #[serde(default = "default_max_frequency")]
    pub max_frequency: f32,
    /// Weight of the previous spectrum, 0 disables smoothing.
    #[serde(default = "default_smoothing")]
    pub smoothing: f32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProjectionConfig {
    #[serde(default = "default_angle_degrees")]
    pub angle_degrees: f32,
    /// Pixels per frequency band.
    #[serde(default = "default_scale_x")]
    pub scale_x: f32,
    /// Pixels per amplitude unit.
    #[serde(default = "default_scale_y")]
    pub scale_y: f32,
    /// Pixels per time slice.
    #[serde(default = "default_scale_z")]
    pub scale_z: f32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DisplayConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_history_length")]
    pub history_length: usize,
    #[serde(default = "default_amplitude_scale")]
    pub amplitude_scale: f32,
    #[serde(default = "default_line_color")]
    pub line_color: [u8; 3],
    #[serde(default = "default_background_color")]
    pub background_color: [u8; 3],
    #[serde(default = "default_line_thickness")]
    pub line_thickness: u32,
    #[serde(default = "default_status_color")]
    pub status_color: [u8; 3],
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default = "default_codec")]
    pub codec: String,
    #[serde(default = "default_pix_fmt")]
    pub pix_fmt: String,
    #[serde(default = "default_crf")]
    pub crf: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            chunk_size: default_chunk_size(),
            channels: default_channels(),
            layout: ChannelLayout::default(),
            format: SampleFormat::default(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            num_bands: default_num_bands(),
            min_frequency: default_min_frequency(),
            max_frequency: default_max_frequency(),
            smoothing: default_smoothing(),
        }
    }
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            angle_degrees: default_angle_degrees(),
            scale_x: default_scale_x(),
            scale_y: default_scale_y(),
            scale_z: default_scale_z(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            history_length: default_history_length(),
            amplitude_scale: default_amplitude_scale(),
            line_color: default_line_color(),
            background_color: default_background_color(),
            line_thickness: default_line_thickness(),
            status_color: default_status_color(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            codec: default_codec(),
            pix_fmt: default_pix_fmt(),
            crf: default_crf(),
        }
    }
}

fn default_sample_rate() -> u32 { 44100 }
fn default_chunk_size() -> usize { 2048 }
fn default_channels() -> usize { 2 }
fn default_num_bands() -> usize { 64 }
fn default_min_frequency() -> f32 { 20.0 }
fn default_max_frequency() -> f32 { 20000.0 }
fn default_smoothing() -> f32 { 0.7 }
fn default_angle_degrees() -> f32 { 30.0 }
fn default_scale_x() -> f32 { 12.0 }
fn default_scale_y() -> f32 { 3.0 }
fn default_scale_z() -> f32 { 8.0 }
fn default_width() -> u32 { 1280 }
fn default_height() -> u32 { 720 }
fn default_history_length() -> usize { 80 }
fn default_amplitude_scale() -> f32 { 100.0 }
fn default_line_color() -> [u8; 3] { [173, 216, 230] }
fn default_background_color() -> [u8; 3] { [10, 10, 20] }
fn default_line_thickness() -> u32 { 2 }
fn default_status_color() -> [u8; 3] { [100, 100, 100] }
fn default_codec() -> String { "libx264".into() }
fn default_pix_fmt() -> String { "yuv420p".into() }
fn default_crf() -> u32 { 18 }

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("sample rate must be positive")]
    ZeroSampleRate,
    #[error("chunk size must be at least 2 samples, got {0}")]
    ChunkTooSmall(usize),
    #[error("channel count must be positive")]
    ZeroChannels,
    #[error("number of frequency bands must be positive")]
    ZeroBands,
    #[error("frequency range must satisfy 0 < min < max, got {min}..{max} Hz")]
    InvalidFrequencyRange { min: f32, max: f32 },
    #[error("smoothing factor must lie in [0, 1], got {0}")]
    SmoothingOutOfRange(f32),
    #[error("history length must be positive")]
    ZeroHistory,
    #[error("viewport must be non-empty, got {width}x{height}")]
    EmptyViewport { width: u32, height: u32 },
}

impl Config {
    /// Rejects values the analysis and projection math cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.audio.sample_rate == 0 {
            return Err(ConfigError::ZeroSampleRate);
        }
        if self.audio.chunk_size < 2 {
            return Err(ConfigError::ChunkTooSmall(self.audio.chunk_size));
        }
        if self.audio.channels == 0 {
            return Err(ConfigError::ZeroChannels);
        }
        if self.analysis.num_bands == 0 {
            return Err(ConfigError::ZeroBands);
        }
        let (min, max) = (self.analysis.min_frequency, self.analysis.max_frequency);
        if !(min > 0.0 && max > min && max.is_finite()) {
            return Err(ConfigError::InvalidFrequencyRange { min, max });
        }
        if !(0.0..=1.0).contains(&self.analysis.smoothing) {
            return Err(ConfigError::SmoothingOutOfRange(self.analysis.smoothing));
        }
        if self.display.history_length == 0 {
            return Err(ConfigError::ZeroHistory);
        }
        if self.display.width == 0 || self.display.height == 0 {
            return Err(ConfigError::EmptyViewport {
                width: self.display.width,
                height: self.display.height,
            });
        }
        Ok(())
    }

    /// Video frame rate implied by one rendered frame per audio chunk, as an
    /// ffmpeg rational.
    pub fn frame_rate(&self) -> String {
        format!("{}/{}", self.audio.sample_rate, self.audio.chunk_size)
    }
}

pub fn load_config(path: &Path) -> Option<Config> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(cfg) => Some(cfg),
        Err(err) => {
            log::debug!("TOML error in {}: {}", path.display(), err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_settings() {
        let cfg = Config::default();
        assert_eq!(cfg.audio.sample_rate, 44100);
        assert_eq!(cfg.audio.chunk_size, 2048);
        assert_eq!(cfg.audio.channels, 2);
        assert_eq!(cfg.analysis.num_bands, 64);
        assert_eq!(cfg.display.history_length, 80);
        assert_eq!(cfg.display.line_color, [173, 216, 230]);
        assert_eq!(cfg.display.line_thickness, 2);
        assert_eq!(cfg.projection.scale_x, 12.0);
        assert_eq!(cfg.analysis.smoothing, 0.7);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            [analysis]
            num_bands = 32

            [display]
            width = 640
            line_color = [255, 0, 0]
            "#,
        )
        .unwrap();
        assert_eq!(cfg.analysis.num_bands, 32);
        assert_eq!(cfg.analysis.max_frequency, 20000.0);
        assert_eq!(cfg.display.width, 640);
        assert_eq!(cfg.display.height, 720);
        assert_eq!(cfg.display.line_color, [255, 0, 0]);
        assert_eq!(cfg.audio.layout, ChannelLayout::Interleaved);
    }

    #[test]
    fn enum_fields_parse_lowercase() {
        let cfg: Config = toml::from_str(
            r#"
            [audio]
            layout = "planar"
            format = "s16le"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.audio.layout, ChannelLayout::Planar);
        assert_eq!(cfg.audio.format, SampleFormat::S16Le);
    }

    #[test]
    fn rejects_inverted_frequency_range() {
        let mut cfg = Config::default();
        cfg.analysis.min_frequency = 5000.0;
        cfg.analysis.max_frequency = 100.0;
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::InvalidFrequencyRange { min: 5000.0, max: 100.0 })
        );
    }

    #[test]
    fn rejects_degenerate_sizes() {
        let mut cfg = Config::default();
        cfg.audio.chunk_size = 1;
        assert_eq!(cfg.validate(), Err(ConfigError::ChunkTooSmall(1)));

        let mut cfg = Config::default();
        cfg.display.history_length = 0;
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroHistory));

        let mut cfg = Config::default();
        cfg.analysis.smoothing = 1.5;
        assert_eq!(cfg.validate(), Err(ConfigError::SmoothingOutOfRange(1.5)));
    }

    #[test]
    fn frame_rate_is_exact_rational() {
        assert_eq!(Config::default().frame_rate(), "44100/2048");
    }

    #[test]
    fn load_config_returns_none_for_missing_file() {
        assert!(load_config(Path::new("/nonexistent/isoviz.toml")).is_none());
    }
}
