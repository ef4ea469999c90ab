use serde::{Deserialize, Serialize};
use std::io::{ErrorKind, Read};
use thiserror::Error;

use super::frame::{AudioFrame, ChannelLayout};
use crate::config::AudioConfig;

/// Sample encoding of a raw PCM stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SampleFormat {
    /// 32-bit float, little endian.
    #[default]
    #[value(name = "f32le")]
    F32Le,
    /// 16-bit signed integer, little endian.
    #[value(name = "s16le")]
    S16Le,
}

impl SampleFormat {
    pub fn bytes_per_sample(self) -> usize {
        match self {
            SampleFormat::F32Le => 4,
            SampleFormat::S16Le => 2,
        }
    }

    fn sample(self, bytes: &[u8]) -> f32 {
        match self {
            SampleFormat::F32Le => f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            SampleFormat::S16Le => i16::from_le_bytes([bytes[0], bytes[1]]) as f32 / 32768.0,
        }
    }
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read audio input")]
    Io(#[from] std::io::Error),
}

/// Reads fixed-size frames of raw interleaved-or-planar PCM from any byte stream.
pub struct PcmSource<R> {
    reader: R,
    format: SampleFormat,
    channels: usize,
    layout: ChannelLayout,
    buffer: Vec<u8>,
    frames_read: u64,
}

impl<R: Read> PcmSource<R> {
    pub fn new(reader: R, config: &AudioConfig) -> Self {
        let bytes_per_frame = config.chunk_size * config.channels.max(1) * config.format.bytes_per_sample();
        Self {
            reader,
            format: config.format,
            channels: config.channels.max(1),
            layout: config.layout,
            buffer: vec![0; bytes_per_frame],
            frames_read: 0,
        }
    }

    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    /// Bytes consumed per full frame.
    pub fn frame_bytes(&self) -> usize {
        self.buffer.len()
    }

    /// Next frame, or `None` once the stream is exhausted. The last frame may be
    /// short; a trailing partial sample is dropped.
    pub fn next_frame(&mut self) -> Result<Option<AudioFrame>, SourceError> {
        let filled = self.fill()?;
        if filled == 0 {
            return Ok(None);
        }

        let width = self.format.bytes_per_sample();
        let samples: Vec<f32> = self.buffer[..filled - filled % width]
            .chunks_exact(width)
            .map(|b| self.format.sample(b))
            .collect();

        self.frames_read += 1;
        Ok(Some(AudioFrame::new(samples, self.channels, self.layout)))
    }

    fn fill(&mut self) -> Result<usize, SourceError> {
        let mut filled = 0;
        while filled < self.buffer.len() {
            match self.reader.read(&mut self.buffer[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(filled)
    }
}

impl<R: Read> Iterator for PcmSource<R> {
    type Item = Result<AudioFrame, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_frame().transpose()
    }
}
