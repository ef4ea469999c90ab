use serde::{Deserialize, Serialize};

/// How samples of a multi-channel frame are arranged in memory.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelLayout {
    /// `L R L R ...`
    #[default]
    Interleaved,
    /// `L L ... R R ...`
    Planar,
}

/// One tick's worth of audio, as delivered by a source.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioFrame {
    samples: Vec<f32>,
    channels: usize,
    layout: ChannelLayout,
}

impl AudioFrame {
    pub fn new(samples: Vec<f32>, channels: usize, layout: ChannelLayout) -> Self {
        Self {
            samples,
            channels: channels.max(1),
            layout,
        }
    }

    pub fn mono(samples: Vec<f32>) -> Self {
        Self::new(samples, 1, ChannelLayout::Interleaved)
    }

    pub fn empty() -> Self {
        Self::mono(Vec::new())
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Samples per channel. A trailing incomplete group is ignored.
    pub fn len(&self) -> usize {
        self.samples.len() / self.channels
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Averages channels per sample. Non-finite samples count as silence.
    pub fn to_mono(&self) -> Vec<f32> {
        let n = self.len();
        if self.channels == 1 {
            return self.samples[..n].iter().map(|&s| finite_or_zero(s)).collect();
        }

        let scale = 1.0 / self.channels as f32;
        match self.layout {
            ChannelLayout::Interleaved => self
                .samples
                .chunks_exact(self.channels)
                .map(|group| group.iter().map(|&s| finite_or_zero(s)).sum::<f32>() * scale)
                .collect(),
            ChannelLayout::Planar => (0..n)
                .map(|i| {
                    (0..self.channels)
                        .map(|ch| finite_or_zero(self.samples[ch * n + i]))
                        .sum::<f32>()
                        * scale
                })
                .collect(),
        }
    }
}

fn finite_or_zero(s: f32) -> f32 {
    if s.is_finite() { s } else { 0.0 }
}
