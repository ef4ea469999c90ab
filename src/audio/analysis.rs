use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

use super::features::{AnalyzerState, FrameAnalysis, Spectrum};
use super::frame::AudioFrame;
use crate::config::{AnalysisConfig, AudioConfig};

/// Everything about a frame's analysis that is fixed once the configuration is:
/// window, FFT plan and the assignment of FFT bins to log-spaced bands.
pub struct SpectralKernel {
    chunk_size: usize,
    smoothing: f32,
    window: Vec<f32>,
    fft: Arc<dyn Fft<f32>>,
    band_edges: Vec<f64>,
    /// Band index per FFT bin; `None` for bins outside the analysis range or
    /// sitting exactly on the top edge.
    bin_bands: Vec<Option<usize>>,
    band_counts: Vec<usize>,
    retained_bins: usize,
}

impl SpectralKernel {
    pub fn new(audio: &AudioConfig, analysis: &AnalysisConfig) -> Self {
        let chunk_size = audio.chunk_size;
        let num_bands = analysis.num_bands;
        let min_freq = analysis.min_frequency as f64;
        let max_freq = analysis.max_frequency as f64;

        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(chunk_size);

        let band_edges = log_band_edges(min_freq, max_freq, num_bands);

        let num_bins = chunk_size / 2 + 1;
        let bin_width = audio.sample_rate as f64 / chunk_size as f64;
        let mut band_counts = vec![0usize; num_bands];
        let mut retained_bins = 0;
        let bin_bands: Vec<Option<usize>> = (0..num_bins)
            .map(|k| {
                let freq = k as f64 * bin_width;
                if freq < min_freq || freq > max_freq {
                    return None;
                }
                retained_bins += 1;
                let band = band_for_frequency(&band_edges, freq)?;
                band_counts[band] += 1;
                Some(band)
            })
            .collect();

        if retained_bins == 0 {
            log::warn!(
                "No FFT bins fall within {:.0}-{:.0} Hz at {} Hz / {} samples; spectra will be silent",
                min_freq, max_freq, audio.sample_rate, chunk_size
            );
        } else {
            let empty_bands = band_counts.iter().filter(|&&c| c == 0).count();
            log::info!(
                "Spectral kernel: {} bands over {:.0}-{:.0} Hz, {} of {} bins retained, {} bands without bins",
                num_bands, min_freq, max_freq, retained_bins, num_bins, empty_bands
            );
        }

        Self {
            chunk_size,
            smoothing: analysis.smoothing,
            window: hann_window(chunk_size),
            fft,
            band_edges,
            bin_bands,
            band_counts,
            retained_bins,
        }
    }

    pub fn num_bands(&self) -> usize {
        self.band_counts.len()
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// `num_bands + 1` ascending edges in Hz.
    pub fn band_edges(&self) -> &[f64] {
        &self.band_edges
    }

    /// Number of FFT bins inside the analysis frequency range.
    pub fn retained_bins(&self) -> usize {
        self.retained_bins
    }

    /// Windowed FFT magnitudes, `chunk_size / 2 + 1` bins. Uses the first
    /// `chunk_size` samples, zero-padding short input.
    pub fn magnitudes(&self, mono: &[f32]) -> Vec<f32> {
        let mut buffer: Vec<Complex<f32>> = vec![Complex::new(0.0, 0.0); self.chunk_size];
        for (slot, (&s, &w)) in buffer.iter_mut().zip(mono.iter().zip(self.window.iter())) {
            *slot = Complex::new(s * w, 0.0);
        }
        self.fft.process(&mut buffer);
        buffer[..self.chunk_size / 2 + 1].iter().map(|c| c.norm()).collect()
    }

    /// Averages bin magnitudes into bands and normalizes so the loudest band is 1.0.
    pub fn map_to_bands(&self, magnitudes: &[f32]) -> Spectrum {
        let num_bands = self.num_bands();
        if self.retained_bins == 0 {
            return Spectrum::zeros(num_bands);
        }

        let mut sums = vec![0.0f32; num_bands];
        for (&mag, band) in magnitudes.iter().zip(self.bin_bands.iter()) {
            if let Some(band) = *band {
                sums[band] += mag;
            }
        }

        let mut bands: Vec<f32> = sums
            .iter()
            .zip(self.band_counts.iter())
            .map(|(&sum, &count)| if count > 0 { sum / count as f32 } else { 0.0 })
            .collect();

        let peak = bands.iter().copied().fold(0.0f32, f32::max);
        if peak > 0.0 {
            for b in bands.iter_mut() {
                *b /= peak;
            }
        }

        Spectrum::from(bands)
    }
}

/// Analyzes one frame against the previous smoothing state.
///
/// An empty frame yields [`FrameAnalysis::NoData`] and returns `state` unchanged.
/// Any frame with samples, silent or not, replaces the state with its output.
pub fn analyze(
    kernel: &SpectralKernel,
    state: AnalyzerState,
    frame: &AudioFrame,
) -> (AnalyzerState, FrameAnalysis) {
    if frame.is_empty() {
        return (state, FrameAnalysis::NoData);
    }

    let mono = frame.to_mono();
    let magnitudes = kernel.magnitudes(&mono);
    let current = kernel.map_to_bands(&magnitudes);

    let spectrum = match state.previous() {
        Some(prev) if prev.len() == current.len() => current.blend_with(prev, kernel.smoothing),
        _ => current,
    };

    (AnalyzerState::with_previous(spectrum.clone()), FrameAnalysis::Spectrum(spectrum))
}

/// Stateful wrapper around [`analyze`] for a single stream.
pub struct SpectrumAnalyzer {
    kernel: SpectralKernel,
    state: AnalyzerState,
}

impl SpectrumAnalyzer {
    pub fn new(audio: &AudioConfig, analysis: &AnalysisConfig) -> Self {
        Self {
            kernel: SpectralKernel::new(audio, analysis),
            state: AnalyzerState::new(),
        }
    }

    pub fn kernel(&self) -> &SpectralKernel {
        &self.kernel
    }

    pub fn state(&self) -> &AnalyzerState {
        &self.state
    }

    pub fn analyze_frame(&mut self, frame: &AudioFrame) -> FrameAnalysis {
        let state = std::mem::take(&mut self.state);
        let (state, result) = analyze(&self.kernel, state, frame);
        self.state = state;
        result
    }

    /// Like [`analyze_frame`](Self::analyze_frame), with no-data collapsed to zeros.
    pub fn analyze(&mut self, frame: &AudioFrame) -> Spectrum {
        let num_bands = self.kernel.num_bands();
        self.analyze_frame(frame).into_spectrum(num_bands)
    }
}

fn log_band_edges(min_freq: f64, max_freq: f64, num_bands: usize) -> Vec<f64> {
    let ratio = max_freq / min_freq;
    (0..=num_bands)
        .map(|i| match i {
            0 => min_freq,
            i if i == num_bands => max_freq,
            i => min_freq * ratio.powf(i as f64 / num_bands as f64),
        })
        .collect()
}

/// Band whose half-open interval `[edge[i], edge[i+1])` holds `freq`.
fn band_for_frequency(edges: &[f64], freq: f64) -> Option<usize> {
    let idx = edges.partition_point(|&e| e <= freq);
    if idx == 0 || idx >= edges.len() {
        None
    } else {
        Some(idx - 1)
    }
}

fn hann_window(size: usize) -> Vec<f32> {
    if size < 2 {
        return vec![1.0; size];
    }
    (0..size)
        .map(|i| {
            0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / (size - 1) as f32).cos())
        })
        .collect()
}
