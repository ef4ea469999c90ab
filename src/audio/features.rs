use std::ops::Index;

/// Normalized band amplitudes for one frame, ascending log-frequency.
///
/// Values lie in 0.0-1.0. The length is fixed by the analyzer's band count.
#[derive(Clone, Debug, PartialEq)]
pub struct Spectrum {
    bands: Vec<f32>,
}

impl Spectrum {
    pub fn zeros(num_bands: usize) -> Self {
        Self { bands: vec![0.0; num_bands] }
    }

    pub fn bands(&self) -> &[f32] {
        &self.bands
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    pub fn peak(&self) -> f32 {
        self.bands.iter().copied().fold(0.0f32, f32::max)
    }

    /// Index of the loudest band, first one on ties.
    pub fn peak_band(&self) -> Option<usize> {
        let peak = self.peak();
        if peak <= 0.0 {
            return None;
        }
        self.bands.iter().position(|&b| b == peak)
    }

    pub fn is_silent(&self) -> bool {
        self.bands.iter().all(|&b| b == 0.0)
    }

    /// `alpha * previous + (1 - alpha) * self`, band by band.
    pub(crate) fn blend_with(&self, previous: &Spectrum, alpha: f32) -> Spectrum {
        let bands = previous
            .bands
            .iter()
            .zip(self.bands.iter())
            .map(|(&prev, &cur)| alpha * prev + (1.0 - alpha) * cur)
            .collect();
        Spectrum { bands }
    }
}

impl From<Vec<f32>> for Spectrum {
    fn from(bands: Vec<f32>) -> Self {
        Self { bands }
    }
}

impl Index<usize> for Spectrum {
    type Output = f32;

    fn index(&self, band: usize) -> &f32 {
        &self.bands[band]
    }
}

/// Outcome of analyzing one frame.
#[derive(Clone, Debug, PartialEq)]
pub enum FrameAnalysis {
    /// The frame carried samples (possibly silent ones).
    Spectrum(Spectrum),
    /// The frame was empty; smoothing state was left untouched.
    NoData,
}

impl FrameAnalysis {
    pub fn is_no_data(&self) -> bool {
        matches!(self, FrameAnalysis::NoData)
    }

    pub fn into_spectrum(self, num_bands: usize) -> Spectrum {
        match self {
            FrameAnalysis::Spectrum(spectrum) => spectrum,
            FrameAnalysis::NoData => Spectrum::zeros(num_bands),
        }
    }
}

/// Previous output of the analyzer, used for exponential smoothing.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnalyzerState {
    previous: Option<Spectrum>,
}

impl AnalyzerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn previous(&self) -> Option<&Spectrum> {
        self.previous.as_ref()
    }

    pub(crate) fn with_previous(spectrum: Spectrum) -> Self {
        Self { previous: Some(spectrum) }
    }
}
