use crate::audio::analysis::SpectrumAnalyzer;
use crate::audio::frame::AudioFrame;
use crate::config::Config;
use crate::render::history::SpectrumHistory;
use crate::render::isometric::IsometricProjector;
use crate::render::waterfall::{DrawCommand, WaterfallRenderer};

/// Per-frame analyze → push → draw, over one audio stream.
pub struct Visualizer {
    analyzer: SpectrumAnalyzer,
    history: SpectrumHistory,
    projector: IsometricProjector,
    renderer: WaterfallRenderer,
}

impl Visualizer {
    pub fn new(config: &Config) -> Self {
        Self {
            analyzer: SpectrumAnalyzer::new(&config.audio, &config.analysis),
            history: SpectrumHistory::new(config.display.history_length),
            projector: IsometricProjector::new(&config.projection, config.display.width, config.display.height),
            renderer: WaterfallRenderer::new(&config.display),
        }
    }

    pub fn history(&self) -> &SpectrumHistory {
        &self.history
    }

    pub fn analyzer(&self) -> &SpectrumAnalyzer {
        &self.analyzer
    }

    /// Feeds one frame, if the source produced one, and returns the draw list.
    ///
    /// With no frame the history is left alone. An empty frame still pushes a
    /// silent spectrum but does not disturb smoothing.
    pub fn tick(&mut self, frame: Option<&AudioFrame>) -> Vec<DrawCommand> {
        if let Some(frame) = frame {
            let num_bands = self.analyzer.kernel().num_bands();
            let analysis = self.analyzer.analyze_frame(frame);
            if analysis.is_no_data() {
                log::debug!("Empty audio frame; pushing silence");
            }
            self.history.push(analysis.into_spectrum(num_bands));
        }
        self.draw()
    }

    pub fn draw(&self) -> Vec<DrawCommand> {
        self.renderer.draw(&self.history, &self.projector)
    }
}
