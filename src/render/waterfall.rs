use super::history::SpectrumHistory;
use super::isometric::{IsometricProjector, ScreenPoint};
use crate::config::DisplayConfig;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Multiplies each channel by `factor` (clamped to 0.0-1.0), truncating.
    pub fn scaled(self, factor: f32) -> Rgb {
        let f = factor.clamp(0.0, 1.0);
        let scale = |c: u8| (c as f32 * f) as u8;
        Rgb(scale(self.0), scale(self.1), scale(self.2))
    }
}

impl From<[u8; 3]> for Rgb {
    fn from(c: [u8; 3]) -> Self {
        Rgb(c[0], c[1], c[2])
    }
}

/// One open polyline for the draw surface.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawCommand {
    pub points: Vec<ScreenPoint>,
    pub color: Rgb,
    pub thickness: u32,
}

/// Brightness of slice `t` in a history of `len` slices: `(t + 1) / len`.
pub fn fade_coefficient(t: usize, len: usize) -> f32 {
    if len == 0 {
        return 0.0;
    }
    (t + 1) as f32 / len as f32
}

/// Turns a spectrum history into depth-faded waterfall polylines.
pub struct WaterfallRenderer {
    line_color: Rgb,
    line_thickness: u32,
    amplitude_scale: f32,
}

impl WaterfallRenderer {
    pub fn new(config: &DisplayConfig) -> Self {
        Self {
            line_color: config.line_color.into(),
            line_thickness: config.line_thickness,
            amplitude_scale: config.amplitude_scale,
        }
    }

    pub fn rung_thickness(&self) -> u32 {
        self.line_thickness / 2
    }

    /// Projected points of every slice, oldest first. The whole history goes
    /// through the projector as one batch.
    fn project_slices(&self, history: &SpectrumHistory, projector: &IsometricProjector) -> Vec<Vec<ScreenPoint>> {
        let snapshot = history.snapshot();
        let mut lengths = Vec::with_capacity(snapshot.len());
        let mut points: Vec<[f32; 3]> = Vec::new();
        for (t, spectrum) in snapshot.iter().enumerate() {
            lengths.push(spectrum.len());
            points.extend(
                spectrum
                    .bands()
                    .iter()
                    .enumerate()
                    .map(|(f, &a)| [f as f32, a * self.amplitude_scale, t as f32]),
            );
        }

        let mut projected = projector.par_project_points(&points).into_iter();
        lengths
            .into_iter()
            .map(|n| projected.by_ref().take(n).collect())
            .collect()
    }

    /// Emits draw commands back to front: each slice's spectrum line, followed by
    /// the rungs joining it to the slice before.
    pub fn draw(&self, history: &SpectrumHistory, projector: &IsometricProjector) -> Vec<DrawCommand> {
        let slices = self.project_slices(history, projector);
        let len = slices.len();
        let mut commands = Vec::new();

        for (t, points) in slices.iter().enumerate() {
            if points.len() < 2 {
                continue;
            }
            let color = self.line_color.scaled(fade_coefficient(t, len));

            commands.push(DrawCommand {
                points: points.clone(),
                color,
                thickness: self.line_thickness,
            });

            if t > 0 {
                let previous = &slices[t - 1];
                for (&near, &far) in points.iter().zip(previous.iter()) {
                    commands.push(DrawCommand {
                        points: vec![near, far],
                        color,
                        thickness: self.rung_thickness(),
                    });
                }
            }
        }

        commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::features::Spectrum;
    use crate::config::ProjectionConfig;

    fn setup(capacity: usize) -> (WaterfallRenderer, IsometricProjector, SpectrumHistory) {
        let display = DisplayConfig::default();
        (
            WaterfallRenderer::new(&display),
            IsometricProjector::new(&ProjectionConfig::default(), display.width, display.height),
            SpectrumHistory::new(capacity),
        )
    }

    fn ramp(num_bands: usize, offset: f32) -> Spectrum {
        Spectrum::from((0..num_bands).map(|i| (i as f32 / num_bands as f32 + offset).min(1.0)).collect::<Vec<_>>())
    }

    fn spectrum_lines(commands: &[DrawCommand]) -> Vec<&DrawCommand> {
        commands.iter().filter(|c| c.thickness == 2).collect()
    }

    #[test]
    fn empty_history_draws_nothing() {
        let (renderer, projector, history) = setup(80);
        assert!(renderer.draw(&history, &projector).is_empty());
    }

    #[test]
    fn single_slice_has_no_rungs() {
        let (renderer, projector, mut history) = setup(80);
        history.push(ramp(64, 0.0));
        let commands = renderer.draw(&history, &projector);
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].points.len(), 64);
        assert_eq!(commands[0].color, Rgb(173, 216, 230));
    }

    #[test]
    fn command_layout_per_slice() {
        let (renderer, projector, mut history) = setup(80);
        for t in 0..3 {
            history.push(ramp(8, t as f32 * 0.1));
        }
        let commands = renderer.draw(&history, &projector);
        // slice 0: line; slices 1 and 2: line + 8 rungs each
        assert_eq!(commands.len(), 1 + 2 * (1 + 8));
        assert_eq!(commands[0].points.len(), 8);
        assert_eq!(commands[1].points.len(), 8);
        for rung in &commands[2..10] {
            assert_eq!(rung.points.len(), 2);
            assert_eq!(rung.thickness, 1);
        }
    }

    #[test]
    fn points_follow_projection_of_scaled_amplitude() {
        let (renderer, projector, mut history) = setup(80);
        history.push(ramp(4, 0.0));
        history.push(ramp(4, 0.5));
        let snapshot = history.snapshot();
        let commands = renderer.draw(&history, &projector);

        let newest = snapshot.get(1).unwrap();
        let line = &commands[1];
        for (f, point) in line.points.iter().enumerate() {
            assert_eq!(*point, projector.project(f as f32, newest[f] * 100.0, 1.0));
        }

        let oldest = snapshot.get(0).unwrap();
        let rung = &commands[2];
        assert_eq!(rung.points[0], projector.project(0.0, newest[0] * 100.0, 1.0));
        assert_eq!(rung.points[1], projector.project(0.0, oldest[0] * 100.0, 0.0));
    }

    #[test]
    fn fade_runs_from_one_eightieth_to_full() {
        assert_eq!(fade_coefficient(79, 80), 1.0);
        assert_eq!(fade_coefficient(0, 80), 1.0 / 80.0);

        let (renderer, projector, mut history) = setup(80);
        for t in 0..80 {
            history.push(ramp(16, t as f32 * 0.01));
        }
        let commands = renderer.draw(&history, &projector);
        let lines = spectrum_lines(&commands);
        assert_eq!(lines.len(), 80);

        let base = Rgb(173, 216, 230);
        assert_eq!(lines[79].color, base);
        assert_eq!(lines[0].color, base.scaled(1.0 / 80.0));
        assert_eq!(lines[0].color, Rgb(2, 2, 2));
        for pair in lines.windows(2) {
            assert!(pair[0].color.0 <= pair[1].color.0);
        }
    }

    #[test]
    fn single_band_slices_are_skipped() {
        let (renderer, projector, mut history) = setup(4);
        history.push(Spectrum::from(vec![0.5]));
        history.push(Spectrum::from(vec![0.7]));
        assert!(renderer.draw(&history, &projector).is_empty());
    }

    #[test]
    fn batched_projection_splits_back_per_slice() {
        let (renderer, projector, mut history) = setup(3);
        for n in [5, 3, 6, 4] {
            history.push(ramp(n, 0.2));
        }
        let commands = renderer.draw(&history, &projector);
        let lines: Vec<&DrawCommand> = commands.iter().filter(|c| c.thickness == 2).collect();
        assert_eq!(lines.len(), 3);

        for (t, (line, spectrum)) in lines.iter().zip(history.snapshot().iter()).enumerate() {
            assert_eq!(line.points.len(), spectrum.len());
            let expected: Vec<ScreenPoint> = spectrum
                .bands()
                .iter()
                .enumerate()
                .map(|(f, &a)| projector.project(f as f32, a * 100.0, t as f32))
                .collect();
            assert_eq!(line.points, expected);
        }
        // rungs stop at the shorter of two neighbouring slices
        let rungs = commands.iter().filter(|c| c.thickness == 1).count();
        assert_eq!(rungs, 3 + 4);
    }

    #[test]
    fn scaled_clamps_factor() {
        assert_eq!(Rgb(200, 100, 50).scaled(0.5), Rgb(100, 50, 25));
        assert_eq!(Rgb(200, 100, 50).scaled(2.0), Rgb(200, 100, 50));
        assert_eq!(Rgb(200, 100, 50).scaled(-1.0), Rgb(0, 0, 0));
    }
}
