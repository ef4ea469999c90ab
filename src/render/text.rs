use fontdue::{Font, FontSettings};
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::canvas::Canvas;
use super::waterfall::Rgb;

#[derive(Debug, Error)]
pub enum FontError {
    #[error("failed to read font {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse font {path}: {reason}")]
    Parse { path: PathBuf, reason: &'static str },
}

pub struct TextOverlay {
    font: Font,
    font_size: f32,
}

impl TextOverlay {
    pub fn from_file(path: &Path, font_size: f32) -> Result<Self, FontError> {
        let bytes = std::fs::read(path).map_err(|source| FontError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let font = Font::from_bytes(bytes, FontSettings::default()).map_err(|reason| FontError::Parse {
            path: path.to_path_buf(),
            reason,
        })?;
        Ok(Self { font, font_size })
    }

    pub fn line_height(&self) -> i32 {
        (self.font_size * 1.2).ceil() as i32
    }

    /// Alpha-composite `text` with its top-left corner at (x, y). Glyph
    /// coverage is the blend alpha; pixels off the canvas are skipped.
    pub fn composite(&self, canvas: &mut Canvas, text: &str, x: i32, y: i32, color: Rgb) {
        let baseline = y + self.font_size as i32;
        let mut pen_x = x;
        for ch in text.chars() {
            let (metrics, coverage) = self.font.rasterize(ch, self.font_size);
            if metrics.width > 0 {
                let top = baseline - metrics.height as i32 - metrics.ymin;
                let left = pen_x + metrics.xmin;
                for (i, &alpha) in coverage.iter().enumerate() {
                    let (gx, gy) = ((i % metrics.width) as i32, (i / metrics.width) as i32);
                    canvas.blend(left + gx, top + gy, color, alpha);
                }
            }
            pen_x += metrics.advance_width.round() as i32;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FONT_CANDIDATES: &[&str] = &[
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
        "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
        "/System/Library/Fonts/Supplemental/Arial.ttf",
        "/Library/Fonts/Arial.ttf",
        "C:\\Windows\\Fonts\\arial.ttf",
    ];

    fn system_font() -> Option<TextOverlay> {
        FONT_CANDIDATES
            .iter()
            .map(Path::new)
            .find(|p| p.exists())
            .and_then(|p| TextOverlay::from_file(p, 16.0).ok())
    }

    #[test]
    fn composite_draws_glyphs_inside_the_text_box() {
        let Some(overlay) = system_font() else {
            eprintln!("no system TTF found, skipping");
            return;
        };
        let bg = Rgb(10, 10, 20);
        let fg = Rgb(250, 250, 250);
        let mut canvas = Canvas::new(120, 40);
        canvas.clear(bg);
        overlay.composite(&mut canvas, "Buffer: 7/80", 4, 4, fg);

        let mut touched = 0;
        for y in 0..40 {
            for x in 0..120 {
                let px = canvas.pixel(x, y).unwrap();
                if px != bg {
                    touched += 1;
                    assert!(px.0 >= bg.0 && px.0 <= fg.0);
                    assert!((2..6 + overlay.line_height()).contains(&y));
                }
            }
        }
        assert!(touched > 0);
        assert!(canvas.pixels().chunks_exact(4).all(|px| px[3] == 255));
    }

    #[test]
    fn composite_past_the_edge_is_clipped() {
        let Some(overlay) = system_font() else {
            eprintln!("no system TTF found, skipping");
            return;
        };
        let mut canvas = Canvas::new(16, 16);
        canvas.clear(Rgb(0, 0, 0));
        overlay.composite(&mut canvas, "WWWWWWWW", -40, 8, Rgb(255, 255, 255));
        overlay.composite(&mut canvas, "offscreen", 100, 100, Rgb(255, 255, 255));
        assert_eq!(canvas.pixels().len(), 16 * 16 * 4);
    }

    #[test]
    fn missing_font_file_is_a_read_error() {
        let err = TextOverlay::from_file(Path::new("/nonexistent/font.ttf"), 24.0).err();
        assert!(matches!(err, Some(FontError::Read { .. })));
    }

    #[test]
    fn garbage_font_file_is_a_parse_error() {
        let path = std::env::temp_dir().join(format!("isoviz-not-a-font-{}.ttf", std::process::id()));
        std::fs::write(&path, b"definitely not a font").unwrap();
        let err = TextOverlay::from_file(&path, 24.0).err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, Some(FontError::Parse { .. })));
    }
}
