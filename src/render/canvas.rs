use image::{Pixel, Rgba, RgbaImage};
use imageproc::drawing::draw_line_segment_mut;

use super::isometric::ScreenPoint;
use super::waterfall::{DrawCommand, Rgb};

/// RGBA8 raster target for draw commands. Later commands overwrite earlier ones.
pub struct Canvas {
    image: RgbaImage,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Row-major RGBA bytes, as the encoder expects them.
    pub fn pixels(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn clear(&mut self, color: Rgb) {
        let fill = opaque(color);
        for px in self.image.pixels_mut() {
            *px = fill;
        }
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<Rgb> {
        if x < 0 || y < 0 {
            return None;
        }
        let px = self.image.get_pixel_checked(x as u32, y as u32)?;
        Some(Rgb(px[0], px[1], px[2]))
    }

    /// Blends `color` over the pixel at (x, y) with `coverage` as alpha.
    /// Out-of-bounds positions are ignored.
    pub fn blend(&mut self, x: i32, y: i32, color: Rgb, coverage: u8) {
        if x < 0 || y < 0 || coverage == 0 {
            return;
        }
        if let Some(px) = self.image.get_pixel_mut_checked(x as u32, y as u32) {
            px.blend(&Rgba([color.0, color.1, color.2, coverage]));
        }
    }

    pub fn draw(&mut self, command: &DrawCommand) {
        if command.thickness == 0 {
            return;
        }
        for pair in command.points.windows(2) {
            self.line(pair[0], pair[1], command.color, command.thickness);
        }
    }

    pub fn draw_all(&mut self, commands: &[DrawCommand]) {
        for command in commands {
            self.draw(command);
        }
    }

    /// Square brush of side `thickness`: one segment per brush offset.
    fn line(&mut self, a: ScreenPoint, b: ScreenPoint, color: Rgb, thickness: u32) {
        let color = opaque(color);
        let lo = -((thickness as i32 - 1) / 2);
        let hi = lo + thickness as i32 - 1;
        for dy in lo..=hi {
            for dx in lo..=hi {
                let start = ((a.x + dx) as f32, (a.y + dy) as f32);
                let end = ((b.x + dx) as f32, (b.y + dy) as f32);
                draw_line_segment_mut(&mut self.image, start, end, color);
            }
        }
    }
}

fn opaque(color: Rgb) -> Rgba<u8> {
    Rgba([color.0, color.1, color.2, 255])
}
