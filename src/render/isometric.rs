use rayon::prelude::*;

use crate::config::ProjectionConfig;

/// Integer pixel position on the canvas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ScreenPoint {
    pub x: i32,
    pub y: i32,
}

impl ScreenPoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Fixed-angle isometric projection of (band, amplitude, time) onto a viewport.
///
/// Frequency runs right-down, amplitude straight up, time left-down, so newer
/// slices sit lower on screen. Screen Y grows downwards.
#[derive(Clone, Debug)]
pub struct IsometricProjector {
    cos_angle: f32,
    sin_angle: f32,
    center_x: f32,
    center_y: f32,
    scale: [f32; 3],
}

impl IsometricProjector {
    pub fn new(config: &ProjectionConfig, width: u32, height: u32) -> Self {
        let angle = config.angle_degrees.to_radians();
        Self {
            cos_angle: angle.cos(),
            sin_angle: angle.sin(),
            center_x: (width / 2) as f32,
            center_y: (height / 2) as f32,
            scale: [config.scale_x, config.scale_y, config.scale_z],
        }
    }

    pub fn center(&self) -> ScreenPoint {
        ScreenPoint::new(self.center_x as i32, self.center_y as i32)
    }

    /// Projects one point; the result is truncated toward zero, not rounded.
    #[inline]
    pub fn project(&self, x: f32, y: f32, z: f32) -> ScreenPoint {
        let sx = x * self.scale[0];
        let sy = y * self.scale[1];
        let sz = z * self.scale[2];

        let screen_x = (sx - sz) * self.cos_angle + self.center_x;
        let screen_y = self.center_y - (sy - (sx + sz) * self.sin_angle);

        ScreenPoint::new(screen_x as i32, screen_y as i32)
    }

    pub fn project_points(&self, points: &[[f32; 3]]) -> Vec<ScreenPoint> {
        points.iter().map(|&[x, y, z]| self.project(x, y, z)).collect()
    }

    /// Parallel form of [`project_points`](Self::project_points), same results in
    /// the same order.
    pub fn par_project_points(&self, points: &[[f32; 3]]) -> Vec<ScreenPoint> {
        points.par_iter().map(|&[x, y, z]| self.project(x, y, z)).collect()
    }
}
