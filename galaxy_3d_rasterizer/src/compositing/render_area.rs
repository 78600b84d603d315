/// Region of the canvas an eye renders into.

use crate::external::Canvas;
use super::stereo::{StereoMode, StereoEye};

/// Pixel rectangle as (left, bottom, right, top), origin bottom-left
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderArea {
    pub left: i32,
    pub bottom: i32,
    pub right: i32,
    pub top: i32,
}

impl RenderArea {
    pub fn new(left: i32, bottom: i32, right: i32, top: i32) -> Self {
        Self { left, bottom, right, top }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.top - self.bottom
    }
}

/// Area of the canvas used by `eye` in `mode`
///
/// Side-by-side splits the width, 3DTV top/bottom splits the height, and
/// above/below splits the height leaving `scanlines` pixels unused between
/// the halves. The left eye takes the left or upper half. Every other mode
/// uses the whole canvas.
pub fn compute_render_area(canvas: &dyn Canvas, mode: StereoMode, eye: StereoEye, scanlines: u32) -> RenderArea {
    let width = canvas.width() as i32;
    let height = canvas.height() as i32;

    match (mode, eye) {
        (StereoMode::AboveBelow, StereoEye::Left) => {
            let half = ((height - scanlines as i32) / 2).max(0);
            RenderArea::new(0, height - half, width, height)
        }
        (StereoMode::AboveBelow, StereoEye::Right) => {
            let half = ((height - scanlines as i32) / 2).max(0);
            RenderArea::new(0, 0, width, half)
        }
        (StereoMode::TopBottom3dTv, StereoEye::Left) => RenderArea::new(0, height - height / 2, width, height),
        (StereoMode::TopBottom3dTv, StereoEye::Right) => RenderArea::new(0, 0, width, height / 2),
        (StereoMode::SideBySide, StereoEye::Left) => RenderArea::new(0, 0, width / 2, height),
        (StereoMode::SideBySide, StereoEye::Right) => RenderArea::new(width / 2, 0, width, height),
        _ => RenderArea::new(0, 0, width, height),
    }
}

#[cfg(test)]
#[path = "render_area_tests.rs"]
mod tests;
