/// Canvas collaborator - the window surface frames are composited onto

use crate::graphics_device::{HdrPrecision, PixelRect};

/// Read-only view of the output canvas
///
/// The rasterizer never mutates the canvas; it only sizes the off-screen
/// pool and the final composition against it.
pub trait Canvas {
    /// Width in pixels
    fn width(&self) -> u32;

    /// Height in pixels
    fn height(&self) -> u32;

    /// Requested multisample count (0 = none)
    fn samples(&self) -> u32;

    /// Color precision of HDR rendering
    fn hdr(&self) -> HdrPrecision;

    /// Full viewport rectangle of the canvas in window pixels
    fn viewport(&self) -> PixelRect;
}
