/// Rasterizer configuration
///
/// Values that are fixed for the lifetime of a `Rasterizer`. Per-frame
/// inputs (canvas size, sample count, HDR mode) come from the `Canvas`.

/// Default height in pixels of the band left between the two halves in
/// the legacy above/below stereo layout
pub const DEFAULT_INTERLACE_SCANLINES: u32 = 32;

/// Default distance between the two eyes, in world units
pub const DEFAULT_EYE_SEPARATION: f32 = 0.1;

/// Configuration consumed by `Rasterizer::new`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterizerConfig {
    /// Warn about feedback loops (a texture attached while still bound for
    /// sampling). Defaults to on in debug builds.
    pub debug: bool,

    /// Scanline band for `StereoMode::AboveBelow`
    pub interlace_scanlines: u32,

    /// Distance between the two eyes for stereo frusta and view matrices
    pub eye_separation: f32,

    /// Fixed focal length. None = taken from the camera each frame.
    pub focal_length: Option<f32>,
}

impl Default for RasterizerConfig {
    fn default() -> Self {
        Self {
            debug: cfg!(debug_assertions),
            interlace_scanlines: DEFAULT_INTERLACE_SCANLINES,
            eye_separation: DEFAULT_EYE_SEPARATION,
            focal_length: None,
        }
    }
}
