/// Rasterizer - frame-level entry point.
///
/// Owns the target manager, the off-screen pool and the shader library, and
/// keeps the per-frame stereo and post-process state. Compositing calls
/// address off-screens by pool slot.

use glam::Mat4;
use crate::error::{Error, Result};
use crate::{engine_debug, engine_info};
use crate::config::RasterizerConfig;
use crate::graphics_device::GraphicsDevice;
use crate::external::{Canvas, ShaderLibrary};
use crate::target::{TargetManager, AttachableKey};
use crate::offscreen::{OffscreenPool, OffscreenSlot, OffscreenSurface, BindMode};
use super::compositor::{self, required_surface};
use super::render_area::{compute_render_area, RenderArea};
use super::stereo::{StereoCamera, StereoMode, StereoEye};

/// Motion blur disabled
pub const MOTION_BLUR_OFF: u16 = 0;
/// Motion blur requested, accumulation not started yet
pub const MOTION_BLUR_ENABLED: u16 = 1;

pub struct Rasterizer {
    ctx: TargetManager,
    pool: OffscreenPool,
    shaders: Box<dyn ShaderLibrary>,
    config: RasterizerConfig,

    stereo: StereoCamera,
    stereo_mode: StereoMode,
    eye: StereoEye,

    global_depth_texture: Option<AttachableKey>,
    motion_blur: u16,
    motion_blur_value: f32,
}

impl Rasterizer {
    pub fn new(device: Box<dyn GraphicsDevice>, shaders: Box<dyn ShaderLibrary>, config: RasterizerConfig) -> Self {
        let mut ctx = TargetManager::new(device);
        ctx.set_debug(config.debug);

        let capabilities = ctx.capabilities();
        engine_info!("galaxy3d::Rasterizer",
            "Rasterizer created (multisample: {}, max samples: {}, blit: {})",
            capabilities.framebuffer_multisample, capabilities.max_samples, capabilities.framebuffer_blit);

        Self {
            ctx,
            pool: OffscreenPool::new(),
            shaders,
            stereo: StereoCamera::from_config(&config),
            config,
            stereo_mode: StereoMode::NoStereo,
            eye: StereoEye::Left,
            global_depth_texture: None,
            motion_blur: MOTION_BLUR_OFF,
            motion_blur_value: -1.0,
        }
    }

    pub fn config(&self) -> &RasterizerConfig {
        &self.config
    }

    pub fn target_manager(&self) -> &TargetManager {
        &self.ctx
    }

    pub fn target_manager_mut(&mut self) -> &mut TargetManager {
        &mut self.ctx
    }

    pub fn pool(&self) -> &OffscreenPool {
        &self.pool
    }

    pub fn shaders_mut(&mut self) -> &mut dyn ShaderLibrary {
        self.shaders.as_mut()
    }

    // ===== OFF-SCREENS =====

    /// Follow the canvas size; returns true if the pool was reset
    pub fn update_offscreens(&mut self, canvas: &dyn Canvas) -> bool {
        let reset = self.pool.update_from_canvas(&mut self.ctx, canvas);
        if reset {
            // The published depth texture belonged to a destroyed slot
            self.global_depth_texture = None;
        }
        reset
    }

    /// Off-screen of `slot`, created on first use
    pub fn offscreen(&mut self, slot: OffscreenSlot) -> Result<&OffscreenSurface> {
        self.pool.get(&mut self.ctx, slot)
    }

    // ===== COMPOSITING =====

    /// Draw `source` into `destination` (None = window default target)
    pub fn draw_offscreen(&mut self, source: OffscreenSlot, destination: Option<OffscreenSlot>) -> Result<()> {
        if let Some(destination) = destination {
            self.pool.ensure(&mut self.ctx, destination)?;
        }
        let source = required_surface(&self.pool, source)?;
        let destination = match destination {
            Some(slot) => Some(required_surface(&self.pool, slot)?),
            None => None,
        };
        compositor::draw_offscreen_to_target(&mut self.ctx, self.shaders.as_mut(), source, destination)
    }

    /// Draw `slot` onto the canvas viewport
    pub fn draw_offscreen_to_canvas(&mut self, canvas: &dyn Canvas, slot: OffscreenSlot) -> Result<()> {
        compositor::draw_offscreen_to_canvas(&mut self.ctx, self.shaders.as_mut(), &mut self.pool, canvas, slot)
    }

    /// Combine two eye slots onto the canvas with the current stereo mode
    pub fn draw_stereo_offscreen(
        &mut self,
        canvas: &dyn Canvas,
        left: OffscreenSlot,
        right: OffscreenSlot,
    ) -> Result<()> {
        compositor::draw_stereo_to_canvas(
            &mut self.ctx,
            self.shaders.as_mut(),
            &mut self.pool,
            canvas,
            left,
            right,
            self.stereo_mode,
        )
    }

    /// Blur the color of `slot` in place, using `blur_slot` as intermediate
    pub fn blur(&mut self, slot: OffscreenSlot, blur_slot: OffscreenSlot, sharpness: f32) -> Result<()> {
        self.pool.ensure(&mut self.ctx, slot)?;
        self.pool.ensure(&mut self.ctx, blur_slot)?;
        let target = required_surface(&self.pool, slot)?;
        let blur = required_surface(&self.pool, blur_slot)?;

        let (Some(texture), Some(blur_texture)) = (target.color_texture(), blur.color_texture()) else {
            return Err(Error::InvalidResource(format!(
                "Blur needs color textures ({:?}, {:?})", slot, blur_slot
            )));
        };
        compositor::separable_blur(
            &mut self.ctx,
            self.shaders.as_mut(),
            target.target(),
            texture,
            blur.target(),
            blur_texture,
            sharpness,
        )
    }

    // ===== GLOBAL DEPTH TEXTURE =====

    /// Publish the depth texture of `slot` for shaders that read scene depth
    ///
    /// Multisampled depth is blitted into `BlitDepth` first and that copy is
    /// published; `slot` is bound again afterwards. Returns the published
    /// texture (None if the depth is a renderbuffer).
    pub fn update_global_depth_texture(&mut self, slot: OffscreenSlot) -> Result<Option<AttachableKey>> {
        let samples = required_surface(&self.pool, slot)?.samples();

        let published = if samples > 0 {
            self.pool.ensure(&mut self.ctx, OffscreenSlot::BlitDepth)?;
            let source = required_surface(&self.pool, slot)?;
            let destination = required_surface(&self.pool, OffscreenSlot::BlitDepth)?;
            source.blit(&mut self.ctx, destination, false, true)?;
            source.bind(&mut self.ctx, BindMode::Simple)?;
            destination.depth_texture()
        } else {
            required_surface(&self.pool, slot)?.depth_texture()
        };

        engine_debug!("galaxy3d::Rasterizer", "Global depth texture from {:?}: {:?}", slot, published);
        self.global_depth_texture = published;
        Ok(published)
    }

    pub fn global_depth_texture(&self) -> Option<AttachableKey> {
        self.global_depth_texture
    }

    pub fn reset_global_depth_texture(&mut self) {
        self.global_depth_texture = None;
    }

    // ===== STEREO =====

    pub fn set_stereo_mode(&mut self, mode: StereoMode) {
        self.stereo_mode = mode;
    }

    pub fn stereo_mode(&self) -> StereoMode {
        self.stereo_mode
    }

    pub fn uses_stereo(&self) -> bool {
        self.stereo_mode.is_stereo()
    }

    pub fn set_eye(&mut self, eye: StereoEye) {
        self.eye = eye;
    }

    pub fn eye(&self) -> StereoEye {
        self.eye
    }

    pub fn set_eye_separation(&mut self, eye_separation: f32) {
        self.stereo.set_eye_separation(eye_separation);
    }

    pub fn eye_separation(&self) -> f32 {
        self.stereo.eye_separation()
    }

    pub fn set_focal_length(&mut self, focal_length: f32) {
        self.stereo.set_focal_length(focal_length);
    }

    pub fn focal_length(&self) -> f32 {
        self.stereo.focal_length()
    }

    /// Canvas area of `eye` in the current stereo mode
    pub fn render_area(&self, canvas: &dyn Canvas, eye: StereoEye) -> RenderArea {
        compute_render_area(canvas, self.stereo_mode, eye, self.config.interlace_scanlines)
    }

    /// Projection for the current eye and stereo mode
    #[allow(clippy::too_many_arguments)]
    pub fn frustum_matrix(
        &mut self,
        camera_focal_length: f32,
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        near: f32,
        far: f32,
    ) -> Mat4 {
        self.stereo.frustum_matrix(
            self.stereo_mode, self.eye, camera_focal_length, left, right, bottom, top, near, far,
        )
    }

    /// View matrix for the current eye and stereo mode
    pub fn view_matrix(&self, camera_transform: Mat4, perspective: bool) -> Mat4 {
        self.stereo.view_matrix(self.stereo_mode, self.eye, camera_transform, perspective)
    }

    // ===== MOTION BLUR =====

    /// Request motion blur with accumulation factor `value`
    ///
    /// An already running motion blur keeps its state; only the value changes.
    pub fn enable_motion_blur(&mut self, value: f32) {
        if self.motion_blur == MOTION_BLUR_OFF {
            self.motion_blur = MOTION_BLUR_ENABLED;
        }
        self.motion_blur_value = value;
    }

    pub fn disable_motion_blur(&mut self) {
        self.motion_blur = MOTION_BLUR_OFF;
        self.motion_blur_value = -1.0;
    }

    /// Set the motion blur state directly (used by the accumulation pass)
    pub fn set_motion_blur(&mut self, state: u16) {
        self.motion_blur = state;
    }

    pub fn motion_blur(&self) -> u16 {
        self.motion_blur
    }

    pub fn motion_blur_value(&self) -> f32 {
        self.motion_blur_value
    }
}

impl Drop for Rasterizer {
    fn drop(&mut self) {
        self.pool.clear(&mut self.ctx);
    }
}

#[cfg(test)]
#[path = "rasterizer_tests.rs"]
mod tests;
