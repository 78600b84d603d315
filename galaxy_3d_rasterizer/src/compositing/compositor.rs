/// Compositing - putting off-screen results on screen.
///
/// Every draw here is a full-screen quad sampling one or two color textures,
/// or a blit when the source is multisampled. Multisampled pool slots are
/// first resolved into their single-sample partner slot.

use glam::Vec2;
use crate::error::{Error, Result};
use crate::{engine_trace, engine_warn};
use crate::graphics_device::{BlitMask, Capability, DepthFunc, PixelRect};
use crate::external::{Canvas, ShaderLibrary, ProgramHandle, UniformValue};
use crate::target::{TargetManager, RenderTargetKey, AttachableKey};
use crate::offscreen::{OffscreenSurface, OffscreenPool, OffscreenSlot};
use super::shader_interface::{
    program_interface, set_uniform, DrawFrameBufferInterface, StereoStippleInterface,
    StereoAnaglyphInterface, SeparableBlurInterface,
};
use super::stereo::StereoMode;

// ============================================================================
// Off-screen to target
// ============================================================================

/// Draw `source` into `destination` (None = window default target)
///
/// Multisampled sources, and sources whose color is a renderbuffer, are
/// blitted with color and depth. Otherwise the color texture is drawn on a
/// full-screen quad with the draw-framebuffer program.
pub fn draw_offscreen_to_target(
    ctx: &mut TargetManager,
    shaders: &mut dyn ShaderLibrary,
    source: &OffscreenSurface,
    destination: Option<&OffscreenSurface>,
) -> Result<()> {
    if source.samples() > 0 || source.color_texture().is_none() {
        let mask = BlitMask::COLOR | BlitMask::DEPTH;
        return match destination {
            Some(destination) => source.blit(ctx, destination, true, true).map(|_| ()),
            None => ctx.blit(source.target(), None, source.width(), source.height(), mask),
        };
    }

    match destination {
        Some(destination) => ctx.bind_slot(destination.target(), 0)?,
        None => ctx.restore_default(),
    }

    source.bind_color_texture(ctx, 0)?;
    match program_interface::<DrawFrameBufferInterface>(shaders) {
        Some((program, interface)) => {
            shaders.bind(program);
            set_uniform(shaders, program, interface.color_texture, UniformValue::Int(0));
            ctx.device_mut().draw_fullscreen_quad();
            shaders.unbind();
        }
        None => {
            engine_warn!("galaxy3d::Compositor", "Draw framebuffer program unavailable, nothing drawn");
        }
    }
    source.unbind_color_texture(ctx)
}

// ============================================================================
// Off-screen to canvas
// ============================================================================

/// Draw pool slot `source` onto the whole canvas viewport
///
/// A multisampled source is resolved into `LeftEyeResolve` first. Depth
/// test passes everything and face culling is off while drawing; both are
/// restored afterwards.
pub fn draw_offscreen_to_canvas(
    ctx: &mut TargetManager,
    shaders: &mut dyn ShaderLibrary,
    pool: &mut OffscreenPool,
    canvas: &dyn Canvas,
    source: OffscreenSlot,
) -> Result<()> {
    let source = resolve_multisample(ctx, pool, source, OffscreenSlot::LeftEyeResolve)?;
    let surface = required_surface(pool, source)?;

    begin_canvas_draw(ctx, canvas);
    let result = draw_offscreen_to_target(ctx, shaders, surface, None);
    end_canvas_draw(ctx);
    result
}

/// Combine the two eye slots onto the canvas for `mode`
///
/// Row and column interlace use the stipple program, anaglyph the anaglyph
/// program. Other modes draw nothing (they render each eye directly).
pub fn draw_stereo_to_canvas(
    ctx: &mut TargetManager,
    shaders: &mut dyn ShaderLibrary,
    pool: &mut OffscreenPool,
    canvas: &dyn Canvas,
    left: OffscreenSlot,
    right: OffscreenSlot,
    mode: StereoMode,
) -> Result<()> {
    let left = resolve_multisample(ctx, pool, left, OffscreenSlot::LeftEyeResolve)?;
    let right = resolve_multisample(ctx, pool, right, OffscreenSlot::RightEyeResolve)?;
    let left = required_surface(pool, left)?;
    let right = required_surface(pool, right)?;

    begin_canvas_draw(ctx, canvas);
    let result = compose_eyes(ctx, shaders, left, right, mode);
    end_canvas_draw(ctx);
    result
}

fn compose_eyes(
    ctx: &mut TargetManager,
    shaders: &mut dyn ShaderLibrary,
    left: &OffscreenSurface,
    right: &OffscreenSurface,
    mode: StereoMode,
) -> Result<()> {
    match mode {
        StereoMode::Interlaced | StereoMode::VerticalInterlace => {
            let Some((program, interface)) = program_interface::<StereoStippleInterface>(shaders) else {
                engine_warn!("galaxy3d::Compositor", "Stereo stipple program unavailable, nothing drawn");
                return Ok(());
            };
            let stipple_id = if mode == StereoMode::Interlaced { 1 } else { 0 };
            draw_eye_pair(ctx, shaders, program, left, right, |shaders| {
                set_uniform(shaders, program, interface.left_eye_texture, UniformValue::Int(0));
                set_uniform(shaders, program, interface.right_eye_texture, UniformValue::Int(1));
                set_uniform(shaders, program, interface.stipple_id, UniformValue::Int(stipple_id));
            })
        }
        StereoMode::Anaglyph => {
            let Some((program, interface)) = program_interface::<StereoAnaglyphInterface>(shaders) else {
                engine_warn!("galaxy3d::Compositor", "Stereo anaglyph program unavailable, nothing drawn");
                return Ok(());
            };
            draw_eye_pair(ctx, shaders, program, left, right, |shaders| {
                set_uniform(shaders, program, interface.left_eye_texture, UniformValue::Int(0));
                set_uniform(shaders, program, interface.right_eye_texture, UniformValue::Int(1));
            })
        }
        _ => Ok(()),
    }
}

/// Left eye on unit 0, right eye on unit 1, one quad
fn draw_eye_pair(
    ctx: &mut TargetManager,
    shaders: &mut dyn ShaderLibrary,
    program: ProgramHandle,
    left: &OffscreenSurface,
    right: &OffscreenSurface,
    set_uniforms: impl FnOnce(&mut dyn ShaderLibrary),
) -> Result<()> {
    left.bind_color_texture(ctx, 0)?;
    if let Err(err) = right.bind_color_texture(ctx, 1) {
        let _ = left.unbind_color_texture(ctx);
        return Err(err);
    }

    shaders.bind(program);
    set_uniforms(shaders);
    ctx.device_mut().draw_fullscreen_quad();
    shaders.unbind();

    left.unbind_color_texture(ctx)?;
    right.unbind_color_texture(ctx)
}

fn begin_canvas_draw(ctx: &mut TargetManager, canvas: &dyn Canvas) {
    let viewport = canvas.viewport();
    let device = ctx.device_mut();
    device.set_viewport(viewport);
    device.set_scissor(viewport);
    device.disable(Capability::CullFace);
    device.set_depth_func(DepthFunc::Always);
    ctx.restore_default();
}

fn end_canvas_draw(ctx: &mut TargetManager) {
    let device = ctx.device_mut();
    device.set_depth_func(DepthFunc::LessEqual);
    device.enable(Capability::CullFace);
}

/// Slot to sample from: `slot` itself, or `resolve` after a color blit when
/// `slot` is multisampled or its color is not a texture
fn resolve_multisample(
    ctx: &mut TargetManager,
    pool: &mut OffscreenPool,
    slot: OffscreenSlot,
    resolve: OffscreenSlot,
) -> Result<OffscreenSlot> {
    let surface = required_surface(pool, slot)?;
    if surface.samples() == 0 && surface.color_texture().is_some() {
        return Ok(slot);
    }

    pool.ensure(ctx, resolve)?;
    let source = required_surface(pool, slot)?;
    let destination = required_surface(pool, resolve)?;
    source.blit(ctx, destination, true, false)?;
    engine_trace!("galaxy3d::Compositor", "Resolved {:?} into {:?}", slot, resolve);
    Ok(resolve)
}

pub(crate) fn required_surface(pool: &OffscreenPool, slot: OffscreenSlot) -> Result<&OffscreenSurface> {
    pool.surface(slot).ok_or_else(|| {
        Error::InvalidResource(format!("Off-screen {:?} has not been created", slot))
    })
}

// ============================================================================
// Separable blur
// ============================================================================

/// Texel steps of the horizontal and vertical blur passes
///
/// `(1 - sharpness) / blur_width` along X, then `(1 - sharpness) /
/// texture_height` along Y. A zero size gives a zero step.
pub fn blur_scales(sharpness: f32, blur_width: u32, texture_height: u32) -> (Vec2, Vec2) {
    let strength = 1.0 - sharpness;
    let step = |size: u32| if size == 0 { 0.0 } else { strength / size as f32 };
    (Vec2::new(step(blur_width), 0.0), Vec2::new(0.0, step(texture_height)))
}

/// Two-pass gaussian blur of `texture` (color of `target`) through
/// `blur_texture` (color of `blur_target`)
///
/// The horizontal pass renders `texture` into `blur_target`, the vertical
/// pass renders `blur_texture` back into `target`. Does nothing if the blur
/// program is unavailable. Leaves `target` bound with depth test disabled.
pub fn separable_blur(
    ctx: &mut TargetManager,
    shaders: &mut dyn ShaderLibrary,
    target: RenderTargetKey,
    texture: AttachableKey,
    blur_target: RenderTargetKey,
    blur_texture: AttachableKey,
    sharpness: f32,
) -> Result<()> {
    let Some((program, interface)) = program_interface::<SeparableBlurInterface>(shaders) else {
        engine_warn!("galaxy3d::Compositor", "Separable blur program unavailable, blur skipped");
        return Ok(());
    };

    let (blur_width, blur_height) = attachable_size(ctx, blur_texture)?;
    let (width, height) = attachable_size(ctx, texture)?;
    let (horizontal, vertical) = blur_scales(sharpness, blur_width, height);

    let pass = BlurPass { program, interface: *interface };
    shaders.bind(program);
    let result = pass
        .run(ctx, shaders, blur_target, texture, blur_width, blur_height, horizontal)
        .and_then(|_| ctx.unbind_texture(texture))
        .and_then(|_| pass.run(ctx, shaders, target, blur_texture, width, height, vertical));

    let _ = ctx.unbind_texture(blur_texture);
    shaders.unbind();
    result
}

struct BlurPass {
    program: ProgramHandle,
    interface: SeparableBlurInterface,
}

impl BlurPass {
    /// Render `source` into color 0 of `target` with step `scale`
    #[allow(clippy::too_many_arguments)]
    fn run(
        &self,
        ctx: &mut TargetManager,
        shaders: &mut dyn ShaderLibrary,
        target: RenderTargetKey,
        source: AttachableKey,
        width: u32,
        height: u32,
        scale: Vec2,
    ) -> Result<()> {
        ctx.bind_simple(target)?;
        ctx.device_mut().set_viewport(PixelRect::from_size(width, height));

        set_uniform(shaders, self.program, self.interface.scale, UniformValue::Vec2(scale));
        set_uniform(shaders, self.program, self.interface.texture_source, UniformValue::TextureUnit(0));

        ctx.device_mut().disable(Capability::DepthTest);
        ctx.bind_texture(source, 0)?;
        ctx.device_mut().draw_fullscreen_quad();
        Ok(())
    }
}

fn attachable_size(ctx: &TargetManager, attachable: AttachableKey) -> Result<(u32, u32)> {
    ctx.attachable(attachable)
        .map(|a| (a.width(), a.height()))
        .ok_or_else(|| Error::InvalidResource(format!("Unknown attachable {:?}", attachable)))
}

#[cfg(test)]
#[path = "compositor_tests.rs"]
mod tests;
