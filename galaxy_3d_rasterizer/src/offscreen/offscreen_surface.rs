/// Off-screen surface - a render target with its own color and depth storage.
///
/// Construction is all-or-nothing: any failed step releases everything
/// allocated by the previous ones. The surface holds arena keys only, so it
/// must be released with `destroy` against the `TargetManager` it was
/// created with.

use bitflags::bitflags;
use crate::error::Result;
use crate::{engine_debug, engine_info};
use crate::graphics_device::{
    DeviceCapabilities, HdrPrecision, PixelFormat, PixelRect, BlitMask, Capability,
};
use crate::target::{TargetManager, RenderTargetKey, AttachableKey};

bitflags! {
    /// Storage policy of an off-screen surface
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct OffscreenMode: u32 {
        /// Color in a renderbuffer instead of a texture
        const RENDERBUFFER_COLOR = 1 << 0;
        /// Depth in a renderbuffer instead of a texture
        const RENDERBUFFER_DEPTH = 1 << 1;
        /// Depth texture configured for comparison sampling
        const DEPTH_COMPARE = 1 << 2;
    }
}

/// Creation parameters of an off-screen surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffscreenDesc {
    pub width: u32,
    pub height: u32,
    /// Requested sample count (the achieved count may be lower)
    pub samples: u32,
    pub precision: HdrPrecision,
    pub mode: OffscreenMode,
}

/// Storage actually used for a surface once device support is known
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoragePlan {
    /// Effective sample count, shared by color and depth
    pub samples: u32,
    pub color_renderbuffer: bool,
    pub depth_renderbuffer: bool,
}

/// Choose storage kinds and the effective sample count
///
/// Both channels always share one sample count. Multisampling needs
/// multisample framebuffers and blit (for read-back); without them samples
/// drop to 0. Without multisample textures every texture channel moves to a
/// renderbuffer, unless the depth channel must stay a comparison texture,
/// in which case samples drop to 0 instead.
pub fn resolve_storage(requested_samples: u32, mode: OffscreenMode, capabilities: &DeviceCapabilities) -> StoragePlan {
    let mut plan = StoragePlan {
        samples: requested_samples.min(capabilities.max_samples),
        color_renderbuffer: mode.contains(OffscreenMode::RENDERBUFFER_COLOR),
        depth_renderbuffer: mode.contains(OffscreenMode::RENDERBUFFER_DEPTH),
    };

    if plan.samples == 0 {
        return plan;
    }

    if !capabilities.framebuffer_multisample || !capabilities.framebuffer_blit {
        plan.samples = 0;
    } else if !capabilities.texture_multisample && !(plan.color_renderbuffer && plan.depth_renderbuffer) {
        if !plan.depth_renderbuffer && mode.contains(OffscreenMode::DEPTH_COMPARE) {
            plan.samples = 0;
        } else {
            plan.color_renderbuffer = true;
            plan.depth_renderbuffer = true;
        }
    }
    plan
}

/// How `OffscreenSurface::bind` binds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindMode {
    /// Framebuffer, color 0 draw/read buffer and viewport only
    Simple,
    /// Also pushes enable bits, viewport and transforms, and remembers the
    /// previously bound target for `unbind(ctx, true)`
    Save,
}

pub struct OffscreenSurface {
    target: RenderTargetKey,
    color: AttachableKey,
    depth: AttachableKey,
    color_is_texture: bool,
    depth_is_texture: bool,
    samples: u32,
    width: u32,
    height: u32,
}

/// Keys allocated so far during construction or a scratch resolve
#[derive(Default)]
struct Allocations {
    target: Option<RenderTargetKey>,
    color: Option<AttachableKey>,
    depth: Option<AttachableKey>,
}

impl Allocations {
    /// Destroy the target first (detaching), then its storage
    fn release(self, ctx: &mut TargetManager) {
        if let Some(target) = self.target {
            let _ = ctx.destroy_render_target(target);
        }
        for attachable in [self.color, self.depth].into_iter().flatten() {
            let _ = ctx.destroy_attachable(attachable);
        }
    }
}

impl OffscreenSurface {
    /// Create a surface; on failure nothing stays allocated
    ///
    /// Leaves the default target bound on success.
    pub fn create(ctx: &mut TargetManager, desc: &OffscreenDesc) -> Result<Self> {
        let target = ctx.create_render_target()?;
        let plan = resolve_storage(desc.samples, desc.mode, &ctx.capabilities());
        if plan.samples != desc.samples {
            engine_info!("galaxy3d::OffscreenSurface",
                "Requested {} samples, using {}", desc.samples, plan.samples);
        }

        let mut allocations = Allocations { target: Some(target), ..Default::default() };
        let (color, depth) = match Self::populate(ctx, desc, &plan, target, &mut allocations) {
            Ok(storage) => storage,
            Err(err) => {
                allocations.release(ctx);
                return Err(err);
            }
        };
        ctx.restore_default();

        engine_debug!("galaxy3d::OffscreenSurface",
            "Created {}x{} off-screen ({} samples)", desc.width, desc.height, plan.samples);

        Ok(Self {
            target,
            color,
            depth,
            color_is_texture: !plan.color_renderbuffer,
            depth_is_texture: !plan.depth_renderbuffer,
            samples: plan.samples,
            width: desc.width,
            height: desc.height,
        })
    }

    fn populate(
        ctx: &mut TargetManager,
        desc: &OffscreenDesc,
        plan: &StoragePlan,
        target: RenderTargetKey,
        allocations: &mut Allocations,
    ) -> Result<(AttachableKey, AttachableKey)> {
        let color = if plan.color_renderbuffer {
            ctx.create_renderbuffer(desc.width, desc.height, plan.samples, desc.precision, false)?
        } else {
            ctx.create_texture(desc.width, desc.height, plan.samples, desc.precision, false, false)?
        };
        allocations.color = Some(color);
        ctx.attach(target, color, 0)?;

        let depth = if plan.depth_renderbuffer {
            ctx.create_renderbuffer(desc.width, desc.height, plan.samples, HdrPrecision::None, true)?
        } else {
            let compare = desc.mode.contains(OffscreenMode::DEPTH_COMPARE);
            ctx.create_texture(desc.width, desc.height, plan.samples, HdrPrecision::None, true, compare)?
        };
        allocations.depth = Some(depth);
        ctx.attach(target, depth, 0)?;

        ctx.check_complete(target)?;
        Ok((color, depth))
    }

    /// Release the render target and both storages
    pub fn destroy(self, ctx: &mut TargetManager) {
        Allocations {
            target: Some(self.target),
            color: Some(self.color),
            depth: Some(self.depth),
        }
        .release(ctx);
    }

    // ===== BINDING =====

    /// Bind for rendering; scissor test is disabled until `unbind`
    pub fn bind(&self, ctx: &mut TargetManager, mode: BindMode) -> Result<()> {
        ctx.device_mut().disable(Capability::ScissorTest);
        match mode {
            BindMode::Save => ctx.bind_attachable_as_target(self.color),
            BindMode::Simple => ctx.bind_slot(self.target, 0),
        }
    }

    /// Bind framebuffer and color 0 only (no viewport, no scissor change)
    pub fn bind_simple(&self, ctx: &mut TargetManager) -> Result<()> {
        ctx.bind_simple(self.target)
    }

    /// Undo `bind`
    ///
    /// With `restore` (after a `Save` bind) the pushed state is popped and the
    /// previously bound target comes back; otherwise the default target is
    /// bound. Scissor test is enabled again either way.
    pub fn unbind(&self, ctx: &mut TargetManager, restore: bool) {
        if restore {
            ctx.unbind_saved();
        } else {
            ctx.restore_default();
        }
        ctx.device_mut().enable(Capability::ScissorTest);
    }

    // ===== TRANSFER =====

    /// Copy color and/or depth into `destination` (overlapping region),
    /// leaving the destination bound
    pub fn blit<'a>(
        &self,
        ctx: &mut TargetManager,
        destination: &'a OffscreenSurface,
        color: bool,
        depth: bool,
    ) -> Result<&'a OffscreenSurface> {
        let mut mask = BlitMask::empty();
        if color {
            mask |= BlitMask::COLOR;
        }
        if depth {
            mask |= BlitMask::DEPTH;
        }

        let width = self.width.min(destination.width);
        let height = self.height.min(destination.height);
        ctx.blit(self.target, Some(destination.target), width, height, mask)?;
        Ok(destination)
    }

    /// Read the whole color buffer into `pixels`
    ///
    /// Multisampled color is resolved through a temporary single-sample
    /// target, released on every path. The bound target is unchanged.
    pub fn read_pixels(&self, ctx: &mut TargetManager, format: PixelFormat, pixels: &mut [u8]) -> Result<()> {
        let area = PixelRect::from_size(self.width, self.height);
        if self.samples == 0 {
            return ctx.read_pixels(self.target, area, format, pixels);
        }

        let previous = ctx.bound_target();
        let mut scratch = Allocations::default();
        let result = self.read_resolved(ctx, format, pixels, &mut scratch);
        scratch.release(ctx);
        ctx.rebind(previous);
        result
    }

    fn read_resolved(
        &self,
        ctx: &mut TargetManager,
        format: PixelFormat,
        pixels: &mut [u8],
        scratch: &mut Allocations,
    ) -> Result<()> {
        let precision = match format {
            PixelFormat::Rgba8 => HdrPrecision::None,
            PixelFormat::Rgba32F => HdrPrecision::FullFloat,
        };

        let target = ctx.create_render_target()?;
        scratch.target = Some(target);
        let texture = ctx.create_texture(self.width, self.height, 0, precision, false, false)?;
        scratch.color = Some(texture);
        ctx.attach(target, texture, 0)?;
        ctx.check_complete(target)?;

        ctx.blit(self.target, Some(target), self.width, self.height, BlitMask::COLOR)?;
        ctx.read_pixels(target, PixelRect::from_size(self.width, self.height), format, pixels)
    }

    /// Color buffer as RGBA8
    pub fn read_rgba8(&self, ctx: &mut TargetManager) -> Result<Vec<u8>> {
        let mut pixels = vec![0u8; self.pixel_count() * 4];
        self.read_pixels(ctx, PixelFormat::Rgba8, &mut pixels)?;
        Ok(pixels)
    }

    /// Color buffer as RGBA32F
    pub fn read_rgba32f(&self, ctx: &mut TargetManager) -> Result<Vec<f32>> {
        let mut pixels = vec![0f32; self.pixel_count() * 4];
        self.read_pixels(ctx, PixelFormat::Rgba32F, bytemuck::cast_slice_mut(&mut pixels))?;
        Ok(pixels)
    }

    // ===== SAMPLING =====

    /// Bind the color texture to texture `unit`
    pub fn bind_color_texture(&self, ctx: &mut TargetManager, unit: u32) -> Result<()> {
        ctx.bind_texture(self.color, unit)
    }

    pub fn unbind_color_texture(&self, ctx: &mut TargetManager) -> Result<()> {
        ctx.unbind_texture(self.color)
    }

    // ===== ACCESSORS =====

    pub fn target(&self) -> RenderTargetKey {
        self.target
    }

    /// Color storage (texture or renderbuffer)
    pub fn color(&self) -> AttachableKey {
        self.color
    }

    /// Depth storage (texture or renderbuffer)
    pub fn depth(&self) -> AttachableKey {
        self.depth
    }

    /// Color storage if it is a texture
    pub fn color_texture(&self) -> Option<AttachableKey> {
        self.color_is_texture.then_some(self.color)
    }

    /// Depth storage if it is a texture
    pub fn depth_texture(&self) -> Option<AttachableKey> {
        self.depth_is_texture.then_some(self.depth)
    }

    /// Achieved sample count
    pub fn samples(&self) -> u32 {
        self.samples
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

#[cfg(test)]
#[path = "offscreen_surface_tests.rs"]
mod tests;
