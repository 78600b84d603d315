/// Off-screen pool - named surfaces sized to the canvas.
///
/// Slots are created lazily by `get` and all dropped together when the
/// canvas size changes.

use crate::error::{Error, Result};
use crate::{engine_debug, engine_info, engine_warn};
use crate::graphics_device::HdrPrecision;
use crate::external::Canvas;
use crate::target::TargetManager;
use super::offscreen_surface::{OffscreenSurface, OffscreenDesc, OffscreenMode, resolve_storage};

/// Number of pool slots
pub const OFFSCREEN_SLOT_COUNT: usize = 7;

/// Named pool slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OffscreenSlot {
    /// Left eye (or mono) render target, may be multisampled
    LeftEye,
    /// Single-sample partner of `LeftEye`
    LeftEyeResolve,
    /// Right eye render target, may be multisampled
    RightEye,
    /// Single-sample partner of `RightEye`
    RightEyeResolve,
    /// First filter ping-pong surface
    FilterA,
    /// Second filter ping-pong surface
    FilterB,
    /// Scratch for resolving depth into a sampleable texture
    BlitDepth,
}

impl OffscreenSlot {
    pub const ALL: [OffscreenSlot; OFFSCREEN_SLOT_COUNT] = [
        OffscreenSlot::LeftEye,
        OffscreenSlot::LeftEyeResolve,
        OffscreenSlot::RightEye,
        OffscreenSlot::RightEyeResolve,
        OffscreenSlot::FilterA,
        OffscreenSlot::FilterB,
        OffscreenSlot::BlitDepth,
    ];

    pub fn index(self) -> usize {
        match self {
            OffscreenSlot::LeftEye => 0,
            OffscreenSlot::LeftEyeResolve => 1,
            OffscreenSlot::RightEye => 2,
            OffscreenSlot::RightEyeResolve => 3,
            OffscreenSlot::FilterA => 4,
            OffscreenSlot::FilterB => 5,
            OffscreenSlot::BlitDepth => 6,
        }
    }

    /// Only the per-eye primary slots use multisample storage
    pub fn supports_samples(self) -> bool {
        matches!(self, OffscreenSlot::LeftEye | OffscreenSlot::RightEye)
    }

    /// Filter ping-pong: FilterA → FilterB, anything else → FilterA
    pub fn next_filter(self) -> OffscreenSlot {
        match self {
            OffscreenSlot::FilterA => OffscreenSlot::FilterB,
            _ => OffscreenSlot::FilterA,
        }
    }

    /// Render ping-pong between an eye's primary and resolve slots
    ///
    /// Only eye slots are valid here; any other slot asserts in debug builds
    /// and yields `LeftEye`.
    pub fn next_render(self) -> OffscreenSlot {
        match self {
            OffscreenSlot::LeftEye => OffscreenSlot::LeftEyeResolve,
            OffscreenSlot::LeftEyeResolve => OffscreenSlot::LeftEye,
            OffscreenSlot::RightEye => OffscreenSlot::RightEyeResolve,
            OffscreenSlot::RightEyeResolve => OffscreenSlot::RightEye,
            _ => {
                debug_assert!(false, "next_render called on non-eye slot {:?}", self);
                OffscreenSlot::LeftEye
            }
        }
    }
}

pub struct OffscreenPool {
    slots: [Option<OffscreenSurface>; OFFSCREEN_SLOT_COUNT],
    width: u32,
    height: u32,
    samples: u32,
    precision: HdrPrecision,
}

impl OffscreenPool {
    /// Empty pool with a 0x0 baseline
    pub fn new() -> Self {
        Self {
            slots: Default::default(),
            width: 0,
            height: 0,
            samples: 0,
            precision: HdrPrecision::None,
        }
    }

    /// Record a new baseline; destroys every slot if the size changed
    ///
    /// Samples and precision are only taken on a size change. Returns true
    /// if the slots were reset.
    pub fn update(
        &mut self,
        ctx: &mut TargetManager,
        width: u32,
        height: u32,
        samples: u32,
        precision: HdrPrecision,
    ) -> bool {
        if width == self.width && height == self.height {
            return false;
        }

        engine_info!("galaxy3d::OffscreenPool",
            "Resize {}x{} -> {}x{} ({} samples, {:?})",
            self.width, self.height, width, height, samples, precision);

        self.width = width;
        self.height = height;
        self.samples = samples;
        self.precision = precision;
        self.clear(ctx);
        true
    }

    /// `update` from the canvas size, sample count and HDR mode
    pub fn update_from_canvas(&mut self, ctx: &mut TargetManager, canvas: &dyn Canvas) -> bool {
        self.update(ctx, canvas.width(), canvas.height(), canvas.samples(), canvas.hdr())
    }

    /// Create the surface of `slot` if it does not exist yet
    ///
    /// Multisampled slots retry with fewer samples until creation succeeds
    /// (0 included). On success the pool's sample baseline becomes the count
    /// that worked. The target bound before the call is bound again.
    ///
    /// # Errors
    ///
    /// The error of the last attempt if no sample count worked.
    pub fn ensure(&mut self, ctx: &mut TargetManager, slot: OffscreenSlot) -> Result<()> {
        if self.slots[slot.index()].is_some() {
            return Ok(());
        }

        let previous = ctx.bound_target();
        let result = self.create_slot(ctx, slot);
        if previous.is_some() {
            ctx.rebind(previous);
        }

        let surface = result?;
        self.slots[slot.index()] = Some(surface);
        Ok(())
    }

    fn create_slot(&mut self, ctx: &mut TargetManager, slot: OffscreenSlot) -> Result<OffscreenSurface> {
        let sample_eligible = slot.supports_samples();
        let multisample_mode = OffscreenMode::RENDERBUFFER_COLOR | OffscreenMode::RENDERBUFFER_DEPTH;
        // Start from what the device can actually do; a 0-sample outcome
        // must use texture storage so the slot stays sampleable
        let first = if sample_eligible {
            resolve_storage(self.samples, multisample_mode, &ctx.capabilities()).samples
        } else {
            0
        };
        let mut last_error = Error::InitializationFailed(format!("No attempt to create {:?}", slot));

        for samples in (0..=first).rev() {
            let mode = if samples > 0 {
                multisample_mode
            } else {
                OffscreenMode::empty()
            };
            let desc = OffscreenDesc {
                width: self.width,
                height: self.height,
                samples,
                precision: self.precision,
                mode,
            };

            match OffscreenSurface::create(ctx, &desc) {
                Ok(surface) => {
                    if sample_eligible {
                        self.samples = surface.samples();
                    }
                    engine_debug!("galaxy3d::OffscreenPool",
                        "Created {:?} ({}x{}, {} samples)", slot, self.width, self.height, surface.samples());
                    return Ok(surface);
                }
                Err(err) => {
                    engine_warn!("galaxy3d::OffscreenPool",
                        "Creating {:?} with {} samples failed: {}", slot, samples, err);
                    last_error = err;
                }
            }
        }
        Err(last_error)
    }

    /// Surface of `slot`, created on first access
    pub fn get(&mut self, ctx: &mut TargetManager, slot: OffscreenSlot) -> Result<&OffscreenSurface> {
        self.ensure(ctx, slot)?;
        self.slots[slot.index()].as_ref().ok_or_else(|| {
            Error::InvalidResource(format!("Off-screen {:?} missing after creation", slot))
        })
    }

    /// Surface of `slot` if it already exists
    pub fn surface(&self, slot: OffscreenSlot) -> Option<&OffscreenSurface> {
        self.slots[slot.index()].as_ref()
    }

    /// Destroy every slot
    pub fn clear(&mut self, ctx: &mut TargetManager) {
        for slot in self.slots.iter_mut() {
            if let Some(surface) = slot.take() {
                surface.destroy(ctx);
            }
        }
    }

    /// Number of slots holding a surface
    pub fn populated_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Current sample baseline for eye slots
    pub fn samples(&self) -> u32 {
        self.samples
    }

    pub fn precision(&self) -> HdrPrecision {
        self.precision
    }
}

impl Default for OffscreenPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "offscreen_pool_tests.rs"]
mod tests;
