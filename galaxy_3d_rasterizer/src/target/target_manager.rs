/// Central render target manager for the rasterizer.
///
/// Owns the graphics device, the render-target and attachable arenas, and
/// the bound-target tracker. Every framebuffer binding goes through here so
/// the tracker always matches what the GPU has bound.

use slotmap::SlotMap;
use crate::error::{Error, Result};
use crate::{engine_debug, engine_error, engine_trace, engine_warn};
use crate::graphics_device::{
    GraphicsDevice, DeviceCapabilities, FramebufferBinding, FramebufferHandle,
    AttachmentPoint, StorageDesc, StorageFormat, HdrPrecision, GpuErrorCode,
    PixelRect, PixelFormat, BlitMask, Capability,
};
use super::render_target::{RenderTarget, RenderTargetKey, MAX_COLOR_SLOTS};
use super::attachable::{Attachable, AttachableKey, AttachableStorage, AttachmentRef};
use super::bound_target::BoundTarget;

/// Render target and attachable registry (one per GPU context)
pub struct TargetManager {
    device: Box<dyn GraphicsDevice>,
    render_targets: SlotMap<RenderTargetKey, RenderTarget>,
    attachables: SlotMap<AttachableKey, Attachable>,
    bound: BoundTarget,
    debug: bool,
}

impl TargetManager {
    /// Create an empty manager driving `device`
    pub fn new(device: Box<dyn GraphicsDevice>) -> Self {
        Self {
            device,
            render_targets: SlotMap::with_key(),
            attachables: SlotMap::with_key(),
            bound: BoundTarget::default(),
            debug: cfg!(debug_assertions),
        }
    }

    /// Enable feedback-loop warnings on attach
    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Optional features of the underlying device
    pub fn capabilities(&self) -> DeviceCapabilities {
        self.device.capabilities()
    }

    /// Direct device access for state that is not framebuffer binding
    /// (viewport, scissor, enable bits, draws). Framebuffer binds must use
    /// the manager's methods.
    pub fn device_mut(&mut self) -> &mut dyn GraphicsDevice {
        self.device.as_mut()
    }

    // ===== RENDER TARGETS =====

    /// Create an empty render target
    ///
    /// The framebuffer starts with no draw or read buffer so completeness is
    /// not checked against attachments that do not exist yet.
    ///
    /// # Errors
    ///
    /// Returns `Error::AllocationFailed` if the device returned no object.
    pub fn create_render_target(&mut self) -> Result<RenderTargetKey> {
        let Some(handle) = self.device.create_framebuffer() else {
            let message = "Framebuffer creation failed".to_string();
            engine_error!("galaxy3d::TargetManager", "{}", message);
            return Err(Error::AllocationFailed(message));
        };

        self.device.bind_framebuffer(FramebufferBinding::Both, Some(handle));
        self.device.set_read_buffer(None);
        self.device.set_draw_buffers(&[]);
        let key = self.render_targets.insert(RenderTarget::new(handle));
        self.rebind_tracked();

        engine_debug!("galaxy3d::TargetManager", "Created framebuffer {}", handle.0);
        Ok(key)
    }

    /// Detach everything (depth first, then colors) and delete the framebuffer
    ///
    /// Rebinds the default target if `target` was the bound one. Attached
    /// resources are not destroyed.
    pub fn destroy_render_target(&mut self, target: RenderTargetKey) -> Result<()> {
        let (depth, colors) = {
            let rt = self.target_ref(target)?;
            (rt.depth, rt.color)
        };

        if let Some(depth) = depth {
            self.detach(depth)?;
        }
        for color in colors.into_iter().flatten() {
            self.detach(color)?;
        }

        if let Some(rt) = self.render_targets.remove(target) {
            self.device.delete_framebuffer(rt.handle());
            if self.bound.current() == Some(target) {
                self.device.bind_framebuffer(FramebufferBinding::Both, None);
            }
            self.bound.forget(target);
            engine_debug!("galaxy3d::TargetManager", "Deleted framebuffer {}", rt.handle().0);
        }
        Ok(())
    }

    pub fn render_target(&self, target: RenderTargetKey) -> Option<&RenderTarget> {
        self.render_targets.get(target)
    }

    pub fn render_target_count(&self) -> usize {
        self.render_targets.len()
    }

    // ===== ATTACHABLES =====

    /// Allocate renderbuffer storage (RGBA8/RGBA16F/RGBA32F color, or depth)
    ///
    /// # Errors
    ///
    /// Returns `Error::AllocationFailed` carrying the GPU error code.
    pub fn create_renderbuffer(
        &mut self,
        width: u32,
        height: u32,
        samples: u32,
        precision: HdrPrecision,
        is_depth: bool,
    ) -> Result<AttachableKey> {
        let desc = storage_desc(width, height, samples, precision, is_depth, false);
        match self.device.create_renderbuffer(&desc) {
            Ok(handle) => {
                engine_debug!("galaxy3d::TargetManager",
                    "Created renderbuffer {} ({}x{}, {} samples, {:?})",
                    handle.0, width, height, samples, desc.format);
                let attachable = Attachable::new(AttachableStorage::Renderbuffer(handle), width, height, samples, desc.format);
                Ok(self.attachables.insert(attachable))
            }
            Err(code) => Err(allocation_failed("Render buffer", code)),
        }
    }

    /// Allocate texture storage (multisample texture when `samples > 0`)
    ///
    /// `depth_compare` configures a depth texture for comparison sampling.
    pub fn create_texture(
        &mut self,
        width: u32,
        height: u32,
        samples: u32,
        precision: HdrPrecision,
        is_depth: bool,
        depth_compare: bool,
    ) -> Result<AttachableKey> {
        let desc = storage_desc(width, height, samples, precision, is_depth, depth_compare);
        match self.device.create_texture(&desc) {
            Ok(handle) => {
                engine_debug!("galaxy3d::TargetManager",
                    "Created texture {} ({}x{}, {} samples, {:?})",
                    handle.0, width, height, samples, desc.format);
                let attachable = Attachable::new(AttachableStorage::Texture(handle), width, height, samples, desc.format);
                Ok(self.attachables.insert(attachable))
            }
            Err(code) => Err(allocation_failed("Texture", code)),
        }
    }

    /// Release the storage of an attachable
    ///
    /// A resource that is still attached is detached first (with a warning),
    /// and unbound from its texture unit.
    pub fn destroy_attachable(&mut self, attachable: AttachableKey) -> Result<()> {
        let (attached, bound_unit) = {
            let resource = self.attachable_ref(attachable)?;
            (resource.attachment.is_some(), resource.bound_unit)
        };

        if attached {
            engine_warn!("galaxy3d::TargetManager",
                "Destroying a resource still attached to a render target, detaching it first");
            self.detach(attachable)?;
        }
        if bound_unit.is_some() {
            self.unbind_texture(attachable)?;
        }

        if let Some(resource) = self.attachables.remove(attachable) {
            match resource.storage() {
                AttachableStorage::Texture(texture) => self.device.delete_texture(texture),
                AttachableStorage::Renderbuffer(rb) => self.device.delete_renderbuffer(rb),
            }
        }
        Ok(())
    }

    pub fn attachable(&self, attachable: AttachableKey) -> Option<&Attachable> {
        self.attachables.get(attachable)
    }

    pub fn attachable_count(&self) -> usize {
        self.attachables.len()
    }

    // ===== ATTACH / DETACH =====

    /// Attach `attachable` to `target`
    ///
    /// Depth resources go to the depth point, color resources to color
    /// point `slot`. The resource leaves any previous render target, and
    /// whatever occupied the point is detached. `target` becomes the bound
    /// target.
    ///
    /// # Errors
    ///
    /// `Error::UnsupportedSlot` if `slot >= MAX_COLOR_SLOTS` (nothing changes).
    pub fn attach(&mut self, target: RenderTargetKey, attachable: AttachableKey, slot: usize) -> Result<()> {
        if slot >= MAX_COLOR_SLOTS {
            engine_error!("galaxy3d::TargetManager",
                "Attaching to index {} framebuffer slot unsupported. Use at most {}",
                slot, MAX_COLOR_SLOTS);
            return Err(Error::UnsupportedSlot { slot, max: MAX_COLOR_SLOTS });
        }

        let handle = self.target_ref(target)?.handle();
        let (point, storage, multisample, attached, bound_unit) = {
            let resource = self.attachable_ref(attachable)?;
            (
                resource.attachment_point(slot),
                resource.storage(),
                resource.is_multisample(),
                resource.attachment.is_some(),
                resource.bound_unit,
            )
        };

        if self.debug {
            if let Some(unit) = bound_unit {
                engine_warn!("galaxy3d::TargetManager",
                    "Feedback loop warning: attaching a texture to a framebuffer while still bound to texture unit {}",
                    unit);
            }
        }

        if attached {
            self.detach(attachable)?;
        }

        let occupant = {
            let rt = self.target_ref(target)?;
            match point {
                AttachmentPoint::Depth => rt.depth,
                AttachmentPoint::Color(i) => rt.attachment_at(i as usize),
            }
        };
        if let Some(occupant) = occupant {
            self.detach(occupant)?;
        }

        self.bind_framebuffer(target, handle);
        match storage {
            AttachableStorage::Texture(texture) => {
                self.device.attach_texture(FramebufferBinding::Both, point, Some(texture), multisample)
            }
            AttachableStorage::Renderbuffer(rb) => {
                self.device.attach_renderbuffer(FramebufferBinding::Both, point, Some(rb))
            }
        }

        if let Some(rt) = self.render_targets.get_mut(target) {
            match point {
                AttachmentPoint::Depth => rt.depth = Some(attachable),
                AttachmentPoint::Color(i) => rt.color[i as usize] = Some(attachable),
            }
        }
        if let Some(resource) = self.attachables.get_mut(attachable) {
            resource.attachment = Some(AttachmentRef { target, slot });
        }
        Ok(())
    }

    /// Detach `attachable` from its render target (no-op if unattached)
    ///
    /// The owning target is bound first unless it already is.
    pub fn detach(&mut self, attachable: AttachableKey) -> Result<()> {
        let (attachment, storage, multisample, point) = {
            let resource = self.attachable_ref(attachable)?;
            let Some(attachment) = resource.attachment else {
                return Ok(());
            };
            (attachment, resource.storage(), resource.is_multisample(), resource.attachment_point(attachment.slot))
        };

        let handle = self.target_ref(attachment.target)?.handle();
        if self.bound.current() != Some(attachment.target) {
            self.bind_framebuffer(attachment.target, handle);
        }

        if let Some(rt) = self.render_targets.get_mut(attachment.target) {
            match point {
                AttachmentPoint::Depth => {
                    debug_assert_eq!(rt.depth, Some(attachable));
                    rt.depth = None;
                }
                AttachmentPoint::Color(i) => {
                    debug_assert_eq!(rt.color[i as usize], Some(attachable));
                    rt.color[i as usize] = None;
                }
            }
        }

        match storage {
            AttachableStorage::Texture(_) => {
                self.device.attach_texture(FramebufferBinding::Both, point, None, multisample)
            }
            AttachableStorage::Renderbuffer(_) => {
                self.device.attach_renderbuffer(FramebufferBinding::Both, point, None)
            }
        }

        if let Some(resource) = self.attachables.get_mut(attachable) {
            resource.attachment = None;
        }
        Ok(())
    }

    /// Validate completeness of `target`
    ///
    /// # Errors
    ///
    /// `Error::IncompleteFramebuffer("Framebuffer status <NAME>")`; the
    /// default target is bound again in that case.
    pub fn check_complete(&mut self, target: RenderTargetKey) -> Result<()> {
        let handle = self.target_ref(target)?.handle();
        self.bind_framebuffer(target, handle);

        let status = self.device.framebuffer_status(FramebufferBinding::Both);
        if !status.is_complete() {
            self.restore_default();
            let message = format!("Framebuffer status {}", status.name());
            engine_error!("galaxy3d::TargetManager", "{}", message);
            return Err(Error::IncompleteFramebuffer(message));
        }
        Ok(())
    }

    // ===== BINDING =====

    /// Render into the target `attachable` is attached to, saving state
    ///
    /// Pushes enable bits, viewport and transforms, disables scissor,
    /// selects the resource's attachment as draw/read buffer (none for
    /// depth) and sets the viewport to its size. Undo with `unbind_saved`.
    pub fn bind_attachable_as_target(&mut self, attachable: AttachableKey) -> Result<()> {
        let (attachment, point, is_depth, ms_texture, width, height) = {
            let resource = self.attachable_ref(attachable)?;
            let Some(attachment) = resource.attachment else {
                let message = "Resource not attached to a render target".to_string();
                engine_error!("galaxy3d::TargetManager", "{}", message);
                return Err(Error::InvalidResource(message));
            };
            (
                attachment,
                resource.attachment_point(attachment.slot),
                resource.is_depth(),
                resource.is_texture() && resource.is_multisample(),
                resource.width(),
                resource.height(),
            )
        };
        let handle = self.target_ref(attachment.target)?.handle();

        self.bound.push_saved();
        self.device.push_state();
        self.device.disable(Capability::ScissorTest);
        self.bind_framebuffer(attachment.target, handle);

        if is_depth {
            self.device.set_draw_buffers(&[]);
            self.select_read_buffer(attachment.target, None);
        } else {
            self.device.set_draw_buffers(&[point]);
            self.select_read_buffer(attachment.target, Some(point));
        }
        if ms_texture {
            self.device.enable(Capability::Multisample);
        }
        self.device.set_viewport(PixelRect::from_size(width, height));
        Ok(())
    }

    /// Render into every populated color slot of `target` (multiple render
    /// targets), reading from `slot`, saving state like
    /// `bind_attachable_as_target`
    ///
    /// # Errors
    ///
    /// `Error::InvalidResource` if `slot` is empty (nothing is bound).
    pub fn bind_all_color_slots(&mut self, target: RenderTargetKey, slot: usize) -> Result<()> {
        let (handle, primary, points) = {
            let rt = self.target_ref(target)?;
            let Some(primary) = rt.attachment_at(slot) else {
                let message = format!("Framebuffer slot {} empty", slot);
                engine_error!("galaxy3d::TargetManager", "{}", message);
                return Err(Error::InvalidResource(message));
            };
            let points: Vec<AttachmentPoint> = rt
                .populated_color_slots()
                .map(|i| AttachmentPoint::Color(i as u32))
                .collect();
            (rt.handle(), primary, points)
        };
        let (width, height) = self.attachable_size(primary)?;

        self.bound.push_saved();
        self.device.push_state();
        self.device.disable(Capability::ScissorTest);
        self.bind_framebuffer(target, handle);
        self.device.set_draw_buffers(&points);
        self.select_read_buffer(target, Some(AttachmentPoint::Color(slot as u32)));
        self.device.set_viewport(PixelRect::from_size(width, height));
        Ok(())
    }

    /// Undo the latest saving bind: pop GPU state, then rebind the target
    /// that was bound before it (default target if none)
    pub fn unbind_saved(&mut self) {
        self.device.pop_state();
        match self.bound.pop_saved() {
            Some(previous) => self.rebind(previous),
            None => {
                debug_assert!(false, "unbind_saved without a saving bind");
                self.restore_default();
            }
        }
    }

    /// Bind `target` drawing to and reading from color `slot`, viewport set
    /// to that attachment's size; nothing is saved
    pub fn bind_slot(&mut self, target: RenderTargetKey, slot: usize) -> Result<()> {
        let (handle, attachment) = {
            let rt = self.target_ref(target)?;
            (rt.handle(), rt.attachment_at(slot))
        };
        let Some(attachment) = attachment else {
            let message = format!("Framebuffer slot {} empty", slot);
            engine_error!("galaxy3d::TargetManager", "{}", message);
            return Err(Error::InvalidResource(message));
        };
        let (width, height) = self.attachable_size(attachment)?;

        let point = AttachmentPoint::Color(slot as u32);
        self.bind_framebuffer(target, handle);
        self.device.set_draw_buffers(&[point]);
        self.select_read_buffer(target, Some(point));
        self.device.set_viewport(PixelRect::from_size(width, height));
        Ok(())
    }

    /// Bind `target` with color 0 as draw/read buffer; viewport untouched
    pub fn bind_simple(&mut self, target: RenderTargetKey) -> Result<()> {
        let handle = self.target_ref(target)?.handle();
        let point = AttachmentPoint::Color(0);
        self.bind_framebuffer(target, handle);
        self.device.set_draw_buffers(&[point]);
        self.select_read_buffer(target, Some(point));
        Ok(())
    }

    /// Bind the window's default framebuffer (skipped if already bound)
    pub fn restore_default(&mut self) {
        if self.bound.current().is_some() {
            self.device.bind_framebuffer(FramebufferBinding::Both, None);
            self.bound.set(None);
            engine_trace!("galaxy3d::TargetManager", "Restored default framebuffer");
        }
    }

    /// Bind `target` again (framebuffer only), or the default target for
    /// None or a target that no longer exists
    pub fn rebind(&mut self, target: Option<RenderTargetKey>) {
        match target.and_then(|k| self.render_targets.get(k).map(|rt| (k, rt.handle()))) {
            Some((key, handle)) => self.bind_framebuffer(key, handle),
            None => self.restore_default(),
        }
    }

    /// Target currently bound (None = default framebuffer)
    pub fn bound_target(&self) -> Option<RenderTargetKey> {
        self.bound.current()
    }

    pub fn is_bound(&self, target: RenderTargetKey) -> bool {
        self.bound.current() == Some(target)
    }

    /// Pending saving binds
    pub fn saved_bind_depth(&self) -> usize {
        self.bound.saved_depth()
    }

    // ===== TRANSFER =====

    /// Copy `width` x `height` from color 0 of `source` into `destination`
    /// (None = default framebuffer), then bind the destination
    pub fn blit(
        &mut self,
        source: RenderTargetKey,
        destination: Option<RenderTargetKey>,
        width: u32,
        height: u32,
        mask: BlitMask,
    ) -> Result<()> {
        debug_assert!(!mask.is_empty(), "blit with an empty mask");
        let (source_handle, source_read) = {
            let rt = self.target_ref(source)?;
            (rt.handle(), rt.read_buffer())
        };
        let destination_handle = match destination {
            Some(d) => Some(self.target_ref(d)?.handle()),
            None => None,
        };

        self.device.bind_framebuffer(FramebufferBinding::Read, Some(source_handle));
        self.device.bind_framebuffer(FramebufferBinding::Draw, destination_handle);
        if destination_handle.is_some() {
            self.device.set_draw_buffers(&[AttachmentPoint::Color(0)]);
        }
        self.device.set_read_buffer(Some(AttachmentPoint::Color(0)));

        let area = PixelRect::from_size(width, height);
        self.device.blit_framebuffer(area, area, mask);
        self.restore_read_buffer(source_read);

        match destination {
            Some(d) => self.bind_simple(d)?,
            None => {
                self.device.bind_framebuffer(FramebufferBinding::Both, None);
                self.bound.set(None);
            }
        }
        Ok(())
    }

    /// Read `area` of color 0 of `target` into `pixels`
    ///
    /// Only the read binding is touched; it and the target's read buffer
    /// are put back afterwards.
    ///
    /// # Errors
    ///
    /// `Error::InvalidResource` if `pixels` is smaller than the area.
    pub fn read_pixels(
        &mut self,
        target: RenderTargetKey,
        area: PixelRect,
        format: PixelFormat,
        pixels: &mut [u8],
    ) -> Result<()> {
        let needed = area.width.max(0) as usize * area.height.max(0) as usize * format.bytes_per_pixel();
        if pixels.len() < needed {
            let message = format!("Pixel buffer too small: {} bytes, {} needed", pixels.len(), needed);
            engine_error!("galaxy3d::TargetManager", "{}", message);
            return Err(Error::InvalidResource(message));
        }

        let (handle, previous_read) = {
            let rt = self.target_ref(target)?;
            (rt.handle(), rt.read_buffer())
        };
        self.device.bind_framebuffer(FramebufferBinding::Read, Some(handle));
        self.device.set_read_buffer(Some(AttachmentPoint::Color(0)));
        self.device.read_pixels(area, format, pixels);
        self.restore_read_buffer(previous_read);

        let tracked = self.tracked_handle();
        self.device.bind_framebuffer(FramebufferBinding::Read, tracked);
        Ok(())
    }

    // ===== SAMPLING =====

    /// Bind a texture attachable to texture `unit` for sampling
    pub fn bind_texture(&mut self, attachable: AttachableKey, unit: u32) -> Result<()> {
        let (texture, multisample) = {
            let resource = self.attachable_ref(attachable)?;
            let Some(texture) = resource.texture() else {
                let message = "Renderbuffer storage cannot be sampled".to_string();
                engine_error!("galaxy3d::TargetManager", "{}", message);
                return Err(Error::InvalidResource(message));
            };
            (texture, resource.is_multisample())
        };

        self.device.bind_texture(unit, Some(texture), multisample);
        if let Some(resource) = self.attachables.get_mut(attachable) {
            resource.bound_unit = Some(unit);
        }
        Ok(())
    }

    /// Unbind a texture attachable from its texture unit (no-op if unbound)
    pub fn unbind_texture(&mut self, attachable: AttachableKey) -> Result<()> {
        let (unit, multisample) = {
            let resource = self.attachable_ref(attachable)?;
            (resource.bound_unit, resource.is_multisample())
        };

        if let Some(unit) = unit {
            self.device.bind_texture(unit, None, multisample);
            if let Some(resource) = self.attachables.get_mut(attachable) {
                resource.bound_unit = None;
            }
        }
        Ok(())
    }

    // ===== INTERNAL =====

    /// Select the read buffer of the bound `target` and remember it
    fn select_read_buffer(&mut self, target: RenderTargetKey, point: Option<AttachmentPoint>) {
        self.device.set_read_buffer(point);
        if let Some(rt) = self.render_targets.get_mut(target) {
            rt.read_buffer = point;
        }
    }

    /// Put back the read buffer of the framebuffer on the read binding after
    /// a transfer switched it to color 0
    fn restore_read_buffer(&mut self, previous: Option<AttachmentPoint>) {
        if previous != Some(AttachmentPoint::Color(0)) {
            self.device.set_read_buffer(previous);
        }
    }

    fn target_ref(&self, target: RenderTargetKey) -> Result<&RenderTarget> {
        self.render_targets.get(target).ok_or_else(|| {
            let message = format!("Unknown render target {:?}", target);
            engine_error!("galaxy3d::TargetManager", "{}", message);
            Error::InvalidResource(message)
        })
    }

    fn attachable_ref(&self, attachable: AttachableKey) -> Result<&Attachable> {
        self.attachables.get(attachable).ok_or_else(|| {
            let message = format!("Unknown attachable {:?}", attachable);
            engine_error!("galaxy3d::TargetManager", "{}", message);
            Error::InvalidResource(message)
        })
    }

    fn attachable_size(&self, attachable: AttachableKey) -> Result<(u32, u32)> {
        let resource = self.attachable_ref(attachable)?;
        Ok((resource.width(), resource.height()))
    }

    fn bind_framebuffer(&mut self, target: RenderTargetKey, handle: FramebufferHandle) {
        self.device.bind_framebuffer(FramebufferBinding::Both, Some(handle));
        self.bound.set(Some(target));
        engine_trace!("galaxy3d::TargetManager", "Bound framebuffer {}", handle.0);
    }

    fn tracked_handle(&self) -> Option<FramebufferHandle> {
        self.bound
            .current()
            .and_then(|k| self.render_targets.get(k))
            .map(|rt| rt.handle())
    }

    /// Put the GPU binding back to what the tracker says
    fn rebind_tracked(&mut self) {
        let handle = self.tracked_handle();
        self.device.bind_framebuffer(FramebufferBinding::Both, handle);
    }
}

impl Drop for TargetManager {
    fn drop(&mut self) {
        let targets: Vec<RenderTargetKey> = self.render_targets.keys().collect();
        for target in targets {
            let _ = self.destroy_render_target(target);
        }
        let attachables: Vec<AttachableKey> = self.attachables.keys().collect();
        for attachable in attachables {
            let _ = self.destroy_attachable(attachable);
        }
    }
}

fn storage_desc(
    width: u32,
    height: u32,
    samples: u32,
    precision: HdrPrecision,
    is_depth: bool,
    depth_compare: bool,
) -> StorageDesc {
    let format = if is_depth {
        StorageFormat::Depth { compare: depth_compare }
    } else {
        StorageFormat::Color(precision)
    };
    StorageDesc { width, height, samples, format }
}

fn allocation_failed(kind: &str, code: GpuErrorCode) -> Error {
    let message = format!("{} creation failed: {}", kind, code.0);
    engine_error!("galaxy3d::TargetManager", "{}", message);
    Error::AllocationFailed(message)
}

#[cfg(test)]
#[path = "target_manager_tests.rs"]
mod tests;
