/// Mock GraphicsDevice for unit tests (no GPU required)
///
/// Keeps a software model of framebuffers, attachments and live storage
/// behind an `Arc<Mutex<..>>` so a test can keep a handle on the state after
/// the device itself has been boxed into a `TargetManager`.

use std::sync::{Arc, Mutex};
use rustc_hash::{FxHashMap, FxHashSet};
use crate::graphics_device::{
    GraphicsDevice, DeviceCapabilities, FramebufferHandle, RenderbufferHandle,
    TextureHandle, GpuErrorCode, FramebufferBinding, AttachmentPoint,
    FramebufferStatus, StorageDesc, BlitMask, PixelRect, PixelFormat,
    Capability, DepthFunc,
};

/// Error code returned for injected allocation failures (GL_OUT_OF_MEMORY)
pub const MOCK_OUT_OF_MEMORY: GpuErrorCode = GpuErrorCode(0x0505);

/// Error code returned when a sample count exceeds the mock limit (GL_INVALID_OPERATION)
pub const MOCK_INVALID_OPERATION: GpuErrorCode = GpuErrorCode(0x0502);

// ============================================================================
// Mock state
// ============================================================================

/// What a mock framebuffer has on one attachment point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockAttachment {
    Texture(u32),
    Renderbuffer(u32),
}

/// Attachment table of one mock framebuffer
#[derive(Debug, Clone, Default)]
pub struct MockFramebuffer {
    pub color: [Option<MockAttachment>; 4],
    pub depth: Option<MockAttachment>,
    pub draw_buffers: Vec<AttachmentPoint>,
    pub read_buffer: Option<AttachmentPoint>,
}

impl MockFramebuffer {
    fn attachments(&self) -> impl Iterator<Item = MockAttachment> + '_ {
        self.color.iter().flatten().chain(self.depth.iter()).copied()
    }
}

/// Shared, inspectable state of a `MockGraphicsDevice`
#[derive(Debug)]
pub struct MockDeviceState {
    pub capabilities: DeviceCapabilities,
    /// Every call in issue order, formatted as `name(args)`
    pub commands: Vec<String>,

    pub framebuffers: FxHashMap<u32, MockFramebuffer>,
    pub renderbuffers: FxHashMap<u32, StorageDesc>,
    pub textures: FxHashMap<u32, StorageDesc>,

    pub bound_read: Option<u32>,
    pub bound_draw: Option<u32>,
    pub texture_units: FxHashMap<u32, u32>,

    pub viewport: PixelRect,
    pub scissor: PixelRect,
    pub enabled: FxHashSet<Capability>,
    pub depth_func: DepthFunc,
    /// Saved (enabled, viewport) pairs of `push_state`
    pub state_stack: Vec<(FxHashSet<Capability>, PixelRect)>,

    /// Index (0-based, over framebuffer/renderbuffer/texture creation) of
    /// the allocation that fails
    pub fail_allocation_at: Option<usize>,
    pub allocation_count: usize,
    /// Storage above this sample count is rejected
    pub max_supported_samples: u32,
    /// Overrides the computed completeness status
    pub forced_status: Option<FramebufferStatus>,
    /// Byte written by `read_pixels`
    pub fill_byte: u8,

    next_name: u32,
}

impl MockDeviceState {
    fn new(capabilities: DeviceCapabilities) -> Self {
        let mut enabled = FxHashSet::default();
        enabled.insert(Capability::ScissorTest);
        enabled.insert(Capability::DepthTest);
        enabled.insert(Capability::CullFace);
        Self {
            capabilities,
            commands: Vec::new(),
            framebuffers: FxHashMap::default(),
            renderbuffers: FxHashMap::default(),
            textures: FxHashMap::default(),
            bound_read: None,
            bound_draw: None,
            texture_units: FxHashMap::default(),
            viewport: PixelRect::default(),
            scissor: PixelRect::default(),
            enabled,
            depth_func: DepthFunc::LessEqual,
            state_stack: Vec::new(),
            fail_allocation_at: None,
            allocation_count: 0,
            max_supported_samples: capabilities.max_samples,
            forced_status: None,
            fill_byte: 0x7F,
            next_name: 1,
        }
    }

    /// Framebuffers + renderbuffers + textures still alive
    pub fn live_object_count(&self) -> usize {
        self.framebuffers.len() + self.renderbuffers.len() + self.textures.len()
    }

    /// Number of recorded commands starting with `prefix`
    pub fn count_commands(&self, prefix: &str) -> usize {
        self.commands.iter().filter(|c| c.starts_with(prefix)).count()
    }

    fn allocate(&mut self) -> Option<u32> {
        let index = self.allocation_count;
        self.allocation_count += 1;
        if self.fail_allocation_at == Some(index) {
            return None;
        }
        let name = self.next_name;
        self.next_name += 1;
        Some(name)
    }

    fn bound(&self, binding: FramebufferBinding) -> Option<u32> {
        match binding {
            FramebufferBinding::Read => self.bound_read,
            FramebufferBinding::Draw | FramebufferBinding::Both => self.bound_draw,
        }
    }

    fn attachment_samples(&self, attachment: MockAttachment) -> Option<u32> {
        match attachment {
            MockAttachment::Texture(t) => self.textures.get(&t).map(|d| d.samples),
            MockAttachment::Renderbuffer(r) => self.renderbuffers.get(&r).map(|d| d.samples),
        }
    }

    fn set_attachment(&mut self, binding: FramebufferBinding, point: AttachmentPoint, value: Option<MockAttachment>) {
        let Some(fb) = self.bound(binding) else { return };
        let Some(framebuffer) = self.framebuffers.get_mut(&fb) else { return };
        match point {
            AttachmentPoint::Color(i) => {
                if let Some(entry) = framebuffer.color.get_mut(i as usize) {
                    *entry = value;
                }
            }
            AttachmentPoint::Depth => framebuffer.depth = value,
        }
    }

    fn create_storage(&mut self, desc: &StorageDesc) -> std::result::Result<u32, GpuErrorCode> {
        if desc.samples > self.max_supported_samples {
            return Err(MOCK_INVALID_OPERATION);
        }
        self.allocate().ok_or(MOCK_OUT_OF_MEMORY)
    }
}

// ============================================================================
// Mock device
// ============================================================================

pub struct MockGraphicsDevice {
    pub state: Arc<Mutex<MockDeviceState>>,
}

impl MockGraphicsDevice {
    /// Device supporting every optional feature up to 16 samples
    pub fn new() -> Self {
        Self::with_capabilities(DeviceCapabilities::default())
    }

    pub fn with_capabilities(capabilities: DeviceCapabilities) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockDeviceState::new(capabilities))),
        }
    }

    fn record(&self, command: String) -> std::sync::MutexGuard<'_, MockDeviceState> {
        let mut state = self.state.lock().unwrap();
        state.commands.push(command);
        state
    }
}

impl Default for MockGraphicsDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    fn capabilities(&self) -> DeviceCapabilities {
        self.state.lock().unwrap().capabilities
    }

    fn create_framebuffer(&mut self) -> Option<FramebufferHandle> {
        let mut state = self.record("create_framebuffer".to_string());
        let name = state.allocate()?;
        state.framebuffers.insert(name, MockFramebuffer::default());
        Some(FramebufferHandle(name))
    }

    fn delete_framebuffer(&mut self, framebuffer: FramebufferHandle) {
        let mut state = self.record(format!("delete_framebuffer({})", framebuffer.0));
        state.framebuffers.remove(&framebuffer.0);
        if state.bound_read == Some(framebuffer.0) {
            state.bound_read = None;
        }
        if state.bound_draw == Some(framebuffer.0) {
            state.bound_draw = None;
        }
    }

    fn bind_framebuffer(&mut self, binding: FramebufferBinding, framebuffer: Option<FramebufferHandle>) {
        let name = framebuffer.map(|f| f.0);
        let mut state = self.record(format!("bind_framebuffer({:?}, {:?})", binding, name));
        match binding {
            FramebufferBinding::Both => {
                state.bound_read = name;
                state.bound_draw = name;
            }
            FramebufferBinding::Read => state.bound_read = name,
            FramebufferBinding::Draw => state.bound_draw = name,
        }
    }

    fn set_draw_buffers(&mut self, attachments: &[AttachmentPoint]) {
        let mut state = self.record(format!("set_draw_buffers({:?})", attachments));
        if let Some(fb) = state.bound_draw {
            if let Some(framebuffer) = state.framebuffers.get_mut(&fb) {
                framebuffer.draw_buffers = attachments.to_vec();
            }
        }
    }

    fn set_read_buffer(&mut self, attachment: Option<AttachmentPoint>) {
        let mut state = self.record(format!("set_read_buffer({:?})", attachment));
        if let Some(fb) = state.bound_read {
            if let Some(framebuffer) = state.framebuffers.get_mut(&fb) {
                framebuffer.read_buffer = attachment;
            }
        }
    }

    fn attach_texture(
        &mut self,
        binding: FramebufferBinding,
        point: AttachmentPoint,
        texture: Option<TextureHandle>,
        multisample: bool,
    ) {
        let name = texture.map(|t| t.0);
        let mut state = self.record(format!("attach_texture({:?}, {:?}, {:?}, {})", binding, point, name, multisample));
        state.set_attachment(binding, point, name.map(MockAttachment::Texture));
    }

    fn attach_renderbuffer(
        &mut self,
        binding: FramebufferBinding,
        point: AttachmentPoint,
        renderbuffer: Option<RenderbufferHandle>,
    ) {
        let name = renderbuffer.map(|r| r.0);
        let mut state = self.record(format!("attach_renderbuffer({:?}, {:?}, {:?})", binding, point, name));
        state.set_attachment(binding, point, name.map(MockAttachment::Renderbuffer));
    }

    fn framebuffer_status(&mut self, binding: FramebufferBinding) -> FramebufferStatus {
        let state = self.record(format!("framebuffer_status({:?})", binding));
        let Some(fb) = state.bound(binding) else {
            return FramebufferStatus::Complete;
        };
        if let Some(forced) = state.forced_status {
            return forced;
        }
        let Some(framebuffer) = state.framebuffers.get(&fb) else {
            return FramebufferStatus::Undefined;
        };

        let samples: Vec<Option<u32>> = framebuffer
            .attachments()
            .map(|a| state.attachment_samples(a))
            .collect();
        if samples.is_empty() {
            return FramebufferStatus::IncompleteMissingAttachment;
        }
        if samples.iter().any(|s| s.is_none()) {
            return FramebufferStatus::IncompleteAttachment;
        }
        if samples.windows(2).any(|w| w[0] != w[1]) {
            return FramebufferStatus::IncompleteMultisample;
        }
        FramebufferStatus::Complete
    }

    fn create_renderbuffer(&mut self, desc: &StorageDesc) -> std::result::Result<RenderbufferHandle, GpuErrorCode> {
        let mut state = self.record(format!("create_renderbuffer({}x{}, {} samples, {:?})", desc.width, desc.height, desc.samples, desc.format));
        let name = state.create_storage(desc)?;
        state.renderbuffers.insert(name, *desc);
        Ok(RenderbufferHandle(name))
    }

    fn delete_renderbuffer(&mut self, renderbuffer: RenderbufferHandle) {
        let mut state = self.record(format!("delete_renderbuffer({})", renderbuffer.0));
        state.renderbuffers.remove(&renderbuffer.0);
    }

    fn create_texture(&mut self, desc: &StorageDesc) -> std::result::Result<TextureHandle, GpuErrorCode> {
        let mut state = self.record(format!("create_texture({}x{}, {} samples, {:?})", desc.width, desc.height, desc.samples, desc.format));
        let name = state.create_storage(desc)?;
        state.textures.insert(name, *desc);
        Ok(TextureHandle(name))
    }

    fn delete_texture(&mut self, texture: TextureHandle) {
        let mut state = self.record(format!("delete_texture({})", texture.0));
        state.textures.remove(&texture.0);
        state.texture_units.retain(|_, t| *t != texture.0);
    }

    fn bind_texture(&mut self, unit: u32, texture: Option<TextureHandle>, multisample: bool) {
        let name = texture.map(|t| t.0);
        let mut state = self.record(format!("bind_texture({}, {:?}, {})", unit, name, multisample));
        match name {
            Some(t) => {
                state.texture_units.insert(unit, t);
            }
            None => {
                state.texture_units.remove(&unit);
            }
        }
    }

    fn blit_framebuffer(&mut self, source: PixelRect, destination: PixelRect, mask: BlitMask) {
        let _state = self.record(format!(
            "blit_framebuffer({}x{} -> {}x{}, {:?})",
            source.width, source.height, destination.width, destination.height, mask
        ));
    }

    fn read_pixels(&mut self, area: PixelRect, format: PixelFormat, pixels: &mut [u8]) {
        let state = self.record(format!("read_pixels({}x{}, {:?})", area.width, area.height, format));
        let len = (area.width.max(0) as usize * area.height.max(0) as usize * format.bytes_per_pixel()).min(pixels.len());
        pixels[..len].fill(state.fill_byte);
    }

    fn set_viewport(&mut self, rect: PixelRect) {
        let mut state = self.record(format!("set_viewport({}, {}, {}, {})", rect.x, rect.y, rect.width, rect.height));
        state.viewport = rect;
    }

    fn set_scissor(&mut self, rect: PixelRect) {
        let mut state = self.record(format!("set_scissor({}, {}, {}, {})", rect.x, rect.y, rect.width, rect.height));
        state.scissor = rect;
    }

    fn enable(&mut self, capability: Capability) {
        let mut state = self.record(format!("enable({:?})", capability));
        state.enabled.insert(capability);
    }

    fn disable(&mut self, capability: Capability) {
        let mut state = self.record(format!("disable({:?})", capability));
        state.enabled.remove(&capability);
    }

    fn set_depth_func(&mut self, func: DepthFunc) {
        let mut state = self.record(format!("set_depth_func({:?})", func));
        state.depth_func = func;
    }

    fn push_state(&mut self) {
        let mut state = self.record("push_state".to_string());
        let saved = (state.enabled.clone(), state.viewport);
        state.state_stack.push(saved);
    }

    fn pop_state(&mut self) {
        let mut state = self.record("pop_state".to_string());
        if let Some((enabled, viewport)) = state.state_stack.pop() {
            state.enabled = enabled;
            state.viewport = viewport;
        }
    }

    fn draw_fullscreen_quad(&mut self) {
        let _state = self.record("draw_fullscreen_quad".to_string());
    }
}

#[cfg(test)]
#[path = "mock_graphics_device_tests.rs"]
mod tests;
