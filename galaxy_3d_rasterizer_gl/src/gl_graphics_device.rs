/// GlGraphicsDevice - GraphicsDevice implementation over glow
///
/// Hands out its own u32 handles and keeps the native GL objects in maps,
/// so anything still alive when the device is dropped gets deleted.

use glow::HasContext;
use rustc_hash::FxHashMap;
use galaxy_3d_rasterizer::galaxy3d;
use galaxy_3d_rasterizer::galaxy3d::render::{
    GraphicsDevice, DeviceCapabilities, FramebufferHandle, RenderbufferHandle, TextureHandle,
    GpuErrorCode, FramebufferBinding, AttachmentPoint, FramebufferStatus, StorageDesc,
    StorageFormat, BlitMask, PixelRect, PixelFormat, Capability, DepthFunc,
};
use galaxy_3d_rasterizer::{engine_bail, engine_debug, engine_info, engine_warn};
use crate::debug::check_gl_error;
use crate::gl_format::{self, GlVersion};

type GlFramebuffer = <glow::Context as HasContext>::Framebuffer;
type GlRenderbuffer = <glow::Context as HasContext>::Renderbuffer;
type GlTexture = <glow::Context as HasContext>::Texture;
type GlVertexArray = <glow::Context as HasContext>::VertexArray;

/// Capabilities saved by push_state
const SAVED_CAPABILITIES: [Capability; 4] = [
    Capability::ScissorTest,
    Capability::DepthTest,
    Capability::CullFace,
    Capability::Multisample,
];

/// Driver errors drained before an allocation, to attribute the new one
const MAX_STALE_ERRORS: usize = 16;

/// State saved by `push_state`
#[derive(Debug, Clone, Copy)]
struct SavedState {
    viewport: [i32; 4],
    scissor: [i32; 4],
    enabled: [bool; SAVED_CAPABILITIES.len()],
}

pub struct GlGraphicsDevice {
    gl: glow::Context,
    capabilities: DeviceCapabilities,

    next_name: u32,
    framebuffers: FxHashMap<u32, GlFramebuffer>,
    renderbuffers: FxHashMap<u32, GlRenderbuffer>,
    textures: FxHashMap<u32, GlTexture>,

    state_stack: Vec<SavedState>,
    quad_vertex_array: Option<GlVertexArray>,
}

impl GlGraphicsDevice {
    /// Wrap a current GL context
    ///
    /// # Errors
    ///
    /// `Error::BackendError` if the context has no framebuffer objects at all.
    pub fn new(gl: glow::Context) -> galaxy3d::Result<Self> {
        let (version, max_samples) = unsafe {
            let version = gl.version();
            (
                GlVersion { major: version.major, minor: version.minor, embedded: version.is_embedded },
                gl.get_parameter_i32(glow::MAX_SAMPLES),
            )
        };
        let capabilities = {
            let extensions = gl.supported_extensions();
            gl_format::device_capabilities(version, |name| extensions.contains(name), max_samples)
        };

        if !version.at_least(3, 0) && !gl.supported_extensions().contains("GL_ARB_framebuffer_object") {
            engine_bail!("galaxy3d::GlDevice",
                "OpenGL {}.{} has no framebuffer objects", version.major, version.minor);
        }

        engine_info!("galaxy3d::GlDevice",
            "OpenGL {}{}.{} (multisample: {}, texture multisample: {}, max samples: {})",
            if version.embedded { "ES " } else { "" }, version.major, version.minor,
            capabilities.framebuffer_multisample, capabilities.texture_multisample, capabilities.max_samples);

        Ok(Self {
            gl,
            capabilities,
            next_name: 1,
            framebuffers: FxHashMap::default(),
            renderbuffers: FxHashMap::default(),
            textures: FxHashMap::default(),
            state_stack: Vec::new(),
            quad_vertex_array: None,
        })
    }

    /// The wrapped context
    pub fn gl(&self) -> &glow::Context {
        &self.gl
    }

    /// GL objects currently owned by this device
    pub fn live_object_count(&self) -> usize {
        self.framebuffers.len() + self.renderbuffers.len() + self.textures.len()
    }

    fn next_name(&mut self) -> u32 {
        let name = self.next_name;
        self.next_name += 1;
        name
    }

    /// Clear pending errors so the next get_error belongs to the next call
    fn drain_errors(&self) {
        for _ in 0..MAX_STALE_ERRORS {
            if unsafe { self.gl.get_error() } == glow::NO_ERROR {
                break;
            }
        }
    }

    fn allocation_error(&self) -> Option<GpuErrorCode> {
        match unsafe { self.gl.get_error() } {
            glow::NO_ERROR => None,
            code => Some(GpuErrorCode(code)),
        }
    }

    fn native_texture(&self, texture: Option<TextureHandle>) -> Option<GlTexture> {
        texture.and_then(|handle| self.textures.get(&handle.0).copied())
    }

    fn native_renderbuffer(&self, renderbuffer: Option<RenderbufferHandle>) -> Option<GlRenderbuffer> {
        renderbuffer.and_then(|handle| self.renderbuffers.get(&handle.0).copied())
    }
}

impl GraphicsDevice for GlGraphicsDevice {
    fn capabilities(&self) -> DeviceCapabilities {
        self.capabilities
    }

    fn create_framebuffer(&mut self) -> Option<FramebufferHandle> {
        let framebuffer = match unsafe { self.gl.create_framebuffer() } {
            Ok(framebuffer) => framebuffer,
            Err(err) => {
                engine_warn!("galaxy3d::GlDevice", "glGenFramebuffers failed: {}", err);
                return None;
            }
        };
        let name = self.next_name();
        self.framebuffers.insert(name, framebuffer);
        Some(FramebufferHandle(name))
    }

    fn delete_framebuffer(&mut self, framebuffer: FramebufferHandle) {
        if let Some(native) = self.framebuffers.remove(&framebuffer.0) {
            unsafe { self.gl.delete_framebuffer(native) };
        }
    }

    fn bind_framebuffer(&mut self, binding: FramebufferBinding, framebuffer: Option<FramebufferHandle>) {
        let native = framebuffer.and_then(|handle| self.framebuffers.get(&handle.0).copied());
        unsafe { self.gl.bind_framebuffer(gl_format::framebuffer_target(binding), native) };
        check_gl_error(&self.gl, "bind_framebuffer");
    }

    fn set_draw_buffers(&mut self, attachments: &[AttachmentPoint]) {
        let buffers: Vec<u32> = if attachments.is_empty() {
            vec![glow::NONE]
        } else {
            attachments.iter().map(|&point| gl_format::attachment(point)).collect()
        };
        unsafe { self.gl.draw_buffers(&buffers) };
        check_gl_error(&self.gl, "draw_buffers");
    }

    fn set_read_buffer(&mut self, attachment: Option<AttachmentPoint>) {
        let buffer = attachment.map_or(glow::NONE, gl_format::attachment);
        unsafe { self.gl.read_buffer(buffer) };
        check_gl_error(&self.gl, "read_buffer");
    }

    fn attach_texture(
        &mut self,
        binding: FramebufferBinding,
        point: AttachmentPoint,
        texture: Option<TextureHandle>,
        multisample: bool,
    ) {
        let native = self.native_texture(texture);
        unsafe {
            self.gl.framebuffer_texture_2d(
                gl_format::framebuffer_target(binding),
                gl_format::attachment(point),
                gl_format::texture_target(multisample),
                native,
                0,
            );
        }
        check_gl_error(&self.gl, "framebuffer_texture_2d");
    }

    fn attach_renderbuffer(
        &mut self,
        binding: FramebufferBinding,
        point: AttachmentPoint,
        renderbuffer: Option<RenderbufferHandle>,
    ) {
        let native = self.native_renderbuffer(renderbuffer);
        unsafe {
            self.gl.framebuffer_renderbuffer(
                gl_format::framebuffer_target(binding),
                gl_format::attachment(point),
                glow::RENDERBUFFER,
                native,
            );
        }
        check_gl_error(&self.gl, "framebuffer_renderbuffer");
    }

    fn framebuffer_status(&mut self, binding: FramebufferBinding) -> FramebufferStatus {
        let status = unsafe { self.gl.check_framebuffer_status(gl_format::framebuffer_target(binding)) };
        gl_format::framebuffer_status(status)
    }

    fn create_renderbuffer(&mut self, desc: &StorageDesc) -> Result<RenderbufferHandle, GpuErrorCode> {
        self.drain_errors();
        let renderbuffer = unsafe { self.gl.create_renderbuffer() }
            .map_err(|_| GpuErrorCode(glow::OUT_OF_MEMORY))?;

        let internal_format = gl_format::internal_format(desc.format);
        unsafe {
            self.gl.bind_renderbuffer(glow::RENDERBUFFER, Some(renderbuffer));
            if desc.is_multisample() {
                self.gl.renderbuffer_storage_multisample(
                    glow::RENDERBUFFER,
                    desc.samples as i32,
                    internal_format,
                    desc.width as i32,
                    desc.height as i32,
                );
            } else {
                self.gl.renderbuffer_storage(glow::RENDERBUFFER, internal_format, desc.width as i32, desc.height as i32);
            }
            self.gl.bind_renderbuffer(glow::RENDERBUFFER, None);
        }

        if let Some(code) = self.allocation_error() {
            unsafe { self.gl.delete_renderbuffer(renderbuffer) };
            return Err(code);
        }

        let name = self.next_name();
        self.renderbuffers.insert(name, renderbuffer);
        engine_debug!("galaxy3d::GlDevice", "Renderbuffer {} ({}x{}, {} samples, {:?})",
            name, desc.width, desc.height, desc.samples, desc.format);
        Ok(RenderbufferHandle(name))
    }

    fn delete_renderbuffer(&mut self, renderbuffer: RenderbufferHandle) {
        if let Some(native) = self.renderbuffers.remove(&renderbuffer.0) {
            unsafe { self.gl.delete_renderbuffer(native) };
        }
    }

    fn create_texture(&mut self, desc: &StorageDesc) -> Result<TextureHandle, GpuErrorCode> {
        self.drain_errors();
        let texture = unsafe { self.gl.create_texture() }
            .map_err(|_| GpuErrorCode(glow::OUT_OF_MEMORY))?;

        let target = gl_format::texture_target(desc.is_multisample());
        let internal_format = gl_format::internal_format(desc.format);
        unsafe {
            self.gl.bind_texture(target, Some(texture));
            if desc.is_multisample() {
                self.gl.tex_image_2d_multisample(
                    target,
                    desc.samples as i32,
                    internal_format as i32,
                    desc.width as i32,
                    desc.height as i32,
                    true,
                );
            } else {
                let (format, ty) = gl_format::upload_format(desc.format);
                self.gl.tex_image_2d(
                    target,
                    0,
                    internal_format as i32,
                    desc.width as i32,
                    desc.height as i32,
                    0,
                    format,
                    ty,
                    None,
                );
                self.gl.tex_parameter_i32(target, glow::TEXTURE_MIN_FILTER, glow::NEAREST as i32);
                self.gl.tex_parameter_i32(target, glow::TEXTURE_MAG_FILTER, glow::NEAREST as i32);
                self.gl.tex_parameter_i32(target, glow::TEXTURE_WRAP_S, glow::CLAMP_TO_EDGE as i32);
                self.gl.tex_parameter_i32(target, glow::TEXTURE_WRAP_T, glow::CLAMP_TO_EDGE as i32);
                if let StorageFormat::Depth { compare: true } = desc.format {
                    self.gl.tex_parameter_i32(target, glow::TEXTURE_COMPARE_MODE, glow::COMPARE_REF_TO_TEXTURE as i32);
                    self.gl.tex_parameter_i32(target, glow::TEXTURE_COMPARE_FUNC, glow::LEQUAL as i32);
                }
            }
            self.gl.bind_texture(target, None);
        }

        if let Some(code) = self.allocation_error() {
            unsafe { self.gl.delete_texture(texture) };
            return Err(code);
        }

        let name = self.next_name();
        self.textures.insert(name, texture);
        engine_debug!("galaxy3d::GlDevice", "Texture {} ({}x{}, {} samples, {:?})",
            name, desc.width, desc.height, desc.samples, desc.format);
        Ok(TextureHandle(name))
    }

    fn delete_texture(&mut self, texture: TextureHandle) {
        if let Some(native) = self.textures.remove(&texture.0) {
            unsafe { self.gl.delete_texture(native) };
        }
    }

    fn bind_texture(&mut self, unit: u32, texture: Option<TextureHandle>, multisample: bool) {
        let native = self.native_texture(texture);
        unsafe {
            self.gl.active_texture(glow::TEXTURE0 + unit);
            self.gl.bind_texture(gl_format::texture_target(multisample), native);
        }
        check_gl_error(&self.gl, "bind_texture");
    }

    fn blit_framebuffer(&mut self, source: PixelRect, destination: PixelRect, mask: BlitMask) {
        unsafe {
            self.gl.blit_framebuffer(
                source.x,
                source.y,
                source.x + source.width,
                source.y + source.height,
                destination.x,
                destination.y,
                destination.x + destination.width,
                destination.y + destination.height,
                gl_format::blit_mask(mask),
                glow::NEAREST,
            );
        }
        check_gl_error(&self.gl, "blit_framebuffer");
    }

    fn read_pixels(&mut self, area: PixelRect, format: PixelFormat, pixels: &mut [u8]) {
        let (format, ty) = gl_format::pixel_format(format);
        unsafe {
            self.gl.pixel_store_i32(glow::PACK_ALIGNMENT, 1);
            self.gl.read_pixels(
                area.x,
                area.y,
                area.width,
                area.height,
                format,
                ty,
                glow::PixelPackData::Slice(pixels),
            );
        }
        check_gl_error(&self.gl, "read_pixels");
    }

    fn set_viewport(&mut self, rect: PixelRect) {
        unsafe { self.gl.viewport(rect.x, rect.y, rect.width, rect.height) };
    }

    fn set_scissor(&mut self, rect: PixelRect) {
        unsafe { self.gl.scissor(rect.x, rect.y, rect.width, rect.height) };
    }

    fn enable(&mut self, capability: Capability) {
        unsafe { self.gl.enable(gl_format::capability(capability)) };
    }

    fn disable(&mut self, capability: Capability) {
        unsafe { self.gl.disable(gl_format::capability(capability)) };
    }

    fn set_depth_func(&mut self, func: DepthFunc) {
        unsafe { self.gl.depth_func(gl_format::depth_func(func)) };
    }

    /// Core profiles have no attribute stack; viewport, scissor box and
    /// enable bits are saved in software. Transforms belong to the shader library.
    fn push_state(&mut self) {
        let mut viewport = [0; 4];
        let mut scissor = [0; 4];
        let mut enabled = [false; SAVED_CAPABILITIES.len()];
        unsafe {
            self.gl.get_parameter_i32_slice(glow::VIEWPORT, &mut viewport);
            self.gl.get_parameter_i32_slice(glow::SCISSOR_BOX, &mut scissor);
            for (flag, &capability) in enabled.iter_mut().zip(SAVED_CAPABILITIES.iter()) {
                *flag = self.gl.is_enabled(gl_format::capability(capability));
            }
        }
        self.state_stack.push(SavedState { viewport, scissor, enabled });
    }

    fn pop_state(&mut self) {
        let Some(state) = self.state_stack.pop() else {
            engine_warn!("galaxy3d::GlDevice", "pop_state without matching push_state");
            return;
        };
        let [x, y, width, height] = state.viewport;
        let [sx, sy, swidth, sheight] = state.scissor;
        unsafe {
            self.gl.viewport(x, y, width, height);
            self.gl.scissor(sx, sy, swidth, sheight);
            for (&enabled, &capability) in state.enabled.iter().zip(SAVED_CAPABILITIES.iter()) {
                if enabled {
                    self.gl.enable(gl_format::capability(capability));
                } else {
                    self.gl.disable(gl_format::capability(capability));
                }
            }
        }
    }

    /// 4-vertex triangle strip from an empty vertex array; the bound
    /// program derives positions from gl_VertexID
    fn draw_fullscreen_quad(&mut self) {
        let vertex_array = match self.quad_vertex_array {
            Some(vertex_array) => vertex_array,
            None => match unsafe { self.gl.create_vertex_array() } {
                Ok(vertex_array) => {
                    self.quad_vertex_array = Some(vertex_array);
                    vertex_array
                }
                Err(err) => {
                    engine_warn!("galaxy3d::GlDevice", "Cannot create quad vertex array: {}", err);
                    return;
                }
            },
        };
        unsafe {
            self.gl.bind_vertex_array(Some(vertex_array));
            self.gl.draw_arrays(glow::TRIANGLE_STRIP, 0, 4);
            self.gl.bind_vertex_array(None);
        }
        check_gl_error(&self.gl, "draw_arrays");
    }
}

impl Drop for GlGraphicsDevice {
    fn drop(&mut self) {
        let leaked = self.live_object_count();
        if leaked > 0 {
            engine_warn!("galaxy3d::GlDevice", "Deleting {} GL objects still alive at shutdown", leaked);
        }
        unsafe {
            for (_, framebuffer) in self.framebuffers.drain() {
                self.gl.delete_framebuffer(framebuffer);
            }
            for (_, renderbuffer) in self.renderbuffers.drain() {
                self.gl.delete_renderbuffer(renderbuffer);
            }
            for (_, texture) in self.textures.drain() {
                self.gl.delete_texture(texture);
            }
            if let Some(vertex_array) = self.quad_vertex_array.take() {
                self.gl.delete_vertex_array(vertex_array);
            }
        }
    }
}
