/// GraphicsDevice trait - the driver seam under render targets and off-screens
///
/// Every GPU call made by the rasterizer goes through this trait. Backends
/// (OpenGL via glow, the test mock) implement it; the rest of the crate only
/// sees opaque handles and the value types below.

use bitflags::bitflags;

// ===== HANDLES =====

/// GPU framebuffer object name (never the window's default framebuffer)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FramebufferHandle(pub u32);

/// GPU renderbuffer name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderbufferHandle(pub u32);

/// GPU texture name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

/// Raw error code reported by the driver after a failed allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GpuErrorCode(pub u32);

// ===== ENUMS =====

/// Which framebuffer binding point a call addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FramebufferBinding {
    /// Read and draw at once
    Both,
    /// Source of blits and read-back
    Read,
    /// Destination of draws and blits
    Draw,
}

/// Attachment point inside a framebuffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachmentPoint {
    /// Color attachment N
    Color(u32),
    /// The single depth attachment
    Depth,
}

/// Color precision class of a color attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HdrPrecision {
    /// 8 bits per channel
    #[default]
    None,
    /// 16-bit float per channel
    HalfFloat,
    /// 32-bit float per channel
    FullFloat,
}

/// Storage format of a texture or renderbuffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageFormat {
    /// RGBA color with the given precision
    Color(HdrPrecision),
    /// Depth component, optionally configured for depth comparison sampling
    Depth {
        /// Enable compare mode (shadow sampler); textures only
        compare: bool,
    },
}

impl StorageFormat {
    /// Returns true for depth storage
    pub fn is_depth(&self) -> bool {
        matches!(self, StorageFormat::Depth { .. })
    }
}

/// Storage description for renderbuffer and texture allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageDesc {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Sample count (0 = single-sample storage)
    pub samples: u32,
    /// Pixel format
    pub format: StorageFormat,
}

impl StorageDesc {
    /// Returns true if the storage holds more than one sample per pixel
    pub fn is_multisample(&self) -> bool {
        self.samples > 0
    }
}

/// Framebuffer completeness status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramebufferStatus {
    Complete,
    IncompleteAttachment,
    IncompleteMissingAttachment,
    Unsupported,
    IncompleteDrawBuffer,
    IncompleteReadBuffer,
    IncompleteMultisample,
    Undefined,
    /// Status code with no known meaning
    Unknown(u32),
}

impl FramebufferStatus {
    /// Descriptive name of the status, "unknown" for unrecognized codes
    pub fn name(&self) -> &'static str {
        match self {
            FramebufferStatus::Complete => "COMPLETE",
            FramebufferStatus::IncompleteAttachment => "INCOMPLETE_ATTACHMENT",
            FramebufferStatus::IncompleteMissingAttachment => "INCOMPLETE_MISSING_ATTACHMENT",
            FramebufferStatus::Unsupported => "UNSUPPORTED",
            FramebufferStatus::IncompleteDrawBuffer => "INCOMPLETE_DRAW_BUFFER",
            FramebufferStatus::IncompleteReadBuffer => "INCOMPLETE_READ_BUFFER",
            FramebufferStatus::IncompleteMultisample => "INCOMPLETE_MULTISAMPLE",
            FramebufferStatus::Undefined => "UNDEFINED",
            FramebufferStatus::Unknown(_) => "unknown",
        }
    }

    /// Returns true for `Complete`
    pub fn is_complete(&self) -> bool {
        *self == FramebufferStatus::Complete
    }
}

/// Fixed-function capability toggled with enable/disable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    ScissorTest,
    DepthTest,
    CullFace,
    Multisample,
}

/// Depth comparison function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DepthFunc {
    Never,
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

/// Pixel layout for read-back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 4 x u8 per pixel
    Rgba8,
    /// 4 x f32 per pixel
    Rgba32F,
}

impl PixelFormat {
    /// Size of one pixel in bytes
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::Rgba8 => 4,
            PixelFormat::Rgba32F => 16,
        }
    }
}

bitflags! {
    /// Buffers copied by a framebuffer blit
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BlitMask: u32 {
        const COLOR = 1 << 0;
        const DEPTH = 1 << 1;
    }
}

/// Integer pixel rectangle (origin at bottom-left)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl PixelRect {
    /// Rectangle anchored at the origin
    pub fn from_size(width: u32, height: u32) -> Self {
        Self { x: 0, y: 0, width: width as i32, height: height as i32 }
    }
}

/// Optional driver features that off-screen creation negotiates against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceCapabilities {
    /// Multisample renderbuffer storage
    pub framebuffer_multisample: bool,
    /// Multisample textures
    pub texture_multisample: bool,
    /// Framebuffer blit (needed to resolve multisample storage)
    pub framebuffer_blit: bool,
    /// Highest sample count the driver advertises
    pub max_samples: u32,
}

impl Default for DeviceCapabilities {
    fn default() -> Self {
        Self {
            framebuffer_multisample: true,
            texture_multisample: true,
            framebuffer_blit: true,
            max_samples: 16,
        }
    }
}

// ===== GRAPHICS DEVICE TRAIT =====

/// Low-level GPU driver interface
///
/// Binding calls must only be issued by `TargetManager`, which keeps its
/// bound-target tracker in sync with them.
pub trait GraphicsDevice {
    /// Optional features supported by this device
    fn capabilities(&self) -> DeviceCapabilities;

    /// Generate a framebuffer object; None if the driver returned no object
    fn create_framebuffer(&mut self) -> Option<FramebufferHandle>;

    /// Delete a framebuffer object
    fn delete_framebuffer(&mut self, framebuffer: FramebufferHandle);

    /// Bind a framebuffer (None = default/window framebuffer)
    fn bind_framebuffer(&mut self, binding: FramebufferBinding, framebuffer: Option<FramebufferHandle>);

    /// Select draw buffers of the draw framebuffer (empty = none)
    fn set_draw_buffers(&mut self, attachments: &[AttachmentPoint]);

    /// Select the read buffer of the read framebuffer (None = none)
    fn set_read_buffer(&mut self, attachment: Option<AttachmentPoint>);

    /// Attach (Some) or clear (None) a texture on the bound framebuffer
    fn attach_texture(
        &mut self,
        binding: FramebufferBinding,
        point: AttachmentPoint,
        texture: Option<TextureHandle>,
        multisample: bool,
    );

    /// Attach (Some) or clear (None) a renderbuffer on the bound framebuffer
    fn attach_renderbuffer(
        &mut self,
        binding: FramebufferBinding,
        point: AttachmentPoint,
        renderbuffer: Option<RenderbufferHandle>,
    );

    /// Completeness of the framebuffer bound to `binding`
    fn framebuffer_status(&mut self, binding: FramebufferBinding) -> FramebufferStatus;

    /// Allocate renderbuffer storage
    fn create_renderbuffer(&mut self, desc: &StorageDesc) -> Result<RenderbufferHandle, GpuErrorCode>;

    /// Release renderbuffer storage
    fn delete_renderbuffer(&mut self, renderbuffer: RenderbufferHandle);

    /// Allocate 2D (or 2D multisample) texture storage without initial data
    fn create_texture(&mut self, desc: &StorageDesc) -> Result<TextureHandle, GpuErrorCode>;

    /// Release texture storage
    fn delete_texture(&mut self, texture: TextureHandle);

    /// Bind (Some) or unbind (None) a texture on a texture unit
    fn bind_texture(&mut self, unit: u32, texture: Option<TextureHandle>, multisample: bool);

    /// Copy between the bound read and draw framebuffers (nearest filtering)
    fn blit_framebuffer(&mut self, source: PixelRect, destination: PixelRect, mask: BlitMask);

    /// Read pixels of the read framebuffer into `pixels`
    fn read_pixels(&mut self, area: PixelRect, format: PixelFormat, pixels: &mut [u8]);

    fn set_viewport(&mut self, rect: PixelRect);

    fn set_scissor(&mut self, rect: PixelRect);

    fn enable(&mut self, capability: Capability);

    fn disable(&mut self, capability: Capability);

    fn set_depth_func(&mut self, func: DepthFunc);

    /// Save enable bits, viewport and the projection/view transforms
    fn push_state(&mut self);

    /// Restore what the matching `push_state` saved
    fn pop_state(&mut self);

    /// Draw one quad covering the viewport with the bound program
    fn draw_fullscreen_quad(&mut self);
}
