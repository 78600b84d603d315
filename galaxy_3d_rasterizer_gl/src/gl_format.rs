/// OpenGL enum conversions
///
/// Pure mappings between the device-seam value types and GL enums, kept
/// free of any context so they can be tested without a driver.

use galaxy_3d_rasterizer::galaxy3d::render::{
    FramebufferBinding, AttachmentPoint, HdrPrecision, StorageFormat, FramebufferStatus,
    Capability, DepthFunc, PixelFormat, BlitMask, DeviceCapabilities,
};

/// Context version as reported by the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlVersion {
    pub major: u32,
    pub minor: u32,
    /// OpenGL ES context
    pub embedded: bool,
}

impl GlVersion {
    pub fn at_least(&self, major: u32, minor: u32) -> bool {
        (self.major, self.minor) >= (major, minor)
    }
}

pub fn framebuffer_target(binding: FramebufferBinding) -> u32 {
    match binding {
        FramebufferBinding::Both => glow::FRAMEBUFFER,
        FramebufferBinding::Read => glow::READ_FRAMEBUFFER,
        FramebufferBinding::Draw => glow::DRAW_FRAMEBUFFER,
    }
}

pub fn attachment(point: AttachmentPoint) -> u32 {
    match point {
        AttachmentPoint::Color(index) => glow::COLOR_ATTACHMENT0 + index,
        AttachmentPoint::Depth => glow::DEPTH_ATTACHMENT,
    }
}

pub fn texture_target(multisample: bool) -> u32 {
    if multisample {
        glow::TEXTURE_2D_MULTISAMPLE
    } else {
        glow::TEXTURE_2D
    }
}

/// Sized internal format of a storage format
pub fn internal_format(format: StorageFormat) -> u32 {
    match format {
        StorageFormat::Color(HdrPrecision::None) => glow::RGBA8,
        StorageFormat::Color(HdrPrecision::HalfFloat) => glow::RGBA16F,
        StorageFormat::Color(HdrPrecision::FullFloat) => glow::RGBA32F,
        StorageFormat::Depth { .. } => glow::DEPTH_COMPONENT24,
    }
}

/// (format, type) pair used when allocating single-sample texture storage
pub fn upload_format(format: StorageFormat) -> (u32, u32) {
    match format {
        StorageFormat::Color(HdrPrecision::None) => (glow::RGBA, glow::UNSIGNED_BYTE),
        StorageFormat::Color(HdrPrecision::HalfFloat) => (glow::RGBA, glow::HALF_FLOAT),
        StorageFormat::Color(HdrPrecision::FullFloat) => (glow::RGBA, glow::FLOAT),
        StorageFormat::Depth { .. } => (glow::DEPTH_COMPONENT, glow::UNSIGNED_INT),
    }
}

/// (format, type) pair used for read-back
pub fn pixel_format(format: PixelFormat) -> (u32, u32) {
    match format {
        PixelFormat::Rgba8 => (glow::RGBA, glow::UNSIGNED_BYTE),
        PixelFormat::Rgba32F => (glow::RGBA, glow::FLOAT),
    }
}

pub fn framebuffer_status(status: u32) -> FramebufferStatus {
    match status {
        glow::FRAMEBUFFER_COMPLETE => FramebufferStatus::Complete,
        glow::FRAMEBUFFER_INCOMPLETE_ATTACHMENT => FramebufferStatus::IncompleteAttachment,
        glow::FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT => FramebufferStatus::IncompleteMissingAttachment,
        glow::FRAMEBUFFER_UNSUPPORTED => FramebufferStatus::Unsupported,
        glow::FRAMEBUFFER_INCOMPLETE_DRAW_BUFFER => FramebufferStatus::IncompleteDrawBuffer,
        glow::FRAMEBUFFER_INCOMPLETE_READ_BUFFER => FramebufferStatus::IncompleteReadBuffer,
        glow::FRAMEBUFFER_INCOMPLETE_MULTISAMPLE => FramebufferStatus::IncompleteMultisample,
        glow::FRAMEBUFFER_UNDEFINED => FramebufferStatus::Undefined,
        other => FramebufferStatus::Unknown(other),
    }
}

pub fn capability(capability: Capability) -> u32 {
    match capability {
        Capability::ScissorTest => glow::SCISSOR_TEST,
        Capability::DepthTest => glow::DEPTH_TEST,
        Capability::CullFace => glow::CULL_FACE,
        Capability::Multisample => glow::MULTISAMPLE,
    }
}

pub fn depth_func(func: DepthFunc) -> u32 {
    match func {
        DepthFunc::Never => glow::NEVER,
        DepthFunc::Less => glow::LESS,
        DepthFunc::Equal => glow::EQUAL,
        DepthFunc::LessEqual => glow::LEQUAL,
        DepthFunc::Greater => glow::GREATER,
        DepthFunc::NotEqual => glow::NOTEQUAL,
        DepthFunc::GreaterEqual => glow::GEQUAL,
        DepthFunc::Always => glow::ALWAYS,
    }
}

pub fn blit_mask(mask: BlitMask) -> u32 {
    let mut bits = 0;
    if mask.contains(BlitMask::COLOR) {
        bits |= glow::COLOR_BUFFER_BIT;
    }
    if mask.contains(BlitMask::DEPTH) {
        bits |= glow::DEPTH_BUFFER_BIT;
    }
    bits
}

/// Derive off-screen capabilities from the context version and extensions
///
/// Desktop GL 3.0 and ES 3.0 have multisample renderbuffers and blits in
/// core; multisample textures need GL 3.2 / ES 3.1 or ARB_texture_multisample.
pub fn device_capabilities(
    version: GlVersion,
    has_extension: impl Fn(&str) -> bool,
    max_samples: i32,
) -> DeviceCapabilities {
    let core_fbo = version.at_least(3, 0);
    let framebuffer_multisample = core_fbo
        || has_extension("GL_ARB_framebuffer_object")
        || has_extension("GL_EXT_framebuffer_multisample");
    let framebuffer_blit = core_fbo
        || has_extension("GL_ARB_framebuffer_object")
        || has_extension("GL_EXT_framebuffer_blit");
    let texture_multisample = if version.embedded {
        version.at_least(3, 1)
    } else {
        version.at_least(3, 2) || has_extension("GL_ARB_texture_multisample")
    };

    DeviceCapabilities {
        framebuffer_multisample,
        texture_multisample,
        framebuffer_blit,
        max_samples: if framebuffer_multisample { max_samples.max(0) as u32 } else { 0 },
    }
}

#[cfg(test)]
#[path = "gl_format_tests.rs"]
mod tests;
