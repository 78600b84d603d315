/// Cached uniform locations of the builtin compositing programs.
///
/// Locations are looked up once per program and stored on the program
/// through `ShaderLibrary::set_attached_interface`; later draws reuse them.

use std::sync::Arc;
use crate::external::{
    ShaderLibrary, ProgramHandle, UniformLocation, UniformValue, BuiltinProgram, AttachedInterface,
};

/// Uniform locations of one builtin program
pub trait ProgramInterface: Send + Sync + 'static {
    /// Program this interface belongs to
    const PROGRAM: BuiltinProgram;

    /// Look up every location used by the compositing code
    fn resolve(shaders: &dyn ShaderLibrary, program: ProgramHandle) -> Self;
}

/// Program handle and its cached interface, or None if the library does
/// not provide the program
pub fn program_interface<I: ProgramInterface>(
    shaders: &mut dyn ShaderLibrary,
) -> Option<(ProgramHandle, Arc<I>)> {
    let program = shaders.builtin_program(I::PROGRAM)?;

    if let Some(cached) = shaders.attached_interface(program) {
        if let Ok(interface) = cached.downcast::<I>() {
            return Some((program, interface));
        }
    }

    let interface = Arc::new(I::resolve(&*shaders, program));
    let attached: AttachedInterface = interface.clone();
    shaders.set_attached_interface(program, attached);
    Some((program, interface))
}

/// Write a uniform if the program has it
pub(crate) fn set_uniform(
    shaders: &mut dyn ShaderLibrary,
    program: ProgramHandle,
    location: Option<UniformLocation>,
    value: UniformValue,
) {
    if let Some(location) = location {
        shaders.set_uniform(program, location, value);
    }
}

/// `BuiltinProgram::DrawFrameBuffer`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawFrameBufferInterface {
    pub color_texture: Option<UniformLocation>,
}

impl ProgramInterface for DrawFrameBufferInterface {
    const PROGRAM: BuiltinProgram = BuiltinProgram::DrawFrameBuffer;

    fn resolve(shaders: &dyn ShaderLibrary, program: ProgramHandle) -> Self {
        Self {
            color_texture: shaders.uniform_location(program, "colortex"),
        }
    }
}

/// `BuiltinProgram::StereoStipple`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StereoStippleInterface {
    pub left_eye_texture: Option<UniformLocation>,
    pub right_eye_texture: Option<UniformLocation>,
    /// 1 = row interlace, 0 = column interlace
    pub stipple_id: Option<UniformLocation>,
}

impl ProgramInterface for StereoStippleInterface {
    const PROGRAM: BuiltinProgram = BuiltinProgram::StereoStipple;

    fn resolve(shaders: &dyn ShaderLibrary, program: ProgramHandle) -> Self {
        Self {
            left_eye_texture: shaders.uniform_location(program, "lefteyetex"),
            right_eye_texture: shaders.uniform_location(program, "righteyetex"),
            stipple_id: shaders.uniform_location(program, "stippleid"),
        }
    }
}

/// `BuiltinProgram::StereoAnaglyph`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StereoAnaglyphInterface {
    pub left_eye_texture: Option<UniformLocation>,
    pub right_eye_texture: Option<UniformLocation>,
}

impl ProgramInterface for StereoAnaglyphInterface {
    const PROGRAM: BuiltinProgram = BuiltinProgram::StereoAnaglyph;

    fn resolve(shaders: &dyn ShaderLibrary, program: ProgramHandle) -> Self {
        Self {
            left_eye_texture: shaders.uniform_location(program, "lefteyetex"),
            right_eye_texture: shaders.uniform_location(program, "righteyetex"),
        }
    }
}

/// `BuiltinProgram::SeparableGaussianBlur`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeparableBlurInterface {
    /// Texel step of the pass (direction and length)
    pub scale: Option<UniformLocation>,
    pub texture_source: Option<UniformLocation>,
}

impl ProgramInterface for SeparableBlurInterface {
    const PROGRAM: BuiltinProgram = BuiltinProgram::SeparableGaussianBlur;

    fn resolve(shaders: &dyn ShaderLibrary, program: ProgramHandle) -> Self {
        Self {
            scale: shaders.uniform_location(program, "ScaleU"),
            texture_source: shaders.uniform_location(program, "textureSource"),
        }
    }
}

#[cfg(test)]
#[path = "shader_interface_tests.rs"]
mod tests;
