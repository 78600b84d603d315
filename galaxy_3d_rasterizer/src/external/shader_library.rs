/// Shader collaborator - compiled builtin programs and their uniforms
///
/// Shader sources and compilation live outside the rasterizer. This trait
/// only hands out opaque program handles, resolves uniform locations, and
/// lets the rasterizer cache per-program data (see `ProgramInterface`).

use std::any::Any;
use std::sync::Arc;
use glam::{Vec2, Vec4};

/// Opaque compiled program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub u32);

/// Resolved uniform location inside a program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub i32);

/// Builtin programs used by compositing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinProgram {
    /// Copies a color texture onto a full-screen quad
    DrawFrameBuffer,
    /// Interleaves two eye textures by row or column parity
    StereoStipple,
    /// Red/cyan filter of two eye textures
    StereoAnaglyph,
    /// One-dimensional gaussian pass, direction given by a scale vector
    SeparableGaussianBlur,
}

/// Value written to a uniform
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Vec2(Vec2),
    Vec4(Vec4),
    /// Sampler uniform bound to a texture unit
    TextureUnit(u32),
}

/// Cached data attached to a program by its user
pub type AttachedInterface = Arc<dyn Any + Send + Sync>;

pub trait ShaderLibrary {
    /// Builtin program of the given kind, None if it is unavailable
    fn builtin_program(&mut self, kind: BuiltinProgram) -> Option<ProgramHandle>;

    /// Make `program` the active program
    fn bind(&mut self, program: ProgramHandle);

    /// Deactivate the active program
    fn unbind(&mut self);

    /// Location of a uniform by name, None if the program has no such uniform
    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation>;

    fn set_uniform(&mut self, program: ProgramHandle, location: UniformLocation, value: UniformValue);

    /// Data previously attached with `set_attached_interface`
    fn attached_interface(&self, program: ProgramHandle) -> Option<AttachedInterface>;

    fn set_attached_interface(&mut self, program: ProgramHandle, data: AttachedInterface);
}
